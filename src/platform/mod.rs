//! Host capabilities the controllers consume as opaque services: wall clock,
//! notifications, confirmation prompts, clipboard and speech.
mod terminal;

pub use terminal::{ read_line, CommandClipboard, CommandSpeech, StdinConfirm, TerminalNotifier };

use async_trait::async_trait;
use chrono::{ DateTime, Local };
use std::fmt;
use std::sync::{ Arc, Mutex };
use thiserror::Error;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// Transient user-facing notice (a "toast").
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Keeps every notification; used by headless callers and tests.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    entries: Arc<Mutex<Vec<(NotificationKind, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(NotificationKind, String)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((kind, message.to_string()));
        }
    }
}

#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every confirmation prompt with the same value.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("{0} is not available")]
    Unavailable(&'static str),
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' exited with {status}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
    },
}

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<(), CapabilityError>;
}

pub struct NoopClipboard;

#[async_trait]
impl Clipboard for NoopClipboard {
    async fn write_text(&self, _text: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("clipboard"))
    }
}

#[async_trait]
pub trait Speech: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), CapabilityError>;

    async fn stop(&self);

    fn is_speaking(&self) -> bool;

    /// Stops playback if something is playing, otherwise starts reading `text`.
    async fn toggle(&self, text: &str) -> Result<(), CapabilityError> {
        if self.is_speaking() {
            self.stop().await;
            Ok(())
        } else {
            self.speak(text).await
        }
    }
}

pub struct NoopSpeech;

#[async_trait]
impl Speech for NoopSpeech {
    async fn speak(&self, _text: &str) -> Result<(), CapabilityError> {
        Err(CapabilityError::Unavailable("speech synthesis"))
    }

    async fn stop(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Copies `text` and reports the outcome as a notification.
pub async fn copy_to_clipboard(clipboard: &dyn Clipboard, notifier: &dyn Notifier, text: &str) -> bool {
    match clipboard.write_text(text).await {
        Ok(()) => {
            notifier.notify(NotificationKind::Success, "Copied to clipboard!");
            true
        }
        Err(e) => {
            log::error!("Failed to copy: {}", e);
            notifier.notify(NotificationKind::Error, "Failed to copy text");
            false
        }
    }
}

/// Toggles read-aloud of `text`, notifying on failure.
pub async fn toggle_speech(speech: &dyn Speech, notifier: &dyn Notifier, text: &str) {
    if let Err(e) = speech.toggle(text).await {
        log::error!("Speech error: {}", e);
        notifier.notify(NotificationKind::Error, "Error playing speech");
    }
}
