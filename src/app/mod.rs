//! Command handlers: wire the configured collaborators into the controllers.
pub mod admin;
pub mod chat;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use crate::api::ApiConfig;
use crate::cli::Args;
use crate::history::ChatHistory;
use crate::platform::{
    AutoConfirm,
    Clipboard,
    Clock,
    CommandClipboard,
    CommandSpeech,
    Confirm,
    NoopClipboard,
    NoopSpeech,
    Notifier,
    Speech,
    StdinConfirm,
    SystemClock,
    TerminalNotifier,
};
use crate::storage::{ create_store, KeyValueStore };

/// Collaborators shared by every command.
pub struct Context {
    pub args: Args,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
    pub api_config: ApiConfig,
}

impl Context {
    pub fn from_args(args: Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let store = create_store(&args)?;
        let api_config = ApiConfig {
            base_url: args.api_url.clone(),
            timeout: Some(Duration::from_secs(args.request_timeout_secs)).filter(|d| !d.is_zero()),
        };
        Ok(Self {
            args,
            store,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(TerminalNotifier),
            api_config,
        })
    }

    pub fn history(&self) -> ChatHistory {
        ChatHistory::new(self.store.clone(), self.clock.clone(), self.args.history_cap)
    }

    /// Prompts on stdin unless the caller already agreed.
    pub fn confirm(&self, assume_yes: bool) -> Arc<dyn Confirm> {
        if assume_yes { Arc::new(AutoConfirm(true)) } else { Arc::new(StdinConfirm) }
    }

    pub fn clipboard(&self) -> Arc<dyn Clipboard> {
        match &self.args.clipboard_cmd {
            Some(cmd) if !cmd.trim().is_empty() => Arc::new(CommandClipboard::new(cmd.clone())),
            _ => Arc::new(NoopClipboard),
        }
    }

    pub fn speech(&self) -> Arc<dyn Speech> {
        match &self.args.speech_cmd {
            Some(cmd) if !cmd.trim().is_empty() => Arc::new(CommandSpeech::new(cmd.clone())),
            _ => Arc::new(NoopSpeech),
        }
    }
}
