use async_trait::async_trait;
use log::{ debug, info };
use std::io::Write;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::{ Child, Command };
use super::{ CapabilityError, Clipboard, Confirm, NotificationKind, Notifier, Speech };

/// Prints notifications to stderr so they never interleave with transcript output on stdout.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        debug!("notification [{}]: {}", kind, message);
        eprintln!("[{}] {}", kind, message);
    }
}

/// Reads one line from the process stdin without holding the async runtime.
/// Returns `None` at end of input.
pub async fn read_line() -> std::io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
        }
    }).await.map_err(std::io::Error::other)?
}

pub struct StdinConfirm;

#[async_trait]
impl Confirm for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        let _ = std::io::stdout().flush();
        match read_line().await {
            Ok(Some(answer)) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

fn split_command(command_line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command_line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Pipes text into an external clipboard tool such as `xclip -selection clipboard` or `pbcopy`.
pub struct CommandClipboard {
    command_line: String,
}

impl CommandClipboard {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self { command_line: command_line.into() }
    }
}

#[async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<(), CapabilityError> {
        let (program, args) = split_command(&self.command_line).ok_or(
            CapabilityError::Unavailable("clipboard")
        )?;
        let spawn_err = |source| CapabilityError::Spawn { command: self.command_line.clone(), source };

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(spawn_err)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await.map_err(spawn_err)?;
        }
        let status = child.wait().await.map_err(spawn_err)?;
        if !status.success() {
            return Err(CapabilityError::Failed { command: self.command_line.clone(), status });
        }
        Ok(())
    }
}

/// Reads text aloud through an external synthesizer such as `espeak` or `say`.
/// The text is passed as the final argument.
pub struct CommandSpeech {
    command_line: String,
    current: Mutex<Option<Child>>,
}

impl CommandSpeech {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self { command_line: command_line.into(), current: Mutex::new(None) }
    }

    fn take_current(&self) -> Option<Child> {
        self.current.lock().ok().and_then(|mut c| c.take())
    }
}

#[async_trait]
impl Speech for CommandSpeech {
    async fn speak(&self, text: &str) -> Result<(), CapabilityError> {
        self.stop().await;
        let (program, args) = split_command(&self.command_line).ok_or(
            CapabilityError::Unavailable("speech synthesis")
        )?;
        let child = Command::new(&program)
            .args(&args)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CapabilityError::Spawn { command: self.command_line.clone(), source })?;
        info!("Speaking {} characters with '{}'", text.chars().count(), program);
        if let Ok(mut current) = self.current.lock() {
            *current = Some(child);
        }
        Ok(())
    }

    async fn stop(&self) {
        if let Some(mut child) = self.take_current() {
            let _ = child.kill().await;
        }
    }

    fn is_speaking(&self) -> bool {
        let Ok(mut current) = self.current.lock() else {
            return false;
        };
        match current.as_mut().map(|child| child.try_wait()) {
            Some(Ok(None)) => true,
            Some(_) => {
                *current = None;
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_lines_split_on_whitespace() {
        assert_eq!(
            split_command("xclip -selection clipboard"),
            Some(("xclip".to_string(), vec!["-selection".to_string(), "clipboard".to_string()]))
        );
        assert_eq!(split_command("   "), None);
    }

    #[tokio::test]
    async fn missing_clipboard_program_is_a_spawn_error() {
        let clipboard = CommandClipboard::new("faqdesk-no-such-clipboard-tool");
        let err = clipboard.write_text("x").await.unwrap_err();
        assert!(matches!(err, CapabilityError::Spawn { .. }));
    }

    #[tokio::test]
    async fn empty_speech_command_is_unavailable() {
        let speech = CommandSpeech::new("");
        assert!(matches!(speech.speak("hi").await, Err(CapabilityError::Unavailable(_))));
        assert!(!speech.is_speaking());
    }
}
