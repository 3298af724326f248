use std::io::{ self, Write };
use tokio::sync::mpsc;
use crate::conversation::ConversationEvent;
use crate::conversation::scroll::ScrollAction;
use crate::models::chat::{ ConversationMessage, Sender };

pub const THINKING_LINE: &str = "Assistant is thinking...";

/// Plain-text rendering of one message, including its badge and "did you mean" list.
pub fn format_message(message: &ConversationMessage) -> String {
    let label = match message.sender {
        Sender::User => "You",
        Sender::Assistant if message.is_error => "Assistant [!]",
        Sender::Assistant => "Assistant",
    };
    let mut out = format!("[{}] {}: {}", message.timestamp, label, message.text);
    if let Some(percent) = message.confidence_percent() {
        out.push_str(&format!("\n    {}% match", percent));
        if let Some(match_type) = &message.match_type {
            out.push_str(&format!(" ({})", match_type));
        }
    }
    if !message.suggestions.is_empty() {
        out.push_str("\n    Did you mean (type its number):");
        for (i, suggestion) in message.suggestions.iter().enumerate() {
            out.push_str(&format!("\n      {}. {}", i + 1, suggestion.question));
        }
    }
    out
}

/// The welcome placeholder shown while the conversation is empty.
pub fn format_welcome(suggestions: &[String]) -> String {
    let mut out = String::from("Ask me anything about admissions, fees, courses or campus life.");
    if !suggestions.is_empty() {
        out.push_str("\nTry one of these (type its number):");
        for (i, suggestion) in suggestions.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}", i + 1, suggestion));
        }
    }
    out
}

/// Prints conversation events. A terminal always shows new output, so an append that
/// must not move the reader is flagged instead of scrolled to.
///
/// The most recently printed numbered list (welcome suggestions or an answer's
/// "did you mean" entries) stays selectable until another message is printed.
pub struct TerminalRenderer<W: Write> {
    out: W,
    suggestions: Vec<String>,
    choices: Vec<String>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, suggestions: Vec<String>) -> Self {
        Self { out, suggestions, choices: Vec::new() }
    }

    /// Questions the user can currently pick by number.
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn show_welcome(&mut self) -> io::Result<()> {
        self.choices = self.suggestions.clone();
        writeln!(self.out, "{}", format_welcome(&self.suggestions))?;
        self.out.flush()
    }

    pub fn render(&mut self, event: &ConversationEvent) -> io::Result<()> {
        match event {
            ConversationEvent::MessageAppended { message, scroll } => {
                if *scroll == ScrollAction::Stay {
                    writeln!(self.out, "-- new message below --")?;
                }
                self.choices = message.suggestions
                    .iter()
                    .map(|s| s.question.clone())
                    .collect();
                writeln!(self.out, "{}", format_message(message))?;
            }
            ConversationEvent::TypingChanged { typing: true, .. } => {
                writeln!(self.out, "{}", THINKING_LINE)?;
            }
            ConversationEvent::TypingChanged { typing: false, .. } => {}
            ConversationEvent::PlaceholderChanged { visible: true } => {
                return self.show_welcome();
            }
            ConversationEvent::PlaceholderChanged { visible: false } => {}
            ConversationEvent::Cleared => {
                writeln!(self.out, "-- conversation cleared --")?;
            }
        }
        self.out.flush()
    }

    /// Renders every event already queued on `rx` without waiting for more.
    pub fn drain(&mut self, rx: &mut mpsc::UnboundedReceiver<ConversationEvent>) -> io::Result<usize> {
        let mut rendered = 0;
        while let Ok(event) = rx.try_recv() {
            self.render(&event)?;
            rendered += 1;
        }
        Ok(rendered)
    }
}
