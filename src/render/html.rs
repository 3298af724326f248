use crate::models::chat::{ ConversationMessage, Sender };
use crate::text::{ escape_html, message_html };

/// Markup for one message, mirroring the chat widget's structure.
pub fn message_block(message: &ConversationMessage) -> String {
    let sender = match message.sender {
        Sender::User => "user",
        Sender::Assistant => "ai",
    };
    let class = if message.is_error { format!("message {} error", sender) } else { format!("message {}", sender) };

    let mut html = format!(
        "<div class=\"{}\">\n  <div class=\"message-content\">\n    <div class=\"message-text\">{}</div>\n",
        class,
        message_html(&message.text)
    );
    if !message.suggestions.is_empty() {
        html.push_str("    <div class=\"suggestions-container\">\n      <p class=\"suggestions-title\">Did you mean:</p>\n");
        for suggestion in &message.suggestions {
            html.push_str(&format!("      <span class=\"suggestion-chip\">{}</span>\n", escape_html(&suggestion.question)));
        }
        html.push_str("    </div>\n");
    }
    html.push_str(
        &format!(
            "    <div class=\"message-meta\"><span class=\"timestamp\">{}</span></div>\n",
            escape_html(&message.timestamp)
        )
    );
    if let Some(percent) = message.confidence_percent() {
        html.push_str(&format!("    <div class=\"confidence-badge\">{}% match</div>\n", percent));
    }
    html.push_str("  </div>\n</div>\n");
    html
}

/// Standalone HTML document of the whole transcript.
pub fn transcript_document(title: &str, messages: &[ConversationMessage]) -> String {
    let body: String = messages.iter().map(message_block).collect();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<div class=\"chat-messages\">\n{body}</div>\n</body>\n</html>\n",
        title = escape_html(title),
        body = body
    )
}
