use chrono::{ Datelike, Duration, NaiveDate, Timelike };
use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("valid url regex"));

/// `9:05 AM` style clock time.
pub fn format_timestamp<T: Timelike>(time: &T) -> String {
    let (pm, hour) = time.hour12();
    format!("{}:{:02} {}", hour, time.minute(), if pm { "PM" } else { "AM" })
}

/// Day label used to group messages: `Today`, `Yesterday`, `Mar 4`, or `Mar 4, 2023`
/// when the year differs from `today`.
pub fn format_message_date(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.checked_sub_signed(Duration::days(1)) {
        "Yesterday".to_string()
    } else if date.year() != today.year() {
        date.format("%b %-d, %Y").to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

pub fn escape_html(unsafe_text: &str) -> String {
    let mut out = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps every http(s) URL in an anchor. Expects already-escaped input.
pub fn linkify(text: &str) -> String {
    URL_RE.replace_all(text, |caps: &regex::Captures| {
        let url = &caps[0];
        format!(
            r#"<a href="{url}" target="_blank" rel="noopener noreferrer" class="message-link">{url}</a>"#
        )
    }).into_owned()
}

/// Escape, linkify and convert newlines: the body markup of a rendered message.
pub fn message_html(text: &str) -> String {
    linkify(&escape_html(text)).replace('\n', "<br>")
}
