//! Presentation of conversation state and admin data: terminal output, HTML transcript
//! export and text charts.
pub mod chart;
pub mod html;
pub mod terminal;

pub use terminal::{ format_message, format_welcome, TerminalRenderer };
