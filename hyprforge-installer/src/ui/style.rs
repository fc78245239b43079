//! Centralized emoji + color helpers for consistent UX copy.

use colored::Colorize;

pub mod emoji {
    pub const ACTION: &str = "🧩";
    pub const CANCEL: &str = "🛑";
    pub const CLEANUP: &str = "🧹";
    pub const DISK: &str = "💾";
    pub const ERROR: &str = "❌";
    pub const PARTY: &str = "🎉";
    pub const SUCCESS: &str = "✅";
    pub const WARNING: &str = "⚠️";
}

pub fn with(emoji: &str, message: &str) -> String {
    format!("{} {}", emoji, message)
}

pub fn heading(message: &str) -> String {
    message.bold().cyan().to_string()
}

pub fn step(index: usize, total: usize, message: &str) -> String {
    with(emoji::ACTION, &format!("[{index}/{total}] {message}"))
        .bold()
        .to_string()
}

pub fn success(message: &str) -> String {
    with(emoji::SUCCESS, message).green().to_string()
}

pub fn warning(message: &str) -> String {
    with(emoji::WARNING, message).yellow().to_string()
}

pub fn error(message: &str) -> String {
    with(emoji::ERROR, message).red().bold().to_string()
}

pub fn cancelled(message: &str) -> String {
    with(emoji::CANCEL, message).yellow().to_string()
}
