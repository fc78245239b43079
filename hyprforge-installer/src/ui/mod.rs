//! Operator-facing prompts and status output.

pub mod confirm;
pub mod prompt;
pub mod style;
