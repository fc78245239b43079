//! Interactive input.
//!
//! Every question goes through [`Prompter`] so the install flow can be driven
//! by a script in tests.

use crate::ui::style;
use anyhow::{anyhow, Context, Result};
use dialoguer::{Input, Password};
use std::collections::VecDeque;

pub trait Prompter {
    /// Free-text line; `default` is shown to the operator but not applied.
    fn input(&mut self, prompt: &str, default: &str) -> Result<String>;

    /// Masked line.
    fn secret(&mut self, prompt: &str) -> Result<String>;

    /// Answer to a yes/no question, as typed.
    fn answer(&mut self, prompt: &str) -> Result<String>;
}

/// Terminal prompts via `dialoguer`.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl Prompter for ConsolePrompter {
    fn input(&mut self, prompt: &str, default: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(format!("{prompt} [{default}]"))
            .allow_empty(true)
            .interact_text()
            .with_context(|| format!("Failed to read input for {prompt}"))
    }

    fn secret(&mut self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .with_context(|| format!("Failed to read input for {prompt}"))
    }

    fn answer(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .context("Failed to read confirmation input")
    }
}

/// Replays fixed answers in order and records every prompt it was shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, prompt: &str) -> Result<String> {
        self.asked.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for prompt: {prompt}"))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, prompt: &str, _default: &str) -> Result<String> {
        self.next(prompt)
    }

    fn secret(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }

    fn answer(&mut self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }
}

/// Empty input selects `default`; anything else is used verbatim.
pub fn ask_with_default(prompter: &mut dyn Prompter, prompt: &str, default: &str) -> Result<String> {
    let value = prompter.input(prompt, default)?;
    if value.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(value)
    }
}

/// Ask twice until both entries match.
pub fn ask_password(prompter: &mut dyn Prompter, prompt: &str) -> Result<String> {
    loop {
        let first = prompter.secret(prompt)?;
        let second = prompter.secret(&format!("Confirm {}", prompt.to_lowercase()))?;
        if first == second {
            return Ok(first);
        }
        log::warn!("{}: entries did not match", prompt);
        eprintln!("{}", style::warning("Passwords do not match, try again."));
    }
}
