//! Confirmation gates.
//!
//! Only the exact answer `y` counts as yes. Surrounding whitespace from line
//! input is ignored; `Y`, `yes` and the empty answer all decline.

use crate::errors::InstallError;
use crate::ui::prompt::Prompter;
use anyhow::Result;

pub fn is_affirmative(answer: &str) -> bool {
    answer.trim() == "y"
}

/// Ask `prompt`; anything but `y` aborts with [`InstallError::Aborted`].
pub fn require_confirmation(prompter: &mut dyn Prompter, prompt: &str) -> Result<()> {
    let answer = prompter.answer(prompt)?;
    if is_affirmative(&answer) {
        return Ok(());
    }
    log::warn!("operator declined: {} (answer {:?})", prompt, answer.trim());
    Err(InstallError::Aborted {
        prompt: prompt.to_string(),
    }
    .into())
}

pub fn confirm_and_run_with<C, A>(prompt: &str, confirm: C, action: A) -> Result<bool>
where
    C: FnOnce(&str) -> Result<bool>,
    A: FnOnce() -> Result<()>,
{
    if confirm(prompt)? {
        action()?;
        Ok(true)
    } else {
        Ok(false)
    }
}
