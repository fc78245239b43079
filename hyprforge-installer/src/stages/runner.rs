use crate::errors::InstallError;
use crate::ui::style;
use anyhow::{Context, Result};

pub type StageFn<'a, C> = Box<dyn Fn(&C) -> Result<()> + 'a>;

pub struct StageDefinition<'a, C> {
    pub name: &'a str,
    pub run: StageFn<'a, C>,
}

impl<'a, C> StageDefinition<'a, C> {
    pub fn new(name: &'a str, run: impl Fn(&C) -> Result<()> + 'a) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }
}

/// Runs stages in order and stops at the first failure.
#[derive(Debug, Clone)]
pub struct StageRunner {
    announce: bool,
}

impl Default for StageRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRunner {
    pub fn new() -> Self {
        Self { announce: true }
    }

    /// No progress lines on stdout.
    pub fn quiet() -> Self {
        Self { announce: false }
    }

    /// Names of the completed stages, in order.
    pub fn run<C>(&self, ctx: &C, stages: &[StageDefinition<'_, C>]) -> Result<Vec<String>> {
        let total = stages.len();
        let mut completed = Vec::with_capacity(total);

        for (idx, stage) in stages.iter().enumerate() {
            log::info!("stage {}/{}: {}", idx + 1, total, stage.name);
            if self.announce {
                println!("{}", style::step(idx + 1, total, stage.name));
            }

            (stage.run)(ctx).with_context(|| InstallError::StageFailed(stage.name.to_string()))?;

            completed.push(stage.name.to_string());
        }

        Ok(completed)
    }
}
