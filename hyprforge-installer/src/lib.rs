//! hyprforge installer.
//!
//! Preflight, plan collection and confirmations happen up front; after that
//! the destructive stages run strictly in order and stop at the first error.

pub mod cli;
pub mod config;
pub mod disk_ops;
pub mod errors;
pub mod logging;
pub mod stages;
pub mod template;
pub mod ui;

use crate::cli::{Cli, Command};
use crate::config::{collect_plan, PlanDefaults};
use crate::stages::runner::{StageDefinition, StageRunner};
use crate::stages::stage_01_preflight::{self, ProbeTarget};
use crate::stages::{
    stage_02_disk_layout, stage_03_filesystems, stage_04_mounts, stage_05_base_install,
    stage_06_system_config, stage_07_desktop, stage_08_finish, InstallContext,
};
use crate::ui::confirm::require_confirmation;
use crate::ui::prompt::{ConsolePrompter, Prompter};
use crate::ui::style::{self, emoji};
use anyhow::{Context, Result};
use hyprforge_hal::{LinuxHal, SystemHal};
use std::path::PathBuf;

/// Everything the install needs besides the operator's answers.
#[derive(Debug, Clone)]
pub struct InstallSettings {
    pub target_root: PathBuf,
    pub probe: ProbeTarget,
    pub defaults: PlanDefaults,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            target_root: PathBuf::from("/mnt"),
            probe: ProbeTarget::default(),
            defaults: PlanDefaults::default(),
        }
    }
}

impl InstallSettings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Ok(Self {
            target_root: cli.target_root.clone(),
            probe: ProbeTarget {
                host: cli.probe_host.clone(),
                port: cli.probe_port,
            },
            defaults: PlanDefaults::load_or_default(cli.plan.as_deref())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub completed_stages: Vec<String>,
    pub rebooting: bool,
}

pub fn run(cli: &Cli) -> Result<()> {
    let hal = LinuxHal::new();
    let settings = InstallSettings::from_cli(cli)?;

    match &cli.command {
        None => {
            log::info!("🌊 Starting hyprforge install");
            let mut prompter = ConsolePrompter;
            install(&hal, &mut prompter, &settings)?;
        }
        Some(Command::Preflight) => {
            log::info!("🔍 Running preflight checks...");
            stage_01_preflight::run(&hal, &settings.probe)?;
            println!("{}", style::success("Preflight checks passed"));
        }
        Some(Command::Disks) => print_disks(&hal)?,
    }
    Ok(())
}

fn print_disks(hal: &dyn SystemHal) -> Result<()> {
    let disks = hal.list_disks().context("Failed to enumerate disks")?;
    if disks.is_empty() {
        println!("{}", style::warning("No candidate disks found"));
        return Ok(());
    }
    println!("{}", style::heading(&style::with(emoji::DISK, "Candidate disks")));
    for disk in &disks {
        println!("   {}", disk_ops::describe_disk(disk));
    }
    Ok(())
}

pub fn destroy_prompt(disk: &str) -> String {
    format!("ALL DATA on {disk} will be destroyed. Continue? (y/N)")
}

pub const CONTINUE_PROMPT: &str = "Proceed with the installation? (y/N)";

/// Full interactive install against `hal`.
pub fn install(
    hal: &dyn SystemHal,
    prompter: &mut dyn Prompter,
    settings: &InstallSettings,
) -> Result<InstallReport> {
    stage_01_preflight::run(hal, &settings.probe)
        .context(errors::InstallError::StageFailed("preflight".to_string()))?;

    print_disks(hal)?;
    let plan = collect_plan(prompter, &settings.defaults)?;

    require_confirmation(prompter, &destroy_prompt(&plan.disk))?;
    let size = disk_ops::check_capacity(hal, &plan.disk)?;
    log::info!("target {} holds {} bytes", plan.disk, size);

    println!("{}", style::heading("Installation plan"));
    for line in plan.summary_lines() {
        println!("   {line}");
    }
    require_confirmation(prompter, CONTINUE_PROMPT)?;

    let ctx = InstallContext::new(hal, plan, settings.target_root.clone()).confirmed();
    log::info!("plan: {:?}", ctx.plan);

    let mut pipeline: Vec<StageDefinition<'_, InstallContext<'_>>> = vec![
        StageDefinition::new("disk layout", stage_02_disk_layout::run),
        StageDefinition::new("filesystems", stage_03_filesystems::run),
        StageDefinition::new("mounts", stage_04_mounts::run),
        StageDefinition::new("base install", stage_05_base_install::run),
        StageDefinition::new("system config", stage_06_system_config::run),
    ];
    if ctx.plan.extended {
        pipeline.push(StageDefinition::new("desktop", stage_07_desktop::run));
    }

    let completed_stages = StageRunner::new().run(&ctx, &pipeline)?;
    let rebooting = stage_08_finish::run(&ctx, prompter)?;

    Ok(InstallReport {
        completed_stages,
        rebooting,
    })
}
