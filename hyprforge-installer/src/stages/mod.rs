//! Install pipeline stages.
//!
//! Each stage is a plain function over [`InstallContext`]. Stages run in
//! order through [`runner::StageRunner`]; the first error stops the run.

use crate::config::InstallPlan;
use crate::disk_ops::PartitionLayout;
use hyprforge_hal::SystemHal;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod runner;
pub mod stage_01_preflight;
pub mod stage_02_disk_layout;
pub mod stage_03_filesystems;
pub mod stage_04_mounts;
pub mod stage_05_base_install;
pub mod stage_06_system_config;
pub mod stage_07_desktop;
pub mod stage_08_finish;

/// Package database syncs, pacstrap and desktop installs.
pub const PACKAGE_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);
/// AUR helper build and AUR installs.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
/// Single configuration commands inside the target.
pub const CONFIG_TIMEOUT: Duration = Duration::from_secs(10 * 60);
/// Clones of the shell framework and plugins.
pub const CLONE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// State shared by every stage: the HAL, the confirmed plan and where things go.
pub struct InstallContext<'a> {
    pub hal: &'a dyn SystemHal,
    pub plan: InstallPlan,
    pub layout: PartitionLayout,
    pub target_root: PathBuf,
    /// Set once the operator accepted the disk destruction prompt.
    pub destructive_confirmed: bool,
}

impl<'a> InstallContext<'a> {
    pub fn new(hal: &'a dyn SystemHal, plan: InstallPlan, target_root: impl Into<PathBuf>) -> Self {
        let layout = PartitionLayout::for_disk(&plan.disk);
        Self {
            hal,
            plan,
            layout,
            target_root: target_root.into(),
            destructive_confirmed: false,
        }
    }

    pub fn confirmed(mut self) -> Self {
        self.destructive_confirmed = true;
        self
    }

    /// Absolute host path of `rel` inside the target root.
    pub fn target(&self, rel: &str) -> PathBuf {
        self.target_root.join(rel.trim_start_matches('/'))
    }

    pub fn root(&self) -> &Path {
        &self.target_root
    }

    pub fn root_arg(&self) -> String {
        self.target_root.display().to_string()
    }

    /// Home directory of the new user as seen inside the target.
    pub fn user_home(&self) -> String {
        format!("/home/{}", self.plan.username)
    }
}
