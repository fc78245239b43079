//! CLI argument parsing for hyprforge
//!
//! Running without a subcommand starts the interactive install.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hyprforge")]
#[command(about = "🌊 hyprforge - Arch Linux + Hyprland installer")]
#[command(long_about = "🌊 hyprforge - Arch Linux + Hyprland installer\n\n\
    Wipes one disk, installs Arch Linux with systemd-boot and optionally a\n\
    Hyprland desktop for the new user.\n\n\
    Run without arguments from the Arch live ISO to start the interactive install.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// TOML file overriding the default answer of each prompt
    #[arg(long, global = true)]
    pub plan: Option<PathBuf>,

    /// Where the new system is assembled before booting into it
    #[arg(long, default_value = "/mnt", global = true)]
    pub target_root: PathBuf,

    /// Log file (falls back to stderr when it cannot be opened)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Host used for the network reachability probe
    #[arg(long, default_value = "archlinux.org", global = true)]
    pub probe_host: String,

    /// TCP port used for the network reachability probe
    #[arg(long, default_value_t = 443, global = true)]
    pub probe_port: u16,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 🔍 Run preflight checks (root, network, clock sync) and exit
    Preflight,

    /// 💾 List candidate install disks and exit
    Disks,
}
