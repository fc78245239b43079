//! Keyring refresh, pacstrap and fstab.

use crate::stages::{InstallContext, PACKAGE_TIMEOUT};
use anyhow::{Context, Result};

pub const BASE_PACKAGES: &[&str] = &[
    "base",
    "base-devel",
    "linux",
    "linux-firmware",
    "linux-headers",
    "networkmanager",
    "vim",
    "sudo",
    "git",
    "pipewire",
    "pipewire-alsa",
    "pipewire-pulse",
    "wireplumber",
    "zsh",
];

pub fn run(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;

    hal.command_status(
        "pacman",
        &["-Sy", "--noconfirm", "archlinux-keyring"],
        PACKAGE_TIMEOUT,
    )?;

    let root = ctx.root_arg();
    let mut args = vec!["-K", root.as_str()];
    args.extend_from_slice(BASE_PACKAGES);
    hal.command_status("pacstrap", &args, PACKAGE_TIMEOUT)?;

    let entries = hal.fstab_entries(ctx.root())?;
    let fstab = ctx.target("etc/fstab");
    hal.append_file(&fstab, &entries)
        .with_context(|| format!("Failed to write {}", fstab.display()))?;
    Ok(())
}
