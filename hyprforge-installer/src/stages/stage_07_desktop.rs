//! Hyprland desktop and user environment.
//!
//! Package installs run as root inside the target. Everything that lands in
//! the user's home runs as that user, with a temporary passwordless sudo rule
//! so `makepkg -si` and `yay` can install without a TTY password prompt.

use crate::errors::InstallError;
use crate::stages::{InstallContext, BUILD_TIMEOUT, CLONE_TIMEOUT, CONFIG_TIMEOUT, PACKAGE_TIMEOUT};
use crate::template::{Escape, Template};
use anyhow::{Context, Result};
use hyprforge_hal::{FileGuard, SystemHal};
use serde_json::json;

pub const DESKTOP_PACKAGES: &[&str] = &[
    "hyprland",
    "hyprpaper",
    "xdg-desktop-portal-hyprland",
    "waybar",
    "wofi",
    "dunst",
    "kitty",
    "thunar",
    "polkit-kde-agent",
    "qt5-wayland",
    "qt6-wayland",
    "network-manager-applet",
    "brightnessctl",
    "pavucontrol",
    "grim",
    "slurp",
    "wl-clipboard",
    "firefox",
    "noto-fonts",
    "noto-fonts-emoji",
    "ttf-jetbrains-mono-nerd",
];

pub const AUR_PACKAGES: &[&str] = &["wlogout", "hyprshot"];

pub const BUILD_SUDOERS: &str = "etc/sudoers.d/10-hyprforge-build";

const BUILD_SUDO_RULE: Template = Template::new(
    "10-hyprforge-build",
    "{{username}} ALL=(ALL) NOPASSWD: ALL\n",
    &["username"],
);

const YAY_REPO: &str = "https://aur.archlinux.org/yay.git";
const OH_MY_ZSH_INSTALL: &str = "curl -fsSL https://raw.githubusercontent.com/ohmyzsh/ohmyzsh/master/tools/install.sh | sh -s -- --unattended";
const MAKEPKG_IN_DIR: &str = "cd -- \"$1\" && exec makepkg -si --noconfirm";

/// (repository, destination under `$ZSH/custom`)
const ZSH_ADDONS: &[(&str, &str)] = &[
    (
        "https://github.com/romkatv/powerlevel10k.git",
        "themes/powerlevel10k",
    ),
    (
        "https://github.com/zsh-users/zsh-autosuggestions.git",
        "plugins/zsh-autosuggestions",
    ),
    (
        "https://github.com/zsh-users/zsh-syntax-highlighting.git",
        "plugins/zsh-syntax-highlighting",
    ),
];

pub const ZSHRC: Template = Template::new(
    ".zshrc",
    include_str!("../../assets/zshrc.tmpl"),
    &["username"],
);

pub const HYPRLAND_CONF: &str = include_str!("../../assets/hyprland.conf");

pub fn run(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;
    let root = ctx.root();
    let user = ctx.plan.username.as_str();

    // Both depend only on the plan; a bad username stops the stage here.
    let sudo_rule = BUILD_SUDO_RULE
        .render(&[("username", user)], Escape::Line)
        .map_err(InstallError::from)?;
    let zshrc = ZSHRC
        .render(&[("username", user)], Escape::Shell)
        .map_err(InstallError::from)?;

    hal.run_in_root(root, "pacman", &["-Syu", "--noconfirm"], PACKAGE_TIMEOUT)?;
    let mut args = vec!["-S", "--needed", "--noconfirm"];
    args.extend_from_slice(DESKTOP_PACKAGES);
    hal.run_in_root(root, "pacman", &args, PACKAGE_TIMEOUT)?;

    let _sudo = grant_build_sudo(ctx, &sudo_rule)?;

    install_aur_helper(ctx)?;
    let mut args = vec!["-S", "--needed", "--noconfirm"];
    args.extend_from_slice(AUR_PACKAGES);
    hal.run_in_root_as(root, user, "yay", &args, BUILD_TIMEOUT)?;

    install_zsh_framework(ctx)?;
    write_user_configs(ctx, &zshrc)?;

    hal.run_in_root(
        root,
        "systemctl",
        &["--global", "enable", "pipewire.service", "pipewire-pulse.service"],
        CONFIG_TIMEOUT,
    )?;
    Ok(())
}

/// The returned guard removes the rule when dropped.
fn grant_build_sudo<'a>(
    ctx: &InstallContext<'a>,
    rule: &str,
) -> Result<FileGuard<'a, dyn SystemHal + 'a>> {
    let hal = ctx.hal;
    let path = ctx.target(BUILD_SUDOERS);
    if let Some(dir) = path.parent() {
        hal.create_dir_all(dir)?;
    }
    hal.write_file(&path, rule, Some(0o440))
        .context("Failed to install temporary sudo rule")?;
    Ok(FileGuard::new(hal, path))
}

fn install_aur_helper(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;
    let user = ctx.plan.username.as_str();
    let build_dir = format!("{}/.cache/yay-build", ctx.user_home());

    hal.run_in_root_as(
        ctx.root(),
        user,
        "git",
        &["clone", YAY_REPO, &build_dir],
        CLONE_TIMEOUT,
    )?;
    hal.run_in_root_as(
        ctx.root(),
        user,
        "sh",
        &["-c", MAKEPKG_IN_DIR, "sh", &build_dir],
        BUILD_TIMEOUT,
    )
    .context("Failed to build yay")?;
    Ok(())
}

fn install_zsh_framework(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;
    let user = ctx.plan.username.as_str();

    hal.run_in_root_as(
        ctx.root(),
        user,
        "sh",
        &["-c", OH_MY_ZSH_INSTALL],
        CLONE_TIMEOUT,
    )
    .context("Failed to install oh-my-zsh")?;

    let custom = format!("{}/.oh-my-zsh/custom", ctx.user_home());
    for (repo, dest) in ZSH_ADDONS {
        let dest = format!("{custom}/{dest}");
        hal.run_in_root_as(
            ctx.root(),
            user,
            "git",
            &["clone", "--depth=1", repo, &dest],
            CLONE_TIMEOUT,
        )?;
    }
    Ok(())
}

fn write_user_configs(ctx: &InstallContext<'_>, zshrc: &str) -> Result<()> {
    let hal = ctx.hal;
    let user = ctx.plan.username.as_str();
    let home = ctx.user_home();
    let owner = format!("{user}:{user}");

    hal.write_file(&ctx.target(&format!("{home}/.zshrc")), zshrc, Some(0o644))?;
    chown(ctx, &["--", &owner, &format!("{home}/.zshrc")])?;

    let hypr = format!("{home}/.config/hypr");
    hal.create_dir_all(&ctx.target(&hypr))?;
    hal.write_file(
        &ctx.target(&format!("{hypr}/hyprland.conf")),
        HYPRLAND_CONF,
        Some(0o644),
    )?;
    chown(ctx, &["-R", "--", &owner, &hypr])?;

    let waybar = format!("{home}/.config/waybar");
    hal.create_dir_all(&ctx.target(&waybar))?;
    let mut config = serde_json::to_string_pretty(&waybar_config())?;
    config.push('\n');
    hal.write_file(
        &ctx.target(&format!("{waybar}/config.jsonc")),
        &config,
        Some(0o644),
    )?;
    chown(ctx, &["-R", "--", &owner, &waybar])?;

    // ~/.config itself was created by root above.
    chown(ctx, &["--", &owner, &format!("{home}/.config")])
}

fn chown(ctx: &InstallContext<'_>, args: &[&str]) -> Result<()> {
    ctx.hal
        .run_in_root(ctx.root(), "chown", args, CONFIG_TIMEOUT)?;
    Ok(())
}

pub fn waybar_config() -> serde_json::Value {
    json!({
        "layer": "top",
        "position": "top",
        "height": 30,
        "spacing": 4,
        "modules-left": ["hyprland/workspaces", "hyprland/window"],
        "modules-center": ["clock"],
        "modules-right": ["pulseaudio", "network", "cpu", "memory", "battery", "tray", "custom/power"],
        "hyprland/workspaces": {
            "format": "{name}",
            "on-click": "activate",
            "sort-by-number": true
        },
        "hyprland/window": {
            "max-length": 60
        },
        "clock": {
            "format": "{:%H:%M}",
            "format-alt": "{:%A, %d %B %Y}",
            "tooltip-format": "<tt>{calendar}</tt>"
        },
        "pulseaudio": {
            "format": "{icon} {volume}%",
            "format-muted": "󰝟 muted",
            "format-icons": { "default": ["", "", ""] },
            "on-click": "pavucontrol"
        },
        "network": {
            "format-wifi": " {essid}",
            "format-ethernet": "󰈀 {ipaddr}",
            "format-disconnected": "󰖪 offline",
            "on-click": "kitty nmtui"
        },
        "cpu": { "format": " {usage}%", "interval": 5 },
        "memory": { "format": " {}%", "interval": 10 },
        "battery": {
            "states": { "warning": 30, "critical": 15 },
            "format": "{icon} {capacity}%",
            "format-icons": ["", "", "", "", ""]
        },
        "tray": { "spacing": 8 },
        "custom/power": {
            "format": "⏻",
            "tooltip": false,
            "on-click": "wlogout"
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::sample_plan;
    use crate::template::TemplateError;
    use hyprforge_hal::{FakeHal, Operation};
    use std::path::Path;

    const DROP_IN: &str = "/mnt/etc/sudoers.d/10-hyprforge-build";

    #[test]
    fn user_steps_run_while_sudo_rule_exists() {
        let hal = FakeHal::new();
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        run(&ctx).unwrap();

        let granted = hal
            .position(|op| matches!(op, Operation::WriteFile { path, .. } if path == Path::new(DROP_IN)))
            .unwrap();
        let revoked = hal
            .position(|op| matches!(op, Operation::RemoveFile { path } if path == Path::new(DROP_IN)))
            .unwrap();
        let makepkg = hal
            .position(|op| op.is_command("sh", &["-c", MAKEPKG_IN_DIR]))
            .unwrap();
        let yay = hal.position(|op| op.is_command("yay", &["-S"])).unwrap();

        assert!(granted < makepkg && makepkg < yay && yay < revoked);
        assert!(hal.file(DROP_IN).is_none());
    }

    #[test]
    fn sudo_rule_is_read_only_and_names_the_user() {
        let hal = FakeHal::new().fail_when(|op| op.is_command("git", &["clone"]));
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        assert!(run(&ctx).is_err());
        assert!(hal.has_operation(|op| matches!(op,
            Operation::WriteFile { path, mode: Some(0o440) } if path == Path::new(DROP_IN))));
        assert_eq!(
            BUILD_SUDO_RULE
                .render(&[("username", "ada")], Escape::Line)
                .unwrap(),
            "ada ALL=(ALL) NOPASSWD: ALL\n"
        );
    }

    #[test]
    fn multi_line_username_never_reaches_sudoers() {
        let hal = FakeHal::new();
        let mut plan = sample_plan("/dev/sda");
        plan.username = "ada\nALL ALL=(ALL) NOPASSWD: ALL".to_string();
        let ctx = InstallContext::new(&hal, plan, "/mnt").confirmed();

        let err = run(&ctx).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::Template(TemplateError::MultiLine { .. }))
        ));
        assert!(hal.file(DROP_IN).is_none());
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn sudo_rule_is_removed_when_build_fails() {
        let hal = FakeHal::new().fail_when(|op| op.is_command("sh", &["-c", MAKEPKG_IN_DIR]));
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        assert!(run(&ctx).is_err());
        assert!(hal.file(DROP_IN).is_none());
        assert!(!hal.has_operation(|op| op.is_command("yay", &[])));
    }

    #[test]
    fn user_commands_run_as_the_new_user() {
        let hal = FakeHal::new();
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        run(&ctx).unwrap();

        for op in hal.operations() {
            if let Operation::Chroot { program, user, .. } = &op {
                let as_user = matches!(program.as_str(), "git" | "sh" | "yay");
                assert_eq!(user.is_some(), as_user, "{op:?}");
                if as_user {
                    assert_eq!(user.as_deref(), Some("ada"));
                }
            }
        }
        assert!(hal.has_operation(|op| op.is_command(
            "git",
            &[
                "clone",
                "--depth=1",
                "https://github.com/romkatv/powerlevel10k.git",
                "/home/ada/.oh-my-zsh/custom/themes/powerlevel10k"
            ]
        )));
    }

    #[test]
    fn writes_owned_config_files() {
        let hal = FakeHal::new();
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        run(&ctx).unwrap();

        let zshrc = hal.file("/mnt/home/ada/.zshrc").unwrap();
        assert!(zshrc.contains("\"$USER\" == 'ada' ]]"));
        assert!(!zshrc.contains("{{"));
        assert_eq!(
            hal.file("/mnt/home/ada/.config/hypr/hyprland.conf").as_deref(),
            Some(HYPRLAND_CONF)
        );
        let waybar: serde_json::Value =
            serde_json::from_str(&hal.file("/mnt/home/ada/.config/waybar/config.jsonc").unwrap())
                .unwrap();
        assert_eq!(waybar["custom/power"]["on-click"], "wlogout");
        assert!(hal.has_operation(|op| op.is_command(
            "chown",
            &["-R", "--", "ada:ada", "/home/ada/.config/hypr"]
        )));
        assert!(hal.has_operation(|op| op.is_command(
            "systemctl",
            &["--global", "enable", "pipewire.service", "pipewire-pulse.service"]
        )));
    }
}
