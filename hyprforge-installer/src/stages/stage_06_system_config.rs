//! Configure the installed system from inside its own root.
//!
//! Commands run through `arch-chroot`; plain files are written directly under
//! the target root.

use crate::errors::InstallError;
use crate::stages::{InstallContext, CONFIG_TIMEOUT};
use crate::template::{Escape, Template};
use anyhow::{Context, Result};
use std::path::Path;

pub const USER_GROUPS: &str = "wheel,audio,video,storage,optical";
pub const WHEEL_RULE: &str = "%wheel ALL=(ALL:ALL) ALL";

const LOCALE_GEN_LINE: Template = Template::new("locale.gen", "{{locale}} UTF-8\n", &["locale"]);
const LOCALE_CONF: Template = Template::new("locale.conf", "LANG={{locale}}\n", &["locale"]);
const VCONSOLE_CONF: Template = Template::new("vconsole.conf", "KEYMAP={{keymap}}\n", &["keymap"]);
const HOSTNAME: Template = Template::new("hostname", "{{hostname}}\n", &["hostname"]);

const HOSTS: Template = Template::new(
    "hosts",
    "127.0.0.1   localhost\n\
     ::1         localhost\n\
     127.0.1.1   {{hostname}}.localdomain {{hostname}}\n",
    &["hostname"],
);

const LOADER_ENTRY: Template = Template::new(
    "arch.conf",
    "title   Arch Linux\n\
     linux   /vmlinuz-linux\n\
     initrd  /initramfs-linux.img\n\
     options root=UUID={{root_uuid}} rw\n",
    &["root_uuid"],
);

const LOADER_CONF: &str = "default arch.conf\ntimeout 3\nconsole-mode max\neditor no\n";

/// Plan values rendered into their files before anything touches the target.
struct IdentityFiles {
    locale_gen: String,
    locale_conf: String,
    vconsole_conf: String,
    hostname: String,
    hosts: String,
}

impl IdentityFiles {
    fn render(ctx: &InstallContext<'_>) -> Result<Self, InstallError> {
        let locale = [("locale", ctx.plan.locale.as_str())];
        let hostname = [("hostname", ctx.plan.hostname.as_str())];
        Ok(Self {
            locale_gen: LOCALE_GEN_LINE.render(&locale, Escape::Line)?,
            locale_conf: LOCALE_CONF.render(&locale, Escape::Line)?,
            vconsole_conf: VCONSOLE_CONF
                .render(&[("keymap", ctx.plan.keymap.as_str())], Escape::Line)?,
            hostname: HOSTNAME.render(&hostname, Escape::Line)?,
            hosts: HOSTS.render(&hostname, Escape::Line)?,
        })
    }
}

pub fn run(ctx: &InstallContext<'_>) -> Result<()> {
    let files = IdentityFiles::render(ctx)?;
    configure_clock(ctx)?;
    configure_locale(ctx, &files)?;
    configure_network_identity(ctx, &files)?;
    configure_accounts(ctx)?;
    configure_boot(ctx)?;
    Ok(())
}

fn in_root(ctx: &InstallContext<'_>, program: &str, args: &[&str]) -> Result<()> {
    ctx.hal
        .run_in_root(ctx.root(), program, args, CONFIG_TIMEOUT)?;
    Ok(())
}

fn configure_clock(ctx: &InstallContext<'_>) -> Result<()> {
    let zone = format!("/usr/share/zoneinfo/{}", ctx.plan.timezone);
    in_root(ctx, "ln", &["-sf", &zone, "/etc/localtime"])?;
    in_root(ctx, "hwclock", &["--systohc"])
}

fn configure_locale(ctx: &InstallContext<'_>, files: &IdentityFiles) -> Result<()> {
    let hal = ctx.hal;

    hal.append_file(&ctx.target("etc/locale.gen"), &files.locale_gen)?;
    in_root(ctx, "locale-gen", &[])?;
    hal.write_file(&ctx.target("etc/locale.conf"), &files.locale_conf, None)?;
    hal.write_file(&ctx.target("etc/vconsole.conf"), &files.vconsole_conf, None)?;
    Ok(())
}

fn configure_network_identity(ctx: &InstallContext<'_>, files: &IdentityFiles) -> Result<()> {
    let hal = ctx.hal;
    hal.write_file(&ctx.target("etc/hostname"), &files.hostname, None)?;
    hal.write_file(&ctx.target("etc/hosts"), &files.hosts, None)?;
    Ok(())
}

fn configure_accounts(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;
    let user = &ctx.plan.username;

    set_password(ctx, "root", &ctx.plan.root_password).context("Failed to set root password")?;
    in_root(
        ctx,
        "useradd",
        &["-m", "-G", USER_GROUPS, "-s", "/bin/zsh", user],
    )?;
    set_password(ctx, user, &ctx.plan.user_password)
        .with_context(|| format!("Failed to set password for {user}"))?;

    let sudoers_path = ctx.target("etc/sudoers");
    let sudoers = hal
        .read_file(&sudoers_path)
        .with_context(|| format!("Failed to read {}", sudoers_path.display()))?;
    hal.write_file(&sudoers_path, &enable_wheel_rule(&sudoers), Some(0o440))?;

    in_root(ctx, "systemctl", &["enable", "NetworkManager"])
}

fn set_password(ctx: &InstallContext<'_>, account: &str, password: &str) -> Result<()> {
    let line = format!("{account}:{password}\n");
    ctx.hal.run_in_root_with_stdin(
        ctx.root(),
        "chpasswd",
        &[],
        line.as_bytes(),
        CONFIG_TIMEOUT,
    )?;
    Ok(())
}

fn configure_boot(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;

    in_root(ctx, "bootctl", &["--esp-path=/boot", "install"])?;

    let uuid = hal.blkid_uuid(Path::new(&ctx.layout.root))?;
    let entries = ctx.target("boot/loader/entries");
    hal.create_dir_all(&entries)?;
    let entry = LOADER_ENTRY
        .render(&[("root_uuid", &uuid)], Escape::Line)
        .map_err(InstallError::from)?;
    hal.write_file(&entries.join("arch.conf"), &entry, None)?;
    hal.write_file(&ctx.target("boot/loader/loader.conf"), LOADER_CONF, None)?;
    Ok(())
}

/// Uncomment the wheel rule. Appends it when no commented form exists.
pub fn enable_wheel_rule(sudoers: &str) -> String {
    let mut found = false;
    let mut out: Vec<String> = Vec::new();

    for line in sudoers.lines() {
        let uncommented = line.trim_start().trim_start_matches('#').trim();
        if uncommented == WHEEL_RULE {
            found = true;
            out.push(WHEEL_RULE.to_string());
        } else {
            out.push(line.to_string());
        }
    }
    if !found {
        out.push(WHEEL_RULE.to_string());
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::sample_plan;
    use crate::template::TemplateError;
    use hyprforge_hal::{FakeHal, Operation};

    const SUDOERS: &str = "root ALL=(ALL:ALL) ALL\n\
                           # %wheel ALL=(ALL:ALL) ALL\n\
                           # %wheel ALL=(ALL:ALL) NOPASSWD: ALL\n";

    fn configured_hal() -> FakeHal {
        let hal = FakeHal::new()
            .with_file("/mnt/etc/sudoers", SUDOERS)
            .with_file("/mnt/etc/locale.gen", "#en_US.UTF-8 UTF-8\n");
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();
        run(&ctx).unwrap();
        hal
    }

    #[test]
    fn wheel_rule_is_uncommented_only_once() {
        let out = enable_wheel_rule(SUDOERS);
        assert!(out.contains("\n%wheel ALL=(ALL:ALL) ALL\n"));
        assert!(out.contains("# %wheel ALL=(ALL:ALL) NOPASSWD: ALL"));
        assert_eq!(enable_wheel_rule(&out), out);
    }

    #[test]
    fn wheel_rule_appended_when_missing() {
        assert_eq!(
            enable_wheel_rule("root ALL=(ALL:ALL) ALL\n"),
            "root ALL=(ALL:ALL) ALL\n%wheel ALL=(ALL:ALL) ALL\n"
        );
    }

    #[test]
    fn writes_identity_files() {
        let hal = configured_hal();

        assert_eq!(
            hal.file("/mnt/etc/locale.gen").unwrap(),
            "#en_US.UTF-8 UTF-8\nde_DE.UTF-8 UTF-8\n"
        );
        assert_eq!(hal.file("/mnt/etc/locale.conf").unwrap(), "LANG=de_DE.UTF-8\n");
        assert_eq!(hal.file("/mnt/etc/vconsole.conf").unwrap(), "KEYMAP=de-latin1\n");
        assert_eq!(hal.file("/mnt/etc/hostname").unwrap(), "forge\n");
        assert_eq!(
            hal.file("/mnt/etc/hosts").unwrap(),
            "127.0.0.1   localhost\n::1         localhost\n127.0.1.1   forge.localdomain forge\n"
        );
    }

    #[test]
    fn passwords_only_travel_over_stdin() {
        let hal = configured_hal();

        let stdin: Vec<String> = hal
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Chroot {
                    program, stdin, args, ..
                } if program == "chpasswd" => {
                    assert!(args.is_empty());
                    stdin
                }
                _ => None,
            })
            .collect();
        assert_eq!(stdin, ["root:root-pw\n", "ada:user-pw\n"]);

        let useradd = hal
            .position(|op| {
                op.is_command(
                    "useradd",
                    &["-m", "-G", USER_GROUPS, "-s", "/bin/zsh", "ada"],
                )
            })
            .unwrap();
        let root_pw = hal.position(|op| op.is_command("chpasswd", &[])).unwrap();
        assert!(root_pw < useradd);
    }

    #[test]
    fn boot_loader_entry_uses_root_uuid() {
        let hal = configured_hal();

        assert!(hal.has_operation(|op| matches!(op,
            Operation::BlkidUuid { device } if device == Path::new("/dev/sda2"))));
        assert_eq!(
            hal.file("/mnt/boot/loader/entries/arch.conf").unwrap(),
            "title   Arch Linux\nlinux   /vmlinuz-linux\ninitrd  /initramfs-linux.img\noptions root=UUID=FAKE-UUID rw\n"
        );
        assert_eq!(
            hal.file("/mnt/boot/loader/loader.conf").unwrap(),
            "default arch.conf\ntimeout 3\nconsole-mode max\neditor no\n"
        );
        assert!(hal
            .file("/mnt/etc/sudoers")
            .unwrap()
            .contains("\n%wheel ALL=(ALL:ALL) ALL\n"));
    }

    #[test]
    fn commands_and_loader_files_follow_install_order() {
        let hal = configured_hal();
        let command = |program: &str, args: &[&str]| {
            hal.position(|op| op.is_command(program, args))
                .unwrap_or_else(|| panic!("{program} {args:?} never ran"))
        };
        let written = |path: &str| {
            hal.position(|op| matches!(op, Operation::WriteFile { path: p, .. } if p == Path::new(path)))
                .unwrap_or_else(|| panic!("{path} never written"))
        };

        let localtime = command(
            "ln",
            &["-sf", "/usr/share/zoneinfo/Europe/Berlin", "/etc/localtime"],
        );
        let hwclock = command("hwclock", &["--systohc"]);
        let locale_gen_append = hal
            .position(|op| {
                matches!(op, Operation::AppendFile { path } if path == Path::new("/mnt/etc/locale.gen"))
            })
            .unwrap();
        let locale_gen = command("locale-gen", &[]);
        let network = command("systemctl", &["enable", "NetworkManager"]);
        let bootctl = command("bootctl", &["--esp-path=/boot", "install"]);
        let entry = written("/mnt/boot/loader/entries/arch.conf");
        let loader = written("/mnt/boot/loader/loader.conf");

        assert!(localtime < hwclock);
        assert!(hwclock < locale_gen_append);
        assert!(locale_gen_append < locale_gen);
        assert!(locale_gen < network);
        assert!(network < bootctl);
        assert!(bootctl < entry);
        assert!(bootctl < loader);
    }

    #[test]
    fn sudoers_is_rewritten_read_only() {
        let hal = configured_hal();
        assert!(hal.has_operation(|op| matches!(op,
            Operation::WriteFile { path, mode: Some(0o440) } if path == Path::new("/mnt/etc/sudoers"))));
    }

    #[test]
    fn multi_line_hostname_is_rejected_before_any_write() {
        let hal = FakeHal::new()
            .with_file("/mnt/etc/sudoers", SUDOERS)
            .with_file("/mnt/etc/locale.gen", "#en_US.UTF-8 UTF-8\n");
        let mut plan = sample_plan("/dev/sda");
        plan.hostname = "a\nb".to_string();
        let ctx = InstallContext::new(&hal, plan, "/mnt").confirmed();

        let err = run(&ctx).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InstallError>(),
            Some(InstallError::Template(TemplateError::MultiLine { .. }))
        ));
        assert!(hal.file("/mnt/etc/hostname").is_none());
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn multi_line_locale_is_rejected_before_any_write() {
        let hal = FakeHal::new().with_file("/mnt/etc/locale.gen", "");
        let mut plan = sample_plan("/dev/sda");
        plan.locale = "en_US.UTF-8\nxx_XX".to_string();
        let ctx = InstallContext::new(&hal, plan, "/mnt").confirmed();

        assert!(run(&ctx).is_err());
        assert_eq!(hal.file("/mnt/etc/locale.gen").as_deref(), Some(""));
        assert_eq!(hal.operation_count(), 0);
    }
}
