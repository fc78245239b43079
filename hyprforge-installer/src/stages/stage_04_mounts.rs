use crate::stages::InstallContext;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;
    let layout = &ctx.layout;

    hal.mount_device(Path::new(&layout.root), ctx.root(), Some("ext4"))
        .with_context(|| format!("Failed to mount root at {}", ctx.target_root.display()))?;

    let boot = ctx.target("boot");
    let home = ctx.target("home");
    hal.create_dir_all(&boot)?;
    hal.create_dir_all(&home)?;

    hal.mount_device(Path::new(&layout.efi), &boot, Some("vfat"))?;
    hal.mount_device(Path::new(&layout.home), &home, Some("ext4"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::sample_plan;
    use hyprforge_hal::{FakeHal, Operation};

    #[test]
    fn root_is_mounted_before_its_children() {
        let hal = FakeHal::new();
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        run(&ctx).unwrap();

        let targets: Vec<String> = hal
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Mount { target, .. } => Some(target.display().to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(targets, ["/mnt", "/mnt/boot", "/mnt/home"]);
        assert!(hal.is_mounted("/mnt/boot"));
        assert!(hal.is_mounted("/mnt/home"));
    }
}
