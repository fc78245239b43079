use crate::stages::InstallContext;
use anyhow::Result;
use hyprforge_hal::FormatOptions;
use std::path::Path;

pub fn run(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;
    let layout = &ctx.layout;
    let opts = FormatOptions::new(ctx.destructive_confirmed);

    hal.format_vfat(Path::new(&layout.efi), "EFI", &opts)?;
    hal.format_ext4(Path::new(&layout.root), "ROOT", &opts)?;
    hal.make_swap(Path::new(&layout.swap), "SWAP", &opts)?;
    hal.swap_on(Path::new(&layout.swap))?;
    hal.format_ext4(Path::new(&layout.home), "HOME", &opts)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::sample_plan;
    use hyprforge_hal::{FakeHal, Operation};
    use std::path::PathBuf;

    #[test]
    fn formats_each_partition_with_its_label() {
        let hal = FakeHal::new();
        let ctx = InstallContext::new(&hal, sample_plan("/dev/nvme0n1"), "/mnt").confirmed();

        run(&ctx).unwrap();

        let dev = |n: u32| PathBuf::from(format!("/dev/nvme0n1p{n}"));
        assert_eq!(
            hal.operations(),
            vec![
                Operation::FormatVfat {
                    device: dev(1),
                    label: "EFI".to_string()
                },
                Operation::FormatExt4 {
                    device: dev(2),
                    label: "ROOT".to_string()
                },
                Operation::MakeSwap {
                    device: dev(3),
                    label: "SWAP".to_string()
                },
                Operation::SwapOn { device: dev(3) },
                Operation::FormatExt4 {
                    device: dev(4),
                    label: "HOME".to_string()
                },
            ]
        );
    }
}
