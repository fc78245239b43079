//! Wipe the target disk and lay down the fixed GPT layout.

use crate::disk_ops::PARTITIONS;
use crate::stages::InstallContext;
use anyhow::{Context, Result};
use hyprforge_hal::{PartedOp, PartedOptions, WipeFsOptions};
use std::path::Path;
use std::time::Duration;

/// Pause before asking the kernel to re-read the new table.
pub const PARTITION_SETTLE: Duration = Duration::from_secs(2);

pub fn run(ctx: &InstallContext<'_>) -> Result<()> {
    let hal = ctx.hal;
    let disk = Path::new(&ctx.plan.disk);

    // Leftovers from an earlier attempt; nothing mounted is the normal case.
    if let Err(err) = hal.unmount_recursive(ctx.root()) {
        log::warn!(
            "ignoring unmount failure on {}: {}",
            ctx.target_root.display(),
            err
        );
    }

    hal.wipefs_all(disk, &WipeFsOptions::new(ctx.destructive_confirmed))
        .with_context(|| format!("Failed to wipe signatures on {}", disk.display()))?;

    let opts = PartedOptions::new(ctx.destructive_confirmed);
    hal.parted(
        disk,
        PartedOp::MkLabel {
            label: "gpt".to_string(),
        },
        &opts,
    )?;
    for part in PARTITIONS.iter() {
        hal.parted(disk, part.mkpart(), &opts)
            .with_context(|| format!("Failed to create {} partition", part.name))?;
    }
    hal.parted(
        disk,
        PartedOp::SetFlag {
            part_num: PARTITIONS[0].number,
            flag: "esp".to_string(),
            state: "on".to_string(),
        },
        &opts,
    )?;

    hal.reread_partition_table(disk, PARTITION_SETTLE)?;
    log::info!("partitions: {:?}", ctx.layout);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::sample_plan;
    use hyprforge_hal::{FakeHal, HalError, Operation};
    use std::path::PathBuf;

    #[test]
    fn lays_out_four_partitions_in_order() {
        let hal = FakeHal::new();
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        run(&ctx).unwrap();

        let disk = PathBuf::from("/dev/sda");
        let parted: Vec<PartedOp> = hal
            .operations()
            .into_iter()
            .filter_map(|op| match op {
                Operation::Parted { disk: d, op } if d == disk => Some(op),
                _ => None,
            })
            .collect();
        assert_eq!(parted.len(), 6);
        assert_eq!(
            parted[0],
            PartedOp::MkLabel {
                label: "gpt".to_string()
            }
        );
        assert_eq!(
            parted[2],
            PartedOp::MkPart {
                name: "ROOT".to_string(),
                fs_type: "ext4".to_string(),
                start: "513MiB".to_string(),
                end: "200.5GiB".to_string(),
            }
        );
        assert!(matches!(&parted[5], PartedOp::SetFlag { part_num: 1, flag, .. } if flag == "esp"));
        assert_eq!(
            hal.operations().last(),
            Some(&Operation::RereadPartitions {
                disk,
                settle: PARTITION_SETTLE
            })
        );
    }

    #[test]
    fn target_is_unmounted_before_the_wipe() {
        let hal = FakeHal::new();
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        run(&ctx).unwrap();

        let unmount = hal
            .position(|op| matches!(op, Operation::UnmountRecursive { target } if target == &PathBuf::from("/mnt")))
            .unwrap();
        let wipe = hal
            .position(|op| matches!(op, Operation::WipeFsAll { disk } if disk == &PathBuf::from("/dev/sda")))
            .unwrap();
        assert_eq!(unmount, 0);
        assert!(unmount < wipe);
    }

    #[test]
    fn unmount_failure_is_ignored() {
        let hal =
            FakeHal::new().fail_when(|op| matches!(op, Operation::UnmountRecursive { .. }));
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt").confirmed();

        run(&ctx).unwrap();
        assert!(hal.has_operation(|op| matches!(op, Operation::WipeFsAll { .. })));
    }

    #[test]
    fn unconfirmed_context_hits_safety_lock() {
        let hal = FakeHal::new();
        let ctx = InstallContext::new(&hal, sample_plan("/dev/sda"), "/mnt");

        let err = run(&ctx).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HalError>(),
            Some(HalError::SafetyLock)
        ));
        assert!(!hal.has_operation(|op| matches!(op, Operation::WipeFsAll { .. })));
    }
}
