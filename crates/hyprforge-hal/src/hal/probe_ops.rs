//! Device probing operations (sysfs/blkid/genfstab).

use crate::sysfs::block::BlockDeviceInfo;
use crate::HalResult;
use std::path::Path;

/// Probing operations trait.
pub trait ProbeOps {
    /// Candidate install disks (whole disks only, virtual devices skipped).
    fn list_disks(&self) -> HalResult<Vec<BlockDeviceInfo>>;

    /// Capacity of a whole disk in bytes.
    fn disk_size_bytes(&self, disk: &Path) -> HalResult<u64>;

    /// Return UUID for a block device (e.g. `/dev/sda1`).
    fn blkid_uuid(&self, device: &Path) -> HalResult<String>;

    /// UUID-based fstab entries for everything mounted under `root` (`genfstab -U`).
    fn fstab_entries(&self, root: &Path) -> HalResult<String>;
}
