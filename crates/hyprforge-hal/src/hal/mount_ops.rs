//! Mount operations trait.

use crate::HalResult;
use std::path::Path;

/// Trait for mounting and unmounting filesystems.
pub trait MountOps {
    /// Mount a device to a target path.
    ///
    /// # Arguments
    /// * `device` - Device path (e.g., `/dev/sda1`)
    /// * `target` - Mount point path
    /// * `fstype` - Optional filesystem type (e.g., `"ext4"`, `"vfat"`)
    fn mount_device(&self, device: &Path, target: &Path, fstype: Option<&str>) -> HalResult<()>;

    /// Unmount `target` and everything mounted beneath it, deepest first.
    fn unmount_recursive(&self, target: &Path) -> HalResult<()>;
}
