//! Filesystem formatting operations trait.

use crate::HalResult;
use std::path::Path;

/// Trait for formatting block devices.
pub trait FormatOps {
    /// Format a device with ext4 and the given volume label.
    fn format_ext4(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()>;

    /// Format a device with VFAT (FAT32), typically used for EFI system partitions.
    fn format_vfat(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()>;

    /// Write a swap signature (`mkswap`).
    fn make_swap(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()>;

    /// Activate a swap device (`swapon`).
    fn swap_on(&self, device: &Path) -> HalResult<()>;
}

/// Carries the operator's wipe confirmation into every format call.
#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    pub confirmed: bool,
}

impl FormatOptions {
    pub fn new(confirmed: bool) -> Self {
        Self { confirmed }
    }
}
