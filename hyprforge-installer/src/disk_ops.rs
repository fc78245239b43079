//! Fixed four-partition GPT layout and the checks around it.

use crate::errors::InstallError;
use anyhow::Result;
use hyprforge_hal::path::partition_path;
use hyprforge_hal::sysfs::block::BlockDeviceInfo;
use hyprforge_hal::{PartedOp, ProbeOps};
use std::path::Path;

const GIB: u64 = 1024 * 1024 * 1024;

/// Last fixed partition boundary (216.5GiB) plus 1GiB for the home partition.
pub const MIN_DISK_BYTES: u64 = (2175 * GIB) / 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSpec {
    pub number: u32,
    pub name: &'static str,
    pub fs_type: &'static str,
    pub start: &'static str,
    pub end: &'static str,
}

impl PartitionSpec {
    pub fn mkpart(&self) -> PartedOp {
        PartedOp::MkPart {
            name: self.name.to_string(),
            fs_type: self.fs_type.to_string(),
            start: self.start.to_string(),
            end: self.end.to_string(),
        }
    }
}

/// EFI, root, swap, home; contiguous, in this order.
pub const PARTITIONS: [PartitionSpec; 4] = [
    PartitionSpec {
        number: 1,
        name: "EFI",
        fs_type: "fat32",
        start: "1MiB",
        end: "513MiB",
    },
    PartitionSpec {
        number: 2,
        name: "ROOT",
        fs_type: "ext4",
        start: "513MiB",
        end: "200.5GiB",
    },
    PartitionSpec {
        number: 3,
        name: "SWAP",
        fs_type: "linux-swap",
        start: "200.5GiB",
        end: "216.5GiB",
    },
    PartitionSpec {
        number: 4,
        name: "HOME",
        fs_type: "ext4",
        start: "216.5GiB",
        end: "100%",
    },
];

/// Device path for each partition role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLayout {
    pub efi: String,
    pub root: String,
    pub swap: String,
    pub home: String,
}

impl PartitionLayout {
    pub fn for_disk(disk: &str) -> Self {
        Self {
            efi: partition_path(disk, PARTITIONS[0].number),
            root: partition_path(disk, PARTITIONS[1].number),
            swap: partition_path(disk, PARTITIONS[2].number),
            home: partition_path(disk, PARTITIONS[3].number),
        }
    }
}

/// Reject disks that cannot hold the fixed layout.
pub fn check_capacity<H: ProbeOps + ?Sized>(hal: &H, disk: &str) -> Result<u64> {
    let size = hal.disk_size_bytes(Path::new(disk))?;
    if size < MIN_DISK_BYTES {
        return Err(InstallError::DiskTooSmall {
            disk: disk.to_string(),
            size,
            required: MIN_DISK_BYTES,
        }
        .into());
    }
    Ok(size)
}

pub fn format_size(bytes: u64) -> String {
    format!("{:.1} GiB", bytes as f64 / GIB as f64)
}

pub fn describe_disk(disk: &BlockDeviceInfo) -> String {
    let mut line = format!(
        "{:<16} {:>10}  {}",
        disk.dev_path.display(),
        format_size(disk.size_bytes),
        disk.model.as_deref().unwrap_or("unknown model")
    );
    if disk.removable {
        line.push_str("  (removable)");
    }
    line
}
