//! Helpers related to block devices in sysfs.

use crate::{HalError, HalResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const SYS_CLASS_BLOCK: &str = "/sys/class/block";

pub fn device_basename(path: &Path) -> HalResult<String> {
    let name = path
        .file_name()
        .ok_or_else(|| HalError::Parse(format!("device path {}", path.display())))?
        .to_string_lossy()
        .to_string();
    Ok(name)
}

/// Reads the block device size from `<sysfs dir>/size`.
///
/// The `size` file is expressed in 512-byte sectors.
pub fn block_device_size_bytes(sys_block_dev_dir: &Path) -> HalResult<u64> {
    let sectors_str = fs::read_to_string(sys_block_dev_dir.join("size"))?;
    let sectors: u64 = sectors_str
        .trim()
        .parse()
        .map_err(|e| HalError::Parse(format!("sector count {:?} ({e})", sectors_str.trim())))?;
    Ok(sectors.saturating_mul(512))
}

/// Size of `disk` in bytes, looked up under `sys_class_block`.
///
/// Symlinks such as `/dev/disk/by-id/...` are resolved to the kernel name first.
pub fn disk_size_bytes_in(sys_class_block: &Path, disk: &Path) -> HalResult<u64> {
    let resolved = fs::canonicalize(disk).unwrap_or_else(|_| disk.to_path_buf());
    let sys_path = sys_class_block.join(device_basename(&resolved)?);
    if !sys_path.exists() {
        return Err(HalError::UnknownDisk(disk.to_path_buf()));
    }
    block_device_size_bytes(&sys_path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDeviceInfo {
    pub name: String,
    pub dev_path: PathBuf,
    pub size_bytes: u64,
    pub model: Option<String>,
    pub removable: bool,
}

impl BlockDeviceInfo {
    pub fn new(dev_path: impl Into<PathBuf>, size_bytes: u64, model: Option<&str>) -> Self {
        let dev_path = dev_path.into();
        let name = dev_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            name,
            dev_path,
            size_bytes,
            model: model.map(str::to_string),
            removable: false,
        }
    }
}

pub fn scan_block_devices() -> HalResult<Vec<BlockDeviceInfo>> {
    scan_block_devices_in(Path::new("/sys/block"))
}

pub fn scan_block_devices_in(sys_block_root: &Path) -> HalResult<Vec<BlockDeviceInfo>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(sys_block_root)?.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if should_skip_block_device(&name) {
            continue;
        }
        let sysfs_path = sys_block_root.join(&name);
        let size_bytes = match block_device_size_bytes(&sysfs_path) {
            Ok(v) => v,
            Err(_) => continue,
        };
        if size_bytes == 0 {
            continue;
        }

        let removable = read_trimmed(sysfs_path.join("removable"))
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            == 1;

        out.push(BlockDeviceInfo {
            dev_path: PathBuf::from("/dev").join(&name),
            model: read_trimmed(sysfs_path.join("device/model")),
            name,
            size_bytes,
            removable,
        });
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

fn read_trimmed(path: PathBuf) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn should_skip_block_device(name: &str) -> bool {
    // Virtual and optical devices are never install targets.
    name.starts_with("loop")
        || name.starts_with("ram")
        || name.starts_with("zram")
        || name.starts_with("dm-")
        || name.starts_with("md")
        || name.starts_with("sr")
}
