//! Fake HAL implementation for testing.
//!
//! Records every operation without executing it. Files written through
//! [`FileOps`] live in memory so stage logic can be checked end to end
//! without root privileges or a real disk.

use super::{
    ChrootOps, FileOps, FormatOps, FormatOptions, HostInfoOps, MountOps, PartedOp, PartedOptions,
    PartitionOps, ProbeOps, ProcessOps, SystemOps, WipeFsOptions,
};
use crate::sysfs::block::BlockDeviceInfo;
use crate::{HalError, HalResult};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Mount {
        device: PathBuf,
        target: PathBuf,
        fstype: Option<String>,
    },
    UnmountRecursive {
        target: PathBuf,
    },
    FormatExt4 {
        device: PathBuf,
        label: String,
    },
    FormatVfat {
        device: PathBuf,
        label: String,
    },
    MakeSwap {
        device: PathBuf,
        label: String,
    },
    SwapOn {
        device: PathBuf,
    },
    WipeFsAll {
        disk: PathBuf,
    },
    Parted {
        disk: PathBuf,
        op: PartedOp,
    },
    RereadPartitions {
        disk: PathBuf,
        settle: Duration,
    },
    Sync,
    Reboot,
    BlkidUuid {
        device: PathBuf,
    },
    FstabEntries {
        root: PathBuf,
    },
    Command {
        program: String,
        args: Vec<String>,
    },
    Chroot {
        root: PathBuf,
        user: Option<String>,
        program: String,
        args: Vec<String>,
        stdin: Option<String>,
    },
    WriteFile {
        path: PathBuf,
        mode: Option<u32>,
    },
    AppendFile {
        path: PathBuf,
    },
    CreateDir {
        path: PathBuf,
    },
    RemoveFile {
        path: PathBuf,
    },
}

impl Operation {
    /// Program name for command-like operations.
    pub fn program(&self) -> Option<&str> {
        match self {
            Operation::Command { program, .. } | Operation::Chroot { program, .. } => {
                Some(program)
            }
            _ => None,
        }
    }

    /// True for a command or chroot invocation of `program` whose args start with `prefix`.
    pub fn is_command(&self, program: &str, prefix: &[&str]) -> bool {
        let args = match self {
            Operation::Command { program: p, args } if p == program => args,
            Operation::Chroot { program: p, args, .. } if p == program => args,
            _ => return false,
        };
        args.len() >= prefix.len() && args.iter().zip(prefix).all(|(a, b)| a == b)
    }
}

type FailRule = Arc<dyn Fn(&Operation) -> bool + Send + Sync>;

/// Shared state for FakeHal operations.
#[derive(Debug, Clone, Default)]
struct FakeHalState {
    operations: Vec<Operation>,
    mounted_paths: HashSet<PathBuf>,
    files: BTreeMap<PathBuf, String>,
}

/// Fake HAL implementation that records operations without executing them.
#[derive(Clone)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
    is_root: bool,
    network: bool,
    disks: Vec<BlockDeviceInfo>,
    fail_rule: Option<FailRule>,
}

impl fmt::Debug for FakeHal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeHal")
            .field("is_root", &self.is_root)
            .field("network", &self.network)
            .field("disks", &self.disks)
            .field("fail_rule", &self.fail_rule.is_some())
            .finish()
    }
}

impl Default for FakeHal {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHal {
    /// A root host with network access and no disks.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeHalState::default())),
            is_root: true,
            network: true,
            disks: Vec::new(),
            fail_rule: None,
        }
    }

    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    pub fn with_network(mut self, reachable: bool) -> Self {
        self.network = reachable;
        self
    }

    pub fn with_disk(mut self, dev_path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        self.disks
            .push(BlockDeviceInfo::new(dev_path, size_bytes, Some("FAKE DISK")));
        self
    }

    /// Seed an in-memory file.
    pub fn with_file(self, path: impl Into<PathBuf>, contents: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.into(), contents.to_string());
        self
    }

    /// Make any operation matching `rule` fail after being recorded.
    pub fn fail_when(mut self, rule: impl Fn(&Operation) -> bool + Send + Sync + 'static) -> Self {
        self.fail_rule = Some(Arc::new(rule));
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    pub fn operation_count(&self) -> usize {
        self.state.lock().unwrap().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// Index of the first recorded operation matching `check`.
    pub fn position(&self, check: impl Fn(&Operation) -> bool) -> Option<usize> {
        self.state.lock().unwrap().operations.iter().position(check)
    }

    /// Current contents of an in-memory file.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.lock().unwrap().files.get(path.as_ref()).cloned()
    }

    /// Whether `path` is mounted according to the recorded mount calls.
    pub fn is_mounted(&self, path: impl AsRef<Path>) -> bool {
        self.state
            .lock()
            .unwrap()
            .mounted_paths
            .contains(path.as_ref())
    }

    fn record(&self, op: Operation) -> HalResult<()> {
        log::info!("FAKE HAL: {:?}", op);
        let fail = self.fail_rule.as_ref().is_some_and(|rule| rule(&op));
        let program = op.program().unwrap_or("fake-op").to_string();
        self.state.lock().unwrap().operations.push(op);
        if fail {
            return Err(HalError::CommandFailed {
                program,
                code: Some(1),
                stderr: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

fn owned_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

impl ProcessOps for FakeHal {
    fn command_status(&self, program: &str, args: &[&str], _timeout: Duration) -> HalResult<()> {
        self.record(Operation::Command {
            program: program.to_string(),
            args: owned_args(args),
        })
    }
}

impl ChrootOps for FakeHal {
    fn run_in_root(
        &self,
        root: &Path,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> HalResult<()> {
        self.record(Operation::Chroot {
            root: root.to_path_buf(),
            user: None,
            program: program.to_string(),
            args: owned_args(args),
            stdin: None,
        })
    }

    fn run_in_root_with_stdin(
        &self,
        root: &Path,
        program: &str,
        args: &[&str],
        stdin: &[u8],
        _timeout: Duration,
    ) -> HalResult<()> {
        self.record(Operation::Chroot {
            root: root.to_path_buf(),
            user: None,
            program: program.to_string(),
            args: owned_args(args),
            stdin: Some(String::from_utf8_lossy(stdin).to_string()),
        })
    }

    fn run_in_root_as(
        &self,
        root: &Path,
        user: &str,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> HalResult<()> {
        self.record(Operation::Chroot {
            root: root.to_path_buf(),
            user: Some(user.to_string()),
            program: program.to_string(),
            args: owned_args(args),
            stdin: None,
        })
    }
}

impl FileOps for FakeHal {
    fn read_file(&self, path: &Path) -> HalResult<String> {
        self.file(path).ok_or_else(|| {
            HalError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })
    }

    fn write_file(&self, path: &Path, contents: &str, mode: Option<u32>) -> HalResult<()> {
        self.record(Operation::WriteFile {
            path: path.to_path_buf(),
            mode,
        })?;
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn append_file(&self, path: &Path, contents: &str) -> HalResult<()> {
        self.record(Operation::AppendFile {
            path: path.to_path_buf(),
        })?;
        self.state
            .lock()
            .unwrap()
            .files
            .entry(path.to_path_buf())
            .or_default()
            .push_str(contents);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> HalResult<()> {
        self.record(Operation::CreateDir {
            path: path.to_path_buf(),
        })
    }

    fn remove_file(&self, path: &Path) -> HalResult<()> {
        self.record(Operation::RemoveFile {
            path: path.to_path_buf(),
        })?;
        self.state.lock().unwrap().files.remove(path);
        Ok(())
    }
}

impl MountOps for FakeHal {
    fn mount_device(&self, device: &Path, target: &Path, fstype: Option<&str>) -> HalResult<()> {
        self.record(Operation::Mount {
            device: device.to_path_buf(),
            target: target.to_path_buf(),
            fstype: fstype.map(|s| s.to_string()),
        })?;
        self.state
            .lock()
            .unwrap()
            .mounted_paths
            .insert(target.to_path_buf());
        Ok(())
    }

    fn unmount_recursive(&self, target: &Path) -> HalResult<()> {
        self.record(Operation::UnmountRecursive {
            target: target.to_path_buf(),
        })?;
        self.state
            .lock()
            .unwrap()
            .mounted_paths
            .retain(|p| !p.starts_with(target));
        Ok(())
    }
}

impl FormatOps for FakeHal {
    fn format_ext4(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        self.record(Operation::FormatExt4 {
            device: device.to_path_buf(),
            label: label.to_string(),
        })
    }

    fn format_vfat(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        self.record(Operation::FormatVfat {
            device: device.to_path_buf(),
            label: label.to_string(),
        })
    }

    fn make_swap(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        self.record(Operation::MakeSwap {
            device: device.to_path_buf(),
            label: label.to_string(),
        })
    }

    fn swap_on(&self, device: &Path) -> HalResult<()> {
        self.record(Operation::SwapOn {
            device: device.to_path_buf(),
        })
    }
}

impl HostInfoOps for FakeHal {
    fn is_root(&self) -> bool {
        self.is_root
    }

    fn network_reachable(&self, _host: &str, _port: u16, _timeout: Duration) -> HalResult<bool> {
        Ok(self.network)
    }
}

impl SystemOps for FakeHal {
    fn sync(&self) -> HalResult<()> {
        self.record(Operation::Sync)
    }

    fn reread_partition_table(&self, disk: &Path, settle: Duration) -> HalResult<()> {
        self.record(Operation::RereadPartitions {
            disk: disk.to_path_buf(),
            settle,
        })
    }

    fn reboot(&self) -> HalResult<()> {
        self.record(Operation::Reboot)
    }
}

impl ProbeOps for FakeHal {
    fn list_disks(&self) -> HalResult<Vec<BlockDeviceInfo>> {
        Ok(self.disks.clone())
    }

    fn disk_size_bytes(&self, disk: &Path) -> HalResult<u64> {
        self.disks
            .iter()
            .find(|d| d.dev_path == disk)
            .map(|d| d.size_bytes)
            .ok_or_else(|| HalError::UnknownDisk(disk.to_path_buf()))
    }

    fn blkid_uuid(&self, device: &Path) -> HalResult<String> {
        self.record(Operation::BlkidUuid {
            device: device.to_path_buf(),
        })?;
        Ok("FAKE-UUID".to_string())
    }

    fn fstab_entries(&self, root: &Path) -> HalResult<String> {
        self.record(Operation::FstabEntries {
            root: root.to_path_buf(),
        })?;
        Ok("UUID=FAKE-UUID / ext4 rw,relatime 0 1\n".to_string())
    }
}

impl PartitionOps for FakeHal {
    fn wipefs_all(&self, disk: &Path, opts: &WipeFsOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        self.record(Operation::WipeFsAll {
            disk: disk.to_path_buf(),
        })
    }

    fn parted(&self, disk: &Path, op: PartedOp, opts: &PartedOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        self.record(Operation::Parted {
            disk: disk.to_path_buf(),
            op,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_hal_records_mount() {
        let hal = FakeHal::new();
        let device = Path::new("/dev/nvme0n1p2");
        let target = Path::new("/mnt");

        hal.mount_device(device, target, Some("ext4")).unwrap();

        assert_eq!(hal.operation_count(), 1);
        assert!(hal.is_mounted(target));
    }

    #[test]
    fn fake_hal_unmount_recursive_clears_nested_mounts() {
        let hal = FakeHal::new();
        hal.mount_device(Path::new("/dev/sda2"), Path::new("/mnt"), None)
            .unwrap();
        hal.mount_device(Path::new("/dev/sda1"), Path::new("/mnt/boot"), None)
            .unwrap();
        hal.mount_device(Path::new("/dev/sdb1"), Path::new("/mnt2"), None)
            .unwrap();

        hal.unmount_recursive(Path::new("/mnt")).unwrap();

        assert!(!hal.is_mounted("/mnt"));
        assert!(!hal.is_mounted("/mnt/boot"));
        assert!(hal.is_mounted("/mnt2"));
    }

    #[test]
    fn fake_hal_requires_confirmation() {
        let hal = FakeHal::new();
        let err = hal
            .format_ext4(Path::new("/dev/sda2"), "ROOT", &FormatOptions::new(false))
            .unwrap_err();
        assert!(matches!(err, HalError::SafetyLock));
        let err = hal
            .wipefs_all(Path::new("/dev/sda"), &WipeFsOptions::new(false))
            .unwrap_err();
        assert!(matches!(err, HalError::SafetyLock));
        assert_eq!(hal.operation_count(), 0);
    }

    #[test]
    fn fake_hal_injected_failure_is_recorded_then_returned() {
        let hal = FakeHal::new().fail_when(|op| op.is_command("pacman", &["-Sy"]));

        hal.command_status("pacman", &["-V"], Duration::from_secs(1))
            .unwrap();
        let err = hal
            .command_status(
                "pacman",
                &["-Sy", "--noconfirm", "archlinux-keyring"],
                Duration::from_secs(1),
            )
            .unwrap_err();

        assert!(matches!(err, HalError::CommandFailed { ref program, .. } if program == "pacman"));
        assert_eq!(hal.operation_count(), 2);
    }

    #[test]
    fn fake_hal_files_live_in_memory() {
        let hal = FakeHal::new().with_file("/mnt/etc/locale.gen", "# locales\n");

        hal.append_file(Path::new("/mnt/etc/locale.gen"), "en_US.UTF-8 UTF-8\n")
            .unwrap();

        assert_eq!(
            hal.read_file(Path::new("/mnt/etc/locale.gen")).unwrap(),
            "# locales\nen_US.UTF-8 UTF-8\n"
        );
        assert!(hal.read_file(Path::new("/mnt/etc/missing")).is_err());
    }

    #[test]
    fn fake_hal_disk_size_lookup() {
        let hal = FakeHal::new().with_disk("/dev/nvme0n1", 512 * 1024 * 1024 * 1024);
        assert_eq!(
            hal.disk_size_bytes(Path::new("/dev/nvme0n1")).unwrap(),
            512 * 1024 * 1024 * 1024
        );
        assert!(hal.disk_size_bytes(Path::new("/dev/sdz")).is_err());
    }
}
