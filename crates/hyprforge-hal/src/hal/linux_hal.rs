//! Linux HAL implementation using real system calls and tools.

use super::{
    ChrootOps, FileOps, FormatOps, FormatOptions, HostInfoOps, MountOps, PartedOp, PartedOptions,
    PartitionOps, ProbeOps, ProcessOps, SystemOps, WipeFsOptions,
};
use crate::sysfs::block::{self, BlockDeviceInfo};
use crate::{procfs, HalError, HalResult};
use std::fs;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone, Default)]
pub struct LinuxHal;

impl LinuxHal {
    pub fn new() -> Self {
        Self
    }
}

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const SYNC_TIMEOUT: Duration = Duration::from_secs(60);
const FORMAT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const WIPEFS_TIMEOUT: Duration = Duration::from_secs(60);
const PARTED_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const FSTAB_TIMEOUT: Duration = Duration::from_secs(60);

const CHROOT_BIN: &str = "arch-chroot";

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &Output) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Spawn `cmd` as the leader of a new process group.
fn spawn_group(program: &str, cmd: &mut Command) -> HalResult<Child> {
    cmd.process_group(0);
    cmd.spawn().map_err(|e| map_command_err(program, e))
}

/// Kill the child's whole process group and reap the child.
///
/// arch-chroot, pacstrap and makepkg fork; their descendants share the group.
fn kill_group(program: &str, child: &mut Child) {
    let pgid = Pid::from_raw(child.id() as i32);
    if let Err(err) = killpg(pgid, Signal::SIGKILL) {
        log::warn!("killpg {} ({}) failed: {}", pgid, program, err);
        let _ = child.kill();
    }
    let _ = child.wait();
}

fn output_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = spawn_group(program, cmd)?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            kill_group(program, &mut child);
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

fn status_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<()> {
    let output = output_with_timeout(program, cmd, timeout)?;
    if !output.status.success() {
        return Err(output_failed(program, &output));
    }
    Ok(())
}

/// Run with stdout/stderr attached to the operator's terminal.
///
/// Package downloads and builds report progress this way; stderr is not
/// captured, so a failure carries only the exit code. The child runs in its
/// own process group and cannot read the terminal, so stdin is either the
/// given bytes or empty.
fn inherit_with_timeout(
    program: &str,
    cmd: &mut Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> HalResult<()> {
    cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    let mut child = spawn_group(program, cmd)?;

    if let (Some(bytes), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(bytes)?;
        // Dropping the pipe closes it so the child sees EOF.
    }

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            kill_group(program, &mut child);
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };
    if !status.success() {
        return Err(HalError::CommandFailed {
            program: program.to_string(),
            code: status.code(),
            stderr: "see output above".to_string(),
        });
    }
    Ok(())
}

fn map_nix_err(err: nix::errno::Errno) -> HalError {
    use nix::errno::Errno;
    match err {
        Errno::EBUSY => HalError::TargetBusy,
        Errno::EACCES | Errno::EPERM => HalError::PermissionDenied,
        other => HalError::Nix(other),
    }
}

fn chroot_command(root: &Path, program: &str, args: &[&str]) -> Command {
    let mut cmd = Command::new(CHROOT_BIN);
    cmd.arg(root).arg(program).args(args);
    cmd
}

impl ProcessOps for LinuxHal {
    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()> {
        log::info!("exec: {} {}", program, args.join(" "));
        let mut cmd = Command::new(program);
        cmd.args(args);
        inherit_with_timeout(program, &mut cmd, None, timeout)
    }
}

impl ChrootOps for LinuxHal {
    fn run_in_root(
        &self,
        root: &Path,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<()> {
        log::info!("chroot {}: {} {}", root.display(), program, args.join(" "));
        let mut cmd = chroot_command(root, program, args);
        inherit_with_timeout(CHROOT_BIN, &mut cmd, None, timeout)
    }

    fn run_in_root_with_stdin(
        &self,
        root: &Path,
        program: &str,
        args: &[&str],
        stdin: &[u8],
        timeout: Duration,
    ) -> HalResult<()> {
        // stdin may carry secrets; log the command only.
        log::info!(
            "chroot {}: {} {} (<stdin>)",
            root.display(),
            program,
            args.join(" ")
        );
        let mut cmd = chroot_command(root, program, args);
        inherit_with_timeout(CHROOT_BIN, &mut cmd, Some(stdin), timeout)
    }

    fn run_in_root_as(
        &self,
        root: &Path,
        user: &str,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<()> {
        log::info!(
            "chroot {} as {}: {} {}",
            root.display(),
            user,
            program,
            args.join(" ")
        );
        let mut sudo_args = vec!["-H", "-u", user, "--", program];
        sudo_args.extend_from_slice(args);
        let mut cmd = chroot_command(root, "sudo", &sudo_args);
        inherit_with_timeout(CHROOT_BIN, &mut cmd, None, timeout)
    }
}

impl FileOps for LinuxHal {
    fn read_file(&self, path: &Path) -> HalResult<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn write_file(&self, path: &Path, contents: &str, mode: Option<u32>) -> HalResult<()> {
        log::info!("write {}", path.display());
        fs::write(path, contents)?;
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        }
        Ok(())
    }

    fn append_file(&self, path: &Path, contents: &str) -> HalResult<()> {
        log::info!("append {}", path.display());
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> HalResult<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> HalResult<()> {
        log::info!("remove {}", path.display());
        fs::remove_file(path)?;
        Ok(())
    }
}

impl MountOps for LinuxHal {
    fn mount_device(
        &self,
        device: &Path,
        target: &Path,
        fstype: Option<&str>,
    ) -> HalResult<()> {
        log::info!("mount {} -> {}", device.display(), target.display());
        nix::mount::mount(
            Some(device),
            target,
            fstype,
            nix::mount::MsFlags::empty(),
            None::<&str>,
        )
        .map_err(map_nix_err)
    }

    fn unmount_recursive(&self, target: &Path) -> HalResult<()> {
        let content = fs::read_to_string("/proc/self/mountinfo")?;
        let entries = procfs::mountinfo::parse_mountinfo(&content);

        for mp in procfs::mountinfo::mounts_under(target, &entries) {
            log::info!("umount {}", mp.display());
            nix::mount::umount2(&mp, nix::mount::MntFlags::empty()).map_err(map_nix_err)?;
        }

        Ok(())
    }
}

impl FormatOps for LinuxHal {
    fn format_ext4(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        log::info!("mkfs.ext4 {} ({})", device.display(), label);

        let mut cmd = Command::new("mkfs.ext4");
        cmd.args(["-F", "-L", label]).arg(device);
        status_with_timeout("mkfs.ext4", &mut cmd, FORMAT_TIMEOUT)
    }

    fn format_vfat(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        log::info!("mkfs.fat {} ({})", device.display(), label);

        let mut cmd = Command::new("mkfs.fat");
        cmd.args(["-F", "32", "-n", label]).arg(device);
        status_with_timeout("mkfs.fat", &mut cmd, FORMAT_TIMEOUT)
    }

    fn make_swap(&self, device: &Path, label: &str, opts: &FormatOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        log::info!("mkswap {} ({})", device.display(), label);

        let mut cmd = Command::new("mkswap");
        cmd.args(["-L", label]).arg(device);
        status_with_timeout("mkswap", &mut cmd, FORMAT_TIMEOUT)
    }

    fn swap_on(&self, device: &Path) -> HalResult<()> {
        log::info!("swapon {}", device.display());
        let mut cmd = Command::new("swapon");
        cmd.arg(device);
        status_with_timeout("swapon", &mut cmd, SYNC_TIMEOUT)
    }
}

impl HostInfoOps for LinuxHal {
    fn is_root(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn network_reachable(&self, host: &str, port: u16, timeout: Duration) -> HalResult<bool> {
        let addr_str = format!("{host}:{port}");
        let addrs = match addr_str.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(err) => {
                log::warn!("failed to resolve {}: {}", addr_str, err);
                return Ok(false);
            }
        };
        for addr in addrs {
            if TcpStream::connect_timeout(&addr, timeout).is_ok() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl SystemOps for LinuxHal {
    fn sync(&self) -> HalResult<()> {
        let mut cmd = Command::new("sync");
        status_with_timeout("sync", &mut cmd, SYNC_TIMEOUT)
    }

    fn reread_partition_table(&self, disk: &Path, settle: Duration) -> HalResult<()> {
        std::thread::sleep(settle);
        log::info!("partprobe {}", disk.display());
        let mut cmd = Command::new("partprobe");
        cmd.arg(disk);
        status_with_timeout("partprobe", &mut cmd, PARTED_TIMEOUT)
    }

    fn reboot(&self) -> HalResult<()> {
        let mut cmd = Command::new("systemctl");
        cmd.arg("reboot");
        status_with_timeout("systemctl", &mut cmd, SYNC_TIMEOUT)
    }
}

impl ProbeOps for LinuxHal {
    fn list_disks(&self) -> HalResult<Vec<BlockDeviceInfo>> {
        block::scan_block_devices()
    }

    fn disk_size_bytes(&self, disk: &Path) -> HalResult<u64> {
        block::disk_size_bytes_in(Path::new(block::SYS_CLASS_BLOCK), disk)
    }

    fn blkid_uuid(&self, device: &Path) -> HalResult<String> {
        let mut cmd = Command::new("blkid");
        cmd.args(["-s", "UUID", "-o", "value"]).arg(device);
        let output = output_with_timeout("blkid", &mut cmd, PROBE_TIMEOUT)?;

        if !output.status.success() {
            return Err(output_failed("blkid", &output));
        }

        let uuid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if uuid.is_empty() {
            return Err(HalError::Parse(format!(
                "blkid output for {}: no UUID",
                device.display()
            )));
        }
        Ok(uuid)
    }

    fn fstab_entries(&self, root: &Path) -> HalResult<String> {
        let mut cmd = Command::new("genfstab");
        cmd.arg("-U").arg(root);
        let output = output_with_timeout("genfstab", &mut cmd, FSTAB_TIMEOUT)?;

        if !output.status.success() {
            return Err(output_failed("genfstab", &output));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl PartitionOps for LinuxHal {
    fn wipefs_all(&self, disk: &Path, opts: &WipeFsOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        log::info!("wipefs -a {}", disk.display());

        let mut cmd = Command::new("wipefs");
        cmd.args(["-a"]).arg(disk);
        status_with_timeout("wipefs", &mut cmd, WIPEFS_TIMEOUT)
    }

    fn parted(&self, disk: &Path, op: PartedOp, opts: &PartedOptions) -> HalResult<()> {
        if !opts.confirmed {
            return Err(HalError::SafetyLock);
        }
        log::info!("parted -s {} {:?}", disk.display(), op);

        let mut args: Vec<String> = vec!["-s".to_string(), disk.display().to_string()];
        match op {
            PartedOp::MkLabel { label } => {
                args.push("mklabel".to_string());
                args.push(label);
            }
            PartedOp::MkPart {
                name,
                fs_type,
                start,
                end,
            } => {
                args.push("-a".to_string());
                args.push("optimal".to_string());
                args.push("mkpart".to_string());
                args.push(name);
                args.push(fs_type);
                args.push(start);
                args.push(end);
            }
            PartedOp::SetFlag {
                part_num,
                flag,
                state,
            } => {
                args.push("set".to_string());
                args.push(part_num.to_string());
                args.push(flag);
                args.push(state);
            }
        }

        let mut cmd = Command::new("parted");
        cmd.args(&args);
        status_with_timeout("parted", &mut cmd, PARTED_TIMEOUT)
    }
}
