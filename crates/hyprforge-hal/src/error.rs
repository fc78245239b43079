//! Errors raised by host-side operations.

use std::path::PathBuf;
use thiserror::Error;

pub type HalResult<T> = std::result::Result<T, HalError>;

#[derive(Error, Debug)]
pub enum HalError {
    /// A wipe, partition or format call arrived without the operator's go-ahead.
    #[error("refusing to touch the disk: the operator has not confirmed the wipe")]
    SafetyLock,

    /// `EBUSY` from mount or umount.
    #[error("target is busy; something still holds a mount under it")]
    TargetBusy,

    #[error("operation not permitted; hyprforge must run as root")]
    PermissionDenied,

    #[error("{0} is not installed on the live system")]
    CommandNotFound(String),

    /// `stderr` is the captured error text, or a pointer to the terminal
    /// output for commands that stream their progress.
    #[error("{program} exited with status {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} was still running after {timeout_secs}s and was killed")]
    CommandTimeout { program: String, timeout_secs: u64 },

    #[error("no block device {0} in /sys/class/block")]
    UnknownDisk(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("system call failed: {0}")]
    Nix(#[from] nix::errno::Errno),

    #[error("could not parse {0}")]
    Parse(String),
}
