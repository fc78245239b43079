//! Partitioning operations (wipefs/parted).

use crate::HalResult;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct WipeFsOptions {
    pub confirmed: bool,
}

impl WipeFsOptions {
    pub fn new(confirmed: bool) -> Self {
        Self { confirmed }
    }
}

#[derive(Debug, Clone)]
pub struct PartedOptions {
    pub confirmed: bool,
}

impl PartedOptions {
    pub fn new(confirmed: bool) -> Self {
        Self { confirmed }
    }
}

/// A high-level partition operation executed via `parted -s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartedOp {
    MkLabel {
        label: String,
    },
    MkPart {
        name: String,
        fs_type: String,
        start: String,
        end: String,
    },
    SetFlag {
        part_num: u32,
        flag: String,
        state: String,
    },
}

pub trait PartitionOps {
    /// Erase all filesystem and partition-table signatures (`wipefs -a`).
    fn wipefs_all(&self, disk: &Path, opts: &WipeFsOptions) -> HalResult<()>;

    /// Execute a single `parted` operation on the given disk.
    fn parted(&self, disk: &Path, op: PartedOp, opts: &PartedOptions) -> HalResult<()>;
}
