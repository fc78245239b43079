//! System-level operations (sync, partition re-read, reboot).

use crate::HalResult;
use std::path::Path;
use std::time::Duration;

/// System operations trait.
pub trait SystemOps {
    /// Best-effort filesystem sync.
    fn sync(&self) -> HalResult<()>;

    /// Wait `settle` and then ask the kernel to re-read the partition table (`partprobe`).
    fn reread_partition_table(&self, disk: &Path, settle: Duration) -> HalResult<()>;

    fn reboot(&self) -> HalResult<()>;
}
