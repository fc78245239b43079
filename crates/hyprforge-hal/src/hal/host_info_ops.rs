//! Host information (read-only).

use crate::HalResult;
use std::time::Duration;

pub trait HostInfoOps {
    /// True when the effective UID is 0.
    fn is_root(&self) -> bool;

    /// Single TCP reachability probe; `Ok(false)` when no address answered.
    fn network_reachable(&self, host: &str, port: u16, timeout: Duration) -> HalResult<bool>;
}
