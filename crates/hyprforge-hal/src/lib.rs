//! hyprforge Hardware Abstraction Layer (HAL).
//!
//! Everything that touches the host (processes, block devices, mounts, files
//! under the target root) goes through the traits in [`hal`], so the installer
//! pipeline can be exercised against [`FakeHal`] without root or real disks.

pub mod error;
pub mod hal;
pub mod path;
pub mod procfs;
pub mod sysfs;

pub use error::{HalError, HalResult};
pub use hal::*;
