//! File operations on the target filesystem.

use crate::HalResult;
use std::path::Path;

pub trait FileOps {
    fn read_file(&self, path: &Path) -> HalResult<String>;

    /// Create or truncate `path` with `contents`; `mode` sets permission bits.
    fn write_file(&self, path: &Path, contents: &str, mode: Option<u32>) -> HalResult<()>;

    fn append_file(&self, path: &Path, contents: &str) -> HalResult<()>;

    fn create_dir_all(&self, path: &Path) -> HalResult<()>;

    fn remove_file(&self, path: &Path) -> HalResult<()>;
}
