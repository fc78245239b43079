use crate::FileOps;
use std::path::PathBuf;

/// RAII guard that removes a file when dropped.
///
/// Used for short-lived grants written into the target (e.g. a sudoers
/// drop-in needed only while building packages as the new user).
#[derive(Debug)]
pub struct FileGuard<'a, H: FileOps + ?Sized> {
    hal: &'a H,
    path: PathBuf,
}

impl<'a, H: FileOps + ?Sized> FileGuard<'a, H> {
    pub fn new(hal: &'a H, path: impl Into<PathBuf>) -> Self {
        Self {
            hal,
            path: path.into(),
        }
    }
}

impl<'a, H: FileOps + ?Sized> Drop for FileGuard<'a, H> {
    fn drop(&mut self) {
        if let Err(err) = self.hal.remove_file(&self.path) {
            log::warn!(
                "file guard failed to remove {}: {}",
                self.path.display(),
                err
            );
        }
    }
}
