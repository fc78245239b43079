//! Isolated root execution (`arch-chroot`).
//!
//! Commands run with the installed system as `/`. Arguments are passed as a
//! vector, never through a shell, so configuration values cannot be
//! reinterpreted on the way in.

use crate::HalResult;
use std::path::Path;
use std::time::Duration;

pub trait ChrootOps {
    /// Run `program args...` with `root` as the filesystem root.
    fn run_in_root(
        &self,
        root: &Path,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<()>;

    /// Same as [`ChrootOps::run_in_root`], feeding `stdin` to the command.
    ///
    /// Used for secrets (`chpasswd`) so they never appear in argv.
    fn run_in_root_with_stdin(
        &self,
        root: &Path,
        program: &str,
        args: &[&str],
        stdin: &[u8],
        timeout: Duration,
    ) -> HalResult<()>;

    /// Run a command inside `root` as `user`, with that user's `HOME`.
    fn run_in_root_as(
        &self,
        root: &Path,
        user: &str,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<()>;
}
