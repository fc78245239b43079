use env_logger::{Env, Target};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_FILE: &str = "/var/log/hyprforge.log";

/// Log to `path` (or the default file), falling back to stderr when it
/// cannot be opened. Level comes from `RUST_LOG`, default `info`.
pub fn init_with(path: Option<PathBuf>) {
    let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let target = open_target(&path).unwrap_or(Target::Stderr);

    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(target)
        .try_init();
}

fn open_target(path: &Path) -> io::Result<Target> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    Ok(Target::Pipe(Box::new(file)))
}
