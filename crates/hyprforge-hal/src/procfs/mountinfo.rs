//! Parsing helpers for `/proc/self/mountinfo`.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    pub mount_point: PathBuf,
}

pub fn parse_mountinfo(content: &str) -> Vec<MountInfo> {
    content
        .lines()
        .filter_map(|line| {
            // <id> <parent> <maj:min> <root> <mount point> <opts...> - <fstype> <source> <superopts>
            let pre = line.split_once(" - ").map_or(line, |(pre, _)| pre);
            let mount_point = pre.split_whitespace().nth(4)?;
            Some(MountInfo {
                mount_point: PathBuf::from(unescape_mount_path(mount_point)),
            })
        })
        .collect()
}

/// Mount points at or below `root`, deepest first, in unmount order.
pub fn mounts_under(root: &Path, entries: &[MountInfo]) -> Vec<PathBuf> {
    let mut under: Vec<PathBuf> = entries
        .iter()
        .map(|e| e.mount_point.clone())
        .filter(|mp| mp.starts_with(root))
        .collect();
    under.sort_by_key(|p| std::cmp::Reverse(p.components().count()));
    under.dedup();
    under
}

pub fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}
