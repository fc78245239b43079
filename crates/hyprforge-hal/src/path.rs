/// Partition path helper for block devices.
///
/// NVMe namespaces (`/dev/nvme0n1`) end in a digit, so their partitions take a
/// `p` separator. Every other disk gets the bare partition number.
pub fn partition_path(disk: &str, num: u32) -> String {
    if disk.contains("nvme") {
        format!("{}p{}", disk, num)
    } else {
        format!("{}{}", disk, num)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nvme_uses_p_separator() {
        assert_eq!(partition_path("/dev/nvme0n1", 1), "/dev/nvme0n1p1");
        assert_eq!(partition_path("/dev/nvme1n1", 4), "/dev/nvme1n1p4");
    }

    #[test]
    fn other_disks_use_bare_number() {
        assert_eq!(partition_path("/dev/sda", 1), "/dev/sda1");
        assert_eq!(partition_path("/dev/vdb", 3), "/dev/vdb3");
    }
}
