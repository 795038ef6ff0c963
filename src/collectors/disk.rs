use crate::collectors::{DiskRecord, MetricsSource, Partition, PartitionUsage};
use tracing::debug;

const PSEUDO_FILESYSTEMS: &[&str] = &[
    "autofs",
    "binfmt_misc",
    "bpf",
    "cgroup",
    "cgroup2",
    "configfs",
    "debugfs",
    "devfs",
    "devpts",
    "devtmpfs",
    "efivarfs",
    "fusectl",
    "hugetlbfs",
    "mqueue",
    "nsfs",
    "overlay",
    "proc",
    "pstore",
    "ramfs",
    "rpc_pipefs",
    "securityfs",
    "squashfs",
    "sysfs",
    "tmpfs",
    "tracefs",
];

const NETWORK_FILESYSTEMS: &[&str] = &[
    "9p",
    "afs",
    "ceph",
    "cifs",
    "fuse",
    "glusterfs",
    "ncpfs",
    "nfs",
    "nfs4",
    "smb3",
    "smbfs",
    "sshfs",
];

/// Sums usage over every physical partition into one system-wide record.
/// Per-partition detail is intentionally dropped.
pub fn collect_disk<S: MetricsSource + ?Sized>(source: &mut S) -> (DiskRecord, u64) {
    let mut errors = 0_u64;

    let partitions = match source.partitions() {
        Ok(parts) => parts,
        Err(err) => {
            debug!(probe = "disk", error = %err, "не удалось получить список разделов");
            errors += 1;
            Vec::new()
        }
    };

    let mut usages = Vec::with_capacity(partitions.len());
    for part in partitions.iter().filter(|p| is_physical(p)) {
        match source.partition_usage(part) {
            Ok(usage) => usages.push(usage),
            Err(err) => {
                // contributes zero to the sums
                debug!(
                    probe = "disk",
                    device = %part.device,
                    mount = %part.mount_point,
                    error = %err,
                    "не удалось получить заполненность раздела"
                );
                errors += 1;
            }
        }
    }

    (aggregate(usages), errors)
}

pub fn is_physical(partition: &Partition) -> bool {
    if partition.removable || partition.mount_point.trim().is_empty() {
        return false;
    }
    if partition.device.trim().eq_ignore_ascii_case("none") {
        return false;
    }
    let fs = partition.fs_type.to_ascii_lowercase();
    // fuseblk is a local block device (ntfs-3g); every fuse.<helper> is not
    if fs.starts_with("fuse.") {
        return false;
    }
    !PSEUDO_FILESYSTEMS.contains(&fs.as_str()) && !NETWORK_FILESYSTEMS.contains(&fs.as_str())
}

pub fn aggregate(usages: impl IntoIterator<Item = PartitionUsage>) -> DiskRecord {
    let (total, free, used) = usages
        .into_iter()
        .fold((0_u64, 0_u64, 0_u64), |(total, free, used), u| {
            (
                total.saturating_add(u.total),
                free.saturating_add(u.free),
                used.saturating_add(u.used),
            )
        });

    DiskRecord {
        total,
        free,
        used,
        used_percent: used_percent(used, total),
    }
}

pub fn used_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::fake::{partition, usage, FakeSource};

    #[test]
    fn two_partitions_are_summed() {
        let mut source = FakeSource::healthy();
        let (record, errors) = collect_disk(&mut source);

        assert_eq!(errors, 0);
        assert_eq!(record.total, 300);
        assert_eq!(record.free, 190);
        assert_eq!(record.used, 110);
        assert!((record.used_percent - 36.666_666).abs() < 1e-4);
    }

    #[test]
    fn zero_partitions_yield_zero_record() {
        let mut source = FakeSource {
            partitions: Some(Vec::new()),
            ..FakeSource::default()
        };

        let (record, errors) = collect_disk(&mut source);

        assert_eq!(errors, 0);
        assert_eq!(record, DiskRecord::default());
    }

    #[test]
    fn zero_total_never_divides() {
        let record = aggregate([usage(0, 0, 0), usage(0, 0, 0)]);
        assert_eq!(record.used_percent, 0.0);
        assert_eq!(used_percent(5, 0), 0.0);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let parts = [usage(100, 40, 60), usage(200, 150, 50), usage(7, 3, 4)];
        let forward = aggregate(parts);
        let mut reversed = parts;
        reversed.reverse();

        assert_eq!(forward, aggregate(reversed));
        assert_eq!(forward.total, 307);
        assert_eq!(forward.free, 193);
        assert_eq!(forward.used, 114);
    }

    #[test]
    fn failed_partition_contributes_zero() {
        let mut source = FakeSource {
            partitions: Some(vec![
                (partition("/dev/sda1", "/", "ext4"), Some(usage(100, 40, 60))),
                (partition("/dev/sdb1", "/broken", "ext4"), None),
            ]),
            ..FakeSource::default()
        };

        let (record, errors) = collect_disk(&mut source);

        assert_eq!(errors, 1);
        assert_eq!(record.total, 100);
        assert_eq!(record.used, 60);
        assert_eq!(record.used_percent, 60.0);
    }

    #[test]
    fn listing_failure_degrades_to_zero() {
        let mut source = FakeSource::default();
        let (record, errors) = collect_disk(&mut source);

        assert_eq!(errors, 1);
        assert_eq!(record, DiskRecord::default());
    }

    #[test]
    fn pseudo_and_removable_partitions_are_skipped() {
        let mut stick = partition("/dev/sdc1", "/media/usb", "vfat");
        stick.removable = true;
        let mut source = FakeSource {
            partitions: Some(vec![
                (partition("/dev/sda1", "/", "ext4"), Some(usage(100, 40, 60))),
                (partition("tmpfs", "/run", "tmpfs"), Some(usage(50, 50, 0))),
                (
                    partition("overlay", "/var/lib/docker/x", "overlay"),
                    Some(usage(10, 5, 5)),
                ),
                (stick, Some(usage(1_000, 1_000, 0))),
                (partition("srv:/export", "/mnt/nfs", "nfs4"), Some(usage(500, 100, 400))),
                (partition("//srv/share", "/mnt/smb", "cifs"), Some(usage(500, 100, 400))),
                (partition("user@host:", "/mnt/ssh", "fuse.sshfs"), Some(usage(70, 7, 63))),
                (partition("remote:", "/mnt/cloud", "fuse.rclone"), Some(usage(80, 8, 72))),
                (partition("lxcfs", "/var/lib/lxcfs", "fuse.lxcfs"), Some(usage(9, 0, 9))),
                (partition("none", "/mnt/bind", "ext4"), Some(usage(300, 30, 270))),
            ]),
            ..FakeSource::default()
        };

        let (record, _) = collect_disk(&mut source);

        assert_eq!(record.total, 100);
        assert_eq!(record.free, 40);
        assert_eq!(record.used, 60);
    }

    #[test]
    fn filesystem_match_is_case_insensitive() {
        assert!(!is_physical(&partition("none", "/sys", "SYSFS")));
        assert!(is_physical(&partition("C:", "C:\\", "NTFS")));
        assert!(!is_physical(&partition("/dev/sda2", "", "ext4")));
    }

    #[test]
    fn fuseblk_counts_as_local() {
        assert!(is_physical(&partition("/dev/sdb2", "/mnt/win", "fuseblk")));
        assert!(!is_physical(&partition(
            "gvfsd-fuse",
            "/run/user/1000/gvfs",
            "fuse.gvfsd-fuse"
        )));
        assert!(!is_physical(&partition("server:/vol", "/mnt/vol", "NFS")));
    }
}
