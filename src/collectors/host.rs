use crate::collectors::{HostRecord, MetricsSource};
use std::time::SystemTime;
use tracing::debug;

/// `create_time` is stamped locally on every call, even when the OS query fails.
pub fn collect_host<S: MetricsSource + ?Sized>(source: &mut S) -> (HostRecord, u64) {
    let info = source.host_info();
    let create_time = SystemTime::now();

    match info {
        Ok(info) => (
            HostRecord {
                hostname: info.hostname,
                os: info.os,
                platform: info.platform,
                boot_time: info.boot_time,
                uptime: info.uptime,
                procs: info.procs,
                create_time,
            },
            0,
        ),
        Err(err) => {
            debug!(probe = "host", error = %err, "не удалось получить сведения о хосте");
            (HostRecord::empty_at(create_time), 1)
        }
    }
}
