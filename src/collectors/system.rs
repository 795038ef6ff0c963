use crate::collectors::{
    CpuDescriptor, HostInfo, MetricsSource, Partition, PartitionUsage, ProbeError, VirtualMemory,
};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sysinfo::{CpuExt, CpuRefreshKind, DiskExt, System, SystemExt};

/// Builds a fresh source for every probe invocation.
pub type SourceFactory = Arc<dyn Fn() -> Box<dyn MetricsSource> + Send + Sync>;

pub fn sysinfo_sources() -> SourceFactory {
    Arc::new(|| -> Box<dyn MetricsSource> { Box::new(SysinfoSource::new()) })
}

/// `MetricsSource` over a private `sysinfo::System`. Nothing is refreshed up
/// front; each call refreshes only what it reads.
pub struct SysinfoSource {
    system: System,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    fn ensure_supported() -> Result<(), ProbeError> {
        if System::IS_SUPPORTED {
            Ok(())
        } else {
            Err(ProbeError::Unsupported)
        }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SysinfoSource {
    fn cpu_descriptors(&mut self) -> Result<Vec<CpuDescriptor>, ProbeError> {
        Self::ensure_supported()?;
        self.system.refresh_cpu_specifics(CpuRefreshKind::everything());

        // one entry per logical CPU, each counted as a single core
        Ok(self
            .system
            .cpus()
            .iter()
            .map(|c| CpuDescriptor {
                model_name: c.brand().trim().to_string(),
                cores: 1,
            })
            .collect())
    }

    fn cpu_usage(&mut self, window: Duration) -> Result<f64, ProbeError> {
        Self::ensure_supported()?;
        let kind = CpuRefreshKind::new().with_cpu_usage();
        self.system.refresh_cpu_specifics(kind);
        thread::sleep(window.max(System::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_specifics(kind);

        if self.system.cpus().is_empty() {
            return Err(ProbeError::Unavailable("cpu usage"));
        }
        Ok(self.system.global_cpu_info().cpu_usage() as f64)
    }

    fn virtual_memory(&mut self) -> Result<VirtualMemory, ProbeError> {
        Self::ensure_supported()?;
        self.system.refresh_memory();

        let total = self.system.total_memory();
        if total == 0 {
            return Err(ProbeError::Unavailable("virtual memory"));
        }
        let used = self.system.used_memory();

        Ok(VirtualMemory {
            total,
            available: self.system.available_memory(),
            used,
            used_percent: used as f64 / total as f64 * 100.0,
        })
    }

    fn partitions(&mut self) -> Result<Vec<Partition>, ProbeError> {
        Self::ensure_supported()?;
        self.system.refresh_disks_list();

        Ok(self
            .system
            .disks()
            .iter()
            .map(|d| Partition {
                device: d.name().to_string_lossy().to_string(),
                mount_point: d.mount_point().to_string_lossy().to_string(),
                fs_type: String::from_utf8_lossy(d.file_system()).to_string(),
                removable: d.is_removable(),
            })
            .collect())
    }

    fn partition_usage(&mut self, partition: &Partition) -> Result<PartitionUsage, ProbeError> {
        let mount = Path::new(&partition.mount_point);
        let disk = self
            .system
            .disks_mut()
            .iter_mut()
            .find(|d| d.mount_point() == mount)
            .ok_or_else(|| ProbeError::MountNotFound(partition.mount_point.clone()))?;

        if !disk.refresh() {
            return Err(ProbeError::Unavailable("partition usage"));
        }

        let total = disk.total_space();
        let free = disk.available_space();
        Ok(PartitionUsage {
            total,
            free,
            used: total.saturating_sub(free),
        })
    }

    fn host_info(&mut self) -> Result<HostInfo, ProbeError> {
        Self::ensure_supported()?;
        self.system.refresh_processes();

        Ok(HostInfo {
            hostname: self.system.host_name().unwrap_or_default(),
            os: std::env::consts::OS.to_string(),
            platform: self.system.distribution_id(),
            boot_time: self.system.boot_time(),
            uptime: self.system.uptime(),
            procs: self.system.processes().len() as u64,
        })
    }
}
