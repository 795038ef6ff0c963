use super::{
    CpuDescriptor, HostInfo, MetricsSource, Partition, PartitionUsage, ProbeError, VirtualMemory,
};
use std::time::Duration;

/// Scripted source for tests. `None` makes the matching call fail.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    pub cpus: Option<Vec<CpuDescriptor>>,
    pub usage: Option<f64>,
    pub memory: Option<VirtualMemory>,
    pub partitions: Option<Vec<(Partition, Option<PartitionUsage>)>>,
    pub host: Option<HostInfo>,
    pub usage_calls: usize,
}

impl FakeSource {
    pub fn healthy() -> Self {
        Self {
            cpus: Some(vec![cpu("Fake CPU @ 3.00GHz"), cpu("Fake CPU @ 3.00GHz")]),
            usage: Some(45.0),
            memory: Some(VirtualMemory {
                total: 16_000,
                available: 12_000,
                used: 4_000,
                used_percent: 25.0,
            }),
            partitions: Some(vec![
                (
                    partition("/dev/sda1", "/", "ext4"),
                    Some(usage(100, 40, 60)),
                ),
                (
                    partition("/dev/sdb1", "/data", "xfs"),
                    Some(usage(200, 150, 50)),
                ),
            ]),
            host: Some(HostInfo {
                hostname: "node-1".to_string(),
                os: "linux".to_string(),
                platform: "ubuntu".to_string(),
                boot_time: 1_700_000_000,
                uptime: 3_600,
                procs: 128,
            }),
            usage_calls: 0,
        }
    }
}

pub fn cpu(model_name: &str) -> CpuDescriptor {
    CpuDescriptor {
        model_name: model_name.to_string(),
        cores: 1,
    }
}

pub fn partition(device: &str, mount_point: &str, fs_type: &str) -> Partition {
    Partition {
        device: device.to_string(),
        mount_point: mount_point.to_string(),
        fs_type: fs_type.to_string(),
        removable: false,
    }
}

pub fn usage(total: u64, free: u64, used: u64) -> PartitionUsage {
    PartitionUsage { total, free, used }
}

impl MetricsSource for FakeSource {
    fn cpu_descriptors(&mut self) -> Result<Vec<CpuDescriptor>, ProbeError> {
        self.cpus
            .clone()
            .ok_or(ProbeError::Unavailable("cpu descriptors"))
    }

    fn cpu_usage(&mut self, _window: Duration) -> Result<f64, ProbeError> {
        self.usage_calls += 1;
        self.usage.ok_or(ProbeError::Unavailable("cpu usage"))
    }

    fn virtual_memory(&mut self) -> Result<VirtualMemory, ProbeError> {
        self.memory
            .clone()
            .ok_or(ProbeError::Unavailable("virtual memory"))
    }

    fn partitions(&mut self) -> Result<Vec<Partition>, ProbeError> {
        self.partitions
            .as_ref()
            .map(|parts| parts.iter().map(|(p, _)| p.clone()).collect())
            .ok_or(ProbeError::Unavailable("partitions"))
    }

    fn partition_usage(&mut self, partition: &Partition) -> Result<PartitionUsage, ProbeError> {
        self.partitions
            .as_ref()
            .and_then(|parts| parts.iter().find(|(p, _)| p == partition))
            .and_then(|(_, usage)| *usage)
            .ok_or_else(|| ProbeError::MountNotFound(partition.mount_point.clone()))
    }

    fn host_info(&mut self) -> Result<HostInfo, ProbeError> {
        self.host.clone().ok_or(ProbeError::Unavailable("host"))
    }
}
