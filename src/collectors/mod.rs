pub mod cpu;
pub mod disk;
#[cfg(test)]
pub mod fake;
pub mod host;
pub mod memory;
pub mod system;

use serde::{Serialize, Serializer};
use std::time::{Duration, SystemTime};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CpuRecord {
    pub model_name: String,
    pub cores: u32,
    pub usage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiskRecord {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostRecord {
    pub hostname: String,
    pub os: String,
    pub platform: String,
    pub boot_time: u64,
    pub uptime: u64,
    pub procs: u64,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub create_time: SystemTime,
}

impl HostRecord {
    /// Zero-valued record stamped with `create_time`.
    pub fn empty_at(create_time: SystemTime) -> Self {
        Self {
            hostname: String::new(),
            os: String::new(),
            platform: String::new(),
            boot_time: 0,
            uptime: 0,
            procs: 0,
            create_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub cpu: Vec<CpuRecord>,
    pub memory: MemoryRecord,
    pub disk: DiskRecord,
    pub host: HostRecord,
}

impl SystemSnapshot {
    pub fn empty_at(create_time: SystemTime) -> Self {
        Self {
            cpu: Vec::new(),
            memory: MemoryRecord::default(),
            disk: DiskRecord::default(),
            host: HostRecord::empty_at(create_time),
        }
    }
}

/// Swallowed OS-layer failures per probe for one aggregate collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeErrors {
    pub cpu: u64,
    pub memory: u64,
    pub disk: u64,
    pub host: u64,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("платформа не поддерживается источником метрик")]
    Unsupported,
    #[error("источник метрик не вернул данные: {0}")]
    Unavailable(&'static str),
    #[error("точка монтирования {0} не найдена")]
    MountNotFound(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuDescriptor {
    pub model_name: String,
    pub cores: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualMemory {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub removable: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionUsage {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostInfo {
    pub hostname: String,
    pub os: String,
    pub platform: String,
    pub boot_time: u64,
    pub uptime: u64,
    pub procs: u64,
}

/// Host OS metrics interface consumed by the probes.
///
/// Every call is attempted once; the probes decide how a failure degrades.
pub trait MetricsSource {
    fn cpu_descriptors(&mut self) -> Result<Vec<CpuDescriptor>, ProbeError>;

    /// Aggregate utilization over all cores, measured across `window`.
    /// Blocks the calling thread for the length of the window.
    fn cpu_usage(&mut self, window: Duration) -> Result<f64, ProbeError>;

    fn virtual_memory(&mut self) -> Result<VirtualMemory, ProbeError>;

    fn partitions(&mut self) -> Result<Vec<Partition>, ProbeError>;

    fn partition_usage(&mut self, partition: &Partition) -> Result<PartitionUsage, ProbeError>;

    fn host_info(&mut self) -> Result<HostInfo, ProbeError>;
}

pub fn collect_system<S: MetricsSource + ?Sized>(
    source: &mut S,
    cpu_window: Duration,
) -> (SystemSnapshot, ProbeErrors) {
    let (cpu, cpu_errors) = cpu::collect_cpu(source, cpu_window);
    let (memory, memory_errors) = memory::collect_memory(source);
    let (disk, disk_errors) = disk::collect_disk(source);
    let (host, host_errors) = host::collect_host(source);

    (
        SystemSnapshot {
            cpu,
            memory,
            disk,
            host,
        },
        ProbeErrors {
            cpu: cpu_errors,
            memory: memory_errors,
            disk: disk_errors,
            host: host_errors,
        },
    )
}

fn serialize_rfc3339<S: Serializer>(ts: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_rfc3339_nanos(*ts))
}
