use crate::collectors::{
    CpuRecord, DiskRecord, HostRecord, MemoryRecord, ProbeErrors, SystemSnapshot,
};
use prometheus::core::Collector;
use prometheus::{opts, Counter, CounterVec, Encoder, Gauge, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    started_at_unix: i64,
    pub sysprobe_requests_total: CounterVec,
    pub sysprobe_probe_errors_total: CounterVec,
    pub sysprobe_cpu_usage_percent: Gauge,
    pub sysprobe_memory_used_percent: Gauge,
    pub sysprobe_disk_used_percent: Gauge,
    pub sysprobe_host_uptime_seconds: Gauge,
    pub sysprobe_host_procs: Gauge,
    pub sysprobe_last_collect_timestamp_seconds: Gauge,
    pub sysprobe_scrape_count_total: Counter,
    pub sysprobe_uptime_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let sysprobe_requests_total = CounterVec::new(
            opts!(
                "sysprobe_requests_total",
                "Snapshot requests served, by endpoint"
            ),
            &["endpoint"],
        )?;
        let sysprobe_probe_errors_total = CounterVec::new(
            opts!(
                "sysprobe_probe_errors_total",
                "OS metric queries that failed and were reported as zero, by probe"
            ),
            &["probe"],
        )?;
        let sysprobe_cpu_usage_percent = Gauge::with_opts(opts!(
            "sysprobe_cpu_usage_percent",
            "Last sampled aggregate CPU usage in percent (0..100)"
        ))?;
        let sysprobe_memory_used_percent = Gauge::with_opts(opts!(
            "sysprobe_memory_used_percent",
            "Last reported virtual memory usage in percent"
        ))?;
        let sysprobe_disk_used_percent = Gauge::with_opts(opts!(
            "sysprobe_disk_used_percent",
            "Last reported usage across physical partitions in percent"
        ))?;
        let sysprobe_host_uptime_seconds = Gauge::with_opts(opts!(
            "sysprobe_host_uptime_seconds",
            "Host uptime in seconds at last collection"
        ))?;
        let sysprobe_host_procs = Gauge::with_opts(opts!(
            "sysprobe_host_procs",
            "Running process count at last collection"
        ))?;
        let sysprobe_last_collect_timestamp_seconds = Gauge::with_opts(opts!(
            "sysprobe_last_collect_timestamp_seconds",
            "Unix timestamp of the last probe run"
        ))?;
        let sysprobe_scrape_count_total = Counter::with_opts(opts!(
            "sysprobe_scrape_count_total",
            "Number of /metrics scrapes"
        ))?;
        let sysprobe_uptime_seconds = Gauge::with_opts(opts!(
            "sysprobe_uptime_seconds",
            "Service uptime in seconds"
        ))?;

        register(&registry, &sysprobe_requests_total)?;
        register(&registry, &sysprobe_probe_errors_total)?;
        register(&registry, &sysprobe_cpu_usage_percent)?;
        register(&registry, &sysprobe_memory_used_percent)?;
        register(&registry, &sysprobe_disk_used_percent)?;
        register(&registry, &sysprobe_host_uptime_seconds)?;
        register(&registry, &sysprobe_host_procs)?;
        register(&registry, &sysprobe_last_collect_timestamp_seconds)?;
        register(&registry, &sysprobe_scrape_count_total)?;
        register(&registry, &sysprobe_uptime_seconds)?;

        Ok(Arc::new(Self {
            registry,
            started_at_unix: now_unix(),
            sysprobe_requests_total,
            sysprobe_probe_errors_total,
            sysprobe_cpu_usage_percent,
            sysprobe_memory_used_percent,
            sysprobe_disk_used_percent,
            sysprobe_host_uptime_seconds,
            sysprobe_host_procs,
            sysprobe_last_collect_timestamp_seconds,
            sysprobe_scrape_count_total,
            sysprobe_uptime_seconds,
        }))
    }

    pub fn inc_request(&self, endpoint: &str) {
        self.sysprobe_requests_total
            .with_label_values(&[endpoint])
            .inc();
    }

    pub fn inc_probe_errors(&self, probe: &str, count: u64) {
        if count == 0 {
            return;
        }
        self.sysprobe_probe_errors_total
            .with_label_values(&[probe])
            .inc_by(count as f64);
    }

    pub fn observe_cpu(&self, records: &[CpuRecord], errors: u64) {
        // usage lives on the first record only
        if let Some(first) = records.first() {
            self.sysprobe_cpu_usage_percent.set(first.usage);
        }
        self.inc_probe_errors("cpu", errors);
        self.touch();
    }

    pub fn observe_memory(&self, record: &MemoryRecord, errors: u64) {
        self.sysprobe_memory_used_percent.set(record.used_percent);
        self.inc_probe_errors("memory", errors);
        self.touch();
    }

    pub fn observe_disk(&self, record: &DiskRecord, errors: u64) {
        self.sysprobe_disk_used_percent.set(record.used_percent);
        self.inc_probe_errors("disk", errors);
        self.touch();
    }

    pub fn observe_host(&self, record: &HostRecord, errors: u64) {
        self.sysprobe_host_uptime_seconds.set(record.uptime as f64);
        self.sysprobe_host_procs.set(record.procs as f64);
        self.inc_probe_errors("host", errors);
        self.touch();
    }

    pub fn observe_system(&self, snapshot: &SystemSnapshot, errors: &ProbeErrors) {
        self.observe_cpu(&snapshot.cpu, errors.cpu);
        self.observe_memory(&snapshot.memory, errors.memory);
        self.observe_disk(&snapshot.disk, errors.disk);
        self.observe_host(&snapshot.host, errors.host);
    }

    pub fn inc_scrape_count(&self) {
        self.sysprobe_scrape_count_total.inc();
    }

    pub fn encode_metrics(&self) -> Result<Vec<u8>, prometheus::Error> {
        let uptime = now_unix().saturating_sub(self.started_at_unix) as f64;
        self.sysprobe_uptime_seconds.set(uptime);

        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf)?;
        Ok(buf)
    }

    fn touch(&self) {
        self.sysprobe_last_collect_timestamp_seconds
            .set(now_unix() as f64);
    }
}

fn register<T: Collector + Clone + 'static>(
    registry: &Registry,
    collector: &T,
) -> Result<(), prometheus::Error> {
    registry.register(Box::new(collector.clone()))
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
