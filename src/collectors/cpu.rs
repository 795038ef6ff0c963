use crate::collectors::{CpuRecord, MetricsSource};
use std::time::Duration;
use tracing::debug;

/// One record per CPU descriptor. The aggregate usage sample lands on the
/// first record only; the rest keep `usage = 0`.
pub fn collect_cpu<S: MetricsSource + ?Sized>(
    source: &mut S,
    window: Duration,
) -> (Vec<CpuRecord>, u64) {
    let mut errors = 0_u64;

    let descriptors = match source.cpu_descriptors() {
        Ok(descriptors) => descriptors,
        Err(err) => {
            debug!(probe = "cpu", error = %err, "не удалось получить список CPU");
            errors += 1;
            Vec::new()
        }
    };

    let mut records: Vec<CpuRecord> = descriptors
        .into_iter()
        .map(|d| CpuRecord {
            model_name: d.model_name,
            cores: d.cores,
            usage: 0.0,
        })
        .collect();

    // no descriptors, nothing to attach to: skip the blocking sample
    if let Some(first) = records.first_mut() {
        match source.cpu_usage(window) {
            Ok(usage) => first.usage = normalize_percent(usage),
            Err(err) => {
                debug!(probe = "cpu", error = %err, "не удалось измерить загрузку CPU");
                errors += 1;
            }
        }
    }

    (records, errors)
}

fn normalize_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
