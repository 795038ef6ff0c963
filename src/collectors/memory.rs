use crate::collectors::{MemoryRecord, MetricsSource};
use tracing::debug;

pub fn collect_memory<S: MetricsSource + ?Sized>(source: &mut S) -> (MemoryRecord, u64) {
    match source.virtual_memory() {
        Ok(vm) => (
            MemoryRecord {
                total: vm.total,
                available: vm.available,
                used: vm.used,
                used_percent: vm.used_percent,
            },
            0,
        ),
        Err(err) => {
            debug!(probe = "memory", error = %err, "не удалось получить сведения о памяти");
            (MemoryRecord::default(), 1)
        }
    }
}
