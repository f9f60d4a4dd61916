//! Field table for the per-process I/O view.

use super::class::FieldSpec;
use crate::source::classes::ProcessCounters;

pub fn process_counters() -> Vec<FieldSpec<ProcessCounters>> {
    type Spec = FieldSpec<ProcessCounters>;

    vec![
        Spec::gauge("io_read_bytes_persec", "IO read bytes/s", |r| {
            r.io_read_bytes_persec
        }),
        Spec::gauge("io_write_bytes_persec", "IO write bytes/s", |r| {
            r.io_write_bytes_persec
        }),
        Spec::gauge("private_bytes", "Private bytes", |r| r.private_bytes),
        Spec::gauge("page_faults_persec", "Page Faults/s", |r| {
            r.page_faults_persec
        }),
        Spec::gauge("thread_count", "Thread Count", |r| r.thread_count),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SampleKind;

    #[test]
    fn test_five_gauges_in_order() {
        let fields = process_counters();
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            [
                "io_read_bytes_persec",
                "io_write_bytes_persec",
                "private_bytes",
                "page_faults_persec",
                "thread_count",
            ]
        );
        assert!(fields.iter().all(|f| f.kind == SampleKind::Gauge));
    }
}
