//! Groups samples into Prometheus metric families.

use std::collections::HashMap;

use prometheus::proto::{self, LabelPair, Metric, MetricFamily};
use prometheus::{Encoder, TextEncoder};

use super::sample::{MetricSink, Sample, SampleKind};

/// Sink that builds `MetricFamily` values for the Prometheus client.
///
/// Families appear in the order their first sample was emitted; metrics
/// within a family keep emission order.
#[derive(Debug, Default)]
pub struct FamilySink {
    families: Vec<MetricFamily>,
    index: HashMap<String, usize>,
}

impl FamilySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of samples received so far.
    pub fn sample_count(&self) -> usize {
        self.families.iter().map(|f| f.get_metric().len()).sum()
    }

    pub fn families(&self) -> &[MetricFamily] {
        &self.families
    }

    pub fn into_families(self) -> Vec<MetricFamily> {
        self.families
    }

    fn family_for(&mut self, sample: &Sample) -> &mut MetricFamily {
        let idx = match self.index.get(sample.fq_name()) {
            Some(&idx) => idx,
            None => {
                let mut family = MetricFamily::default();
                family.set_name(sample.fq_name().to_string());
                family.set_help(sample.descriptor().help().to_string());
                family.set_field_type(sample.kind().metric_type());

                self.families.push(family);
                let idx = self.families.len() - 1;
                self.index.insert(sample.fq_name().to_string(), idx);
                idx
            }
        };
        &mut self.families[idx]
    }
}

impl MetricSink for FamilySink {
    fn emit(&mut self, sample: Sample) {
        let mut metric = Metric::default();
        for (key, value) in sample.labels() {
            let mut pair = LabelPair::default();
            pair.set_name(key.to_string());
            pair.set_value(value.to_string());
            metric.mut_label().push(pair);
        }

        match sample.kind() {
            SampleKind::Counter => {
                let mut counter = proto::Counter::default();
                counter.set_value(sample.value());
                metric.set_counter(counter);
            }
            SampleKind::Gauge => {
                let mut gauge = proto::Gauge::default();
                gauge.set_value(sample.value());
                metric.set_gauge(gauge);
            }
        }

        let family = self.family_for(&sample);
        debug_assert_eq!(family.get_field_type(), sample.kind().metric_type());
        family.mut_metric().push(metric);
    }
}

/// Renders families in the Prometheus text exposition format.
pub fn encode_text(families: &[MetricFamily]) -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
