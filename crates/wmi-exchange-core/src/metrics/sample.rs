//! Samples and the sink they are written to.

use std::sync::Arc;

use prometheus::proto::MetricType;

use super::descriptor::MetricDescriptor;

/// Prometheus sample kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Counter,
    Gauge,
}

impl SampleKind {
    pub fn metric_type(self) -> MetricType {
        match self {
            SampleKind::Counter => MetricType::COUNTER,
            SampleKind::Gauge => MetricType::GAUGE,
        }
    }
}

/// Label values did not match the descriptor's label keys.
///
/// Always a programming error in a field binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMismatch {
    pub fq_name: String,
    pub expected: usize,
    pub actual: usize,
}

impl std::fmt::Display for LabelMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {} label values, got {}",
            self.fq_name, self.expected, self.actual
        )
    }
}

impl std::error::Error for LabelMismatch {}

/// One labelled value of a descriptor.
#[derive(Debug, Clone)]
pub struct Sample {
    descriptor: Arc<MetricDescriptor>,
    kind: SampleKind,
    value: f64,
    label_values: Vec<String>,
}

impl Sample {
    /// Creates a sample, checking the label count against the descriptor.
    pub fn new(
        descriptor: &Arc<MetricDescriptor>,
        kind: SampleKind,
        value: f64,
        label_values: Vec<String>,
    ) -> Result<Self, LabelMismatch> {
        let expected = descriptor.label_keys().len();
        if label_values.len() != expected {
            return Err(LabelMismatch {
                fq_name: descriptor.fq_name().to_string(),
                expected,
                actual: label_values.len(),
            });
        }

        Ok(Self {
            descriptor: Arc::clone(descriptor),
            kind,
            value,
            label_values,
        })
    }

    /// Creates a sample from a raw 64-bit counter, widened to `f64`.
    pub fn from_raw(
        descriptor: &Arc<MetricDescriptor>,
        kind: SampleKind,
        raw: u64,
        label_values: Vec<String>,
    ) -> Result<Self, LabelMismatch> {
        Self::new(descriptor, kind, raw as f64, label_values)
    }

    pub fn descriptor(&self) -> &Arc<MetricDescriptor> {
        &self.descriptor
    }

    pub fn fq_name(&self) -> &str {
        self.descriptor.fq_name()
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Label keys zipped with their values.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.descriptor
            .label_keys()
            .iter()
            .zip(&self.label_values)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Receives the samples of one scrape.
pub trait MetricSink {
    fn emit(&mut self, sample: Sample);
}

impl MetricSink for Vec<Sample> {
    fn emit(&mut self, sample: Sample) {
        self.push(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(labels: &[&str]) -> Arc<MetricDescriptor> {
        Arc::new(
            MetricDescriptor::new("exchange", "ldap_read_time", "LDAP Read Time", labels).unwrap(),
        )
    }

    #[test]
    fn test_from_raw_widens_without_clamping() {
        let d = descriptor(&[]);
        let s = Sample::from_raw(&d, SampleKind::Counter, u64::MAX, vec![]).unwrap();
        assert_eq!(s.value(), u64::MAX as f64);
    }

    #[test]
    fn test_label_count_mismatch() {
        let d = descriptor(&["name"]);
        let err = Sample::from_raw(&d, SampleKind::Gauge, 1, vec![]).unwrap_err();

        assert_eq!(
            err,
            LabelMismatch {
                fq_name: "wmi_exchange_ldap_read_time".into(),
                expected: 1,
                actual: 0,
            }
        );
    }

    #[test]
    fn test_labels_zip_keys_and_values() {
        let d = descriptor(&["name"]);
        let s = Sample::from_raw(&d, SampleKind::Counter, 123, vec!["foo_bar_baz".into()]).unwrap();

        assert_eq!(s.labels().collect::<Vec<_>>(), [("name", "foo_bar_baz")]);
        assert_eq!(s.fq_name(), "wmi_exchange_ldap_read_time");
    }

    #[test]
    fn test_vec_sink_keeps_order() {
        let d = descriptor(&[]);
        let mut sink: Vec<Sample> = Vec::new();
        sink.emit(Sample::from_raw(&d, SampleKind::Gauge, 1, vec![]).unwrap());
        sink.emit(Sample::from_raw(&d, SampleKind::Gauge, 2, vec![]).unwrap());

        let values: Vec<_> = sink.iter().map(Sample::value).collect();
        assert_eq!(values, [1.0, 2.0]);
    }

    #[test]
    fn test_kind_maps_to_metric_type() {
        assert_eq!(SampleKind::Counter.metric_type(), MetricType::COUNTER);
        assert_eq!(SampleKind::Gauge.metric_type(), MetricType::GAUGE);
    }
}
