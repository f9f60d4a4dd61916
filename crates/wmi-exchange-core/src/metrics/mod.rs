//! Metric descriptors, samples and sinks.

pub mod descriptor;
pub mod family;
pub mod sample;

pub use descriptor::{
    DescriptorError, DescriptorRegistry, EXCHANGE_SUBSYSTEM, MetricDescriptor, NAMESPACE,
    PROCTEST_SUBSYSTEM, build_fq_name,
};
pub use family::{FamilySink, encode_text};
pub use sample::{LabelMismatch, MetricSink, Sample, SampleKind};
