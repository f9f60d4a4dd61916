//! wmi-exchange-core - collector dispatch and metric projection for the
//! Exchange / process WMI exporter.
//!
//! Provides:
//! - `source`: counter-class record shapes, the `CounterSource` abstraction
//!   (WMI on Windows, `MockSource` everywhere) and the query adapter
//! - `metrics`: descriptors, samples, sinks and the Prometheus family bridge
//! - `collector`: per-class collectors and the collector catalog
//! - `selection`: enable/disable selection algebra and catalog listing
//! - `exporter`: the factory (`ExporterBuilder`) and the scrape dispatcher
//! - `context`: cooperative cancellation for a single scrape

pub mod collector;
pub mod context;
pub mod exporter;
pub mod metrics;
pub mod selection;
pub mod source;

pub use collector::{CollectError, CollectorId};
pub use context::ScrapeContext;
pub use exporter::{BuildError, CollectorOutcome, Exporter, ExporterBuilder, ScrapeSummary};
pub use metrics::{FamilySink, MetricDescriptor, MetricSink, Sample, SampleKind};
pub use selection::{ActiveList, SelectionConfig, SelectionError};
pub use source::{CounterClass, CounterSource, MockSource, QueryError, SourceError};
