//! Exporter factory and scrape dispatcher.
//!
//! `ExporterBuilder` resolves the selection, builds the active collectors and
//! their descriptors once; the resulting `Exporter` is immutable and can be
//! scraped any number of times, from several threads with disjoint sinks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use prometheus::core::Desc;
use prometheus::proto::MetricFamily;
use tracing::{debug, error, info, warn};

use crate::collector::{self, CollectError, Collector, CollectorId};
use crate::context::ScrapeContext;
use crate::metrics::{
    DescriptorError, DescriptorRegistry, EXCHANGE_SUBSYSTEM, FamilySink, MetricDescriptor,
    MetricSink, Sample, SampleKind,
};
use crate::selection::{ActiveList, SelectionConfig, SelectionError};
use crate::source::CounterSource;

/// Error while assembling an exporter.
#[derive(Debug)]
pub enum BuildError {
    Selection(SelectionError),
    Descriptor(DescriptorError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Selection(e) => write!(f, "invalid collector selection: {}", e),
            BuildError::Descriptor(e) => write!(f, "invalid metric descriptor: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Selection(e) => Some(e),
            BuildError::Descriptor(e) => Some(e),
        }
    }
}

impl From<SelectionError> for BuildError {
    fn from(e: SelectionError) -> Self {
        BuildError::Selection(e)
    }
}

impl From<DescriptorError> for BuildError {
    fn from(e: DescriptorError) -> Self {
        BuildError::Descriptor(e)
    }
}

/// Result of one collector within a scrape.
#[derive(Debug, Clone)]
pub struct CollectorOutcome {
    pub id: CollectorId,
    pub class: &'static str,
    pub duration: Duration,
    /// Samples written to the sink, excluding meta-metrics.
    pub samples: usize,
    pub error: Option<CollectError>,
}

impl CollectorOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// What happened during one scrape.
#[derive(Debug, Clone, Default)]
pub struct ScrapeSummary {
    /// One entry per collector that was attempted, in dispatch order.
    pub outcomes: Vec<CollectorOutcome>,
    /// The context was cancelled before every collector ran.
    pub cancelled: bool,
    pub total: Duration,
}

impl ScrapeSummary {
    pub fn samples(&self) -> usize {
        self.outcomes.iter().map(|o| o.samples).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CollectorOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn outcome(&self, id: CollectorId) -> Option<&CollectorOutcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}

/// Descriptors of the per-collector scrape meta-metrics.
struct ScrapeMetrics {
    duration: Arc<MetricDescriptor>,
    success: Arc<MetricDescriptor>,
}

impl ScrapeMetrics {
    fn register(registry: &mut DescriptorRegistry) -> Result<Self, DescriptorError> {
        let duration = registry.register(
            EXCHANGE_SUBSYSTEM,
            "collector_duration_seconds",
            "Duration of a collector run within a scrape",
            &["collector"],
        )?;
        let success = registry.register(
            EXCHANGE_SUBSYSTEM,
            "collector_success",
            "Whether a collector run within a scrape succeeded",
            &["collector"],
        )?;
        Ok(Self { duration, success })
    }

    fn emit(
        &self,
        outcome: &CollectorOutcome,
        sink: &mut dyn MetricSink,
    ) -> Result<(), CollectError> {
        let label = vec![outcome.id.as_str().to_string()];
        let success = if outcome.is_success() { 1.0 } else { 0.0 };

        sink.emit(Sample::new(
            &self.duration,
            SampleKind::Gauge,
            outcome.duration.as_secs_f64(),
            label.clone(),
        )?);
        sink.emit(Sample::new(&self.success, SampleKind::Gauge, success, label)?);
        Ok(())
    }
}

/// Assembles an `Exporter` from a counter source and a selection.
pub struct ExporterBuilder<S> {
    source: S,
    selection: SelectionConfig,
    scrape_timeout: Option<Duration>,
    scrape_metrics: bool,
}

impl<S> ExporterBuilder<S>
where
    S: CounterSource + Clone + 'static,
{
    pub fn new(source: S) -> Self {
        Self {
            source,
            selection: SelectionConfig::default(),
            scrape_timeout: None,
            scrape_metrics: false,
        }
    }

    pub fn selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = selection;
        self
    }

    /// Deadline applied to every scrape context the exporter creates.
    pub fn scrape_timeout(mut self, timeout: Duration) -> Self {
        self.scrape_timeout = Some(timeout);
        self
    }

    /// Emits `collector_duration_seconds` and `collector_success` per collector.
    pub fn with_scrape_metrics(mut self, enabled: bool) -> Self {
        self.scrape_metrics = enabled;
        self
    }

    /// Resolves the selection and builds every active collector.
    ///
    /// Fails on an unknown collector id.
    pub fn build(self) -> Result<Exporter, BuildError> {
        let active = self.selection.resolve()?;
        let mut registry = DescriptorRegistry::new();

        let mut collectors = Vec::with_capacity(active.len());
        for id in active.iter() {
            collectors.push(collector::build(id, &self.source, &mut registry)?);
        }

        let scrape_metrics = if self.scrape_metrics {
            Some(ScrapeMetrics::register(&mut registry)?)
        } else {
            None
        };

        info!(
            collectors = %active.iter().map(CollectorId::as_str).collect::<Vec<_>>().join(","),
            descriptors = registry.len(),
            "exchange collectors enabled"
        );

        Ok(Exporter {
            active,
            collectors,
            registry,
            scrape_timeout: self.scrape_timeout,
            scrape_metrics,
        })
    }
}

/// The scrape dispatcher.
pub struct Exporter {
    active: ActiveList,
    collectors: Vec<Box<dyn Collector>>,
    registry: DescriptorRegistry,
    scrape_timeout: Option<Duration>,
    scrape_metrics: Option<ScrapeMetrics>,
}

impl Exporter {
    pub fn active(&self) -> &ActiveList {
        &self.active
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    /// A fresh context honouring the configured scrape timeout.
    pub fn scrape_context(&self) -> ScrapeContext {
        self.scrape_context_from(&ScrapeContext::background())
    }

    /// Like `scrape_context`, but cancelled whenever `parent` is.
    pub fn scrape_context_from(&self, parent: &ScrapeContext) -> ScrapeContext {
        match self.scrape_timeout {
            Some(timeout) => parent.child_with_timeout(timeout),
            None => parent.clone(),
        }
    }

    /// Runs one scrape into `sink`.
    pub fn collect(&self, sink: &mut dyn MetricSink) -> Result<ScrapeSummary, CollectError> {
        self.collect_with(&self.scrape_context(), sink)
    }

    /// Runs one scrape into `sink` under `ctx`.
    ///
    /// Query failures and missing data are logged and recorded in the summary;
    /// the scrape continues with the next collector. Only a label mismatch
    /// aborts the scrape and is returned as an error. Cancellation stops the
    /// scrape between collectors.
    pub fn collect_with(
        &self,
        ctx: &ScrapeContext,
        sink: &mut dyn MetricSink,
    ) -> Result<ScrapeSummary, CollectError> {
        let started = Instant::now();
        let mut summary = ScrapeSummary::default();

        for collector in &self.collectors {
            if ctx.is_cancelled() {
                info!(
                    remaining = self.collectors.len() - summary.outcomes.len(),
                    "scrape cancelled, skipping remaining collectors"
                );
                summary.cancelled = true;
                break;
            }

            let id = collector.id();
            let class = collector.class_name();
            let collector_started = Instant::now();
            let result = collector.collect(ctx, sink);
            let duration = collector_started.elapsed();

            let outcome = match result {
                Ok(samples) => {
                    debug!(
                        collector = id.as_str(),
                        samples,
                        elapsed_ms = duration.as_millis() as u64,
                        "collector finished"
                    );
                    CollectorOutcome {
                        id,
                        class,
                        duration,
                        samples,
                        error: None,
                    }
                }
                Err(e) if e.is_fatal() => {
                    error!(collector = id.as_str(), class, error = %e, "scrape aborted");
                    return Err(e);
                }
                Err(e) => {
                    warn!(collector = id.as_str(), class, error = %e, "collector failed");
                    CollectorOutcome {
                        id,
                        class,
                        duration,
                        samples: 0,
                        error: Some(e),
                    }
                }
            };

            if let Some(meta) = &self.scrape_metrics {
                meta.emit(&outcome, sink)?;
            }
            summary.outcomes.push(outcome);
        }

        summary.total = started.elapsed();
        Ok(summary)
    }

    /// Runs one scrape and groups the samples into metric families.
    ///
    /// An aborted scrape yields no families.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let mut sink = FamilySink::new();
        match self.collect(&mut sink) {
            Ok(_) => sink.into_families(),
            Err(e) => {
                error!(error = %e, "discarding scrape");
                Vec::new()
            }
        }
    }
}

impl prometheus::core::Collector for Exporter {
    fn desc(&self) -> Vec<&Desc> {
        self.registry.iter().map(|d| d.desc()).collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.gather()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::LabelMismatch;
    use crate::source::classes::{DatabaseInstances, Owa};
    use crate::source::{MockSource, SourceError};

    fn exporter(source: MockSource, enabled: &[&str], disabled: &[&str]) -> Exporter {
        let selection = SelectionConfig {
            enabled: enabled.iter().map(|s| s.to_string()).collect(),
            disabled: disabled.iter().map(|s| s.to_string()).collect(),
            list_only: false,
        };
        ExporterBuilder::new(source)
            .selection(selection)
            .build()
            .unwrap()
    }

    struct CancelOnEmit {
        ctx: ScrapeContext,
        samples: Vec<Sample>,
    }

    impl MetricSink for CancelOnEmit {
        fn emit(&mut self, sample: Sample) {
            self.ctx.cancel();
            self.samples.push(sample);
        }
    }

    struct BrokenCollector;

    impl Collector for BrokenCollector {
        fn id(&self) -> CollectorId {
            CollectorId::Owa
        }

        fn class_name(&self) -> &'static str {
            "Broken"
        }

        fn collect(
            &self,
            _: &ScrapeContext,
            _: &mut dyn MetricSink,
        ) -> Result<usize, CollectError> {
            Err(CollectError::InvariantViolation(LabelMismatch {
                fq_name: "wmi_exchange_broken".into(),
                expected: 1,
                actual: 2,
            }))
        }
    }

    #[test]
    fn test_full_scrape_of_typical_server() {
        let exporter = ExporterBuilder::new(MockSource::typical_exchange_server())
            .build()
            .unwrap();
        let mut sink: Vec<Sample> = Vec::new();
        let summary = exporter.collect(&mut sink).unwrap();

        assert_eq!(summary.outcomes.len(), CollectorId::ALL.len());
        assert_eq!(summary.failed().count(), 0);
        assert!(!summary.cancelled);
        assert_eq!(summary.samples(), sink.len());

        for sample in &sink {
            let descriptor = exporter.registry().get(sample.fq_name()).unwrap();
            assert_eq!(sample.label_values().len(), descriptor.label_keys().len());
            assert!(!sample.label_values().iter().any(|v| v.ends_with("_total")));
        }
    }

    #[test]
    fn test_dispatch_order_follows_selection() {
        let exporter = exporter(
            MockSource::typical_exchange_server(),
            &["owa", "active_sync"],
            &[],
        );
        let mut sink: Vec<Sample> = Vec::new();
        exporter.collect(&mut sink).unwrap();

        let names: Vec<_> = sink.iter().map(Sample::fq_name).collect();
        assert_eq!(
            names,
            [
                "wmi_exchange_current_unique_users",
                "wmi_exchange_owa_requests_per_sec",
                "wmi_exchange_active_sync_requests_per_sec",
                "wmi_exchange_ping_commands_pending",
                "wmi_exchange_sync_commands_per_sec",
            ]
        );
    }

    #[test]
    fn test_selection_subtracts_disabled() {
        let exporter = exporter(
            MockSource::typical_exchange_server(),
            &["transport_queues", "http_proxy", "owa"],
            &["http_proxy"],
        );
        assert_eq!(
            exporter.active().ids(),
            [CollectorId::TransportQueues, CollectorId::Owa]
        );
        assert!(exporter
            .registry()
            .get("wmi_exchange_proxy_requests_per_sec")
            .is_none());
    }

    #[test]
    fn test_unknown_collector_fails_build() {
        let selection = SelectionConfig {
            enabled: vec!["owa".into(), "exchange_magic".into()],
            ..SelectionConfig::default()
        };
        let err = ExporterBuilder::new(MockSource::new())
            .selection(selection)
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            BuildError::Selection(SelectionError::UnknownCollector { ref id })
                if id == "exchange_magic"
        ));
    }

    #[test]
    fn test_failure_is_contained() {
        let source = MockSource::typical_exchange_server().with_failure::<DatabaseInstances>(
            SourceError::Transport("0x80041010".into()),
        );
        let exporter = exporter(source, &["database_instances", "owa"], &[]);
        let mut sink: Vec<Sample> = Vec::new();
        let summary = exporter.collect(&mut sink).unwrap();

        assert!(sink.iter().all(|s| !s.fq_name().contains("database")));
        assert_eq!(sink.len(), 2);

        let failed: Vec<_> = summary.failed().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, CollectorId::DatabaseInstances);
        let error = failed[0].error.as_ref().unwrap().to_string();
        assert!(error.contains("Win32_PerfRawData_ESE_MSExchangeDatabaseInstances"));
        assert!(error.contains("0x80041010"));
        assert!(summary.outcome(CollectorId::Owa).unwrap().is_success());
    }

    #[test]
    fn test_all_collectors_failing_still_succeeds() {
        let exporter = ExporterBuilder::new(MockSource::new()).build().unwrap();
        let mut sink: Vec<Sample> = Vec::new();
        let summary = exporter.collect(&mut sink).unwrap();

        assert!(sink.is_empty());
        assert_eq!(summary.failed().count(), CollectorId::ALL.len());
    }

    #[test]
    fn test_cancelled_before_start_runs_nothing() {
        let source = MockSource::typical_exchange_server();
        let exporter = exporter(source.clone(), &["owa", "active_sync"], &[]);
        let ctx = ScrapeContext::background();
        ctx.cancel();

        let mut sink: Vec<Sample> = Vec::new();
        let summary = exporter.collect_with(&ctx, &mut sink).unwrap();
        assert!(summary.cancelled);
        assert!(summary.outcomes.is_empty());
        assert!(sink.is_empty());
        assert!(source.issued_queries().is_empty());
    }

    #[test]
    fn test_cancel_between_collectors() {
        let exporter = exporter(
            MockSource::typical_exchange_server(),
            &["owa", "active_sync", "rpc_client_access"],
            &[],
        );
        let ctx = ScrapeContext::background();
        let mut sink = CancelOnEmit {
            ctx: ctx.clone(),
            samples: Vec::new(),
        };

        let summary = exporter.collect_with(&ctx, &mut sink).unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.outcomes[0].id, CollectorId::Owa);
        assert_eq!(sink.samples.len(), 2);
    }

    #[test]
    fn test_invariant_violation_aborts_scrape() {
        let exporter = Exporter {
            active: ActiveList::default(),
            collectors: vec![Box::new(BrokenCollector)],
            registry: DescriptorRegistry::new(),
            scrape_timeout: None,
            scrape_metrics: None,
        };
        let mut sink: Vec<Sample> = Vec::new();
        let err = exporter.collect(&mut sink).unwrap_err();
        assert!(err.is_fatal());
        assert!(exporter.gather().is_empty());
    }

    #[test]
    fn test_scrape_metrics() {
        let source =
            MockSource::typical_exchange_server().with_failure::<Owa>(SourceError::Cancelled);
        let exporter = ExporterBuilder::new(source)
            .selection(SelectionConfig {
                enabled: vec!["owa".into(), "auto_discover".into()],
                ..SelectionConfig::default()
            })
            .with_scrape_metrics(true)
            .build()
            .unwrap();

        let mut sink: Vec<Sample> = Vec::new();
        let summary = exporter.collect(&mut sink).unwrap();
        assert_eq!(summary.samples(), 1);

        let success: Vec<_> = sink
            .iter()
            .filter(|s| s.fq_name() == "wmi_exchange_collector_success")
            .map(|s| (s.label_values()[0].as_str(), s.value()))
            .collect();
        assert_eq!(success, [("owa", 0.0), ("auto_discover", 1.0)]);
        assert_eq!(
            sink.iter()
                .filter(|s| s.fq_name() == "wmi_exchange_collector_duration_seconds")
                .count(),
            2
        );
    }

    #[test]
    fn test_host_without_exchange() {
        let exporter = ExporterBuilder::new(MockSource::plain_windows_host())
            .build()
            .unwrap();
        let mut sink: Vec<Sample> = Vec::new();
        let summary = exporter.collect(&mut sink).unwrap();

        assert_eq!(summary.failed().count(), CollectorId::ALL.len() - 1);
        assert!(summary.outcome(CollectorId::Proctest).unwrap().is_success());
        assert_eq!(sink.len(), 5);
        assert!(sink.iter().all(|s| s.fq_name().starts_with("wmi_proctest_")));
    }

    #[test]
    fn test_scrape_timeout_expired() {
        let source = MockSource::typical_exchange_server();
        let exporter = ExporterBuilder::new(source.clone())
            .scrape_timeout(Duration::ZERO)
            .build()
            .unwrap();
        let mut sink: Vec<Sample> = Vec::new();
        let summary = exporter.collect(&mut sink).unwrap();

        assert!(summary.cancelled);
        assert!(sink.is_empty());
        assert!(source.issued_queries().is_empty());
    }

    #[test]
    fn test_descriptors_are_unique() {
        let exporter = ExporterBuilder::new(MockSource::new())
            .with_scrape_metrics(true)
            .build()
            .unwrap();
        let mut names: Vec<_> = exporter.registry().iter().map(|d| d.fq_name()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_prometheus_registry_gather() {
        let exporter = exporter(
            MockSource::typical_exchange_server(),
            &["ad_access_procs", "owa"],
            &[],
        );
        let registry = prometheus::Registry::new();
        registry.register(Box::new(exporter)).unwrap();

        let families = registry.gather();
        let read = families
            .iter()
            .find(|f| f.get_name() == "wmi_exchange_ldap_read_time")
            .unwrap();
        assert_eq!(read.get_metric().len(), 2);
        assert!(families
            .iter()
            .any(|f| f.get_name() == "wmi_exchange_owa_requests_per_sec"));
    }
}
