//! Per-class collectors.
//!
//! Every collector implements the single-method `Collector` trait; the
//! per-class knowledge (which class, which rows, which field goes to which
//! descriptor with which kind) lives in the field tables of `exchange` and
//! `proctest` and is bound by `build`.

pub mod catalog;
pub mod class;
pub mod exchange;
pub mod proctest;

pub use catalog::CollectorId;
pub use class::{ClassCollector, FieldSpec, RowPolicy, instance_label, to_label_name};

use crate::context::ScrapeContext;
use crate::metrics::{DescriptorError, DescriptorRegistry, LabelMismatch, MetricSink};
use crate::source::classes::{
    ActiveSync, AdAccessProcesses, Autodiscover, AvailabilityService, DatabaseInstances,
    HttpProxy, Owa, ProcessCounters, RpcClientAccess, TransportQueues, WorkloadManagement,
};
use crate::source::{CounterClass, CounterSource, QueryError};

/// Error from a single collector run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectError {
    /// The class could not be queried.
    Query(QueryError),
    /// A class that needs at least one row returned none.
    NoData { class: &'static str },
    /// A sample did not match its descriptor. Aborts the scrape.
    InvariantViolation(LabelMismatch),
}

impl CollectError {
    /// True when the whole scrape must be abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollectError::InvariantViolation(_))
    }

    pub fn class(&self) -> Option<&'static str> {
        match self {
            CollectError::Query(e) => Some(e.class),
            CollectError::NoData { class } => Some(*class),
            CollectError::InvariantViolation(_) => None,
        }
    }
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Query(e) => write!(f, "{}", e),
            CollectError::NoData { class } => {
                write!(f, "WMI query returned zero-length response (Class: {})", class)
            }
            CollectError::InvariantViolation(e) => write!(f, "label mismatch: {}", e),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Query(e) => Some(e),
            CollectError::NoData { .. } => None,
            CollectError::InvariantViolation(e) => Some(e),
        }
    }
}

impl From<QueryError> for CollectError {
    fn from(e: QueryError) -> Self {
        CollectError::Query(e)
    }
}

impl From<LabelMismatch> for CollectError {
    fn from(e: LabelMismatch) -> Self {
        CollectError::InvariantViolation(e)
    }
}

/// One isolated unit of a scrape.
pub trait Collector: Send + Sync {
    fn id(&self) -> CollectorId;

    /// The counter class this collector queries.
    fn class_name(&self) -> &'static str;

    /// Queries the class and writes its samples to `sink`.
    ///
    /// On error nothing has been written. Returns the number of samples emitted.
    fn collect(&self, ctx: &ScrapeContext, sink: &mut dyn MetricSink)
    -> Result<usize, CollectError>;
}

fn boxed<S, T>(
    id: CollectorId,
    source: &S,
    policy: RowPolicy,
    fields: Vec<FieldSpec<T>>,
    registry: &mut DescriptorRegistry,
) -> Result<Box<dyn Collector>, DescriptorError>
where
    S: CounterSource + Clone + 'static,
    T: CounterClass,
{
    let collector = ClassCollector::new(id, source.clone(), policy, fields, registry)?;
    Ok(Box::new(collector))
}

/// Builds the collector for `id`, registering its descriptors.
pub fn build<S>(
    id: CollectorId,
    source: &S,
    registry: &mut DescriptorRegistry,
) -> Result<Box<dyn Collector>, DescriptorError>
where
    S: CounterSource + Clone + 'static,
{
    use RowPolicy::{PerInstance, PerProcess, Singleton};

    match id {
        CollectorId::AdAccessProcs => boxed::<S, AdAccessProcesses>(
            id,
            source,
            PerInstance,
            exchange::ad_access_processes(),
            registry,
        ),
        CollectorId::TransportQueues => boxed::<S, TransportQueues>(
            id,
            source,
            PerInstance,
            exchange::transport_queues(),
            registry,
        ),
        CollectorId::DatabaseInstances => boxed::<S, DatabaseInstances>(
            id,
            source,
            PerInstance,
            exchange::database_instances(),
            registry,
        ),
        CollectorId::HttpProxy => {
            boxed::<S, HttpProxy>(id, source, PerInstance, exchange::http_proxy(), registry)
        }
        CollectorId::ActiveSync => {
            boxed::<S, ActiveSync>(id, source, Singleton, exchange::active_sync(), registry)
        }
        CollectorId::AvailabilityService => boxed::<S, AvailabilityService>(
            id,
            source,
            Singleton,
            exchange::availability_service(),
            registry,
        ),
        CollectorId::Owa => boxed::<S, Owa>(id, source, Singleton, exchange::owa(), registry),
        CollectorId::AutoDiscover => {
            boxed::<S, Autodiscover>(id, source, Singleton, exchange::autodiscover(), registry)
        }
        CollectorId::ManagementWorkloads => boxed::<S, WorkloadManagement>(
            id,
            source,
            Singleton,
            exchange::workload_management(),
            registry,
        ),
        CollectorId::RpcClientAccess => boxed::<S, RpcClientAccess>(
            id,
            source,
            Singleton,
            exchange::rpc_client_access(),
            registry,
        ),
        CollectorId::Proctest => boxed::<S, ProcessCounters>(
            id,
            source,
            PerProcess,
            proctest::process_counters(),
            registry,
        ),
    }
}
