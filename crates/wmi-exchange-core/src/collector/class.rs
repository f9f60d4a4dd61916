//! Generic per-class collector driven by a field-binding table.
//!
//! A `ClassCollector` queries one counter class, filters its rows according
//! to a `RowPolicy`, and projects every surviving row into one sample per
//! field binding.

use std::sync::Arc;

use tracing::{debug, trace};

use super::catalog::CollectorId;
use super::{CollectError, Collector};
use crate::context::ScrapeContext;
use crate::metrics::{
    DescriptorError, DescriptorRegistry, LabelMismatch, MetricDescriptor, MetricSink, Sample,
    SampleKind,
};
use crate::source::query_all;
use crate::source::traits::{CounterClass, CounterSource};

/// Instance name WMI uses for the aggregate row.
pub const TOTAL_INSTANCE: &str = "_Total";

/// How rows of a class are labelled and filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    /// Exactly one meaningful row, no labels. Zero rows is `NoData`.
    Singleton,
    /// One row per `Name`, labelled `{name}`. Aggregate and indexed rows are skipped.
    PerInstance,
    /// One row per process, labelled `{process, process_id}`. Zero rows is `NoData`.
    PerProcess,
}

impl RowPolicy {
    pub fn label_keys(self) -> &'static [&'static str] {
        match self {
            RowPolicy::Singleton => &[],
            RowPolicy::PerInstance => &["name"],
            RowPolicy::PerProcess => &["process", "process_id"],
        }
    }
}

/// Static description of one projected field.
pub struct FieldSpec<T> {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: SampleKind,
    pub value: fn(&T) -> u64,
}

impl<T> FieldSpec<T> {
    pub const fn counter(name: &'static str, help: &'static str, value: fn(&T) -> u64) -> Self {
        Self {
            name,
            help,
            kind: SampleKind::Counter,
            value,
        }
    }

    pub const fn gauge(name: &'static str, help: &'static str, value: fn(&T) -> u64) -> Self {
        Self {
            name,
            help,
            kind: SampleKind::Gauge,
            value,
        }
    }
}

struct FieldBinding<T> {
    descriptor: Arc<MetricDescriptor>,
    kind: SampleKind,
    value: fn(&T) -> u64,
}

/// Collector for one counter class.
pub struct ClassCollector<S, T> {
    id: CollectorId,
    source: S,
    policy: RowPolicy,
    bindings: Vec<FieldBinding<T>>,
}

impl<S, T> ClassCollector<S, T>
where
    S: CounterSource,
    T: CounterClass,
{
    /// Registers one descriptor per field in `registry` and binds it.
    pub fn new(
        id: CollectorId,
        source: S,
        policy: RowPolicy,
        fields: Vec<FieldSpec<T>>,
        registry: &mut DescriptorRegistry,
    ) -> Result<Self, DescriptorError> {
        let mut bindings = Vec::with_capacity(fields.len());
        for field in fields {
            let descriptor =
                registry.register(id.subsystem(), field.name, field.help, policy.label_keys())?;
            bindings.push(FieldBinding {
                descriptor,
                kind: field.kind,
                value: field.value,
            });
        }

        Ok(Self {
            id,
            source,
            policy,
            bindings,
        })
    }

    fn project(
        &self,
        row: &T,
        label_values: Vec<String>,
        out: &mut Vec<Sample>,
    ) -> Result<(), LabelMismatch> {
        for binding in &self.bindings {
            out.push(Sample::from_raw(
                &binding.descriptor,
                binding.kind,
                (binding.value)(row),
                label_values.clone(),
            )?);
        }
        Ok(())
    }
}

impl<S, T> Collector for ClassCollector<S, T>
where
    S: CounterSource,
    T: CounterClass,
{
    fn id(&self) -> CollectorId {
        self.id
    }

    fn class_name(&self) -> &'static str {
        T::CLASS_NAME
    }

    fn collect(
        &self,
        ctx: &ScrapeContext,
        sink: &mut dyn MetricSink,
    ) -> Result<usize, CollectError> {
        let rows = query_all::<T, S>(&self.source, ctx)?;
        // Buffered so a failing row leaves nothing of this class in the sink.
        let mut samples = Vec::with_capacity(rows.len() * self.bindings.len());

        match self.policy {
            RowPolicy::Singleton => {
                let Some(row) = rows.first() else {
                    return Err(CollectError::NoData {
                        class: T::CLASS_NAME,
                    });
                };
                if rows.len() > 1 {
                    debug!(
                        class = T::CLASS_NAME,
                        rows = rows.len(),
                        "singleton class returned several rows, using the first"
                    );
                }
                self.project(row, Vec::new(), &mut samples)?;
            }
            RowPolicy::PerInstance => {
                for row in &rows {
                    let Some(label) = row.instance_name().and_then(instance_label) else {
                        trace!(class = T::CLASS_NAME, name = ?row.instance_name(), "row skipped");
                        continue;
                    };
                    self.project(row, vec![label], &mut samples)?;
                }
            }
            RowPolicy::PerProcess => {
                if rows.is_empty() {
                    return Err(CollectError::NoData {
                        class: T::CLASS_NAME,
                    });
                }
                for row in &rows {
                    let Some(name) = row.instance_name() else {
                        continue;
                    };
                    if name == TOTAL_INSTANCE {
                        continue;
                    }
                    let pid = row.process_id().unwrap_or_default().to_string();
                    self.project(row, vec![name.to_string(), pid], &mut samples)?;
                }
            }
        }

        let count = samples.len();
        for sample in samples {
            sink.emit(sample);
        }
        Ok(count)
    }
}

/// Converts an instance name to a label value: lowercase, whitespace runs
/// and dots replaced by `_`.
pub fn to_label_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace('.', "_")
}

/// True for names ending in `#` plus one or two digits (`w3wp#1`).
///
/// Only the end of the name is checked: `a#1 b` and `w3wp#123` are kept.
pub fn has_instance_index_suffix(name: &str) -> bool {
    match name.rsplit_once('#') {
        Some((_, suffix)) => {
            (1..=2).contains(&suffix.len()) && suffix.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Label for a per-instance row, or `None` when the row must be skipped.
pub fn instance_label(name: &str) -> Option<String> {
    if name == TOTAL_INSTANCE || has_instance_index_suffix(name) {
        return None;
    }
    let label = to_label_name(name);
    if label.ends_with("_total") {
        return None;
    }
    Some(label)
}
