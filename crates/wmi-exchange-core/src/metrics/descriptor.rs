//! Metric descriptors and the descriptor registry.

use std::collections::HashMap;
use std::sync::Arc;

use prometheus::core::Desc;

/// Namespace shared by every metric of the exporter.
pub const NAMESPACE: &str = "wmi";
/// Subsystem of the Exchange counter classes.
pub const EXCHANGE_SUBSYSTEM: &str = "exchange";
/// Subsystem of the per-process counter class.
pub const PROCTEST_SUBSYSTEM: &str = "proctest";

/// Error type for descriptor construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// The Prometheus client rejected the name, help or label set.
    Invalid { fq_name: String, cause: String },
    /// Another descriptor already uses this fully-qualified name.
    Duplicate { fq_name: String },
}

impl std::fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorError::Invalid { fq_name, cause } => {
                write!(f, "invalid descriptor {}: {}", fq_name, cause)
            }
            DescriptorError::Duplicate { fq_name } => {
                write!(f, "descriptor {} registered twice", fq_name)
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

/// Joins namespace, subsystem and name with `_`, skipping empty parts.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

/// Immutable description of one metric: name, help and label keys.
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    desc: Desc,
}

impl MetricDescriptor {
    /// Builds `wmi_<subsystem>_<name>`, validated by the Prometheus client.
    pub fn new(
        subsystem: &str,
        name: &str,
        help: &str,
        label_keys: &[&str],
    ) -> Result<Self, DescriptorError> {
        let fq_name = build_fq_name(NAMESPACE, subsystem, name);
        let desc = Desc::new(
            fq_name.clone(),
            help.to_string(),
            label_keys.iter().map(|k| k.to_string()).collect(),
            HashMap::new(),
        )
        .map_err(|e| DescriptorError::Invalid {
            fq_name,
            cause: e.to_string(),
        })?;

        Ok(Self { desc })
    }

    pub fn fq_name(&self) -> &str {
        &self.desc.fq_name
    }

    pub fn help(&self) -> &str {
        &self.desc.help
    }

    pub fn label_keys(&self) -> &[String] {
        &self.desc.variable_labels
    }

    /// The underlying Prometheus client descriptor.
    pub fn desc(&self) -> &Desc {
        &self.desc
    }
}

/// Descriptors keyed by fully-qualified name, in registration order.
///
/// Filled once while the exporter is built and read-only afterwards.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: Vec<Arc<MetricDescriptor>>,
    by_fq_name: HashMap<String, usize>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a descriptor; fails if its fq_name is taken.
    pub fn register(
        &mut self,
        subsystem: &str,
        name: &str,
        help: &str,
        label_keys: &[&str],
    ) -> Result<Arc<MetricDescriptor>, DescriptorError> {
        let descriptor = MetricDescriptor::new(subsystem, name, help, label_keys)?;
        if self.by_fq_name.contains_key(descriptor.fq_name()) {
            return Err(DescriptorError::Duplicate {
                fq_name: descriptor.fq_name().to_string(),
            });
        }

        let descriptor = Arc::new(descriptor);
        self.by_fq_name
            .insert(descriptor.fq_name().to_string(), self.descriptors.len());
        self.descriptors.push(Arc::clone(&descriptor));
        Ok(descriptor)
    }

    pub fn get(&self, fq_name: &str) -> Option<&Arc<MetricDescriptor>> {
        self.by_fq_name
            .get(fq_name)
            .and_then(|&i| self.descriptors.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<MetricDescriptor>> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fq_name() {
        assert_eq!(
            build_fq_name("wmi", "exchange", "ldap_read_time"),
            "wmi_exchange_ldap_read_time"
        );
        assert_eq!(build_fq_name("wmi", "", "up"), "wmi_up");
    }

    #[test]
    fn test_descriptor_accessors() {
        let d = MetricDescriptor::new("proctest", "thread_count", "Thread Count", &[
            "process",
            "process_id",
        ])
        .unwrap();

        assert_eq!(d.fq_name(), "wmi_proctest_thread_count");
        assert_eq!(d.help(), "Thread Count");
        assert_eq!(d.label_keys(), ["process", "process_id"]);
    }

    #[test]
    fn test_invalid_label_rejected() {
        let err = MetricDescriptor::new("exchange", "x", "help", &["bad-label"]).unwrap_err();
        assert!(matches!(err, DescriptorError::Invalid { .. }));
    }

    #[test]
    fn test_empty_help_rejected() {
        assert!(MetricDescriptor::new("exchange", "x", "", &[]).is_err());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = DescriptorRegistry::new();
        registry
            .register("exchange", "owa_requests_per_sec", "OWA requests/s", &[])
            .unwrap();
        let err = registry
            .register("exchange", "owa_requests_per_sec", "again", &[])
            .unwrap_err();

        assert_eq!(
            err,
            DescriptorError::Duplicate {
                fq_name: "wmi_exchange_owa_requests_per_sec".into()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_lookup_and_order() {
        let mut registry = DescriptorRegistry::new();
        registry.register("exchange", "b", "b", &[]).unwrap();
        registry.register("exchange", "a", "a", &["name"]).unwrap();

        let names: Vec<_> = registry.iter().map(|d| d.fq_name()).collect();
        assert_eq!(names, ["wmi_exchange_b", "wmi_exchange_a"]);
        assert_eq!(
            registry.get("wmi_exchange_a").unwrap().label_keys(),
            ["name"]
        );
        assert!(registry.get("wmi_exchange_c").is_none());
    }
}
