//! Enable/disable selection of collectors.

use std::fmt;

use tracing::warn;

use crate::collector::CollectorId;

const MARKER_ENABLED: &str = "\x1b[32m => ";
const MARKER_DISABLED: &str = "\x1b[31m => ";
const COLOR_RESET: &str = "\x1b[0m";

/// Selection rejected at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    UnknownCollector { id: String },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::UnknownCollector { id } => write!(f, "no such collector: {}", id),
        }
    }
}

impl std::error::Error for SelectionError {}

/// Which collectors to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Collector ids to run, in the order given. Defaults to the whole catalog.
    pub enabled: Vec<String>,
    /// Collector ids removed from `enabled`.
    pub disabled: Vec<String>,
    /// Print the catalog and exit instead of scraping.
    pub list_only: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            enabled: CollectorId::ALL
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            disabled: Vec::new(),
            list_only: false,
        }
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_id(id: &str) -> Result<CollectorId, SelectionError> {
    match CollectorId::lookup(id) {
        Some((resolved, true)) => {
            warn!(
                alias = id,
                collector = resolved.as_str(),
                "deprecated collector name, use the canonical one"
            );
            Ok(resolved)
        }
        Some((resolved, false)) => Ok(resolved),
        None => Err(SelectionError::UnknownCollector { id: id.to_string() }),
    }
}

impl SelectionConfig {
    /// Builds a selection from comma-separated flag values.
    ///
    /// A missing `enable` means the whole catalog.
    pub fn from_flags(enable: Option<&str>, disable: Option<&str>, list_only: bool) -> Self {
        let mut config = Self {
            list_only,
            ..Self::default()
        };
        if let Some(enable) = enable {
            config.enabled = split_list(enable);
        }
        if let Some(disable) = disable {
            config.disabled = split_list(disable);
        }
        config
    }

    /// Resolves the ordered list of collectors to run.
    ///
    /// Every id in `enabled` and `disabled` must name a catalog entry.
    pub fn resolve(&self) -> Result<ActiveList, SelectionError> {
        let enabled = self
            .enabled
            .iter()
            .map(|id| parse_id(id))
            .collect::<Result<Vec<_>, _>>()?;
        let disabled = self
            .disabled
            .iter()
            .map(|id| parse_id(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ids: Vec<CollectorId> = Vec::with_capacity(enabled.len());
        for id in enabled {
            if !disabled.contains(&id) && !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ActiveList { ids })
    }

    /// True if `id` is enabled and not disabled. Unknown ids are ignored.
    pub fn is_enabled(&self, id: CollectorId) -> bool {
        let matches = |name: &String| CollectorId::lookup(name).map(|(c, _)| c) == Some(id);
        self.enabled.iter().any(matches) && !self.disabled.iter().any(matches)
    }

    /// The catalog listing, one line per collector.
    pub fn listing(&self) -> CollectorListing<'_> {
        CollectorListing { config: self }
    }
}

/// Ordered collectors chosen for this process. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActiveList {
    ids: Vec<CollectorId>,
}

impl ActiveList {
    pub fn ids(&self) -> &[CollectorId] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = CollectorId> + '_ {
        self.ids.iter().copied()
    }

    pub fn contains(&self, id: CollectorId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Catalog listing with coloured enabled/disabled markers.
pub struct CollectorListing<'a> {
    config: &'a SelectionConfig,
}

impl fmt::Display for CollectorListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in CollectorId::ALL {
            let marker = if self.config.is_enabled(id) {
                MARKER_ENABLED
            } else {
                MARKER_DISABLED
            };
            writeln!(
                f,
                "{:<15} {:<32} {}{}",
                marker,
                id.as_str(),
                id.description(),
                COLOR_RESET
            )?;
        }
        Ok(())
    }
}
