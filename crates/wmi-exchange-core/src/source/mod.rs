//! Counter sources and the query adapter.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ collector ── query_all::<T>() ── QueryError   │
//! └──────────────────────┬───────────────────────┘
//!                        │ "SELECT * FROM <class>"
//!                 ┌──────▼───────┐
//!                 │ CounterSource│ (trait)
//!                 └──────┬───────┘
//!            ┌───────────┴───────────┐
//!     ┌──────▼──────┐         ┌──────▼──────┐
//!     │  WmiSource  │         │ MockSource  │
//!     │  (Windows)  │         │ (Testing)   │
//!     └─────────────┘         └─────────────┘
//! ```

pub mod classes;
pub mod mock;
pub mod traits;
#[cfg(windows)]
pub mod wmi;

use tracing::debug;

use crate::context::ScrapeContext;

pub use mock::MockSource;
pub use traits::{CounterClass, CounterSource, class_name};
#[cfg(windows)]
pub use wmi::WmiSource;

/// Failure reported by the system-management binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The scrape context was cancelled before or during the query.
    Cancelled,
    /// The facility could not be reached or rejected the query.
    Transport(String),
    /// Rows came back but could not be mapped onto the record shape.
    Parse(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Cancelled => write!(f, "scrape cancelled"),
            SourceError::Transport(msg) => write!(f, "transport error: {}", msg),
            SourceError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

/// Error returned by the query adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryError {
    pub class: &'static str,
    pub cause: SourceError,
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WMI query error: {} (Class: {})", self.cause, self.class)
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Builds the query string for a class.
pub fn query_string<T: CounterClass>() -> String {
    format!("SELECT * FROM {}", T::CLASS_NAME)
}

/// Queries every row of `T`.
///
/// A zero-row response is not an error.
pub fn query_all<T, S>(source: &S, ctx: &ScrapeContext) -> Result<Vec<T>, QueryError>
where
    T: CounterClass,
    S: CounterSource,
{
    let query = query_string::<T>();
    debug!(class = T::CLASS_NAME, query = %query, "issuing WMI query");

    source.query::<T>(ctx, &query).map_err(|cause| QueryError {
        class: T::CLASS_NAME,
        cause,
    })
}
