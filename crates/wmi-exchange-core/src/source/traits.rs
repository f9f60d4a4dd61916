//! Abstractions over the system-management facility to enable testing and mocking.
//!
//! The `CounterSource` trait lets collectors query WMI on Windows and an
//! in-memory `MockSource` in tests or on other platforms.

use serde::de::DeserializeOwned;

use super::SourceError;
use crate::context::ScrapeContext;

/// A performance-counter class: one record shape per class.
///
/// Every numeric field of an implementor is an unsigned 64-bit raw counter.
/// `CLASS_NAME` is embedded verbatim in the query predicate.
pub trait CounterClass: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Class identifier, e.g. `Win32_PerfRawData_PerfProc_Process`.
    const CLASS_NAME: &'static str;

    /// The `Name` property of the row, for classes that carry one.
    fn instance_name(&self) -> Option<&str> {
        None
    }

    /// The owning process id, for per-process classes.
    fn process_id(&self) -> Option<u32> {
        None
    }
}

/// Returns the identifier used in the query predicate for `T`.
pub fn class_name<T: CounterClass>() -> &'static str {
    T::CLASS_NAME
}

/// Abstraction for the system-management query facility.
///
/// Implementations must fail with `SourceError::Cancelled` when `ctx` is
/// already cancelled instead of issuing the query.
pub trait CounterSource: Send + Sync {
    /// Runs `query` and deserializes every returned row into `T`.
    ///
    /// A successful query with no rows yields an empty vector.
    fn query<T: CounterClass>(&self, ctx: &ScrapeContext, query: &str)
    -> Result<Vec<T>, SourceError>;
}
