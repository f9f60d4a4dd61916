//! In-memory mock counter source for testing collectors without WMI.
//!
//! `MockSource` stores typed rows per counter class, so tests and
//! non-Windows hosts can simulate any WMI state.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::context::ScrapeContext;
use crate::source::SourceError;
use crate::source::traits::{CounterClass, CounterSource};

#[derive(Clone)]
enum MockTable {
    Rows(Arc<dyn Any + Send + Sync>),
    Fail(SourceError),
}

/// In-memory counter source.
///
/// Classes that were never registered fail with a transport error, as WMI
/// does for a class that is not installed on the host. Clones share the
/// query log.
#[derive(Clone, Default)]
pub struct MockSource {
    tables: HashMap<&'static str, MockTable>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl std::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut classes: Vec<_> = self.tables.keys().collect();
        classes.sort();
        f.debug_struct("MockSource")
            .field("classes", &classes)
            .finish()
    }
}

impl MockSource {
    /// Creates a new source with no classes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rows returned for class `T`, replacing earlier rows or failures.
    pub fn set_rows<T: CounterClass>(&mut self, rows: Vec<T>) {
        self.tables
            .insert(T::CLASS_NAME, MockTable::Rows(Arc::new(rows)));
    }

    /// Makes every query for class `T` fail with `error`.
    pub fn set_failure<T: CounterClass>(&mut self, error: SourceError) {
        self.tables.insert(T::CLASS_NAME, MockTable::Fail(error));
    }

    /// Removes class `T`, so querying it fails as an unknown class.
    pub fn remove_class<T: CounterClass>(&mut self) {
        self.tables.remove(T::CLASS_NAME);
    }

    pub fn with_rows<T: CounterClass>(mut self, rows: Vec<T>) -> Self {
        self.set_rows(rows);
        self
    }

    pub fn with_failure<T: CounterClass>(mut self, error: SourceError) -> Self {
        self.set_failure::<T>(error);
        self
    }

    /// Query strings issued so far, in order.
    pub fn issued_queries(&self) -> Vec<String> {
        match self.queries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, query: &str) {
        let mut guard = match self.queries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(query.to_string());
    }
}

impl CounterSource for MockSource {
    fn query<T: CounterClass>(
        &self,
        ctx: &ScrapeContext,
        query: &str,
    ) -> Result<Vec<T>, SourceError> {
        if ctx.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        self.record(query);

        match self.tables.get(T::CLASS_NAME) {
            Some(MockTable::Rows(rows)) => rows
                .downcast_ref::<Vec<T>>()
                .cloned()
                .ok_or_else(|| {
                    SourceError::Parse(format!(
                        "rows registered for {} have a different record shape",
                        T::CLASS_NAME
                    ))
                }),
            Some(MockTable::Fail(err)) => Err(err.clone()),
            None => Err(SourceError::Transport(format!(
                "Invalid class \"{}\"",
                T::CLASS_NAME
            ))),
        }
    }
}
