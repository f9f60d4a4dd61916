//! WMI-backed counter source (Windows only).

use std::cell::RefCell;

use wmi::{COMLibrary, WMIConnection};

use crate::context::ScrapeContext;
use crate::source::SourceError;
use crate::source::traits::{CounterClass, CounterSource};

/// Default WMI namespace holding the `Win32_PerfRawData_*` classes.
pub const DEFAULT_NAMESPACE: &str = "ROOT\\CIMV2";

thread_local! {
    // COM handles are bound to the thread that created them.
    static CONNECTION: RefCell<Option<(String, WMIConnection)>> = const { RefCell::new(None) };
}

/// Real counter source that delegates to WMI.
///
/// Holds no COM state itself; a connection is opened lazily per thread and
/// reused by later queries on that thread.
#[derive(Debug, Clone)]
pub struct WmiSource {
    namespace: String,
}

impl Default for WmiSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WmiSource {
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    fn connect(&self) -> Result<WMIConnection, SourceError> {
        let com = COMLibrary::new()
            .or_else(|_| COMLibrary::without_security())
            .map_err(|e| SourceError::Transport(format!("COM initialisation failed: {}", e)))?;
        WMIConnection::with_namespace_path(&self.namespace, com.into())
            .map_err(|e| SourceError::Transport(format!("{}: {}", self.namespace, e)))
    }
}

impl CounterSource for WmiSource {
    fn query<T: CounterClass>(
        &self,
        ctx: &ScrapeContext,
        query: &str,
    ) -> Result<Vec<T>, SourceError> {
        if ctx.is_cancelled() {
            return Err(SourceError::Cancelled);
        }

        CONNECTION.with(|cell| {
            let mut slot = cell.borrow_mut();
            let stale = !matches!(&*slot, Some((ns, _)) if *ns == self.namespace);
            if stale {
                *slot = Some((self.namespace.clone(), self.connect()?));
            }
            let Some((_, conn)) = slot.as_ref() else {
                return Err(SourceError::Transport("no WMI connection".to_string()));
            };

            let result = conn.raw_query::<T>(query);
            if result.is_err() {
                // Force a reconnect on the next query.
                *slot = None;
            }
            result.map_err(|e| SourceError::Transport(e.to_string()))
        })
    }
}
