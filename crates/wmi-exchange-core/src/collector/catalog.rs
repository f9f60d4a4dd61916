//! The closed catalog of collectors.

use std::str::FromStr;

use crate::metrics::{EXCHANGE_SUBSYSTEM, PROCTEST_SUBSYSTEM};
use crate::selection::SelectionError;
use crate::source::classes::{
    ActiveSync, AdAccessProcesses, Autodiscover, AvailabilityService, DatabaseInstances,
    HttpProxy, Owa, ProcessCounters, RpcClientAccess, TransportQueues, WorkloadManagement,
};
use crate::source::traits::CounterClass;

/// Spelling of `auto_discover` used by older releases.
const LEGACY_AUTO_DISCOVER: &str = "auto_descover";

/// Stable identifier of a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectorId {
    AdAccessProcs,
    TransportQueues,
    DatabaseInstances,
    HttpProxy,
    ActiveSync,
    AvailabilityService,
    Owa,
    AutoDiscover,
    ManagementWorkloads,
    RpcClientAccess,
    Proctest,
}

impl CollectorId {
    /// Every collector, in declaration order.
    pub const ALL: [CollectorId; 11] = [
        CollectorId::AdAccessProcs,
        CollectorId::TransportQueues,
        CollectorId::DatabaseInstances,
        CollectorId::HttpProxy,
        CollectorId::ActiveSync,
        CollectorId::AvailabilityService,
        CollectorId::Owa,
        CollectorId::AutoDiscover,
        CollectorId::ManagementWorkloads,
        CollectorId::RpcClientAccess,
        CollectorId::Proctest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CollectorId::AdAccessProcs => "ad_access_procs",
            CollectorId::TransportQueues => "transport_queues",
            CollectorId::DatabaseInstances => "database_instances",
            CollectorId::HttpProxy => "http_proxy",
            CollectorId::ActiveSync => "active_sync",
            CollectorId::AvailabilityService => "availability_service",
            CollectorId::Owa => "owa",
            CollectorId::AutoDiscover => "auto_discover",
            CollectorId::ManagementWorkloads => "management_workloads",
            CollectorId::RpcClientAccess => "rpc_client_access",
            CollectorId::Proctest => "proctest",
        }
    }

    /// The counter class this collector queries.
    pub fn class_name(self) -> &'static str {
        match self {
            CollectorId::AdAccessProcs => AdAccessProcesses::CLASS_NAME,
            CollectorId::TransportQueues => TransportQueues::CLASS_NAME,
            CollectorId::DatabaseInstances => DatabaseInstances::CLASS_NAME,
            CollectorId::HttpProxy => HttpProxy::CLASS_NAME,
            CollectorId::ActiveSync => ActiveSync::CLASS_NAME,
            CollectorId::AvailabilityService => AvailabilityService::CLASS_NAME,
            CollectorId::Owa => Owa::CLASS_NAME,
            CollectorId::AutoDiscover => Autodiscover::CLASS_NAME,
            CollectorId::ManagementWorkloads => WorkloadManagement::CLASS_NAME,
            CollectorId::RpcClientAccess => RpcClientAccess::CLASS_NAME,
            CollectorId::Proctest => ProcessCounters::CLASS_NAME,
        }
    }

    pub fn subsystem(self) -> &'static str {
        match self {
            CollectorId::Proctest => PROCTEST_SUBSYSTEM,
            _ => EXCHANGE_SUBSYSTEM,
        }
    }

    /// Human description shown by the collector listing.
    pub fn description(self) -> String {
        format!("(WMI Class: {})", self.class_name())
    }

    /// Resolves an identifier, also accepting legacy spellings.
    ///
    /// The flag is true when a legacy spelling was used.
    pub fn lookup(id: &str) -> Option<(CollectorId, bool)> {
        if id == LEGACY_AUTO_DISCOVER {
            return Some((CollectorId::AutoDiscover, true));
        }
        Self::ALL
            .iter()
            .find(|c| c.as_str() == id)
            .map(|&c| (c, false))
    }
}

impl FromStr for CollectorId {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
            .map(|(id, _)| id)
            .ok_or_else(|| SelectionError::UnknownCollector { id: s.to_string() })
    }
}

impl std::fmt::Display for CollectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
