//! Record shapes for the performance-counter classes.
//!
//! Field names follow the WMI property names. Where WMI spells a property
//! differently from its documented counter name (`RequestsPersec` vs
//! `RequestsPerSec`), both spellings are accepted.

use serde::Deserialize;

use super::traits::CounterClass;

/// `MSExchange ADAccess Processes`, one row per process using AD access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdAccessProcesses {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "LDAPReadTime")]
    pub ldap_read_time: u64,
    #[serde(rename = "LDAPSearchTime")]
    pub ldap_search_time: u64,
    #[serde(rename = "LDAPTimeoutErrorsPerSec", alias = "LDAPTimeoutErrorsPersec")]
    pub ldap_timeout_errors_per_sec: u64,
    #[serde(
        rename = "LongRunningLDAPOperationsPerMin",
        alias = "LongRunningLDAPOperationsPermin"
    )]
    pub long_running_ldap_operations_per_min: u64,
    #[serde(
        rename = "LDAPSearchesTimeLimitExceededPerMinute",
        alias = "LDAPSearchesTimeLimitExceededperMinute"
    )]
    pub ldap_searches_time_limit_exceeded_per_min: u64,
}

impl CounterClass for AdAccessProcesses {
    const CLASS_NAME: &'static str =
        "Win32_PerfRawData_MSExchangeADAccess_MSExchangeADAccessProcesses";

    fn instance_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// `MSExchangeTransport Queues`, one row per queue priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportQueues {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "ExternalActiveRemoteDeliveryQueueLength")]
    pub external_active_remote_delivery_queue_length: u64,
    #[serde(rename = "InternalActiveRemoteDeliveryQueueLength")]
    pub internal_active_remote_delivery_queue_length: u64,
    #[serde(rename = "ActiveMailboxDeliveryQueueLength")]
    pub active_mailbox_delivery_queue_length: u64,
    #[serde(rename = "RetryMailboxDeliveryQueueLength")]
    pub retry_mailbox_delivery_queue_length: u64,
    #[serde(rename = "UnreachableQueueLength")]
    pub unreachable_queue_length: u64,
    #[serde(rename = "ExternalLargestDeliveryQueueLength")]
    pub external_largest_delivery_queue_length: u64,
    #[serde(rename = "InternalLargestDeliveryQueueLength")]
    pub internal_largest_delivery_queue_length: u64,
    #[serde(rename = "PoisonQueueLength")]
    pub poison_queue_length: u64,
}

impl CounterClass for TransportQueues {
    const CLASS_NAME: &'static str =
        "Win32_PerfRawData_MSExchangeTransportQueues_MSExchangeTransportQueues";

    fn instance_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// `MSExchange Database ==> Instances`, one row per database instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseInstances {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "IODatabaseReadsAverageLatency")]
    pub io_database_reads_average_latency: u64,
    #[serde(rename = "IODatabaseWritesAverageLatency")]
    pub io_database_writes_average_latency: u64,
    #[serde(rename = "IOLogWritesAverageLatency")]
    pub io_log_writes_average_latency: u64,
    #[serde(rename = "IODatabaseReadsRecoveryAverageLatency")]
    pub io_database_reads_recovery_average_latency: u64,
    #[serde(rename = "IODatabaseWritesRecoveryAverageLatency")]
    pub io_database_writes_recovery_average_latency: u64,
}

impl CounterClass for DatabaseInstances {
    const CLASS_NAME: &'static str = "Win32_PerfRawData_ESE_MSExchangeDatabaseInstances";

    fn instance_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// `MSExchange HttpProxy`, one row per proxied protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpProxy {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "MailboxServerLocatorAverageLatency")]
    pub mailbox_server_locator_average_latency: u64,
    #[serde(rename = "AverageAuthenticationLatency")]
    pub average_authentication_latency: u64,
    #[serde(rename = "AverageClientAccessServerProcessingLatency")]
    pub average_client_access_server_processing_latency: u64,
    #[serde(rename = "MailboxServerProxyFailureRate")]
    pub mailbox_server_proxy_failure_rate: u64,
    #[serde(rename = "OutstandingProxyRequests")]
    pub outstanding_proxy_requests: u64,
    #[serde(rename = "ProxyRequestsPerSec", alias = "ProxyRequestsPersec")]
    pub proxy_requests_per_sec: u64,
}

impl CounterClass for HttpProxy {
    const CLASS_NAME: &'static str = "Win32_PerfRawData_MSExchangeHttpProxy_MSExchangeHttpProxy";

    fn instance_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// `MSExchange ActiveSync` (singleton).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActiveSync {
    #[serde(rename = "RequestsPerSec", alias = "RequestsPersec")]
    pub requests_per_sec: u64,
    #[serde(rename = "RequestsTotal")]
    pub requests_total: u64,
    #[serde(rename = "PingCommandsPending")]
    pub ping_commands_pending: u64,
    #[serde(rename = "SyncCommandsPerSec", alias = "SyncCommandsPersec")]
    pub sync_commands_per_sec: u64,
}

impl CounterClass for ActiveSync {
    const CLASS_NAME: &'static str = "Win32_PerfRawData_MSExchangeActiveSync_MSExchangeActiveSync";
}

/// `MSExchange Availability Service` (singleton).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AvailabilityService {
    #[serde(rename = "RequestsSec", alias = "AvailabilityRequestssec")]
    pub requests_sec: u64,
}

impl CounterClass for AvailabilityService {
    const CLASS_NAME: &'static str =
        "Win32_PerfRawData_MSExchangeAvailabilityService_MSExchangeAvailabilityService";
}

/// `MSExchange OWA` (singleton).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Owa {
    #[serde(rename = "CurrentUniqueUsers")]
    pub current_unique_users: u64,
    #[serde(rename = "RequestsPerSec", alias = "RequestsPersec")]
    pub requests_per_sec: u64,
}

impl CounterClass for Owa {
    const CLASS_NAME: &'static str = "Win32_PerfRawData_MSExchangeOWA_MSExchangeOWA";
}

/// `MSExchangeAutodiscover` (singleton).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Autodiscover {
    #[serde(rename = "RequestsPerSec", alias = "RequestsPersec")]
    pub requests_per_sec: u64,
}

impl CounterClass for Autodiscover {
    const CLASS_NAME: &'static str =
        "Win32_PerfRawData_MSExchangeAutodiscover_MSExchangeAutodiscover";
}

/// `MSExchange WorkloadManagement Workloads`.
///
/// WMI reports one row per workload with a `Name`; the exporter treats the
/// class as a singleton and projects the first row only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkloadManagement {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "ActiveTasks")]
    pub active_tasks: u64,
    #[serde(rename = "CompletedTasks")]
    pub completed_tasks: u64,
    #[serde(rename = "QueuedTasks")]
    pub queued_tasks: u64,
}

impl CounterClass for WorkloadManagement {
    const CLASS_NAME: &'static str = "Win32_PerfRawData_MSExchangeWorkloadManagementWorkloads_MSExchangeWorkloadManagementWorkloads";

    fn instance_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// `MSExchange RpcClientAccess` (singleton).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RpcClientAccess {
    #[serde(rename = "RPCAveragedLatency")]
    pub rpc_averaged_latency: u64,
    #[serde(rename = "RPCRequests")]
    pub rpc_requests: u64,
    #[serde(rename = "ActiveUserCount")]
    pub active_user_count: u64,
    #[serde(rename = "ConnectionCount")]
    pub connection_count: u64,
    #[serde(rename = "RPCOperationsPerSec", alias = "RPCOperationsPersec")]
    pub rpc_operations_per_sec: u64,
    #[serde(rename = "UserCount")]
    pub user_count: u64,
}

impl CounterClass for RpcClientAccess {
    const CLASS_NAME: &'static str =
        "Win32_PerfRawData_MSExchangeRpcClientAccess_MSExchangeRpcClientAccess";
}

/// `Process` performance object, one row per process instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcessCounters {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "IDProcess")]
    pub id_process: u32,
    #[serde(rename = "IOReadBytesPersec", alias = "IOReadBytesPerSec")]
    pub io_read_bytes_persec: u64,
    #[serde(rename = "IOWriteBytesPersec", alias = "IOWriteBytesPerSec")]
    pub io_write_bytes_persec: u64,
    #[serde(rename = "PrivateBytes")]
    pub private_bytes: u64,
    #[serde(rename = "PageFaultsPersec", alias = "PageFaultsPerSec")]
    pub page_faults_persec: u64,
    #[serde(rename = "ThreadCount")]
    pub thread_count: u64,
}

impl CounterClass for ProcessCounters {
    const CLASS_NAME: &'static str = "Win32_PerfRawData_PerfProc_Process";

    fn instance_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn process_id(&self) -> Option<u32> {
        Some(self.id_process)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names_are_distinct() {
        let names = [
            AdAccessProcesses::CLASS_NAME,
            TransportQueues::CLASS_NAME,
            DatabaseInstances::CLASS_NAME,
            HttpProxy::CLASS_NAME,
            ActiveSync::CLASS_NAME,
            AvailabilityService::CLASS_NAME,
            Owa::CLASS_NAME,
            Autodiscover::CLASS_NAME,
            WorkloadManagement::CLASS_NAME,
            RpcClientAccess::CLASS_NAME,
            ProcessCounters::CLASS_NAME,
        ];
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(names.iter().all(|n| n.starts_with("Win32_PerfRawData_")));
    }

    #[test]
    fn test_instance_name_only_for_named_classes() {
        let ad = AdAccessProcesses {
            name: Some("w3wp".into()),
            ..Default::default()
        };
        assert_eq!(ad.instance_name(), Some("w3wp"));
        assert_eq!(ActiveSync::default().instance_name(), None);
        assert_eq!(Owa::default().process_id(), None);
    }

    #[test]
    fn test_process_id() {
        let proc = ProcessCounters {
            name: Some("svchost".into()),
            id_process: 1234,
            ..Default::default()
        };
        assert_eq!(proc.process_id(), Some(1234));
    }
}
