//! Field tables for the Exchange counter classes.

use super::class::FieldSpec;
use crate::source::classes::{
    ActiveSync, AdAccessProcesses, Autodiscover, AvailabilityService, DatabaseInstances,
    HttpProxy, Owa, RpcClientAccess, TransportQueues, WorkloadManagement,
};

pub fn ad_access_processes() -> Vec<FieldSpec<AdAccessProcesses>> {
    type Spec = FieldSpec<AdAccessProcesses>;

    vec![
        Spec::counter("ldap_read_time", "LDAP Read Time", |r| r.ldap_read_time),
        Spec::counter("ldap_search_time", "LDAP Search Time", |r| {
            r.ldap_search_time
        }),
        Spec::counter(
            "ldap_timeout_errors_per_sec",
            "LDAP timeout errors per second",
            |r| r.ldap_timeout_errors_per_sec,
        ),
        Spec::counter(
            "long_running_ldap_operations_per_min",
            "Long Running LDAP operations per minute",
            |r| r.long_running_ldap_operations_per_min,
        ),
        Spec::counter(
            "ldap_searches_time_limit_exceeded_per_min",
            "LDAP searches time limit exceeded per minute",
            |r| r.ldap_searches_time_limit_exceeded_per_min,
        ),
    ]
}

pub fn transport_queues() -> Vec<FieldSpec<TransportQueues>> {
    type Spec = FieldSpec<TransportQueues>;

    vec![
        Spec::gauge(
            "external_active_remote_delivery_queue_len",
            "External Active Remote Delivery Queue length",
            |r| r.external_active_remote_delivery_queue_length,
        ),
        Spec::gauge(
            "internal_active_remote_delivery_queue_len",
            "Internal Active Remote Delivery Queue length",
            |r| r.internal_active_remote_delivery_queue_length,
        ),
        Spec::gauge(
            "active_mailbox_delivery_queue_len",
            "Active Mailbox Delivery Queue length",
            |r| r.active_mailbox_delivery_queue_length,
        ),
        Spec::gauge(
            "retry_mailbox_delivery_queue_len",
            "Retry Mailbox Delivery Queue length",
            |r| r.retry_mailbox_delivery_queue_length,
        ),
        Spec::gauge("unreachable_queue_len", "Unreachable Queue length", |r| {
            r.unreachable_queue_length
        }),
        Spec::gauge(
            "external_largest_delivery_queue_len",
            "External Largest Delivery Queue length",
            |r| r.external_largest_delivery_queue_length,
        ),
        // Exported name is misspelt; keep it.
        Spec::gauge(
            "inernal_largest_delivery_queue_len",
            "Internal Largest Delivery Queue length",
            |r| r.internal_largest_delivery_queue_length,
        ),
        Spec::gauge("poison_queue_len", "Poison Queue length", |r| {
            r.poison_queue_length
        }),
    ]
}

pub fn database_instances() -> Vec<FieldSpec<DatabaseInstances>> {
    type Spec = FieldSpec<DatabaseInstances>;

    vec![
        Spec::counter(
            "io_database_reads_average_latency",
            "Average database read latency",
            |r| r.io_database_reads_average_latency,
        ),
        Spec::counter(
            "io_database_writes_average_latency",
            "Average database write latency",
            |r| r.io_database_writes_average_latency,
        ),
        Spec::counter(
            "io_log_writes_average_latency",
            "Average Log Writes Latency",
            |r| r.io_log_writes_average_latency,
        ),
        Spec::counter(
            "io_database_reads_recovery_average_latency",
            "Database reads recovery average latency",
            |r| r.io_database_reads_recovery_average_latency,
        ),
        Spec::counter(
            "io_database_writes_recovery_average_latency",
            "Database writes recovery average latency",
            |r| r.io_database_writes_recovery_average_latency,
        ),
    ]
}

pub fn http_proxy() -> Vec<FieldSpec<HttpProxy>> {
    type Spec = FieldSpec<HttpProxy>;

    vec![
        Spec::counter(
            "mailbox_server_locator_average_latency",
            "Exchange HTTP Proxy Mailbox Server Locator latency (avg)",
            |r| r.mailbox_server_locator_average_latency,
        ),
        Spec::counter(
            "average_authentication_latency",
            "Exchange HTTP Proxy Authentication Latency (avg)",
            |r| r.average_authentication_latency,
        ),
        Spec::counter(
            "average_client_access_server_processing_latency",
            "Exchange HTTP Proxy Client Access Server Processing Latency (avg)",
            |r| r.average_client_access_server_processing_latency,
        ),
        Spec::counter(
            "mailbox_server_proxy_failure_rate",
            "Exchange HTTP Proxy Mailbox Server Proxy Failure Rate",
            |r| r.mailbox_server_proxy_failure_rate,
        ),
        Spec::gauge(
            "outstanding_proxy_requests",
            "Exchange HTTP Proxy outstanding proxy requests",
            |r| r.outstanding_proxy_requests,
        ),
        Spec::counter(
            "proxy_requests_per_sec",
            "Exchange HTTP Proxy requests/s",
            |r| r.proxy_requests_per_sec,
        ),
    ]
}

pub fn active_sync() -> Vec<FieldSpec<ActiveSync>> {
    type Spec = FieldSpec<ActiveSync>;

    vec![
        Spec::counter(
            "active_sync_requests_per_sec",
            "Active Sync requests/s",
            |r| r.requests_per_sec,
        ),
        Spec::gauge(
            "ping_commands_pending",
            "Pending Active Sync ping-commands",
            |r| r.ping_commands_pending,
        ),
        Spec::counter(
            "sync_commands_per_sec",
            "Active Sync sync-commands/s",
            |r| r.sync_commands_per_sec,
        ),
    ]
}

pub fn availability_service() -> Vec<FieldSpec<AvailabilityService>> {
    type Spec = FieldSpec<AvailabilityService>;

    vec![Spec::counter(
        "availability_requests_per_sec",
        "Availability Service / Availability requests/s",
        |r| r.requests_sec,
    )]
}

pub fn owa() -> Vec<FieldSpec<Owa>> {
    type Spec = FieldSpec<Owa>;

    vec![
        Spec::gauge(
            "current_unique_users",
            "Outlook Web Access current unique users",
            |r| r.current_unique_users,
        ),
        Spec::counter(
            "owa_requests_per_sec",
            "Outlook Web Access requests/s",
            |r| r.requests_per_sec,
        ),
    ]
}

pub fn autodiscover() -> Vec<FieldSpec<Autodiscover>> {
    type Spec = FieldSpec<Autodiscover>;

    vec![Spec::counter(
        "autodiscover_requests_per_sec",
        "Autodiscovery requests/s",
        |r| r.requests_per_sec,
    )]
}

pub fn workload_management() -> Vec<FieldSpec<WorkloadManagement>> {
    type Spec = FieldSpec<WorkloadManagement>;

    vec![
        Spec::gauge("active_tasks", "Active Workload Management Tasks", |r| {
            r.active_tasks
        }),
        Spec::counter(
            "completed_tasks",
            "Completed Workload Management Tasks",
            |r| r.completed_tasks,
        ),
        Spec::gauge("queued_tasks", "Queued Workload Management Tasks", |r| {
            r.queued_tasks
        }),
    ]
}

pub fn rpc_client_access() -> Vec<FieldSpec<RpcClientAccess>> {
    type Spec = FieldSpec<RpcClientAccess>;

    vec![
        Spec::counter(
            "rpc_averaged_latency",
            "RPC Client Access averaged latency",
            |r| r.rpc_averaged_latency,
        ),
        Spec::counter("rpc_requests", "RPC Client Access requests", |r| {
            r.rpc_requests
        }),
        Spec::gauge(
            "active_user_count",
            "RPC Client Access active user count",
            |r| r.active_user_count,
        ),
        Spec::counter(
            "connection_count",
            "RPC Client Access connection count",
            |r| r.connection_count,
        ),
        Spec::counter(
            "rpc_operations_per_sec",
            "RPC Client Access operations per sec",
            |r| r.rpc_operations_per_sec,
        ),
        Spec::counter("user_count", "RPC Client Access user count", |r| {
            r.user_count
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SampleKind;

    fn kinds<T>(fields: &[FieldSpec<T>]) -> Vec<(&'static str, SampleKind)> {
        fields.iter().map(|f| (f.name, f.kind)).collect()
    }

    #[test]
    fn test_transport_queue_fields_are_gauges() {
        let fields = transport_queues();
        assert_eq!(fields.len(), 8);
        assert!(fields.iter().all(|f| f.kind == SampleKind::Gauge));
        assert!(fields.iter().any(|f| f.name == "inernal_largest_delivery_queue_len"));
    }

    #[test]
    fn test_rates_and_latencies_are_counters() {
        let mut all = kinds(&ad_access_processes());
        all.extend(kinds(&database_instances()));
        all.extend(kinds(&http_proxy()));
        all.extend(kinds(&active_sync()));
        all.extend(kinds(&availability_service()));
        all.extend(kinds(&owa()));
        all.extend(kinds(&autodiscover()));
        all.extend(kinds(&rpc_client_access()));

        for (name, kind) in all {
            if name.ends_with("_per_sec")
                || name.ends_with("_per_min")
                || name.ends_with("_latency")
            {
                assert_eq!(kind, SampleKind::Counter, "{}", name);
            }
        }
    }

    #[test]
    fn test_rpc_client_access_kinds() {
        assert_eq!(
            kinds(&rpc_client_access()),
            [
                ("rpc_averaged_latency", SampleKind::Counter),
                ("rpc_requests", SampleKind::Counter),
                ("active_user_count", SampleKind::Gauge),
                ("connection_count", SampleKind::Counter),
                ("rpc_operations_per_sec", SampleKind::Counter),
                ("user_count", SampleKind::Counter),
            ]
        );
    }

    #[test]
    fn test_workload_and_owa_kinds() {
        assert_eq!(
            kinds(&workload_management()),
            [
                ("active_tasks", SampleKind::Gauge),
                ("completed_tasks", SampleKind::Counter),
                ("queued_tasks", SampleKind::Gauge),
            ]
        );
        assert_eq!(kinds(&owa())[0], ("current_unique_users", SampleKind::Gauge));
    }

    #[test]
    fn test_accessors_read_their_own_field() {
        let row = ActiveSync {
            requests_per_sec: 10,
            requests_total: 99,
            ping_commands_pending: 2,
            sync_commands_per_sec: 3,
        };
        let values: Vec<u64> = active_sync().iter().map(|f| (f.value)(&row)).collect();
        assert_eq!(values, [10, 2, 3]);
    }
}
