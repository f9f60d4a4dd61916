//! Pre-built mock sources for testing.
//!
//! These scenarios provide realistic WMI states of an Exchange mailbox
//! server for testing collectors and the exporter end to end.

use super::source::MockSource;
use crate::source::classes::{
    ActiveSync, AdAccessProcesses, Autodiscover, AvailabilityService, DatabaseInstances,
    HttpProxy, Owa, ProcessCounters, RpcClientAccess, TransportQueues, WorkloadManagement,
};

impl MockSource {
    /// Creates a typical Exchange server with every catalog class populated.
    ///
    /// Per-instance classes include a `_Total` row, as WMI reports it.
    pub fn typical_exchange_server() -> Self {
        let mut source = Self::new();

        source.set_rows(vec![
            AdAccessProcesses {
                name: Some("MSExchangeTransport".into()),
                ldap_read_time: 12,
                ldap_search_time: 31,
                ldap_timeout_errors_per_sec: 0,
                long_running_ldap_operations_per_min: 1,
                ldap_searches_time_limit_exceeded_per_min: 0,
            },
            AdAccessProcesses {
                name: Some("w3wp MSExchangeOWAAppPool".into()),
                ldap_read_time: 8,
                ldap_search_time: 17,
                ldap_timeout_errors_per_sec: 2,
                long_running_ldap_operations_per_min: 0,
                ldap_searches_time_limit_exceeded_per_min: 1,
            },
            AdAccessProcesses {
                name: Some("_Total".into()),
                ldap_read_time: 20,
                ldap_search_time: 48,
                ldap_timeout_errors_per_sec: 2,
                long_running_ldap_operations_per_min: 1,
                ldap_searches_time_limit_exceeded_per_min: 1,
            },
        ]);

        source.set_rows(vec![
            TransportQueues {
                name: Some("normal priority".into()),
                external_active_remote_delivery_queue_length: 3,
                internal_active_remote_delivery_queue_length: 1,
                active_mailbox_delivery_queue_length: 4,
                retry_mailbox_delivery_queue_length: 0,
                unreachable_queue_length: 0,
                external_largest_delivery_queue_length: 2,
                internal_largest_delivery_queue_length: 1,
                poison_queue_length: 0,
            },
            TransportQueues {
                name: Some("high priority".into()),
                active_mailbox_delivery_queue_length: 1,
                ..Default::default()
            },
            TransportQueues {
                name: Some("_Total".into()),
                external_active_remote_delivery_queue_length: 3,
                internal_active_remote_delivery_queue_length: 1,
                active_mailbox_delivery_queue_length: 5,
                external_largest_delivery_queue_length: 2,
                internal_largest_delivery_queue_length: 1,
                ..Default::default()
            },
        ]);

        source.set_rows(vec![
            DatabaseInstances {
                name: Some("Information Store - Mailbox Database 0311695863".into()),
                io_database_reads_average_latency: 1_840,
                io_database_writes_average_latency: 2_210,
                io_log_writes_average_latency: 310,
                io_database_reads_recovery_average_latency: 0,
                io_database_writes_recovery_average_latency: 0,
            },
            DatabaseInstances {
                name: Some("_Total".into()),
                io_database_reads_average_latency: 1_840,
                io_database_writes_average_latency: 2_210,
                io_log_writes_average_latency: 310,
                ..Default::default()
            },
        ]);

        source.set_rows(vec![
            HttpProxy {
                name: Some("owa".into()),
                mailbox_server_locator_average_latency: 5,
                average_authentication_latency: 11,
                average_client_access_server_processing_latency: 3,
                mailbox_server_proxy_failure_rate: 0,
                outstanding_proxy_requests: 2,
                proxy_requests_per_sec: 921,
            },
            HttpProxy {
                name: Some("rpchttp".into()),
                mailbox_server_locator_average_latency: 4,
                average_authentication_latency: 9,
                average_client_access_server_processing_latency: 2,
                mailbox_server_proxy_failure_rate: 1,
                outstanding_proxy_requests: 0,
                proxy_requests_per_sec: 4_410,
            },
        ]);

        source.set_rows(vec![ActiveSync {
            requests_per_sec: 10_442,
            requests_total: 10_442,
            ping_commands_pending: 14,
            sync_commands_per_sec: 3_208,
        }]);

        source.set_rows(vec![AvailabilityService { requests_sec: 611 }]);

        source.set_rows(vec![Owa {
            current_unique_users: 37,
            requests_per_sec: 18_093,
        }]);

        source.set_rows(vec![Autodiscover {
            requests_per_sec: 2_774,
        }]);

        source.set_rows(vec![
            WorkloadManagement {
                name: Some("msexchangemailboxassistants_mailboxassistants".into()),
                active_tasks: 2,
                completed_tasks: 9_318,
                queued_tasks: 0,
            },
            WorkloadManagement {
                name: Some("msexchangerepl_replication".into()),
                active_tasks: 0,
                completed_tasks: 112,
                queued_tasks: 1,
            },
        ]);

        source.set_rows(vec![RpcClientAccess {
            rpc_averaged_latency: 6,
            rpc_requests: 51_027,
            active_user_count: 21,
            connection_count: 64,
            rpc_operations_per_sec: 198_332,
            user_count: 29,
        }]);

        source.set_rows(vec![
            ProcessCounters {
                name: Some("System".into()),
                id_process: 4,
                io_read_bytes_persec: 1_048_576,
                io_write_bytes_persec: 524_288,
                private_bytes: 188_416,
                page_faults_persec: 18_220,
                thread_count: 212,
            },
            ProcessCounters {
                name: Some("svchost".into()),
                id_process: 1234,
                io_read_bytes_persec: 7,
                io_write_bytes_persec: 8,
                private_bytes: 9,
                page_faults_persec: 10,
                thread_count: 11,
            },
            ProcessCounters {
                name: Some("_Total".into()),
                id_process: 0,
                io_read_bytes_persec: 1_048_583,
                io_write_bytes_persec: 524_296,
                private_bytes: 188_425,
                page_faults_persec: 18_230,
                thread_count: 223,
            },
        ]);

        source
    }

    /// Creates a host without Exchange installed: only the process class exists.
    pub fn plain_windows_host() -> Self {
        let mut source = Self::new();
        source.set_rows(vec![ProcessCounters {
            name: Some("explorer".into()),
            id_process: 5120,
            io_read_bytes_persec: 40_960,
            io_write_bytes_persec: 4_096,
            private_bytes: 61_440_000,
            page_faults_persec: 92_114,
            thread_count: 68,
        }]);
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScrapeContext;
    use crate::source::traits::CounterSource;

    #[test]
    fn test_typical_exchange_server_has_every_class() {
        let source = MockSource::typical_exchange_server();
        let ctx = ScrapeContext::background();

        assert_eq!(source.query::<AdAccessProcesses>(&ctx, "q").unwrap().len(), 3);
        assert_eq!(source.query::<TransportQueues>(&ctx, "q").unwrap().len(), 3);
        assert_eq!(source.query::<DatabaseInstances>(&ctx, "q").unwrap().len(), 2);
        assert_eq!(source.query::<HttpProxy>(&ctx, "q").unwrap().len(), 2);
        assert_eq!(source.query::<ActiveSync>(&ctx, "q").unwrap().len(), 1);
        assert_eq!(source.query::<AvailabilityService>(&ctx, "q").unwrap().len(), 1);
        assert_eq!(source.query::<Owa>(&ctx, "q").unwrap().len(), 1);
        assert_eq!(source.query::<Autodiscover>(&ctx, "q").unwrap().len(), 1);
        assert_eq!(source.query::<WorkloadManagement>(&ctx, "q").unwrap().len(), 2);
        assert_eq!(source.query::<RpcClientAccess>(&ctx, "q").unwrap().len(), 1);
        assert_eq!(source.query::<ProcessCounters>(&ctx, "q").unwrap().len(), 3);
    }

    #[test]
    fn test_plain_windows_host_has_no_exchange() {
        let source = MockSource::plain_windows_host();
        let ctx = ScrapeContext::background();

        assert!(source.query::<Owa>(&ctx, "q").is_err());
        assert_eq!(source.query::<ProcessCounters>(&ctx, "q").unwrap().len(), 1);
    }
}
