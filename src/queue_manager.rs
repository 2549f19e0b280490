//! Queue manager connection handle.
//!
//! Owns one logical connection to a queue manager: idempotent connect,
//! guaranteed release on every exit path via [`ConnectionGuard`], and the
//! administrative pass-throughs (list queues/channels, create/delete queue,
//! queue statistics), each guarded by a connected precondition.

use crate::error::{AdminError, ConnectionError, PreconditionError};
use crate::structures::{
    ChannelDescriptor, ConnectOptions, Credentials, QueueStats,
};
use crate::transport::{
    AdminCommand, AdminRecord, ConnectionHandle, MqTransport, ReasonCode, TransportError,
};
use std::cell::Cell;

/// Maximum depth given to queues created without an explicit one.
pub const DEFAULT_QUEUE_DEPTH: u32 = 5000;

// ---------------------------------------------------------------------------
//  Queue manager handle
// ---------------------------------------------------------------------------

/// A handle to one queue manager.
///
/// ```no_run
/// use wmq::{Broker, QueueManager};
///
/// let broker = Broker::new("TEST");
/// let qmgr = QueueManager::new(broker, "TEST", "localhost(1414)");
/// let conn = qmgr.connection()?;
/// conn.create_queue("DAVAY", 111)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// `connect` is idempotent: connecting an already-connected handle is a
/// no-op, so scoped re-entries never double-connect. The handle is not
/// internally synchronized; one handle belongs to one flow of control.
#[derive(Debug)]
pub struct QueueManager<T: MqTransport> {
    name: String,
    channel: ChannelDescriptor,
    credentials: Credentials,
    options: ConnectOptions,
    transport: T,
    conn: Cell<Option<ConnectionHandle>>,
}

impl<T: MqTransport> QueueManager<T> {
    /// Create a disconnected handle to the named queue manager, reached
    /// through `conn_info` (`host(port)[,host(port)...]`) over the default
    /// client channel.
    pub fn new(transport: T, name: impl Into<String>, conn_info: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channel: ChannelDescriptor::client(conn_info),
            credentials: Credentials::none(),
            options: ConnectOptions::default(),
            transport,
            conn: Cell::new(None),
        }
    }

    /// Use a specific channel name instead of the default.
    pub fn with_channel(mut self, channel_name: impl Into<String>) -> Self {
        self.channel.channel_name = channel_name.into();
        self
    }

    /// Present credentials when connecting.
    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Credentials {
            user: Some(user.into()),
            password,
        };
        self
    }

    /// Queue manager name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Connection string this handle was configured with.
    pub fn conn_info(&self) -> &str {
        &self.channel.connection_name
    }

    /// Channel descriptor this handle connects through.
    pub fn channel(&self) -> &ChannelDescriptor {
        &self.channel
    }

    /// Whether the connection is currently active.
    pub fn is_connected(&self) -> bool {
        self.conn.get().is_some()
    }

    /// Establish the connection. A no-op when already connected.
    pub fn connect(&self) -> Result<(), ConnectionError> {
        if self.is_connected() {
            return Ok(());
        }
        let handle = self
            .transport
            .connect(&self.name, &self.channel, &self.credentials, self.options)
            .map_err(|source| ConnectionError {
                qmgr_name: self.name.clone(),
                conn_info: self.channel.connection_name.clone(),
                source,
            })?;
        self.conn.set(Some(handle));
        tracing::info!(qmgr = %self.name, conn = %self.channel.connection_name, "connected to queue manager");
        Ok(())
    }

    /// Release the connection if active; a no-op otherwise.
    pub fn disconnect(&self) {
        if let Some(handle) = self.conn.take() {
            self.transport.disconnect(handle);
            tracing::info!(qmgr = %self.name, "disconnected from queue manager");
        }
    }

    /// Acquire a scoped connection. Connects if needed and returns a guard
    /// that disconnects on drop — but only if this acquisition opened the
    /// connection, so nested scopes reuse the outer connection and leave it
    /// up when they end.
    pub fn connection(&self) -> Result<ConnectionGuard<'_, T>, ConnectionError> {
        let owned = !self.is_connected();
        self.connect()?;
        Ok(ConnectionGuard { qmgr: self, owned })
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn connection_handle(&self) -> Option<ConnectionHandle> {
        self.conn.get()
    }

    fn require_connected(
        &self,
        operation: &'static str,
    ) -> Result<ConnectionHandle, PreconditionError> {
        self.conn.get().ok_or(PreconditionError { operation })
    }

    // -----------------------------------------------------------------------
    //  Administrative operations
    // -----------------------------------------------------------------------

    fn admin(
        &self,
        operation: &'static str,
        command: AdminCommand<'_>,
    ) -> Result<Vec<AdminRecord>, AdminError> {
        let conn = self.require_connected(operation)?;
        self.transport
            .execute_admin(conn, command)
            .map_err(|source| AdminError::Remote {
                qmgr_name: self.name.clone(),
                source,
            })
    }

    /// Map "unknown object name" to an empty list: for list operations it
    /// is a normal outcome, not an error.
    fn admin_list(
        &self,
        operation: &'static str,
        command: AdminCommand<'_>,
    ) -> Result<Vec<AdminRecord>, AdminError> {
        match self.admin(operation, command) {
            Err(AdminError::Remote { source, .. })
                if source.reason == ReasonCode::UnknownObjectName =>
            {
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Names of the queues matching a pattern (`*` suffix wildcard);
    /// empty when none match.
    pub fn list_queues(&self, pattern: &str) -> Result<Vec<String>, AdminError> {
        let records = self.admin_list("list_queues", AdminCommand::InquireQueues { pattern })?;
        let names: Vec<String> = records
            .into_iter()
            .filter_map(|r| match r {
                AdminRecord::QueueName(name) => Some(name),
                _ => None,
            })
            .collect();
        if names.is_empty() {
            tracing::info!(qmgr = %self.name, pattern, "no queues matched");
        }
        Ok(names)
    }

    /// Names of the channels matching a pattern; empty when none match.
    pub fn list_channels(&self, pattern: &str) -> Result<Vec<String>, AdminError> {
        let records =
            self.admin_list("list_channels", AdminCommand::InquireChannels { pattern })?;
        Ok(records
            .into_iter()
            .filter_map(|r| match r {
                AdminRecord::ChannelName(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    /// Create a local queue with the given maximum depth
    /// (see [`DEFAULT_QUEUE_DEPTH`]).
    pub fn create_queue(&self, name: &str, max_depth: u32) -> Result<(), AdminError> {
        self.admin(
            "create_queue",
            AdminCommand::CreateQueue { name, max_depth },
        )?;
        tracing::info!(qmgr = %self.name, queue = %name, max_depth, "created queue");
        Ok(())
    }

    /// Delete a queue, purging any remaining messages when `purge` is set.
    pub fn delete_queue(&self, name: &str, purge: bool) -> Result<(), AdminError> {
        self.admin("delete_queue", AdminCommand::DeleteQueue { name, purge })?;
        tracing::info!(qmgr = %self.name, queue = %name, "deleted queue");
        Ok(())
    }

    /// Fetch and reset the statistics of a queue.
    pub fn queue_stats(&self, name: &str) -> Result<QueueStats, AdminError> {
        let records = self.admin("queue_stats", AdminCommand::ResetQueueStats { name })?;
        records
            .into_iter()
            .find_map(|r| match r {
                AdminRecord::QueueStatistics(stats) => Some(stats),
                _ => None,
            })
            .ok_or_else(|| AdminError::Remote {
                qmgr_name: self.name.clone(),
                source: TransportError::new(
                    ReasonCode::Other,
                    format!("no statistics record returned for queue '{name}'"),
                ),
            })
    }
}

impl<T: MqTransport> Drop for QueueManager<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// ---------------------------------------------------------------------------
//  Connection guard
// ---------------------------------------------------------------------------

/// Scoped connection to a queue manager.
///
/// Dereferences to the [`QueueManager`] it was acquired from. On drop it
/// disconnects, on every exit path, unless the connection was already up
/// when the guard was acquired.
#[derive(Debug)]
pub struct ConnectionGuard<'a, T: MqTransport> {
    qmgr: &'a QueueManager<T>,
    owned: bool,
}

impl<T: MqTransport> std::ops::Deref for ConnectionGuard<'_, T> {
    type Target = QueueManager<T>;

    fn deref(&self) -> &Self::Target {
        self.qmgr
    }
}

impl<T: MqTransport> Drop for ConnectionGuard<'_, T> {
    fn drop(&mut self) {
        if self.owned {
            self.qmgr.disconnect();
        }
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Broker;

    fn qmgr() -> QueueManager<Broker> {
        let broker = Broker::new("TESTQM");
        broker.define_queue("TEST.Q", 100);
        QueueManager::new(broker, "TESTQM", "localhost(1414)")
    }

    #[test]
    fn test_connect_is_idempotent() {
        let qm = qmgr();
        assert!(!qm.is_connected());
        qm.connect().unwrap();
        assert!(qm.is_connected());
        // Second connect is a no-op.
        qm.connect().unwrap();
        assert!(qm.is_connected());
        qm.disconnect();
        assert!(!qm.is_connected());
        // Disconnecting again is a no-op.
        qm.disconnect();
    }

    #[test]
    fn test_connection_guard_releases_on_drop() {
        let qm = qmgr();
        {
            let conn = qm.connection().unwrap();
            assert!(conn.is_connected());
        }
        assert!(!qm.is_connected());
    }

    #[test]
    fn test_nested_guard_keeps_outer_connection() {
        let qm = qmgr();
        let outer = qm.connection().unwrap();
        {
            let _inner = outer.connection().unwrap();
        }
        // The inner scope did not tear down the outer connection.
        assert!(qm.is_connected());
        drop(outer);
        assert!(!qm.is_connected());
    }

    #[test]
    fn test_connect_unreachable_names_manager_and_conn_info() {
        let broker = Broker::new("REALQM");
        let qm = QueueManager::new(broker, "GHOSTQM", "nowhere(1414)");
        let err = qm.connect().unwrap_err();
        assert_eq!(err.qmgr_name, "GHOSTQM");
        assert_eq!(err.conn_info, "nowhere(1414)");
    }

    #[test]
    fn test_admin_requires_connection() {
        let qm = qmgr();
        let err = qm.list_queues("*").unwrap_err();
        assert!(matches!(err, AdminError::NotConnected(_)));
        let err = qm.create_queue("Q", 10).unwrap_err();
        assert!(matches!(err, AdminError::NotConnected(_)));
        let err = qm.queue_stats("TEST.Q").unwrap_err();
        assert!(matches!(err, AdminError::NotConnected(_)));
    }

    #[test]
    fn test_list_queues_no_match_is_empty() {
        let qm = qmgr();
        let conn = qm.connection().unwrap();
        assert!(conn.list_queues("NOPE.*").unwrap().is_empty());
    }

    #[test]
    fn test_create_list_delete_queue() {
        let qm = qmgr();
        let conn = qm.connection().unwrap();
        conn.create_queue("T1", 111).unwrap();
        assert_eq!(conn.list_queues("T1").unwrap(), vec!["T1".to_string()]);
        conn.delete_queue("T1", false).unwrap();
        assert!(conn.list_queues("T1").unwrap().is_empty());
    }

    #[test]
    fn test_list_channels_includes_default() {
        let qm = qmgr();
        let conn = qm.connection().unwrap();
        let channels = conn.list_channels("SYSTEM.*").unwrap();
        assert!(channels.contains(&crate::structures::DEFAULT_CHANNEL.to_string()));
    }

    #[test]
    fn test_queue_stats_record() {
        let qm = qmgr();
        let conn = qm.connection().unwrap();
        let stats = conn.queue_stats("TEST.Q").unwrap();
        assert_eq!(stats.msg_enqueue_count, 0);
        assert_eq!(stats.msg_dequeue_count, 0);
    }

    #[test]
    fn test_queue_stats_unknown_queue_is_remote_error() {
        let qm = qmgr();
        let conn = qm.connection().unwrap();
        let err = conn.queue_stats("NOSUCH.Q").unwrap_err();
        assert!(matches!(err, AdminError::Remote { .. }));
    }

    #[test]
    fn test_builder_channel_and_credentials() {
        let broker = Broker::new("TESTQM").with_channel("APP.SVRCONN");
        let qm = QueueManager::new(broker, "TESTQM", "localhost(1414)")
            .with_channel("APP.SVRCONN")
            .with_credentials("app", Some("secret".to_string()));
        assert_eq!(qm.channel().channel_name, "APP.SVRCONN");
        qm.connect().unwrap();
    }
}
