//! Boundary with the underlying middleware client.
//!
//! The access layer never talks to a queue manager directly; it drives an
//! implementation of [`MqTransport`], which owns the actual transport,
//! wire encoding and administrative command execution. Handles returned by
//! the transport are opaque — the layer composes over them instead of
//! inheriting from any client library's types.

use crate::structures::{
    ChannelDescriptor, ConnectOptions, Credentials, GetOptions, MessageDescriptor, OpenMode,
    PutOptions, QueueStats,
};
use miette::Diagnostic;
use thiserror::Error;

// ---------------------------------------------------------------------------
//  Opaque handles
// ---------------------------------------------------------------------------

/// Opaque handle to one logical connection owned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(pub u32);

/// Opaque handle to one open queue object owned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u32);

// ---------------------------------------------------------------------------
//  Transport errors
// ---------------------------------------------------------------------------

/// Classified reason for a transport failure.
///
/// The access layer branches on a handful of these: the mode-mismatch
/// reasons trigger a one-shot reopen-and-retry, `NoMessageAvailable` is a
/// normal control-flow outcome, and `UnknownObjectName` maps to an empty
/// result for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    /// No message currently available on the queue.
    NoMessageAvailable,
    /// The handle is not open for destructive or browse get.
    NotOpenForInput,
    /// The handle is not open for put.
    NotOpenForOutput,
    /// The named object does not exist.
    UnknownObjectName,
    /// The named object already exists.
    ObjectAlreadyExists,
    /// The queue is at its maximum depth.
    QueueFull,
    /// The queue still holds messages and purge was not requested.
    QueueNotEmpty,
    /// The message exceeds the caller's maximum length.
    TruncatedMessageFailed,
    /// The remote side refused the connection.
    ConnectionRefused,
    /// The connection went away while an operation was in flight.
    ConnectionBroken,
    /// The handle does not refer to a live connection or object.
    InvalidHandle,
    /// Any other failure.
    Other,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoMessageAvailable => "no message available",
            Self::NotOpenForInput => "not open for input",
            Self::NotOpenForOutput => "not open for output",
            Self::UnknownObjectName => "unknown object name",
            Self::ObjectAlreadyExists => "object already exists",
            Self::QueueFull => "queue full",
            Self::QueueNotEmpty => "queue not empty",
            Self::TruncatedMessageFailed => "message truncated",
            Self::ConnectionRefused => "connection refused",
            Self::ConnectionBroken => "connection broken",
            Self::InvalidHandle => "invalid handle",
            Self::Other => "error",
        };
        f.write_str(s)
    }
}

/// A failure reported by the middleware client.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{reason}: {detail}")]
#[diagnostic(code(wmq::transport))]
pub struct TransportError {
    /// Classified reason.
    pub reason: ReasonCode,
    /// Human-readable detail.
    pub detail: String,
}

impl TransportError {
    pub fn new(reason: ReasonCode, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

// ---------------------------------------------------------------------------
//  Administrative commands
// ---------------------------------------------------------------------------

/// One administrative request/response exchange (PCF-style), distinct from
/// message put/get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand<'a> {
    /// List queues whose names match a pattern (`*` suffix wildcard).
    InquireQueues { pattern: &'a str },
    /// List channels whose names match a pattern.
    InquireChannels { pattern: &'a str },
    /// Create a local queue with the given maximum depth.
    CreateQueue { name: &'a str, max_depth: u32 },
    /// Delete a queue, optionally purging any messages it still holds.
    DeleteQueue { name: &'a str, purge: bool },
    /// Fetch and reset the statistics of a queue.
    ResetQueueStats { name: &'a str },
}

/// One record of an administrative response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminRecord {
    /// A queue name matched by an inquire-queues exchange.
    QueueName(String),
    /// A channel name matched by an inquire-channels exchange.
    ChannelName(String),
    /// The statistics record of a reset-statistics exchange.
    QueueStatistics(QueueStats),
}

// ---------------------------------------------------------------------------
//  Transport trait
// ---------------------------------------------------------------------------

/// The underlying middleware client.
///
/// A get with a non-zero wait bound blocks the calling thread for up to
/// that bound, so implementations must be callable from multiple threads;
/// the access layer itself adds no locking on top.
pub trait MqTransport {
    /// Establish a connection to the named queue manager.
    fn connect(
        &self,
        qmgr_name: &str,
        channel: &ChannelDescriptor,
        credentials: &Credentials,
        options: ConnectOptions,
    ) -> Result<ConnectionHandle, TransportError>;

    /// Release a connection. Unknown handles are ignored.
    fn disconnect(&self, conn: ConnectionHandle);

    /// Open a queue in the given access mode.
    fn open_queue(
        &self,
        conn: ConnectionHandle,
        name: &str,
        mode: OpenMode,
    ) -> Result<ObjectHandle, TransportError>;

    /// Close an open queue object.
    fn close_queue(&self, conn: ConnectionHandle, obj: ObjectHandle)
        -> Result<(), TransportError>;

    /// Write a message to an open queue.
    fn put(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
        payload: &[u8],
        options: &PutOptions,
    ) -> Result<(), TransportError>;

    /// Read or browse a message from an open queue. On success the
    /// descriptor is filled with the retrieved message's metadata; a
    /// selective descriptor constrains which message a destructive get may
    /// match.
    fn get(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
        max_length: Option<usize>,
        descriptor: &mut MessageDescriptor,
        options: &GetOptions,
    ) -> Result<Vec<u8>, TransportError>;

    /// Current depth of an open queue.
    fn inquire_depth(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
    ) -> Result<u32, TransportError>;

    /// Execute one administrative request/response exchange.
    fn execute_admin(
        &self,
        conn: ConnectionHandle,
        command: AdminCommand<'_>,
    ) -> Result<Vec<AdminRecord>, TransportError>;
}

impl<T: MqTransport + ?Sized> MqTransport for std::sync::Arc<T> {
    fn connect(
        &self,
        qmgr_name: &str,
        channel: &ChannelDescriptor,
        credentials: &Credentials,
        options: ConnectOptions,
    ) -> Result<ConnectionHandle, TransportError> {
        (**self).connect(qmgr_name, channel, credentials, options)
    }

    fn disconnect(&self, conn: ConnectionHandle) {
        (**self).disconnect(conn);
    }

    fn open_queue(
        &self,
        conn: ConnectionHandle,
        name: &str,
        mode: OpenMode,
    ) -> Result<ObjectHandle, TransportError> {
        (**self).open_queue(conn, name, mode)
    }

    fn close_queue(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
    ) -> Result<(), TransportError> {
        (**self).close_queue(conn, obj)
    }

    fn put(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
        payload: &[u8],
        options: &PutOptions,
    ) -> Result<(), TransportError> {
        (**self).put(conn, obj, payload, options)
    }

    fn get(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
        max_length: Option<usize>,
        descriptor: &mut MessageDescriptor,
        options: &GetOptions,
    ) -> Result<Vec<u8>, TransportError> {
        (**self).get(conn, obj, max_length, descriptor, options)
    }

    fn inquire_depth(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
    ) -> Result<u32, TransportError> {
        (**self).inquire_depth(conn, obj)
    }

    fn execute_admin(
        &self,
        conn: ConnectionHandle,
        command: AdminCommand<'_>,
    ) -> Result<Vec<AdminRecord>, TransportError> {
        (**self).execute_admin(conn, command)
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------
