//! Access-layer error types.
//!
//! Every terminal error carries the queue or queue-manager identity it
//! relates to plus the underlying transport cause. Recoverable conditions
//! (mode mismatch, no message available) are handled inside the layer and
//! never surface through these types directly.

use crate::transport::TransportError;
use miette::Diagnostic;
use thiserror::Error;

/// An operation requiring an active connection was invoked while
/// disconnected. Programmer error; never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("'{operation}' requires an active connection to the queue manager")]
#[diagnostic(code(wmq::not_connected))]
pub struct PreconditionError {
    /// The operation that was attempted.
    pub operation: &'static str,
}

/// Connecting to the queue manager failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("could not connect to queue manager '{qmgr_name}' at '{conn_info}'")]
#[diagnostic(code(wmq::connection))]
pub struct ConnectionError {
    /// Queue manager name.
    pub qmgr_name: String,
    /// Connection string that was tried.
    pub conn_info: String,
    /// Underlying cause.
    #[source]
    pub source: TransportError,
}

/// Opening a queue failed for a reason other than a recoverable mode
/// mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum OpenError {
    /// The owning connection was not active.
    #[error(transparent)]
    #[diagnostic(transparent)]
    NotConnected(#[from] PreconditionError),

    /// The transport rejected the open.
    #[error("could not open queue '{queue}'")]
    #[diagnostic(code(wmq::open))]
    Transport {
        /// Queue name.
        queue: String,
        /// Underlying cause.
        #[source]
        source: TransportError,
    },
}

/// A put failed terminally (including a second mode-mismatch after the
/// one-shot reopen).
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("could not put a message to queue '{queue}'")]
#[diagnostic(code(wmq::put))]
pub struct PutError {
    /// Queue name.
    pub queue: String,
    /// Underlying cause.
    #[source]
    pub source: TransportError,
}

/// A get failed terminally. "No message available" is not a `GetError`;
/// it is surfaced as a distinguished outcome instead.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("could not get a message from queue '{queue}'")]
#[diagnostic(code(wmq::get))]
pub struct GetError {
    /// Queue name.
    pub queue: String,
    /// Underlying cause.
    #[source]
    pub source: TransportError,
}

/// A depth inquiry failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("could not inquire the current depth of queue '{queue}'")]
#[diagnostic(code(wmq::depth))]
pub struct DepthError {
    /// Queue name.
    pub queue: String,
    /// Underlying cause.
    #[source]
    pub source: TransportError,
}

/// An administrative operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum AdminError {
    /// The operation was invoked while disconnected.
    #[error(transparent)]
    #[diagnostic(transparent)]
    NotConnected(#[from] PreconditionError),

    /// The remote exchange failed.
    #[error("administrative command failed on queue manager '{qmgr_name}'")]
    #[diagnostic(code(wmq::admin))]
    Remote {
        /// Queue manager name.
        qmgr_name: String,
        /// Underlying cause.
        #[source]
        source: TransportError,
    },
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------
