//! Client-side access layer for message-queuing middleware.
//!
//! The layer wraps a low-level queue-manager client behind a small,
//! hard-to-misuse API:
//!
//! - **Connection lifecycle** — [`QueueManager`] with idempotent connect,
//!   scoped release via [`ConnectionGuard`], and precondition-checked
//!   administrative operations.
//! - **Queue access** — [`Queue`] handles with transparent one-shot repair
//!   of open-mode mismatches on put and get.
//! - **Consumption sequences** — lazy [`MessageReader`] (destructive reads
//!   under a wait-interval policy) and [`MessageBrowser`] (non-destructive
//!   cursor pass).
//! - **Administration** — create/delete queues, list queues and channels,
//!   fetch-and-reset queue statistics.
//! - **Transport boundary** — the [`MqTransport`] trait; [`Broker`] is an
//!   in-process implementation for local development and tests.
//!
//! ```no_run
//! use wmq::{Broker, OpenMode, PutOptions, Queue, QueueManager};
//!
//! let broker = Broker::new("TEST");
//! broker.define_queue("DAVAY", 5000);
//!
//! let qmgr = QueueManager::new(broker, "TEST", "localhost(1414)");
//! let _conn = qmgr.connection()?;
//!
//! let queue = Queue::new(&qmgr, "DAVAY");
//! let open = queue.open(OpenMode::default())?;
//! open.put(b"Test message", &PutOptions::default())?;
//! for message in open.read_while_waiting(0, None) {
//!     println!("{}", String::from_utf8_lossy(&message?.payload));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod broker;
pub mod error;
pub mod queue;
pub mod queue_manager;
pub mod structures;
pub mod transport;

pub use broker::Broker;
pub use error::{
    AdminError, ConnectionError, DepthError, GetError, OpenError, PreconditionError, PutError,
};
pub use queue::{MessageBrowser, MessageReader, OpenGuard, Queue};
pub use queue_manager::{ConnectionGuard, QueueManager, DEFAULT_QUEUE_DEPTH};
pub use structures::{
    ChannelDescriptor, ChannelType, ConnectOptions, Credentials, GetOptions, Message,
    MessageDescriptor, OpenMode, PutOptions, QueueStats, ShareMode, TransportType, WaitInterval,
    DEFAULT_CHANNEL,
};
pub use transport::{
    AdminCommand, AdminRecord, ConnectionHandle, MqTransport, ObjectHandle, ReasonCode,
    TransportError,
};
