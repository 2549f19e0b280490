//! Queue handle and message consumption.
//!
//! A [`Queue`] is bound to one [`QueueManager`] connection and owns at most
//! one open object handle. Its put/get primitives repair a recoverable
//! mode mismatch with exactly one transparent reopen; on top of them sit
//! the two lazy consumption sequences, [`MessageReader`] (destructive
//! wait-reads) and [`MessageBrowser`] (a non-destructive pass over the
//! queue's current contents).

use crate::error::{DepthError, GetError, OpenError, PreconditionError, PutError};
use crate::queue_manager::QueueManager;
use crate::structures::{
    GetOptions, Message, MessageDescriptor, OpenMode, PutOptions, WaitInterval,
};
use crate::transport::{ConnectionHandle, MqTransport, ObjectHandle, ReasonCode, TransportError};
use std::cell::Cell;
use std::cmp::Ordering;

// ---------------------------------------------------------------------------
//  Queue handle
// ---------------------------------------------------------------------------

/// A handle to one named queue, bound to a queue manager connection.
///
/// ```no_run
/// use wmq::{Broker, OpenMode, PutOptions, Queue, QueueManager};
///
/// let broker = Broker::new("TEST");
/// broker.define_queue("DAVAY", 5000);
/// let qmgr = QueueManager::new(broker, "TEST", "localhost(1414)");
/// let _conn = qmgr.connection()?;
/// let queue = Queue::new(&qmgr, "DAVAY");
/// let open = queue.open(OpenMode::default())?;
/// open.put(b"Test message", &PutOptions::default())?;
/// for msg in open.read_while_waiting(0, None) {
///     println!("{:?}", msg?.payload);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// The handle is not internally synchronized; one queue handle must not be
/// driven concurrently by two flows of control.
#[derive(Debug)]
pub struct Queue<'g, T: MqTransport> {
    name: String,
    qmgr: &'g QueueManager<T>,
    obj: Cell<Option<ObjectHandle>>,
    mode: Cell<OpenMode>,
}

impl<'g, T: MqTransport> Queue<'g, T> {
    /// Create a closed handle to the named queue. The queue manager
    /// connection must outlive this handle.
    pub fn new(qmgr: &'g QueueManager<T>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qmgr,
            obj: Cell::new(None),
            mode: Cell::new(OpenMode::default()),
        }
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the handle currently holds an open object.
    pub fn is_open(&self) -> bool {
        self.obj.get().is_some()
    }

    /// The access mode of the current open object, if any.
    pub fn open_mode(&self) -> Option<OpenMode> {
        self.obj.get().map(|_| self.mode.get())
    }

    /// Open the queue in the given access mode, returning a guard that
    /// closes the handle on drop. Any previously open object is closed
    /// first.
    pub fn open(&self, mode: OpenMode) -> Result<OpenGuard<'_, 'g, T>, OpenError> {
        if !self.qmgr.is_connected() {
            return Err(PreconditionError { operation: "open" }.into());
        }
        self.reopen(mode).map_err(|source| OpenError::Transport {
            queue: self.name.clone(),
            source,
        })?;
        Ok(OpenGuard { queue: self })
    }

    /// Close the handle. Best-effort cleanup: closing an already-closed
    /// handle is a no-op and any error from an invalid handle is
    /// suppressed.
    pub fn close(&self) {
        if let Some(obj) = self.obj.take() {
            if let Some(conn) = self.qmgr.connection_handle() {
                if let Err(err) = self.qmgr.transport().close_queue(conn, obj) {
                    tracing::debug!(queue = %self.name, %err, "suppressed close error");
                }
            }
        }
    }

    /// Close (suppressing any error) and open again in the given mode.
    fn reopen(&self, mode: OpenMode) -> Result<ObjectHandle, TransportError> {
        self.close();
        let conn = self.conn()?;
        let obj = self.qmgr.transport().open_queue(conn, &self.name, mode)?;
        self.obj.set(Some(obj));
        self.mode.set(mode);
        Ok(obj)
    }

    fn conn(&self) -> Result<ConnectionHandle, TransportError> {
        self.qmgr.connection_handle().ok_or_else(|| {
            TransportError::new(
                ReasonCode::ConnectionBroken,
                "queue manager is not connected",
            )
        })
    }

    fn raw_put(&self, payload: &[u8], options: &PutOptions) -> Result<(), TransportError> {
        let conn = self.conn()?;
        let Some(obj) = self.obj.get() else {
            return Err(TransportError::new(
                ReasonCode::NotOpenForOutput,
                format!("queue '{}' is not open", self.name),
            ));
        };
        self.qmgr.transport().put(conn, obj, payload, options)
    }

    fn raw_get(
        &self,
        max_length: Option<usize>,
        descriptor: &mut MessageDescriptor,
        options: &GetOptions,
    ) -> Result<Vec<u8>, TransportError> {
        let conn = self.conn()?;
        let Some(obj) = self.obj.get() else {
            return Err(TransportError::new(
                ReasonCode::NotOpenForInput,
                format!("queue '{}' is not open", self.name),
            ));
        };
        self.qmgr
            .transport()
            .get(conn, obj, max_length, descriptor, options)
    }

    fn put_error(&self, source: TransportError) -> PutError {
        PutError {
            queue: self.name.clone(),
            source,
        }
    }

    fn get_error(&self, source: TransportError) -> GetError {
        GetError {
            queue: self.name.clone(),
            source,
        }
    }

    /// Write a message.
    ///
    /// If the handle is not open for output it is reopened in the default
    /// dual mode exactly once and the put retried once; a second mode
    /// failure, or any other failure, propagates.
    pub fn put(&self, payload: &[u8], options: &PutOptions) -> Result<(), PutError> {
        match self.raw_put(payload, options) {
            Err(e) if e.reason == ReasonCode::NotOpenForOutput => {
                tracing::warn!(queue = %self.name, "not open for output, reopening");
                self.reopen(OpenMode::default())
                    .map_err(|source| self.put_error(source))?;
                self.raw_put(payload, options)
                    .map_err(|source| self.put_error(source))
            }
            other => other.map_err(|source| self.put_error(source)),
        }
    }

    /// Read or browse a message, depending on `options`.
    ///
    /// `Ok(None)` means no message is currently available — a normal
    /// outcome, not an error. A not-open-for-input failure triggers the
    /// same one-shot reopen-and-retry as [`put`](Queue::put). On success
    /// the caller's descriptor is filled with the message's metadata.
    pub fn get(
        &self,
        max_length: Option<usize>,
        descriptor: &mut MessageDescriptor,
        options: &GetOptions,
    ) -> Result<Option<Message>, GetError> {
        match self.raw_get(max_length, descriptor, options) {
            Ok(payload) => Ok(Some(Message {
                payload,
                descriptor: descriptor.clone(),
            })),
            Err(e) if e.reason == ReasonCode::NoMessageAvailable => Ok(None),
            Err(e) if e.reason == ReasonCode::NotOpenForInput => {
                tracing::warn!(queue = %self.name, "not open for input, reopening");
                self.reopen(OpenMode::default())
                    .map_err(|source| self.get_error(source))?;
                match self.raw_get(max_length, descriptor, options) {
                    Ok(payload) => Ok(Some(Message {
                        payload,
                        descriptor: descriptor.clone(),
                    })),
                    Err(e) if e.reason == ReasonCode::NoMessageAvailable => Ok(None),
                    Err(source) => Err(self.get_error(source)),
                }
            }
            Err(source) => Err(self.get_error(source)),
        }
    }

    /// Current queue depth.
    pub fn depth(&self) -> Result<u32, DepthError> {
        self.depth_inner().map_err(|source| DepthError {
            queue: self.name.clone(),
            source,
        })
    }

    fn depth_inner(&self) -> Result<u32, TransportError> {
        let conn = self.conn()?;
        let obj = match self.obj.get() {
            Some(obj) => obj,
            None => self.reopen(OpenMode::default())?,
        };
        self.qmgr.transport().inquire_depth(conn, obj)
    }

    /// Compare the current depth against a threshold.
    pub fn compare_depth(&self, threshold: u32) -> Result<Ordering, DepthError> {
        Ok(self.depth()?.cmp(&threshold))
    }

    /// Destructively read messages, waiting for new arrivals per the
    /// wait-interval policy computed once here: `0` drains the currently
    /// queued messages and stops, `-1` blocks forever yielding each new
    /// arrival, and any other value waits up to `|wait_seconds|` seconds
    /// for the next message before giving up.
    ///
    /// The sequence is lazy and restartable only by constructing a new
    /// one. It ends cleanly on "no message available" (unless unlimited)
    /// or terminally with the first propagated error.
    pub fn read_while_waiting(
        &self,
        wait_seconds: i32,
        max_length: Option<usize>,
    ) -> MessageReader<'_, 'g, T> {
        MessageReader {
            queue: self,
            descriptor: MessageDescriptor::default(),
            options: GetOptions {
                wait: WaitInterval::from_seconds(wait_seconds),
                browse_next: false,
            },
            unlimited: wait_seconds == -1,
            max_length,
            done: false,
        }
    }

    /// Browse the queue's current contents without removing them: one
    /// finite pass that advances a cursor and ends when the cursor
    /// exhausts the queue. The handle is reopened in browse mode before
    /// the pass starts, regardless of its current mode.
    pub fn browse_messages(
        &self,
        max_length: Option<usize>,
    ) -> Result<MessageBrowser<'_, 'g, T>, OpenError> {
        if !self.qmgr.is_connected() {
            return Err(PreconditionError {
                operation: "browse_messages",
            }
            .into());
        }
        self.reopen(OpenMode::browse_only())
            .map_err(|source| OpenError::Transport {
                queue: self.name.clone(),
                source,
            })?;
        Ok(MessageBrowser {
            queue: self,
            descriptor: MessageDescriptor::default(),
            options: GetOptions {
                wait: WaitInterval::Unlimited,
                browse_next: true,
            },
            max_length,
            done: false,
        })
    }
}

// ---------------------------------------------------------------------------
//  Open guard
// ---------------------------------------------------------------------------

/// Scoped open queue handle; closes the queue on drop, on every exit path.
#[derive(Debug)]
pub struct OpenGuard<'q, 'g, T: MqTransport> {
    queue: &'q Queue<'g, T>,
}

impl<'g, T: MqTransport> std::ops::Deref for OpenGuard<'_, 'g, T> {
    type Target = Queue<'g, T>;

    fn deref(&self) -> &Self::Target {
        self.queue
    }
}

impl<T: MqTransport> Drop for OpenGuard<'_, '_, T> {
    fn drop(&mut self) {
        self.queue.close();
    }
}

// ---------------------------------------------------------------------------
//  Destructive wait-read sequence
// ---------------------------------------------------------------------------

/// Lazy destructive read sequence produced by
/// [`Queue::read_while_waiting`].
///
/// Yields `Ok(Message)` per retrieval, ends cleanly when the wait policy
/// says stop, or yields one final `Err` and ends. The reused descriptor's
/// correlation fields are reset between yields so a stale id never
/// constrains the next retrieval.
#[derive(Debug)]
pub struct MessageReader<'q, 'g, T: MqTransport> {
    queue: &'q Queue<'g, T>,
    descriptor: MessageDescriptor,
    options: GetOptions,
    unlimited: bool,
    max_length: Option<usize>,
    done: bool,
}

impl<T: MqTransport> Iterator for MessageReader<'_, '_, T> {
    type Item = Result<Message, GetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self
                .queue
                .get(self.max_length, &mut self.descriptor, &self.options)
            {
                Ok(Some(message)) => {
                    self.descriptor.reset();
                    return Some(Ok(message));
                }
                // With an unlimited wait this branch is only reached when
                // the blocked get was interrupted externally; keep going.
                Ok(None) if self.unlimited => continue,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
//  Non-destructive browse sequence
// ---------------------------------------------------------------------------

/// Lazy browse sequence produced by [`Queue::browse_messages`]: a single
/// finite pass over the queue's current contents.
#[derive(Debug)]
pub struct MessageBrowser<'q, 'g, T: MqTransport> {
    queue: &'q Queue<'g, T>,
    descriptor: MessageDescriptor,
    options: GetOptions,
    max_length: Option<usize>,
    done: bool,
}

impl<T: MqTransport> Iterator for MessageBrowser<'_, '_, T> {
    type Item = Result<Message, GetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self
            .queue
            .get(self.max_length, &mut self.descriptor, &self.options)
        {
            Ok(Some(message)) => {
                self.descriptor.reset();
                Some(Ok(message))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------
