//! In-process queue manager implementing [`MqTransport`].
//!
//! Holds named queues in memory, tracks per-connection open objects with
//! their access modes, and supports the full verb surface the access layer
//! drives: blocking wait-gets, browse cursors, correlation matching,
//! max-depth enforcement and PCF-style administrative commands.

use crate::structures::{
    ChannelDescriptor, ConnectOptions, Credentials, GetOptions, MessageDescriptor, OpenMode,
    PutOptions, QueueStats, WaitInterval, DEFAULT_CHANNEL,
};
use crate::transport::{
    AdminCommand, AdminRecord, ConnectionHandle, MqTransport, ObjectHandle, ReasonCode,
    TransportError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
//  Internal state
// ---------------------------------------------------------------------------

/// A message resident on a queue.
#[derive(Debug, Clone)]
struct StoredMessage {
    descriptor: MessageDescriptor,
    payload: Vec<u8>,
}

/// One named local queue.
#[derive(Debug)]
struct LocalQueue {
    messages: VecDeque<StoredMessage>,
    max_depth: u32,
    reset_at: Instant,
    high_depth: u32,
    enqueued: u64,
    dequeued: u64,
}

impl LocalQueue {
    fn new(max_depth: u32) -> Self {
        Self {
            messages: VecDeque::new(),
            max_depth,
            reset_at: Instant::now(),
            high_depth: 0,
            enqueued: 0,
            dequeued: 0,
        }
    }
}

/// An open queue object bound to one connection.
#[derive(Debug)]
struct OpenObject {
    queue: String,
    mode: OpenMode,
    browse_cursor: usize,
}

/// Per-connection bookkeeping.
#[derive(Debug, Default)]
struct ConnState {
    open_objects: HashMap<u32, OpenObject>,
    next_obj: u32,
}

#[derive(Debug, Default)]
struct BrokerState {
    queues: HashMap<String, LocalQueue>,
    channels: Vec<String>,
    connections: HashMap<u32, ConnState>,
    next_conn: u32,
    next_msg_id: u64,
}

// ---------------------------------------------------------------------------
//  Broker
// ---------------------------------------------------------------------------

/// An in-process queue manager.
///
/// All verbs take `&self`; internal state sits behind one mutex, and a
/// condition variable wakes gets blocked on a wait interval whenever a
/// message arrives or a handle they depend on goes away. Share a broker
/// across threads with `Arc`.
#[derive(Debug)]
pub struct Broker {
    name: String,
    state: Mutex<BrokerState>,
    arrivals: Condvar,
}

impl Broker {
    /// Create a queue manager with the given name and the well-known
    /// default client channel.
    pub fn new(name: impl Into<String>) -> Self {
        let state = BrokerState {
            channels: vec![DEFAULT_CHANNEL.to_string()],
            next_conn: 1,
            ..Default::default()
        };
        Self {
            name: name.into(),
            state: Mutex::new(state),
            arrivals: Condvar::new(),
        }
    }

    /// Register an additional channel name.
    pub fn with_channel(self, name: impl Into<String>) -> Self {
        self.state().channels.push(name.into());
        self
    }

    /// Define a local queue directly, bypassing the admin command path.
    pub fn define_queue(&self, name: impl Into<String>, max_depth: u32) {
        self.state()
            .queues
            .insert(name.into(), LocalQueue::new(max_depth));
    }

    /// Queue manager name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn resolve_object(
        state: &BrokerState,
        conn: ConnectionHandle,
        obj: ObjectHandle,
    ) -> Result<(String, OpenMode, usize), TransportError> {
        let conn_state = state.connections.get(&conn.0).ok_or_else(|| {
            TransportError::new(ReasonCode::ConnectionBroken, "connection is closed")
        })?;
        let open = conn_state.open_objects.get(&obj.0).ok_or_else(|| {
            TransportError::new(ReasonCode::InvalidHandle, "object is not open")
        })?;
        Ok((open.queue.clone(), open.mode, open.browse_cursor))
    }

    fn queue<'a>(
        state: &'a BrokerState,
        name: &str,
    ) -> Result<&'a LocalQueue, TransportError> {
        state.queues.get(name).ok_or_else(|| {
            TransportError::new(
                ReasonCode::UnknownObjectName,
                format!("queue '{name}' does not exist"),
            )
        })
    }

    fn queue_mut<'a>(
        state: &'a mut BrokerState,
        name: &str,
    ) -> Result<&'a mut LocalQueue, TransportError> {
        state.queues.get_mut(name).ok_or_else(|| {
            TransportError::new(
                ReasonCode::UnknownObjectName,
                format!("queue '{name}' does not exist"),
            )
        })
    }

    fn next_msg_id(state: &mut BrokerState) -> [u8; 24] {
        state.next_msg_id += 1;
        let mut id = [0u8; 24];
        id[16..].copy_from_slice(&state.next_msg_id.to_be_bytes());
        id
    }
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => name == pattern,
    }
}

impl MqTransport for Broker {
    fn connect(
        &self,
        qmgr_name: &str,
        channel: &ChannelDescriptor,
        _credentials: &Credentials,
        _options: ConnectOptions,
    ) -> Result<ConnectionHandle, TransportError> {
        let mut state = self.state();
        if qmgr_name != self.name {
            return Err(TransportError::new(
                ReasonCode::ConnectionRefused,
                format!(
                    "no queue manager '{qmgr_name}' at '{}'",
                    channel.connection_name
                ),
            ));
        }
        if !state.channels.iter().any(|c| c == &channel.channel_name) {
            return Err(TransportError::new(
                ReasonCode::ConnectionRefused,
                format!("unknown channel '{}'", channel.channel_name),
            ));
        }
        let handle = state.next_conn;
        state.next_conn += 1;
        state.connections.insert(handle, ConnState::default());
        tracing::debug!(qmgr = %self.name, handle, "connection accepted");
        Ok(ConnectionHandle(handle))
    }

    fn disconnect(&self, conn: ConnectionHandle) {
        let mut state = self.state();
        if state.connections.remove(&conn.0).is_some() {
            tracing::debug!(qmgr = %self.name, handle = conn.0, "connection released");
        }
        drop(state);
        // Wake any get blocked on this connection so it can fail.
        self.arrivals.notify_all();
    }

    fn open_queue(
        &self,
        conn: ConnectionHandle,
        name: &str,
        mode: OpenMode,
    ) -> Result<ObjectHandle, TransportError> {
        let mut state = self.state();
        Self::queue(&state, name)?;
        let conn_state = state.connections.get_mut(&conn.0).ok_or_else(|| {
            TransportError::new(ReasonCode::ConnectionBroken, "connection is closed")
        })?;
        let handle = conn_state.next_obj;
        conn_state.next_obj += 1;
        conn_state.open_objects.insert(
            handle,
            OpenObject {
                queue: name.to_string(),
                mode,
                browse_cursor: 0,
            },
        );
        Ok(ObjectHandle(handle))
    }

    fn close_queue(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
    ) -> Result<(), TransportError> {
        let mut state = self.state();
        let conn_state = state.connections.get_mut(&conn.0).ok_or_else(|| {
            TransportError::new(ReasonCode::ConnectionBroken, "connection is closed")
        })?;
        conn_state
            .open_objects
            .remove(&obj.0)
            .map(|_| ())
            .ok_or_else(|| TransportError::new(ReasonCode::InvalidHandle, "object is not open"))?;
        drop(state);
        self.arrivals.notify_all();
        Ok(())
    }

    fn put(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
        payload: &[u8],
        options: &PutOptions,
    ) -> Result<(), TransportError> {
        let mut state = self.state();
        let (queue_name, mode, _) = Self::resolve_object(&state, conn, obj)?;
        if !mode.output {
            return Err(TransportError::new(
                ReasonCode::NotOpenForOutput,
                format!("queue '{queue_name}' is not open for output"),
            ));
        }
        let msg_id = if options.new_msg_id {
            Self::next_msg_id(&mut state)
        } else {
            MessageDescriptor::NO_ID
        };
        let queue = Self::queue_mut(&mut state, &queue_name)?;
        if queue.messages.len() as u32 >= queue.max_depth {
            return Err(TransportError::new(
                ReasonCode::QueueFull,
                format!("queue '{queue_name}' is at its maximum depth"),
            ));
        }
        queue.messages.push_back(StoredMessage {
            descriptor: MessageDescriptor {
                msg_id,
                correl_id: options.correl_id.unwrap_or(MessageDescriptor::NO_ID),
                group_id: MessageDescriptor::NO_ID,
            },
            payload: payload.to_vec(),
        });
        queue.enqueued += 1;
        queue.high_depth = queue.high_depth.max(queue.messages.len() as u32);
        drop(state);
        self.arrivals.notify_all();
        Ok(())
    }

    fn get(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
        max_length: Option<usize>,
        descriptor: &mut MessageDescriptor,
        options: &GetOptions,
    ) -> Result<Vec<u8>, TransportError> {
        let deadline = match options.wait {
            WaitInterval::Millis(ms) => Some(Instant::now() + Duration::from_millis(u64::from(ms))),
            _ => None,
        };
        let mut state = self.state();
        loop {
            // Revalidate on every pass: handles may be torn down from
            // another thread while this get is blocked.
            let (queue_name, mode, cursor) = Self::resolve_object(&state, conn, obj)?;

            if options.browse_next {
                if !mode.browse {
                    return Err(TransportError::new(
                        ReasonCode::NotOpenForInput,
                        format!("queue '{queue_name}' is not open for browse"),
                    ));
                }
                let found = Self::queue(&state, &queue_name)?
                    .messages
                    .get(cursor)
                    .map(|m| (m.descriptor.clone(), m.payload.clone()));
                // A browse-next get advances the cursor over the queue's
                // current contents; it never waits for new arrivals.
                return match found {
                    Some((md, payload)) => {
                        if matches!(max_length, Some(max) if payload.len() > max) {
                            return Err(TransportError::new(
                                ReasonCode::TruncatedMessageFailed,
                                format!("message on '{queue_name}' exceeds the maximum length"),
                            ));
                        }
                        if let Some(conn_state) = state.connections.get_mut(&conn.0) {
                            if let Some(open) = conn_state.open_objects.get_mut(&obj.0) {
                                open.browse_cursor += 1;
                            }
                        }
                        *descriptor = md;
                        Ok(payload)
                    }
                    None => Err(TransportError::new(
                        ReasonCode::NoMessageAvailable,
                        format!("no more messages to browse on queue '{queue_name}'"),
                    )),
                };
            }

            if !mode.input {
                return Err(TransportError::new(
                    ReasonCode::NotOpenForInput,
                    format!("queue '{queue_name}' is not open for input"),
                ));
            }

            let pos = {
                let queue = Self::queue(&state, &queue_name)?;
                if descriptor.is_selective() {
                    queue.messages.iter().position(|m| {
                        (descriptor.msg_id == MessageDescriptor::NO_ID
                            || m.descriptor.msg_id == descriptor.msg_id)
                            && (descriptor.correl_id == MessageDescriptor::NO_ID
                                || m.descriptor.correl_id == descriptor.correl_id)
                    })
                } else if queue.messages.is_empty() {
                    None
                } else {
                    Some(0)
                }
            };

            if let Some(pos) = pos {
                let queue = Self::queue_mut(&mut state, &queue_name)?;
                if let Some(max) = max_length {
                    if queue.messages[pos].payload.len() > max {
                        // Leave the message on the queue.
                        return Err(TransportError::new(
                            ReasonCode::TruncatedMessageFailed,
                            format!("message on '{queue_name}' exceeds the maximum length"),
                        ));
                    }
                }
                let msg = queue.messages.remove(pos).ok_or_else(|| {
                    TransportError::new(ReasonCode::Other, "message index out of range")
                })?;
                queue.dequeued += 1;
                *descriptor = msg.descriptor;
                return Ok(msg.payload);
            }

            match options.wait {
                WaitInterval::NoWait => {
                    return Err(TransportError::new(
                        ReasonCode::NoMessageAvailable,
                        format!("no message available on queue '{queue_name}'"),
                    ));
                }
                WaitInterval::Millis(_) => {
                    let now = Instant::now();
                    match deadline {
                        Some(dl) if now < dl => {
                            let (guard, _) = self
                                .arrivals
                                .wait_timeout(state, dl - now)
                                .unwrap_or_else(|e| e.into_inner());
                            state = guard;
                        }
                        _ => {
                            return Err(TransportError::new(
                                ReasonCode::NoMessageAvailable,
                                format!("no message arrived on queue '{queue_name}' in time"),
                            ));
                        }
                    }
                }
                WaitInterval::Unlimited => {
                    state = self
                        .arrivals
                        .wait(state)
                        .unwrap_or_else(|e| e.into_inner());
                }
            }
        }
    }

    fn inquire_depth(
        &self,
        conn: ConnectionHandle,
        obj: ObjectHandle,
    ) -> Result<u32, TransportError> {
        let state = self.state();
        let (queue_name, _, _) = Self::resolve_object(&state, conn, obj)?;
        Ok(Self::queue(&state, &queue_name)?.messages.len() as u32)
    }

    fn execute_admin(
        &self,
        conn: ConnectionHandle,
        command: AdminCommand<'_>,
    ) -> Result<Vec<AdminRecord>, TransportError> {
        let mut state = self.state();
        if !state.connections.contains_key(&conn.0) {
            return Err(TransportError::new(
                ReasonCode::ConnectionBroken,
                "connection is closed",
            ));
        }
        match command {
            AdminCommand::InquireQueues { pattern } => {
                let mut names: Vec<String> = state
                    .queues
                    .keys()
                    .filter(|n| matches_pattern(n, pattern))
                    .cloned()
                    .collect();
                if names.is_empty() {
                    return Err(TransportError::new(
                        ReasonCode::UnknownObjectName,
                        format!("no queues match '{pattern}'"),
                    ));
                }
                names.sort();
                Ok(names.into_iter().map(AdminRecord::QueueName).collect())
            }
            AdminCommand::InquireChannels { pattern } => {
                let mut names: Vec<String> = state
                    .channels
                    .iter()
                    .filter(|n| matches_pattern(n, pattern))
                    .cloned()
                    .collect();
                if names.is_empty() {
                    return Err(TransportError::new(
                        ReasonCode::UnknownObjectName,
                        format!("no channels match '{pattern}'"),
                    ));
                }
                names.sort();
                Ok(names.into_iter().map(AdminRecord::ChannelName).collect())
            }
            AdminCommand::CreateQueue { name, max_depth } => {
                if state.queues.contains_key(name) {
                    return Err(TransportError::new(
                        ReasonCode::ObjectAlreadyExists,
                        format!("queue '{name}' already exists"),
                    ));
                }
                state
                    .queues
                    .insert(name.to_string(), LocalQueue::new(max_depth));
                Ok(Vec::new())
            }
            AdminCommand::DeleteQueue { name, purge } => {
                let queue = Self::queue(&state, name)?;
                if !queue.messages.is_empty() && !purge {
                    return Err(TransportError::new(
                        ReasonCode::QueueNotEmpty,
                        format!("queue '{name}' still holds messages"),
                    ));
                }
                state.queues.remove(name);
                drop(state);
                // Wake gets blocked on the deleted queue.
                self.arrivals.notify_all();
                Ok(Vec::new())
            }
            AdminCommand::ResetQueueStats { name } => {
                let queue = Self::queue_mut(&mut state, name)?;
                let stats = QueueStats {
                    time_since_reset: queue.reset_at.elapsed().as_secs(),
                    high_queue_depth: queue.high_depth,
                    msg_dequeue_count: queue.dequeued,
                    msg_enqueue_count: queue.enqueued,
                };
                queue.reset_at = Instant::now();
                queue.high_depth = queue.messages.len() as u32;
                queue.enqueued = 0;
                queue.dequeued = 0;
                Ok(vec![AdminRecord::QueueStatistics(stats)])
            }
        }
    }
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Broker, ConnectionHandle) {
        let broker = Broker::new("TESTQM");
        broker.define_queue("TEST.Q", 5000);
        let conn = broker
            .connect(
                "TESTQM",
                &ChannelDescriptor::client("localhost(1414)"),
                &Credentials::none(),
                ConnectOptions::default(),
            )
            .unwrap();
        (broker, conn)
    }

    #[test]
    fn test_connect_wrong_name_refused() {
        let broker = Broker::new("TESTQM");
        let err = broker
            .connect(
                "OTHERQM",
                &ChannelDescriptor::client("localhost(1414)"),
                &Credentials::none(),
                ConnectOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::ConnectionRefused);
    }

    #[test]
    fn test_connect_unknown_channel_refused() {
        let broker = Broker::new("TESTQM");
        let mut cd = ChannelDescriptor::client("localhost(1414)");
        cd.channel_name = "NOSUCH.CHANNEL".to_string();
        let err = broker
            .connect("TESTQM", &cd, &Credentials::none(), ConnectOptions::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::ConnectionRefused);
    }

    #[test]
    fn test_open_unknown_queue() {
        let (broker, conn) = setup();
        let err = broker
            .open_queue(conn, "NOSUCH.Q", OpenMode::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::UnknownObjectName);
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        broker
            .put(conn, obj, b"hello", &PutOptions::default())
            .unwrap();

        let mut md = MessageDescriptor::default();
        let payload = broker
            .get(conn, obj, None, &mut md, &GetOptions::default())
            .unwrap();
        assert_eq!(payload, b"hello");
        // The broker stamped a message id on retrieval.
        assert_ne!(md.msg_id, MessageDescriptor::NO_ID);
    }

    #[test]
    fn test_put_not_open_for_output() {
        let (broker, conn) = setup();
        let obj = broker
            .open_queue(conn, "TEST.Q", OpenMode::input_only())
            .unwrap();
        let err = broker
            .put(conn, obj, b"x", &PutOptions::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::NotOpenForOutput);
    }

    #[test]
    fn test_get_not_open_for_input() {
        let (broker, conn) = setup();
        let obj = broker
            .open_queue(conn, "TEST.Q", OpenMode::output_only())
            .unwrap();
        let mut md = MessageDescriptor::default();
        let err = broker
            .get(conn, obj, None, &mut md, &GetOptions::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::NotOpenForInput);
    }

    #[test]
    fn test_get_empty_no_wait() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        let mut md = MessageDescriptor::default();
        let err = broker
            .get(conn, obj, None, &mut md, &GetOptions::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::NoMessageAvailable);
    }

    #[test]
    fn test_get_wait_times_out() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        let mut md = MessageDescriptor::default();
        let started = Instant::now();
        let err = broker
            .get(
                conn,
                obj,
                None,
                &mut md,
                &GetOptions {
                    wait: WaitInterval::Millis(50),
                    browse_next: false,
                },
            )
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::NoMessageAvailable);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_browse_cursor_advances_without_removal() {
        let (broker, conn) = setup();
        let out = broker
            .open_queue(conn, "TEST.Q", OpenMode::output_only())
            .unwrap();
        broker.put(conn, out, b"m1", &PutOptions::default()).unwrap();
        broker.put(conn, out, b"m2", &PutOptions::default()).unwrap();

        let brw = broker
            .open_queue(conn, "TEST.Q", OpenMode::browse_only())
            .unwrap();
        let gmo = GetOptions {
            wait: WaitInterval::Unlimited,
            browse_next: true,
        };
        let mut md = MessageDescriptor::default();
        assert_eq!(broker.get(conn, brw, None, &mut md, &gmo).unwrap(), b"m1");
        assert_eq!(broker.get(conn, brw, None, &mut md, &gmo).unwrap(), b"m2");
        // Cursor exhausted: NoMessageAvailable even with an unlimited wait.
        let err = broker.get(conn, brw, None, &mut md, &gmo).unwrap_err();
        assert_eq!(err.reason, ReasonCode::NoMessageAvailable);
        assert_eq!(broker.inquire_depth(conn, brw).unwrap(), 2);
    }

    #[test]
    fn test_selective_get_by_correl_id() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        broker.put(conn, obj, b"plain", &PutOptions::default()).unwrap();
        broker
            .put(
                conn,
                obj,
                b"tagged",
                &PutOptions {
                    correl_id: Some([7u8; 24]),
                    ..Default::default()
                },
            )
            .unwrap();

        let mut md = MessageDescriptor {
            correl_id: [7u8; 24],
            ..Default::default()
        };
        let payload = broker
            .get(conn, obj, None, &mut md, &GetOptions::default())
            .unwrap();
        assert_eq!(payload, b"tagged");
        assert_eq!(broker.inquire_depth(conn, obj).unwrap(), 1);
    }

    #[test]
    fn test_queue_full() {
        let (broker, conn) = setup();
        broker.define_queue("TINY.Q", 1);
        let obj = broker.open_queue(conn, "TINY.Q", OpenMode::default()).unwrap();
        broker.put(conn, obj, b"one", &PutOptions::default()).unwrap();
        let err = broker
            .put(conn, obj, b"two", &PutOptions::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::QueueFull);
    }

    #[test]
    fn test_max_length_leaves_message_in_place() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        broker
            .put(conn, obj, b"a long payload", &PutOptions::default())
            .unwrap();
        let mut md = MessageDescriptor::default();
        let err = broker
            .get(conn, obj, Some(4), &mut md, &GetOptions::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::TruncatedMessageFailed);
        assert_eq!(broker.inquire_depth(conn, obj).unwrap(), 1);
    }

    #[test]
    fn test_close_then_get_fails() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        broker.close_queue(conn, obj).unwrap();
        let mut md = MessageDescriptor::default();
        let err = broker
            .get(conn, obj, None, &mut md, &GetOptions::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::InvalidHandle);
        // Closing again reports an invalid handle too.
        assert!(broker.close_queue(conn, obj).is_err());
    }

    #[test]
    fn test_admin_inquire_queues_pattern() {
        let (broker, conn) = setup();
        broker.define_queue("APP.Q1", 100);
        broker.define_queue("APP.Q2", 100);
        let records = broker
            .execute_admin(conn, AdminCommand::InquireQueues { pattern: "APP.*" })
            .unwrap();
        assert_eq!(
            records,
            vec![
                AdminRecord::QueueName("APP.Q1".to_string()),
                AdminRecord::QueueName("APP.Q2".to_string()),
            ]
        );
    }

    #[test]
    fn test_admin_inquire_no_match_is_unknown_object() {
        let (broker, conn) = setup();
        let err = broker
            .execute_admin(conn, AdminCommand::InquireQueues { pattern: "NOPE.*" })
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::UnknownObjectName);
    }

    #[test]
    fn test_admin_create_delete_queue() {
        let (broker, conn) = setup();
        broker
            .execute_admin(
                conn,
                AdminCommand::CreateQueue {
                    name: "NEW.Q",
                    max_depth: 111,
                },
            )
            .unwrap();
        // Duplicate create fails.
        let err = broker
            .execute_admin(
                conn,
                AdminCommand::CreateQueue {
                    name: "NEW.Q",
                    max_depth: 111,
                },
            )
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::ObjectAlreadyExists);

        broker
            .execute_admin(
                conn,
                AdminCommand::DeleteQueue {
                    name: "NEW.Q",
                    purge: false,
                },
            )
            .unwrap();
        let err = broker
            .execute_admin(conn, AdminCommand::InquireQueues { pattern: "NEW.Q" })
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::UnknownObjectName);
    }

    #[test]
    fn test_admin_delete_nonempty_requires_purge() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        broker.put(conn, obj, b"m", &PutOptions::default()).unwrap();

        let err = broker
            .execute_admin(
                conn,
                AdminCommand::DeleteQueue {
                    name: "TEST.Q",
                    purge: false,
                },
            )
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::QueueNotEmpty);

        broker
            .execute_admin(
                conn,
                AdminCommand::DeleteQueue {
                    name: "TEST.Q",
                    purge: true,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_admin_reset_queue_stats() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        broker.put(conn, obj, b"m1", &PutOptions::default()).unwrap();
        broker.put(conn, obj, b"m2", &PutOptions::default()).unwrap();
        let mut md = MessageDescriptor::default();
        broker
            .get(conn, obj, None, &mut md, &GetOptions::default())
            .unwrap();

        let records = broker
            .execute_admin(conn, AdminCommand::ResetQueueStats { name: "TEST.Q" })
            .unwrap();
        let AdminRecord::QueueStatistics(stats) = &records[0] else {
            panic!("expected a statistics record");
        };
        assert_eq!(stats.msg_enqueue_count, 2);
        assert_eq!(stats.msg_dequeue_count, 1);
        assert_eq!(stats.high_queue_depth, 2);

        // Counters start over after the reset.
        let records = broker
            .execute_admin(conn, AdminCommand::ResetQueueStats { name: "TEST.Q" })
            .unwrap();
        let AdminRecord::QueueStatistics(stats) = &records[0] else {
            panic!("expected a statistics record");
        };
        assert_eq!(stats.msg_enqueue_count, 0);
        assert_eq!(stats.msg_dequeue_count, 0);
        assert_eq!(stats.high_queue_depth, 1);
    }

    #[test]
    fn test_disconnect_invalidates_objects() {
        let (broker, conn) = setup();
        let obj = broker.open_queue(conn, "TEST.Q", OpenMode::default()).unwrap();
        broker.disconnect(conn);
        let mut md = MessageDescriptor::default();
        let err = broker
            .get(conn, obj, None, &mut md, &GetOptions::default())
            .unwrap_err();
        assert_eq!(err.reason, ReasonCode::ConnectionBroken);
    }

    #[test]
    fn test_pattern_matching() {
        assert!(matches_pattern("SYSTEM.DEF.SVRCONN", "SYSTEM.*"));
        assert!(matches_pattern("Q1", "Q1"));
        assert!(!matches_pattern("Q1", "Q2"));
        assert!(matches_pattern("ANY", "*"));
    }
}
