//! Data structures shared across the access layer.
//!
//! Message descriptors, get/put options, open modes, queue statistics and
//! the channel/credential records used to reach a queue manager.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
//  Message descriptor
// ---------------------------------------------------------------------------

/// Per-message correlation metadata accompanying every retrieval.
///
/// A consumption sequence reuses one descriptor across gets; [`reset`]
/// clears the correlation fields back to their "none" values so a stale id
/// from the previous message does not constrain the next retrieval.
///
/// [`reset`]: MessageDescriptor::reset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    /// Message ID (24 bytes, all-zero = none).
    pub msg_id: [u8; 24],
    /// Correlation ID (24 bytes, all-zero = none).
    pub correl_id: [u8; 24],
    /// Group ID (24 bytes, all-zero = none).
    pub group_id: [u8; 24],
}

impl MessageDescriptor {
    /// The "none" value for each 24-byte identifier field.
    pub const NO_ID: [u8; 24] = [0u8; 24];

    /// Reset all correlation fields to their "none" values.
    pub fn reset(&mut self) {
        self.msg_id = Self::NO_ID;
        self.correl_id = Self::NO_ID;
        self.group_id = Self::NO_ID;
    }

    /// Whether any correlation field is set, i.e. the descriptor would
    /// constrain which message a destructive get may match.
    pub fn is_selective(&self) -> bool {
        self.msg_id != Self::NO_ID || self.correl_id != Self::NO_ID
    }
}

// ---------------------------------------------------------------------------
//  Message
// ---------------------------------------------------------------------------

/// A message retrieved from a queue: opaque payload plus the descriptor
/// that accompanied its retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque message body.
    pub payload: Vec<u8>,
    /// Descriptor snapshot taken at retrieval time.
    pub descriptor: MessageDescriptor,
}

// ---------------------------------------------------------------------------
//  Wait interval / get options
// ---------------------------------------------------------------------------

/// How long a get may block waiting for a message to arrive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitInterval {
    /// Return immediately if nothing is queued.
    #[default]
    NoWait,
    /// Wait up to this many milliseconds.
    Millis(u32),
    /// Block indefinitely for the next message.
    Unlimited,
}

impl WaitInterval {
    /// Wait-interval policy of a destructive read sequence, computed once
    /// at sequence start: `0` means no wait, `-1` means unlimited, any
    /// other value waits `|seconds| * 1000` milliseconds per get.
    pub fn from_seconds(seconds: i32) -> Self {
        match seconds {
            0 => Self::NoWait,
            -1 => Self::Unlimited,
            n => Self::Millis(n.unsigned_abs().saturating_mul(1000)),
        }
    }
}

/// Wait behaviour of a single get.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOptions {
    /// How long to wait for a message.
    pub wait: WaitInterval,
    /// Advance a browse cursor instead of destructively reading. A browse
    /// get never waits for queue growth; it ends when the cursor exhausts
    /// the queue's current contents.
    pub browse_next: bool,
}

// ---------------------------------------------------------------------------
//  Put options
// ---------------------------------------------------------------------------

/// Options for a single put.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutOptions {
    /// Have the queue manager generate a fresh message ID.
    pub new_msg_id: bool,
    /// Correlation ID to stamp on the message (none if unset).
    pub correl_id: Option<[u8; 24]>,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            new_msg_id: true,
            correl_id: None,
        }
    }
}

// ---------------------------------------------------------------------------
//  Open mode
// ---------------------------------------------------------------------------

/// Access flags a queue handle is opened with.
///
/// The default is the dual input + output mode, which is also the mode used
/// when a handle transparently reopens itself after a mode-mismatch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenMode {
    /// Open for destructive get.
    pub input: bool,
    /// Open for put.
    pub output: bool,
    /// Open for non-destructive browse.
    pub browse: bool,
}

impl OpenMode {
    /// Input-only access.
    pub const fn input_only() -> Self {
        Self {
            input: true,
            output: false,
            browse: false,
        }
    }

    /// Output-only access.
    pub const fn output_only() -> Self {
        Self {
            input: false,
            output: true,
            browse: false,
        }
    }

    /// Browse-only access.
    pub const fn browse_only() -> Self {
        Self {
            input: false,
            output: false,
            browse: true,
        }
    }

    /// Dual input + output access.
    pub const fn dual() -> Self {
        Self {
            input: true,
            output: true,
            browse: false,
        }
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::dual()
    }
}

// ---------------------------------------------------------------------------
//  Queue statistics
// ---------------------------------------------------------------------------

/// Fixed record returned by a reset-statistics administrative exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Seconds since statistics were last reset.
    pub time_since_reset: u64,
    /// High-water queue depth since the last reset.
    pub high_queue_depth: u32,
    /// Messages destructively read since the last reset.
    pub msg_dequeue_count: u64,
    /// Messages put since the last reset.
    pub msg_enqueue_count: u64,
}

// ---------------------------------------------------------------------------
//  Channel descriptor / credentials / connect options
// ---------------------------------------------------------------------------

/// Well-known fallback channel name used when none is specified.
pub const DEFAULT_CHANNEL: &str = "SYSTEM.DEF.SVRCONN";

/// Transmission protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportType {
    /// TCP/IP.
    #[default]
    Tcp,
    /// LU 6.2 (SNA).
    Lu62,
}

/// Channel kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelType {
    /// Client end of a client connection.
    #[default]
    ClientConnection,
    /// Queue manager end of a client connection.
    ServerConnection,
}

/// A named transport configuration used to reach a queue manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    /// Channel name.
    pub channel_name: String,
    /// Connection string of the form `host(port)[,host(port)...]`.
    pub connection_name: String,
    /// Transmission protocol.
    pub transport_type: TransportType,
    /// Channel kind.
    pub channel_type: ChannelType,
}

impl ChannelDescriptor {
    /// A TCP client-connection channel to the given connection string,
    /// using the well-known default channel name.
    pub fn client(connection_name: impl Into<String>) -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL.to_string(),
            connection_name: connection_name.into(),
            transport_type: TransportType::Tcp,
            channel_type: ChannelType::ClientConnection,
        }
    }
}

impl Default for ChannelDescriptor {
    fn default() -> Self {
        Self::client("")
    }
}

/// Credentials presented when connecting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User name.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
}

impl Credentials {
    /// No credentials.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Handle-sharing behaviour of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareMode {
    /// The connection handle may not be shared.
    Exclusive,
    /// Shared handle; concurrent calls block until the handle is free.
    #[default]
    ShareBlock,
    /// Shared handle; concurrent calls fail instead of blocking.
    ShareNoBlock,
}

/// Connection-option flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// Handle-sharing mode; defaults to share-block so scoped re-entries
    /// can safely reuse an already-open connection.
    pub share_mode: ShareMode,
}

// ---------------------------------------------------------------------------
//  Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_default_is_none() {
        let md = MessageDescriptor::default();
        assert_eq!(md.msg_id, MessageDescriptor::NO_ID);
        assert_eq!(md.correl_id, MessageDescriptor::NO_ID);
        assert_eq!(md.group_id, MessageDescriptor::NO_ID);
        assert!(!md.is_selective());
    }

    #[test]
    fn test_descriptor_reset() {
        let mut md = MessageDescriptor {
            msg_id: [1u8; 24],
            correl_id: [2u8; 24],
            group_id: [3u8; 24],
        };
        assert!(md.is_selective());
        md.reset();
        assert_eq!(md, MessageDescriptor::default());
    }

    #[test]
    fn test_wait_interval_from_seconds() {
        assert_eq!(WaitInterval::from_seconds(0), WaitInterval::NoWait);
        assert_eq!(WaitInterval::from_seconds(-1), WaitInterval::Unlimited);
        assert_eq!(WaitInterval::from_seconds(5), WaitInterval::Millis(5000));
        // Negative values other than -1 use their magnitude.
        assert_eq!(WaitInterval::from_seconds(-7), WaitInterval::Millis(7000));
    }

    #[test]
    fn test_get_options_default() {
        let gmo = GetOptions::default();
        assert_eq!(gmo.wait, WaitInterval::NoWait);
        assert!(!gmo.browse_next);
    }

    #[test]
    fn test_put_options_default() {
        let pmo = PutOptions::default();
        assert!(pmo.new_msg_id);
        assert!(pmo.correl_id.is_none());
    }

    #[test]
    fn test_open_mode_default_is_dual() {
        let mode = OpenMode::default();
        assert!(mode.input);
        assert!(mode.output);
        assert!(!mode.browse);
        assert_eq!(mode, OpenMode::dual());
    }

    #[test]
    fn test_open_mode_constructors() {
        assert!(OpenMode::input_only().input);
        assert!(!OpenMode::input_only().output);
        assert!(OpenMode::output_only().output);
        assert!(OpenMode::browse_only().browse);
        assert!(!OpenMode::browse_only().input);
    }

    #[test]
    fn test_channel_descriptor_defaults() {
        let cd = ChannelDescriptor::client("localhost(1414)");
        assert_eq!(cd.channel_name, DEFAULT_CHANNEL);
        assert_eq!(cd.connection_name, "localhost(1414)");
        assert_eq!(cd.transport_type, TransportType::Tcp);
        assert_eq!(cd.channel_type, ChannelType::ClientConnection);
    }

    #[test]
    fn test_multi_host_connection_string() {
        let cd = ChannelDescriptor::client("hosta(1414),hostb(1415)");
        assert_eq!(cd.connection_name, "hosta(1414),hostb(1415)");
    }

    #[test]
    fn test_connect_options_default() {
        assert_eq!(ConnectOptions::default().share_mode, ShareMode::ShareBlock);
    }
}
