//! Channel types and message protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Identifies a channel type / platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    Telegram,
    Discord,
    Slack,
    WebChat,
    Matrix,
    Signal,
    WhatsApp,
    Email,
    Irc,
    Webhook,
    Sms,
    Teams,
    IMessage,
    Mattermost,
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Telegram => write!(f, "telegram"),
            Self::Discord => write!(f, "discord"),
            Self::Slack => write!(f, "slack"),
            Self::WebChat => write!(f, "webchat"),
            Self::Matrix => write!(f, "matrix"),
            Self::Signal => write!(f, "signal"),
            Self::WhatsApp => write!(f, "whatsapp"),
            Self::Email => write!(f, "email"),
            Self::Irc => write!(f, "irc"),
            Self::Webhook => write!(f, "webhook"),
            Self::Sms => write!(f, "sms"),
            Self::Teams => write!(f, "teams"),
            Self::IMessage => write!(f, "imessage"),
            Self::Mattermost => write!(f, "mattermost"),
        }
    }
}

/// Describes the capabilities that a channel supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCapabilities {
    pub supports_threads: bool,
    pub supports_reactions: bool,
    pub supports_files: bool,
    pub supports_voice: bool,
    pub supports_video: bool,
    pub max_message_length: Option<usize>,
    pub supports_editing: bool,
    pub supports_deletion: bool,
}

/// How a channel receives incoming messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamingMode {
    /// Periodic polling with a given interval.
    Polling { interval_ms: u64 },
    /// Persistent WebSocket connection.
    WebSocket,
    /// Server-sent events (HTTP streaming).
    ServerSentEvents,
    /// Long-polling (HTTP held open until data).
    LongPolling,
}

impl Default for StreamingMode {
    fn default() -> Self {
        Self::Polling { interval_ms: 5000 }
    }
}

/// Unique identifier for a thread within a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message across channels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// A user within a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelUser {
    pub id: String,
    pub display_name: Option<String>,
    pub channel_type: ChannelType,
}

impl ChannelUser {
    pub fn new(id: impl Into<String>, channel_type: ChannelType) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            channel_type,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Content carried by a channel message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageContent {
    /// Plain text content.
    Text { text: String },
    /// An image (URL or base64).
    Image {
        url: String,
        alt_text: Option<String>,
    },
    /// A file attachment.
    File {
        url: String,
        filename: String,
        size_bytes: Option<u64>,
    },
    /// A command (e.g., `/start`, `/help`).
    Command { command: String, args: Vec<String> },
    /// Generic media (audio, video, etc.).
    Media {
        url: String,
        mime_type: String,
        caption: Option<String>,
    },
    /// A geographic location.
    Location {
        latitude: f64,
        longitude: f64,
        label: Option<String>,
    },
    /// A contact card.
    Contact {
        name: String,
        phone: Option<String>,
        email: Option<String>,
    },
    /// A reaction to another message.
    Reaction {
        emoji: String,
        target_message_id: MessageId,
    },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn command(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::Command {
            command: command.into(),
            args,
        }
    }

    /// Extract plain text content, if present.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Connection status of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    /// Not yet connected.
    Disconnected,
    /// Actively connecting.
    Connecting,
    /// Connected and ready.
    Connected,
    /// Connection lost, will retry.
    Reconnecting,
    /// Permanently failed.
    Failed,
}

/// A message sent or received over a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub channel_type: ChannelType,
    pub channel_id: String,
    pub sender: ChannelUser,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
    pub reply_to: Option<MessageId>,
    pub thread_id: Option<ThreadId>,
    pub metadata: HashMap<String, String>,
}

impl ChannelMessage {
    /// Create a new text message.
    pub fn text(
        channel_type: ChannelType,
        channel_id: impl Into<String>,
        sender: ChannelUser,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::random(),
            channel_type,
            channel_id: channel_id.into(),
            sender,
            content: MessageContent::text(text),
            timestamp: Utc::now(),
            reply_to: None,
            thread_id: None,
            metadata: HashMap::new(),
        }
    }

    /// Set a reply-to reference.
    pub fn with_reply_to(mut self, reply_to: MessageId) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Set a thread ID for threaded conversations.
    pub fn with_thread(mut self, thread_id: ThreadId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
