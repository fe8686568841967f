//! Chat and message records for Parley.
//!
//! A chat binds exactly two participants; messages belong to exactly one chat.
//! Identifiers are UUID v7 so that ids sort in creation order, which the
//! message pagination cursor relies on as a tiebreak.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for a chat, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub Uuid);

impl ChatId {
    /// Create a new ChatId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChatId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a message, wrapping a UUID v7.
///
/// Ids generated later compare greater, so `(created_at, id)` is a total
/// order over the messages of a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Create a new MessageId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Order a participant pair canonically (lexicographically smaller first).
///
/// Chats are persisted with their pair in this order so that `(a, b)` and
/// `(b, a)` hit the same unique key.
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

/// A persistent two-party conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    /// Canonically smaller participant.
    pub user_id1: String,
    /// Canonically larger participant.
    pub user_id2: String,
    pub created_at: DateTime<Utc>,
    /// Last activity; refreshed whenever a message is sent into the chat.
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Whether `user_id` is one of the two participants.
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.user_id1 == user_id || self.user_id2 == user_id
    }

    /// The participant that is not `user_id`, if `user_id` is a participant.
    pub fn counterpart(&self, user_id: &str) -> Option<&str> {
        if self.user_id1 == user_id {
            Some(&self.user_id2)
        } else if self.user_id2 == user_id {
            Some(&self.user_id1)
        } else {
            None
        }
    }
}

/// A single message within a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Set once, when the counterpart marks the chat as read.
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// Request body for opening a chat between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub user_id1: String,
    pub user_id2: String,
}

/// Request body for sending a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: String,
    pub content: String,
}

/// Request body for marking a chat's incoming messages as read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkReadRequest {
    pub user_id: String,
}

/// Result of a mark-as-read call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReadResult {
    pub chat_id: ChatId,
    pub user_id: String,
    /// Messages that transitioned from unread to read.
    pub marked: u64,
}
