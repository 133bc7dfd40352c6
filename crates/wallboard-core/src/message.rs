//! The message model for the wall.
//!
//! A message id doubles as the deduplication key: it is derived from the
//! creation time at microsecond resolution and bumped past the previously
//! issued id, so ids are unique within a process lifetime and sort in
//! creation order on the issuing node.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Message Id
// ----------------------------------------------------------------------------

/// Unique identifier for a message, immutable once assigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(u64);

static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

impl MessageId {
    /// Reconstruct an id received from a peer.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw microsecond value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Issue a fresh id for the given creation time.
    ///
    /// Two calls in the same microsecond still produce distinct ids; the
    /// second is bumped by one. Uniqueness is only guaranteed within this
    /// process, which is all sessions and posts require.
    pub fn issue(now_micros: u64) -> Self {
        loop {
            let last = LAST_ISSUED.load(Ordering::Relaxed);
            let id = now_micros.max(last + 1);
            if LAST_ISSUED
                .compare_exchange(last, id, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Self(id);
            }
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn unix_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

// ----------------------------------------------------------------------------
// Visibility
// ----------------------------------------------------------------------------

/// Who may read a message. Private messages are visible only to
/// authenticated readers; this filter is the sole confidentiality boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

// ----------------------------------------------------------------------------
// Message
// ----------------------------------------------------------------------------

/// A single wall entry.
///
/// `author` is always resolved from the authenticated session on the origin
/// node, never taken from the client. `created_at` is a display timestamp,
/// not a vector clock; replicas may observe different local orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub visibility: Visibility,
    /// Creation time in microseconds since the Unix epoch.
    pub created_at: u64,
}

impl Message {
    /// Create a new message originating on this node.
    pub fn new(author: impl Into<String>, content: impl Into<String>, visibility: Visibility) -> Self {
        let now = unix_micros();
        Self {
            id: MessageId::issue(now),
            content: content.into(),
            author: author.into(),
            visibility,
            created_at: now,
        }
    }
}

// Two messages are equal iff their ids are equal.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.author, self.content)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_ids_are_distinct_and_increasing() {
        let a = MessageId::issue(unix_micros());
        let b = MessageId::issue(unix_micros());
        let c = MessageId::issue(unix_micros());
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn same_microsecond_still_gets_distinct_ids() {
        let now = unix_micros();
        let a = MessageId::issue(now);
        let b = MessageId::issue(now);
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn message_equality_is_by_id() {
        let original = Message::new("admin", "hello", Visibility::Public);
        let mut replica = original.clone();
        replica.content = "mutated in transit".to_string();
        assert_eq!(original, replica);

        let other = Message::new("admin", "hello", Visibility::Public);
        assert_ne!(original, other);
    }

    #[test]
    fn visibility_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Visibility::Private).unwrap(),
            "\"private\""
        );
        let parsed: Visibility = serde_json::from_str("\"public\"").unwrap();
        assert_eq!(parsed, Visibility::Public);
    }
}
