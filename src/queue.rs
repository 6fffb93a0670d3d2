//! Deferred delivery
//!
//! A built message can be handed to a [`MailQueue`] instead of being sent
//! immediately. The storage and the cron runner behind the queue are external
//! collaborators; the crate only ships [`NullQueue`], which accepts nothing
//! and returns the zero identifier.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::transport::TransportSnapshot;

/// A built message captured for deferred delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedMessage {
    /// Registry name of the message.
    pub name: String,
    /// Populated transport state at build time.
    pub snapshot: TransportSnapshot,
    /// Instant the message should be delivered at.
    pub when: DateTime<Utc>,
    /// Free-form context stored alongside the message.
    pub context: Map<String, Value>,
}

/// Persists built messages for delayed delivery.
pub trait MailQueue {
    /// Stores one message and returns its queue identifier; `0` means the
    /// message was not queued.
    fn push(&mut self, message: QueuedMessage) -> u64;
}

/// Queue backend without storage: every push is acknowledged with the zero
/// identifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullQueue;

impl MailQueue for NullQueue {
    fn push(&mut self, message: QueuedMessage) -> u64 {
        debug!(name = message.name.as_str(), "queue has no storage backend, message not persisted");
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::params::ContentType;

    #[test]
    fn null_queue_never_queues() {
        let message = QueuedMessage {
            name: "welcome".to_string(),
            snapshot: TransportSnapshot {
                from: None,
                to: Vec::new(),
                cc: Vec::new(),
                bcc: Vec::new(),
                reply_to: Vec::new(),
                attachments: Vec::new(),
                charset: "utf-8".to_string(),
                encoding: None,
                content_type: ContentType::MultipartAlternative,
                headers: Vec::new(),
                subject: String::new(),
                html: String::new(),
                text: String::new(),
            },
            when: Utc::now(),
            context: Map::new(),
        };
        assert_eq!(NullQueue.push(message), 0);
    }
}
