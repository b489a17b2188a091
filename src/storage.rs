//! In-memory storage for messages captured by the memory transport.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::message::Message;

/// A captured message with metadata.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// Unique identifier, also reported as the message id.
    pub id: String,
    pub message: Message,
    /// The MIME text that would have gone over the wire.
    pub raw: String,
    /// Envelope recipients that were accepted.
    pub accepted: Vec<String>,
    pub sent_at: DateTime<Utc>,
}

/// Trait for message storage backends.
pub trait Storage: Send + Sync {
    /// Store a message and return its ID.
    fn push(&self, message: Message, raw: String, accepted: Vec<String>) -> String;

    /// Get a message by ID.
    fn get(&self, id: &str) -> Option<StoredMessage>;

    /// All stored messages, newest first.
    fn all(&self) -> Vec<StoredMessage>;

    fn clear(&self);

    fn count(&self) -> usize;

    /// Remove and return all stored messages, newest first.
    fn flush(&self) -> Vec<StoredMessage>;
}

/// Thread-safe in-memory storage, kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    messages: RwLock<Vec<StoredMessage>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage wrapped in an Arc for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Storage for MemoryStorage {
    fn push(&self, message: Message, raw: String, accepted: Vec<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.messages.write().push(StoredMessage {
            id: id.clone(),
            message,
            raw,
            accepted,
            sent_at: Utc::now(),
        });
        id
    }

    fn get(&self, id: &str) -> Option<StoredMessage> {
        self.messages.read().iter().find(|m| m.id == id).cloned()
    }

    fn all(&self) -> Vec<StoredMessage> {
        self.messages.read().iter().rev().cloned().collect()
    }

    fn clear(&self) {
        self.messages.write().clear();
    }

    fn count(&self) -> usize {
        self.messages.read().len()
    }

    fn flush(&self) -> Vec<StoredMessage> {
        let mut messages = self.messages.write();
        let mut drained: Vec<StoredMessage> = messages.drain(..).collect();
        drained.reverse();
        drained
    }
}
