//! In-memory transport for development and testing.
//!
//! ```rust,ignore
//! use mailkit::{Mailer, MailerConfig};
//! use mailkit::transport::MemoryTransport;
//! use std::sync::Arc;
//!
//! let memory = Arc::new(MemoryTransport::new());
//! let mut mailer = Mailer::new(MailerConfig::default()).with_transport(memory.clone());
//!
//! mailer.set_to("user@example.com");
//! mailer.send().await?;
//!
//! assert!(memory.sent_to("user@example.com"));
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use super::mime;
use super::{SendReport, Transport};
use crate::error::MailError;
use crate::message::Message;
use crate::storage::{MemoryStorage, Storage, StoredMessage};

/// Transport that captures messages in memory.
///
/// Messages are still rendered to MIME, so address and header errors show
/// up exactly as they would with a real transport.
pub struct MemoryTransport {
    storage: Arc<MemoryStorage>,
    /// If set, send() fails with this error (transport-level failure).
    fail_with: RwLock<Option<String>>,
    /// Lowercased addresses that are refused individually.
    rejected: RwLock<HashSet<String>>,
}

impl MemoryTransport {
    /// Create a new memory transport with fresh storage.
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::shared())
    }

    /// Create a memory transport over existing storage.
    pub fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        Self {
            storage,
            fail_with: RwLock::new(None),
            rejected: RwLock::new(HashSet::new()),
        }
    }

    pub fn storage(&self) -> Arc<MemoryStorage> {
        Arc::clone(&self.storage)
    }

    // =========================================================================
    // Failure Simulation
    // =========================================================================

    /// Make every send fail as if the transport could not connect.
    pub fn set_failure(&self, message: impl Into<String>) {
        *self.fail_with.write() = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.fail_with.write() = None;
    }

    /// Refuse one recipient while accepting the others.
    pub fn reject(&self, email: &str) {
        self.rejected.write().insert(email.to_lowercase());
    }

    pub fn clear_rejections(&self) {
        self.rejected.write().clear();
    }

    // =========================================================================
    // Captured Messages
    // =========================================================================

    /// All captured messages (newest first).
    pub fn messages(&self) -> Vec<StoredMessage> {
        self.storage.all()
    }

    /// The most recently captured message.
    pub fn last_message(&self) -> Option<StoredMessage> {
        self.storage.all().into_iter().next()
    }

    pub fn message_count(&self) -> usize {
        self.storage.count()
    }

    pub fn has_messages(&self) -> bool {
        self.storage.count() > 0
    }

    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Remove and return all captured messages.
    pub fn flush(&self) -> Vec<StoredMessage> {
        self.storage.flush()
    }

    /// Whether a message was accepted for a specific address.
    pub fn sent_to(&self, email: &str) -> bool {
        self.storage.all().iter().any(|stored| {
            stored
                .accepted
                .iter()
                .any(|addr| addr.eq_ignore_ascii_case(email))
        })
    }

    pub fn sent_with_subject(&self, subject: &str) -> bool {
        self.storage
            .all()
            .iter()
            .any(|stored| stored.message.subject == subject)
    }

    /// Find messages matching a predicate.
    pub fn find_messages<F>(&self, predicate: F) -> Vec<StoredMessage>
    where
        F: Fn(&Message) -> bool,
    {
        self.storage
            .all()
            .into_iter()
            .filter(|stored| predicate(&stored.message))
            .collect()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, message: &Message) -> Result<SendReport, MailError> {
        if let Some(ref reason) = *self.fail_with.read() {
            return Err(MailError::transport("memory", reason.clone()));
        }

        let built = mime::build_message(message, false)?;
        let raw = String::from_utf8_lossy(&built.formatted()).into_owned();

        let rejected = self.rejected.read().clone();
        let (failed, accepted): (Vec<_>, Vec<_>) = message
            .all_recipients()
            .into_iter()
            .cloned()
            .partition(|addr| rejected.contains(&addr.email.to_lowercase()));

        let accepted: Vec<String> = accepted.into_iter().map(|addr| addr.email).collect();
        let count = accepted.len();
        let message_id = if count > 0 {
            self.storage.push(message.clone(), raw, accepted)
        } else {
            mime::message_id(&built).unwrap_or_default()
        };

        Ok(SendReport {
            message_id,
            accepted: count,
            failed,
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
