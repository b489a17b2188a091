//! Logger transport that only logs messages.
//!
//! Useful for staging environments or when you want to see what would be
//! sent without actually sending anything.

use async_trait::async_trait;
use std::any::Any;

use super::{SendReport, Transport};
use crate::error::MailError;
use crate::message::Message;

/// Emits tracing events instead of delivering.
pub struct LoggerTransport {
    /// If true, log full message details. If false, just a recipient summary.
    log_full: bool,
}

impl LoggerTransport {
    /// Brief output (just recipients).
    pub fn new() -> Self {
        Self { log_full: false }
    }

    /// Full message details.
    pub fn full() -> Self {
        Self { log_full: true }
    }

    pub fn log_full(mut self, full: bool) -> Self {
        self.log_full = full;
        self
    }
}

impl Default for LoggerTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LoggerTransport {
    async fn send(&self, message: &Message) -> Result<SendReport, MailError> {
        let message_id = uuid::Uuid::new_v4().to_string();

        if self.log_full {
            tracing::info!(
                message_id = %message_id,
                from = ?message.from.as_ref().map(|a| a.formatted()),
                to = ?message.to.iter().map(|a| a.formatted()).collect::<Vec<_>>(),
                cc = ?message.cc.iter().map(|a| a.formatted()).collect::<Vec<_>>(),
                bcc = ?message.bcc.iter().map(|a| a.formatted()).collect::<Vec<_>>(),
                subject = %message.subject,
                content_type = %message.content_type_header(),
                priority = %message.priority,
                attachments = message.attachments.len(),
                "Message logged (full)"
            );

            if let Some(ref body) = message.body {
                tracing::debug!(body = %body, "Message body");
            }
        } else {
            tracing::info!(
                message_id = %message_id,
                to = ?message.to.iter().map(|a| &a.email).collect::<Vec<_>>(),
                subject = %message.subject,
                "Message logged"
            );
        }

        Ok(SendReport::accepted(
            message_id,
            message.all_recipients().len(),
        ))
    }

    fn name(&self) -> &'static str {
        "logger"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logger_counts_all_recipients() {
        let transport = LoggerTransport::full();

        let mut message = Message::new();
        message
            .set_from(("Alice", "alice@example.com"))
            .set_to("bob@example.com")
            .set_cc("charlie@example.com")
            .set_subject("Test Subject")
            .set_body("<p>HTML</p>");

        let report = transport.send(&message).await.unwrap();
        assert_eq!(report.accepted, 2);
        assert!(!report.message_id.is_empty());
    }

    #[test]
    fn test_logger_builder() {
        assert!(LoggerTransport::new().log_full(true).log_full);
        assert!(!LoggerTransport::default().log_full);
        assert_eq!(LoggerTransport::new().name(), "logger");
    }
}
