//! The mail client: binds one transport and performs sends.

use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::time::Instant;
use tracing::Instrument;

use crate::address::Address;
use crate::error::MailError;
use crate::message::Message;
use crate::transport::Transport;

/// Sends messages through a fixed transport.
///
/// The transport is chosen when the client is built and never changes.
#[derive(Clone)]
pub struct MailClient {
    transport: Arc<dyn Transport>,
}

impl MailClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send `message` and return the number of accepted recipients.
    ///
    /// Recipients the transport refused are appended to `failed`. A
    /// transport-level failure is returned as an error and leaves `failed`
    /// untouched.
    pub async fn send(
        &self,
        message: &Message,
        failed: &mut Vec<Address>,
    ) -> Result<usize, MailError> {
        validate(message)?;

        let transport = self.transport.name();
        let span = tracing::info_span!(
            "mailkit.send",
            transport = transport,
            to = ?message.all_recipients().iter().map(|a| &a.email).collect::<Vec<_>>(),
            subject = %message.subject,
        );

        async move {
            tracing::debug!("Sending message");

            #[cfg(feature = "metrics")]
            let start = Instant::now();

            let result = self.transport.send(message).await;

            #[cfg(feature = "metrics")]
            {
                let duration = start.elapsed().as_secs_f64();
                let status = match &result {
                    Ok(report) if report.failed.is_empty() => "success",
                    Ok(_) => "partial",
                    Err(_) => "error",
                };
                metrics::counter!("mailkit_messages_total", "transport" => transport, "status" => status)
                    .increment(1);
                metrics::histogram!("mailkit_send_duration_seconds", "transport" => transport)
                    .record(duration);
            }

            match result {
                Ok(report) => {
                    for recipient in &report.failed {
                        tracing::warn!(recipient = %recipient.email, "Recipient refused");
                    }
                    tracing::info!(
                        message_id = %report.message_id,
                        accepted = report.accepted,
                        failed = report.failed.len(),
                        "Message sent"
                    );
                    failed.extend(report.failed);
                    Ok(report.accepted)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Message send failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl std::fmt::Debug for MailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailClient")
            .field("transport", &self.transport.name())
            .finish()
    }
}

fn validate(message: &Message) -> Result<(), MailError> {
    if message.from.is_none() {
        return Err(MailError::MissingField("from"));
    }
    if message.all_recipients().is_empty() {
        return Err(MailError::MissingField("to"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    fn message() -> Message {
        let mut message = Message::new();
        message
            .set_from("sender@example.com")
            .set_to(vec!["a@example.com", "b@example.com"])
            .set_subject("Hello");
        message
    }

    #[tokio::test]
    async fn test_send_collects_failed_recipients() {
        let memory = Arc::new(MemoryTransport::new());
        memory.reject("a@example.com");
        let client = MailClient::new(memory.clone());

        let mut failed = Vec::new();
        let accepted = client.send(&message(), &mut failed).await.unwrap();

        assert_eq!(accepted, 1);
        assert_eq!(failed, vec![Address::new("a@example.com")]);
        assert_eq!(memory.message_count(), 1);
    }

    #[tokio::test]
    async fn test_send_validates_before_transport() {
        let memory = Arc::new(MemoryTransport::new());
        let client = MailClient::new(memory.clone());
        let mut failed = Vec::new();

        let mut no_sender = message();
        no_sender.from = None;
        let result = client.send(&no_sender, &mut failed).await;
        assert!(matches!(result, Err(MailError::MissingField("from"))));

        let mut no_recipients = message();
        no_recipients.to.clear();
        let result = client.send(&no_recipients, &mut failed).await;
        assert!(matches!(result, Err(MailError::MissingField("to"))));

        assert_eq!(memory.message_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_aborts() {
        let memory = Arc::new(MemoryTransport::new());
        memory.set_failure("Connection refused");
        let client = MailClient::new(memory);

        let mut failed = Vec::new();
        assert!(client.send(&message(), &mut failed).await.is_err());
        assert!(failed.is_empty());
    }
}
