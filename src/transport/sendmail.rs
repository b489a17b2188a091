//! Sendmail transport using lettre.

use async_trait::async_trait;
use lettre::{AsyncSendmailTransport, AsyncTransport, Tokio1Executor};
use std::any::Any;

use super::mime;
use super::{SendReport, Transport};
use crate::config::DEFAULT_SENDMAIL;
use crate::error::MailError;
use crate::message::Message;

/// Hands messages to a local sendmail binary, envelope as arguments.
///
/// Sendmail reports success or failure for the whole message, so either all
/// recipients are accepted or the send fails.
pub struct SendmailTransport {
    command: String,
    transport: AsyncSendmailTransport<Tokio1Executor>,
}

impl SendmailTransport {
    /// Use `/usr/sbin/sendmail`.
    pub fn new() -> Self {
        Self::with_command(DEFAULT_SENDMAIL)
    }

    pub fn with_command(command: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            transport: AsyncSendmailTransport::<Tokio1Executor>::new_with_command(command.clone()),
            command,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SendmailTransport {
    async fn send(&self, message: &Message) -> Result<SendReport, MailError> {
        let built = mime::build_message(message, false)?;
        let message_id = mime::message_id(&built).unwrap_or_default();
        let accepted = built.envelope().to().len();

        self.transport.send(built).await?;

        Ok(SendReport::accepted(message_id, accepted))
    }

    fn name(&self) -> &'static str {
        "sendmail"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
