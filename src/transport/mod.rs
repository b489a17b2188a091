//! Transport trait and the built-in transports.
//!
//! # Why `async_trait`?
//!
//! The [`Mailer`](crate::Mailer) facade picks its transport at runtime from
//! configuration and keeps it as an `Arc<dyn Transport>`. Native async trait
//! methods are not object-safe, so `#[async_trait]` boxes the returned
//! futures. Delivery is network- or process-bound and the allocation does
//! not show up next to it.
//!
//! ## Available transports
//!
//! | Transport | Config | Description |
//! |-----------|--------|-------------|
//! | [`SmtpTransport`] | `smtp` | SMTP relay via lettre |
//! | [`SendmailTransport`] | `sendmail` | Local sendmail binary, envelope as arguments |
//! | [`MailTransport`] | `mail` (default) | Message piped to the local MTA with `-t -i` |
//! | [`MemoryTransport`] | `memory` | In-memory capture for dev/testing |
//! | [`LoggerTransport`] | `logger` | Logs messages without sending |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

use crate::address::Address;
use crate::config::TransportConfig;
use crate::error::MailError;
use crate::message::Message;

mod logger;
mod mail;
mod memory;
pub(crate) mod mime;
mod sendmail;
mod smtp;

pub use logger::LoggerTransport;
pub use mail::MailTransport;
pub use memory::MemoryTransport;
pub use sendmail::SendmailTransport;
pub use smtp::SmtpTransport;

/// Outcome of handing one message to a transport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendReport {
    /// Message ID assigned by the transport or taken from the message
    pub message_id: String,
    /// Number of recipients accepted for delivery
    pub accepted: usize,
    /// Recipients the transport refused, without aborting the others
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<Address>,
}

impl SendReport {
    /// A report where every recipient was accepted.
    pub fn accepted(message_id: impl Into<String>, accepted: usize) -> Self {
        Self {
            message_id: message_id.into(),
            accepted,
            failed: Vec::new(),
        }
    }
}

/// A delivery mechanism.
///
/// Implementations hand a composed [`Message`] to the next hop. Refused
/// individual recipients go into [`SendReport::failed`]; failures that stop
/// the whole delivery (connection refused, process exited non-zero) are
/// returned as errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &Message) -> Result<SendReport, MailError>;

    /// Transport name (for logging/debugging).
    fn name(&self) -> &'static str {
        "unknown"
    }

    /// Access the concrete transport, e.g. to read back SMTP settings.
    fn as_any(&self) -> &dyn Any;
}

/// Build a transport from its configuration.
pub fn build(config: &TransportConfig) -> Result<Arc<dyn Transport>, MailError> {
    let transport: Arc<dyn Transport> = match config {
        TransportConfig::Smtp(smtp) => Arc::new(SmtpTransport::new(smtp.clone())?),
        TransportConfig::Sendmail { command } => Arc::new(match command {
            Some(command) => SendmailTransport::with_command(command),
            None => SendmailTransport::new(),
        }),
        TransportConfig::Mail { command, params } => {
            let mut transport = match command {
                Some(command) => MailTransport::with_command(command),
                None => MailTransport::new(),
            };
            transport = transport.extra_params(params.clone());
            Arc::new(transport)
        }
        TransportConfig::Memory => Arc::new(MemoryTransport::new()),
        TransportConfig::Logger { full } => Arc::new(LoggerTransport::new().log_full(*full)),
    };
    Ok(transport)
}
