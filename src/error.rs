//! Error types for mailkit.

use thiserror::Error;

/// Errors that can occur while configuring, composing, or sending mail.
#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// Configuration error (unknown transport option, invalid value, missing env var, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing required field (e.g., from address).
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid email address format.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Attachment file not found.
    #[error("Attachment file not found: {0}")]
    AttachmentFileNotFound(String),

    /// Failed to read attachment file.
    #[error("Failed to read attachment: {0}")]
    AttachmentReadError(String),

    /// Resolved view file does not exist.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Error building the MIME message.
    #[error("Build error: {0}")]
    BuildError(String),

    /// Error sending the message.
    #[error("Send error: {0}")]
    SendError(String),

    /// Transport-specific error with details.
    #[error("Transport error ({transport}): {message}")]
    Transport {
        transport: &'static str,
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl MailError {
    /// Create a transport-specific error.
    pub fn transport(transport: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            transport,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MailError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        Self::BuildError(err.to_string())
    }
}

impl From<lettre::address::AddressError> for MailError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::transport("smtp", err.to_string())
    }
}

impl From<lettre::transport::sendmail::Error> for MailError {
    fn from(err: lettre::transport::sendmail::Error) -> Self {
        Self::transport("sendmail", err.to_string())
    }
}

impl From<minijinja::Error> for MailError {
    fn from(err: minijinja::Error) -> Self {
        Self::TemplateError(err.to_string())
    }
}
