//! Default transport: hand the whole message to the local MTA.
//!
//! The message, headers included, is written to the stdin of
//! `sendmail -t -i` and the MTA takes the recipients from the headers.
//! Extra parameters are appended verbatim; a parameter containing `%s` gets
//! the sender address substituted, so `-f%s` sets the envelope sender.

use async_trait::async_trait;
use std::any::Any;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::mime;
use super::{SendReport, Transport};
use crate::config::DEFAULT_SENDMAIL;
use crate::error::MailError;
use crate::message::Message;

/// Local mail handoff transport.
#[derive(Debug, Clone)]
pub struct MailTransport {
    command: String,
    extra_params: Vec<String>,
}

impl MailTransport {
    /// Use `/usr/sbin/sendmail`.
    pub fn new() -> Self {
        Self::with_command(DEFAULT_SENDMAIL)
    }

    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            extra_params: Vec::new(),
        }
    }

    /// Set the opaque extra parameters passed to the MTA.
    pub fn extra_params(mut self, params: Vec<String>) -> Self {
        self.extra_params = params;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn params(&self) -> &[String] {
        &self.extra_params
    }

    /// Arguments for one invocation, with `%s` replaced by `reverse_path`.
    pub fn arguments(&self, reverse_path: &str) -> Vec<String> {
        let mut args = vec!["-t".to_string(), "-i".to_string()];
        args.extend(
            self.extra_params
                .iter()
                .map(|param| param.replace("%s", reverse_path)),
        );
        args
    }
}

impl Default for MailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MailTransport {
    async fn send(&self, message: &Message) -> Result<SendReport, MailError> {
        let built = mime::build_message(message, true)?;
        let message_id = mime::message_id(&built).unwrap_or_default();
        let accepted = built.envelope().to().len();
        let reverse_path = match &message.from {
            Some(from) => from.to_ascii()?,
            None => return Err(MailError::MissingField("from")),
        };

        let args = self.arguments(&reverse_path);
        tracing::debug!(command = %self.command, args = ?args, "Spawning local MTA");

        let mut child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MailError::transport("mail", format!("{}: {}", self.command, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MailError::transport("mail", "MTA stdin unavailable"))?;
        stdin
            .write_all(&built.formatted())
            .await
            .map_err(|e| MailError::transport("mail", e.to_string()))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| MailError::transport("mail", e.to_string()))?;

        if !output.status.success() {
            return Err(MailError::transport(
                "mail",
                format!(
                    "{} exited with {}: {}",
                    self.command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Ok(SendReport::accepted(message_id, accepted))
    }

    fn name(&self) -> &'static str {
        "mail"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
