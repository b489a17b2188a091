//! SMTP transport using lettre.
//!
//! # Example
//!
//! ```rust,ignore
//! use mailkit::{SmtpConfig, TlsMode};
//! use mailkit::transport::SmtpTransport;
//!
//! let transport = SmtpTransport::new(
//!     SmtpConfig::new("smtp.example.com")
//!         .port(587)
//!         .credentials("username", "password")
//!         .tls(TlsMode::StartTls),
//! )?;
//! ```

use async_trait::async_trait;
use lettre::transport::smtp::authentication::{Credentials, DEFAULT_MECHANISMS};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::commands::{Data, Mail, Rcpt};
use lettre::transport::smtp::extension::{ClientId, Extension, MailBodyParameter, MailParameter};
use std::any::Any;
use std::time::Duration;

use super::mime;
use super::{SendReport, Transport};
use crate::address::Address;
use crate::config::{SmtpConfig, TlsMode};
use crate::error::MailError;
use crate::message::Message;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// SMTP transport.
///
/// Each send opens one connection and runs one transaction. A negative
/// reply to a recipient's `RCPT TO` records that recipient as failed and
/// the message is still delivered to the others. Any other failure (the
/// connection, TLS, `AUTH`, `MAIL FROM` or `DATA`) aborts the send.
pub struct SmtpTransport {
    config: SmtpConfig,
    hello_name: ClientId,
    tls_parameters: Option<TlsParameters>,
    credentials: Option<Credentials>,
}

impl SmtpTransport {
    /// Build the transport. No connection is opened until the first send.
    pub fn new(config: SmtpConfig) -> Result<Self, MailError> {
        let tls_parameters = match config.tls {
            TlsMode::None => None,
            TlsMode::StartTls | TlsMode::Tls => Some(TlsParameters::new(config.host.clone())?),
        };
        let credentials = config.username.as_ref().map(|username| {
            Credentials::new(username.clone(), config.password.clone().unwrap_or_default())
        });
        let hello_name = match &config.local_domain {
            Some(domain) => ClientId::Domain(domain.clone()),
            None => ClientId::default(),
        };

        tracing::debug!(
            host = %config.host,
            port = config.effective_port(),
            tls = ?config.tls,
            "Built SMTP transport"
        );

        Ok(Self {
            config,
            hello_name,
            tls_parameters,
            credentials,
        })
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.effective_port()
    }

    pub fn tls(&self) -> TlsMode {
        self.config.tls
    }

    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }

    /// Open a connection and check the server answers.
    pub async fn test_connection(&self) -> Result<bool, MailError> {
        let mut conn = self.connect().await?;
        let connected = conn.test_connected().await;
        conn.abort().await;
        Ok(connected)
    }

    /// Connect, greet, upgrade and authenticate.
    async fn connect(&self) -> Result<AsyncSmtpConnection, MailError> {
        let implicit_tls = match self.config.tls {
            TlsMode::Tls => self.tls_parameters.clone(),
            TlsMode::None | TlsMode::StartTls => None,
        };

        let mut conn = AsyncSmtpConnection::connect_tokio1(
            (self.config.host.as_str(), self.port()),
            Some(self.config.timeout_duration().unwrap_or(DEFAULT_TIMEOUT)),
            &self.hello_name,
            implicit_tls,
            None,
        )
        .await?;

        if let Err(e) = self.secure(&mut conn).await {
            conn.abort().await;
            return Err(e);
        }
        Ok(conn)
    }

    async fn secure(&self, conn: &mut AsyncSmtpConnection) -> Result<(), MailError> {
        if let (TlsMode::StartTls, Some(parameters)) = (self.config.tls, &self.tls_parameters) {
            conn.starttls(parameters.clone(), &self.hello_name).await?;
        }
        if let Some(credentials) = &self.credentials {
            conn.auth(DEFAULT_MECHANISMS, credentials).await?;
        }
        Ok(())
    }

    /// Run one `MAIL FROM` / `RCPT TO` / `DATA` transaction.
    async fn transaction(
        &self,
        conn: &mut AsyncSmtpConnection,
        sender: lettre::Address,
        recipients: &[&Address],
        raw: &[u8],
        report: &mut SendReport,
    ) -> Result<(), MailError> {
        let mut parameters = Vec::new();
        if !raw.is_ascii() {
            if !conn.server_info().supports_feature(Extension::EightBitMime) {
                return Err(MailError::transport(
                    "smtp",
                    "message contains non-ascii characters but the server does not support 8BITMIME",
                ));
            }
            parameters.push(MailParameter::Body(MailBodyParameter::EightBitMime));
        }

        conn.command(Mail::new(Some(sender), parameters)).await?;

        for recipient in recipients {
            let address = mime::to_lettre_address(recipient)?;
            match conn.command(Rcpt::new(address, vec![])).await {
                Ok(_) => report.accepted += 1,
                Err(e) if e.is_permanent() || e.is_transient() => {
                    tracing::warn!(
                        recipient = %recipient.email,
                        error = %e,
                        "SMTP server refused recipient"
                    );
                    report.failed.push((*recipient).clone());
                }
                Err(e) => return Err(e.into()),
            }
        }

        if report.accepted == 0 {
            return Ok(());
        }

        conn.command(Data).await?;
        conn.message(raw).await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, message: &Message) -> Result<SendReport, MailError> {
        let built = mime::build_message(message, false)?;
        let message_id = mime::message_id(&built).unwrap_or_default();
        let raw = built.formatted();
        let sender = match built.envelope().from() {
            Some(from) => from.clone(),
            None => return Err(MailError::MissingField("from")),
        };

        let mut report = SendReport {
            message_id,
            ..SendReport::default()
        };

        let mut conn = self.connect().await?;
        let recipients = message.all_recipients();
        match self
            .transaction(&mut conn, sender, &recipients, &raw, &mut report)
            .await
        {
            Ok(()) => {
                if let Err(e) = conn.quit().await {
                    tracing::debug!(error = %e, "SMTP QUIT failed");
                }
                Ok(report)
            }
            Err(e) => {
                conn.abort().await;
                Err(e)
            }
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
