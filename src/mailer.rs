//! The configuration-driven mail facade.
//!
//! A [`Mailer`] owns a [`MailerConfig`] and three lazily built objects: the
//! transport, the message being composed and the client that sends it.
//! Each is built on first use and kept for the lifetime of the mailer.
//!
//! ```rust,ignore
//! use mailkit::{Mailer, MailerConfig, TransportConfig, SmtpConfig};
//!
//! let mut mailer = Mailer::new(MailerConfig {
//!     transport: TransportConfig::Smtp(SmtpConfig::new("smtp.example.com").port(587)),
//!     ..MailerConfig::default()
//! });
//!
//! mailer.set_to([("Alice", "alice@example.com"), ("Bob", "bob@example.com")]);
//! mailer.set_subject("Quarterly report");
//! let body = mailer.render_template("report", &serde_json::json!({ "quarter": 3 }))?;
//! mailer.set_body(body);
//! mailer.attachment("report.pdf", None, None)?;
//!
//! let accepted = mailer.send().await?;
//! if let Some(failed) = mailer.failed_recipients() {
//!     eprintln!("{} recipients refused", failed.len());
//! }
//! ```
//!
//! # Limitations
//!
//! Configuration is read when each object is built. Changing
//! `config.transport` after the transport exists, or the priority, charset,
//! content type or sender after the message exists, has no effect on them.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::address::{Address, Recipients, ToAddress};
use crate::attachment::Attachment;
use crate::client::MailClient;
use crate::config::MailerConfig;
use crate::error::MailError;
use crate::message::Message;
use crate::transport::{self, Transport};
use crate::view::{Aliases, MiniJinjaRenderer, PathResolver, TemplateRenderer, VIEW_EXTENSION};

/// Mail facade with lazily built transport, message and client.
pub struct Mailer {
    /// Read when the transport and message are first built.
    pub config: MailerConfig,
    renderer: Arc<dyn TemplateRenderer>,
    resolver: Arc<dyn PathResolver>,
    transport: Option<Arc<dyn Transport>>,
    message: Option<Message>,
    client: Option<MailClient>,
    failed_recipients: Vec<Address>,
}

impl Mailer {
    pub fn new(config: MailerConfig) -> Self {
        Self {
            config,
            renderer: Arc::new(MiniJinjaRenderer::new()),
            resolver: Arc::new(Aliases::default()),
            transport: None,
            message: None,
            client: None,
            failed_recipients: Vec::new(),
        }
    }

    /// Build from environment variables, see [`MailerConfig::from_env`].
    pub fn from_env() -> Result<Self, MailError> {
        Ok(Self::new(MailerConfig::from_env()?))
    }

    /// Replace the template renderer used by [`render_template`](Self::render_template).
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replace the resolver used for `config.view_path`.
    pub fn with_resolver(mut self, resolver: Arc<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Use an already built transport instead of building one from config.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self.client = None;
        self
    }

    // =========================================================================
    // Lazy objects
    // =========================================================================

    /// The transport, built from `config.transport` on first call.
    pub fn transport(&mut self) -> Result<Arc<dyn Transport>, MailError> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }

        let transport = transport::build(&self.config.transport)?;
        tracing::debug!(transport = transport.name(), "Built mail transport");
        self.transport = Some(Arc::clone(&transport));
        Ok(transport)
    }

    /// The message being composed, populated from config on first call.
    pub fn message(&mut self) -> &mut Message {
        let config = &self.config;
        self.message.get_or_insert_with(|| new_message(config))
    }

    /// The client, wrapping [`transport`](Self::transport), built on first call.
    pub fn client(&mut self) -> Result<&MailClient, MailError> {
        let client = match self.client.take() {
            Some(client) => client,
            None => {
                let client = MailClient::new(self.transport()?);
                tracing::debug!("Built mail client");
                client
            }
        };
        let client: &MailClient = self.client.insert(client);
        Ok(client)
    }

    // =========================================================================
    // Composition
    // =========================================================================

    pub fn set_from(&mut self, from: impl ToAddress) -> &mut Message {
        self.message().set_from(from)
    }

    /// Replace the recipients.
    ///
    /// Accepts a single address, a list of addresses, or a map of address to
    /// display name.
    pub fn set_to(&mut self, recipients: impl Into<Recipients>) -> &mut Message {
        self.message().set_to(recipients)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Message {
        self.message().set_subject(subject)
    }

    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Message {
        self.message().set_body(body)
    }

    /// Attach a file. The file is read immediately.
    ///
    /// `filename` and `content_type` override the name taken from `path` and
    /// the type guessed from its extension.
    pub fn attachment(
        &mut self,
        path: impl AsRef<Path>,
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<&mut Message, MailError> {
        let attachment = load(path.as_ref(), filename, content_type)?;
        Ok(self.message().attach(attachment))
    }

    /// Embed an image inline and return its `cid:` URI for use in the body.
    pub fn embed_image(
        &mut self,
        path: impl AsRef<Path>,
        filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<String, MailError> {
        let attachment = load(path.as_ref(), filename, content_type)?;
        Ok(self.message().embed(attachment))
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Render `<view_path>/<view>.html` with `params` as named bindings.
    pub fn render_template<P: Serialize + ?Sized>(
        &self,
        view: &str,
        params: &P,
    ) -> Result<String, MailError> {
        let dir = self.resolver.resolve(&self.config.view_path)?;
        let path = dir.join(format!("{}.{}", view, VIEW_EXTENSION));
        if !path.is_file() {
            return Err(MailError::TemplateNotFound(path.display().to_string()));
        }

        let params = serde_json::to_value(params)?;
        tracing::debug!(view = %path.display(), "Rendering view");
        self.renderer.render(&path, &params)
    }

    /// Render a view and use it as the message body.
    pub fn render_body<P: Serialize + ?Sized>(
        &mut self,
        view: &str,
        params: &P,
    ) -> Result<&mut Message, MailError> {
        let body = self.render_template(view, params)?;
        Ok(self.message().set_body(body))
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Send the message and return the number of accepted recipients.
    ///
    /// Refused recipients are available from
    /// [`failed_recipients`](Self::failed_recipients) afterwards.
    pub async fn send(&mut self) -> Result<usize, MailError> {
        self.failed_recipients.clear();

        let client = self.client()?.clone();
        let config = &self.config;
        let message = self.message.get_or_insert_with(|| new_message(config));

        client.send(message, &mut self.failed_recipients).await
    }

    /// Recipients refused by the last send, `None` if there were none.
    pub fn failed_recipients(&self) -> Option<&[Address]> {
        if self.failed_recipients.is_empty() {
            None
        } else {
            Some(self.failed_recipients.as_slice())
        }
    }
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new(MailerConfig::default())
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("config", &self.config)
            .field("transport", &self.transport.as_ref().map(|t| t.name()))
            .field("message", &self.message)
            .field("failed_recipients", &self.failed_recipients)
            .finish()
    }
}

fn new_message(config: &MailerConfig) -> Message {
    tracing::debug!(from = %config.from, "Built message");
    let mut message = Message::new();
    message
        .set_from(&config.from)
        .set_priority(config.priority)
        .set_charset(config.charset.clone())
        .set_content_type(config.content_type.clone());
    message
}

fn load(
    path: &Path,
    filename: Option<&str>,
    content_type: Option<&str>,
) -> Result<Attachment, MailError> {
    let mut attachment = Attachment::from_path(path)?;
    if let Some(filename) = filename {
        attachment = attachment.filename(filename);
    }
    if let Some(content_type) = content_type {
        attachment = attachment.content_type(content_type);
    }
    Ok(attachment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::message::Priority;

    #[test]
    fn test_message_populated_from_config() {
        let mut mailer = Mailer::new(MailerConfig {
            priority: Priority::High,
            charset: "iso-8859-1".into(),
            content_type: "text/plain".into(),
            from: Address::with_name("App", "app@example.com"),
            ..MailerConfig::default()
        });

        let message = mailer.message();
        assert_eq!(message.priority, Priority::High);
        assert_eq!(message.charset, "iso-8859-1");
        assert_eq!(message.content_type, "text/plain");
        assert_eq!(message.from, Some(Address::with_name("App", "app@example.com")));
    }

    #[test]
    fn test_config_changes_after_message_do_not_apply() {
        let mut mailer = Mailer::default();
        mailer.message();
        mailer.config.priority = Priority::Lowest;
        assert_eq!(mailer.message().priority, Priority::Normal);
    }

    #[test]
    fn test_client_reuses_transport() {
        let mut mailer = Mailer::new(MailerConfig {
            transport: TransportConfig::Memory,
            ..MailerConfig::default()
        });

        let transport = mailer.transport().unwrap();
        let client_transport = Arc::clone(mailer.client().unwrap().transport());
        assert!(Arc::ptr_eq(&transport, &client_transport));
    }

    #[test]
    fn test_client_builds_transport() {
        let mut mailer = Mailer::new(MailerConfig {
            transport: TransportConfig::Logger { full: false },
            ..MailerConfig::default()
        });

        assert_eq!(mailer.client().unwrap().transport().name(), "logger");
        assert_eq!(mailer.transport().unwrap().name(), "logger");
    }

    #[test]
    fn test_attachment_overrides() {
        let path = std::env::temp_dir().join(format!("mailkit-{}.bin", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"PDF").unwrap();

        let mut mailer = Mailer::default();
        mailer
            .attachment(&path, Some("report.pdf"), Some("application/pdf"))
            .unwrap();

        let attachment = &mailer.message().attachments[0];
        assert_eq!(attachment.filename, "report.pdf");
        assert_eq!(attachment.content_type, "application/pdf");
        assert!(!attachment.is_inline());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_embed_image_returns_cid() {
        let path = std::env::temp_dir().join(format!("mailkit-{}.png", uuid::Uuid::new_v4()));
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut mailer = Mailer::default();
        let cid = mailer.embed_image(&path, None, None).unwrap();

        let attachment = &mailer.message().attachments[0];
        assert!(attachment.is_inline());
        assert_eq!(attachment.content_type, "image/png");
        assert_eq!(Some(cid), attachment.cid());

        std::fs::remove_file(&path).unwrap();
    }
}
