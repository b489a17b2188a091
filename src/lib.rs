//! # mailkit
//!
//! A configuration-driven mail facade. A [`Mailer`] holds the settings,
//! builds its transport, message and client the first time they are needed
//! and forwards composition and delivery calls to them. MIME and the SMTP
//! and sendmail transports come from [`lettre`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mailkit::Mailer;
//!
//! let mut mailer = Mailer::from_env()?;
//!
//! mailer.set_to([("Alice", "alice@example.com"), ("Bob", "bob@example.com")]);
//! mailer.set_subject("Welcome!");
//! mailer.render_body("welcome", &serde_json::json!({ "team": "Ops" }))?;
//! let logo = mailer.embed_image("assets/logo.png", None, None)?;
//!
//! let accepted = mailer.send().await?;
//! for failed in mailer.failed_recipients().unwrap_or_default() {
//!     tracing::warn!(recipient = %failed, "not delivered");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `MAIL_TRANSPORT` | `smtp`, `sendmail`, `memory`, `logger`, `logger_full`; anything else selects `mail` |
//! | `MAIL_FROM` | Default sender email |
//! | `MAIL_FROM_NAME` | Default sender name |
//! | `MAIL_PRIORITY` | 1 (highest) to 5 (lowest), clamped |
//! | `MAIL_CHARSET` | Body charset (default: `utf-8`) |
//! | `MAIL_CONTENT_TYPE` | Body MIME type (default: `text/html`) |
//! | `MAIL_VIEW_PATH` | View directory (default: `@app/views/mailer`) |
//! | `SMTP_HOST` | SMTP server host |
//! | `SMTP_PORT` | SMTP server port (default: 587) |
//! | `SMTP_USERNAME` | SMTP username |
//! | `SMTP_PASSWORD` | SMTP password |
//! | `SMTP_TLS` | `none`, `starttls` (default) or `tls` |
//! | `SENDMAIL_COMMAND` | Binary used by the `sendmail` and `mail` transports |
//! | `MAIL_EXTRA_PARAMS` | Extra arguments for the `mail` transport, `%s` becomes the sender |
//!
//! ## Feature Flags
//!
//! - `templates` - Askama templates via [`Mailer::compose`]
//! - `testing` - Assertion helpers over [`transport::MemoryTransport`]
//! - `metrics` - Prometheus-style metrics (counters/histograms)
//! - `full` - All of the above
//!
//! ## Metrics
//!
//! Enable `features = ["metrics"]` to emit:
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `mailkit_messages_total` | Counter | transport, status | Messages sent (`success`, `partial`, `error`) |
//! | `mailkit_send_duration_seconds` | Histogram | transport | Send duration |
//!
//! Install a recorder (e.g., `metrics-exporter-prometheus`) in your app to collect them.

/// The version of the mailkit crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod attachment;
mod client;
mod config;
mod error;
mod mailer;
mod message;
mod storage;
mod view;

pub mod transport;

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(feature = "templates")]
mod template;
#[cfg(feature = "templates")]
pub use template::EmailTemplate;

pub use address::{Address, Recipients, ToAddress};
pub use attachment::{Attachment, AttachmentType};
pub use client::MailClient;
pub use config::{MailerConfig, SmtpConfig, TlsMode, TransportConfig, DEFAULT_SENDMAIL};
pub use error::MailError;
pub use mailer::Mailer;
pub use message::{Message, Priority};
pub use storage::{MemoryStorage, Storage, StoredMessage};
pub use transport::{SendReport, Transport};
pub use view::{Aliases, MiniJinjaRenderer, PathResolver, TemplateRenderer, VIEW_EXTENSION};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Address, Attachment, MailError, Mailer, MailerConfig, Message, Priority, ToAddress,
        Transport, TransportConfig,
    };
}
