//! Askama template integration.
//!
//! Compile-time checked alternative to [`Mailer::render_template`].
//!
//! # Example
//!
//! ```rust,ignore
//! use askama::Template;
//! use mailkit::{EmailTemplate, Mailer};
//!
//! #[derive(Template)]
//! #[template(path = "emails/welcome.html")]
//! struct WelcomeEmail {
//!     user_name: String,
//! }
//!
//! impl EmailTemplate for WelcomeEmail {
//!     fn subject(&self) -> String {
//!         format!("Welcome, {}!", self.user_name)
//!     }
//! }
//!
//! let mut mailer = Mailer::from_env()?;
//! mailer.set_to("alice@example.com");
//! mailer.compose(&WelcomeEmail { user_name: "Alice".into() })?;
//! mailer.send().await?;
//! ```

use askama::Template;

use crate::error::MailError;
use crate::mailer::Mailer;
use crate::message::Message;

/// An askama template that knows its subject line.
pub trait EmailTemplate: Template {
    fn subject(&self) -> String;

    /// Body MIME type, `None` keeps the configured one.
    fn content_type(&self) -> Option<&'static str> {
        None
    }
}

impl Mailer {
    /// Render `template` into the subject and body of the message.
    pub fn compose<T: EmailTemplate>(&mut self, template: &T) -> Result<&mut Message, MailError> {
        let body = template
            .render()
            .map_err(|e| MailError::TemplateError(e.to_string()))?;

        let message = self.message();
        message.set_subject(template.subject()).set_body(body);
        if let Some(content_type) = template.content_type() {
            message.set_content_type(content_type);
        }
        Ok(message)
    }
}
