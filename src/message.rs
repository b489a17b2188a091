//! The message being composed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::address::{Address, Recipients, ToAddress};
use crate::attachment::Attachment;

/// Message priority, carried in the `X-Priority` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Priority {
    Highest = 1,
    High = 2,
    #[default]
    Normal = 3,
    Low = 4,
    Lowest = 5,
}

impl Priority {
    /// Map a numeric priority onto 1..=5, clamping out-of-range values.
    pub fn clamped(value: i64) -> Self {
        match value {
            i64::MIN..=1 => Self::Highest,
            2 => Self::High,
            3 => Self::Normal,
            4 => Self::Low,
            _ => Self::Lowest,
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Highest => "Highest",
            Self::High => "High",
            Self::Normal => "Normal",
            Self::Low => "Low",
            Self::Lowest => "Lowest",
        }
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Self::clamped(i64::from(value))
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.level()
    }
}

/// `X-Priority` header value, e.g. `1 (Highest)`.
impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.level(), self.label())
    }
}

/// An in-memory email message prior to transmission.
///
/// Mutators take `&mut self` and return it, so calls chain off the
/// reference the [`Mailer`](crate::Mailer) hands out:
///
/// ```
/// use mailkit::Message;
///
/// let mut message = Message::new();
/// message
///     .set_to("user@example.com")
///     .set_subject("Hello")
///     .set_body("<p>Hi</p>");
///
/// assert_eq!(message.to.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Sender address
    pub from: Option<Address>,
    /// Primary recipients
    pub to: Vec<Address>,
    /// Carbon copy recipients
    pub cc: Vec<Address>,
    /// Blind carbon copy recipients
    pub bcc: Vec<Address>,
    /// Reply-to addresses
    pub reply_to: Vec<Address>,
    pub subject: String,
    pub body: Option<String>,
    /// Body MIME type, e.g. `text/html`
    pub content_type: String,
    pub charset: String,
    pub priority: Priority,
    pub attachments: Vec<Attachment>,
    /// Custom headers
    pub headers: BTreeMap<String, String>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            subject: String::new(),
            body: None,
            content_type: "text/plain".to_string(),
            charset: "utf-8".to_string(),
            priority: Priority::Normal,
            attachments: Vec::new(),
            headers: BTreeMap::new(),
        }
    }
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_from(&mut self, addr: impl ToAddress) -> &mut Self {
        self.from = Some(addr.to_address());
        self
    }

    /// Replace all primary recipients.
    pub fn set_to(&mut self, recipients: impl Into<Recipients>) -> &mut Self {
        self.to = recipients.into().into_vec();
        self
    }

    /// Add a primary recipient.
    pub fn add_to(&mut self, addr: impl ToAddress) -> &mut Self {
        self.to.push(addr.to_address());
        self
    }

    /// Replace all CC recipients.
    pub fn set_cc(&mut self, recipients: impl Into<Recipients>) -> &mut Self {
        self.cc = recipients.into().into_vec();
        self
    }

    /// Replace all BCC recipients.
    pub fn set_bcc(&mut self, recipients: impl Into<Recipients>) -> &mut Self {
        self.bcc = recipients.into().into_vec();
        self
    }

    pub fn set_reply_to(&mut self, recipients: impl Into<Recipients>) -> &mut Self {
        self.reply_to = recipients.into().into_vec();
        self
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = subject.into();
        self
    }

    pub fn set_body(&mut self, body: impl Into<String>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) -> &mut Self {
        self.content_type = content_type.into();
        self
    }

    pub fn set_charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = charset.into();
        self
    }

    pub fn set_priority(&mut self, priority: Priority) -> &mut Self {
        self.priority = priority;
        self
    }

    /// Add a custom header.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn attach(&mut self, attachment: Attachment) -> &mut Self {
        self.attachments.push(attachment);
        self
    }

    /// Embed an attachment inline and return its `cid:` URI.
    pub fn embed(&mut self, attachment: Attachment) -> String {
        let attachment = attachment.inline();
        // inline() always assigns a content id
        let cid = attachment.cid().unwrap_or_default();
        self.attachments.push(attachment);
        cid
    }

    /// The full `Content-Type` value including charset.
    pub fn content_type_header(&self) -> String {
        if self.charset.is_empty() {
            self.content_type.clone()
        } else {
            format!("{}; charset={}", self.content_type, self.charset)
        }
    }

    /// All envelope recipients (to + cc + bcc).
    pub fn all_recipients(&self) -> Vec<&Address> {
        self.to
            .iter()
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
            .collect()
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Inline attachments only.
    pub fn inline_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_inline())
    }

    /// Regular (non-inline) attachments only.
    pub fn regular_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| !a.is_inline())
    }
}
