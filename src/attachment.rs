//! Message attachments, regular and inline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MailError;

/// Domain used for generated Content-IDs.
const CID_DOMAIN: &str = "mailkit.generated";

/// Type of attachment disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttachmentType {
    /// Regular attachment (shown as downloadable file)
    #[default]
    Attachment,
    /// Inline attachment (embedded in HTML via cid:)
    Inline,
}

/// A message attachment.
///
/// Data is always loaded eagerly so that a missing file is reported while the
/// message is composed, before any transport is touched.
///
/// ```
/// use mailkit::Attachment;
///
/// let report = Attachment::from_bytes("report.pdf", b"%PDF".to_vec());
/// assert_eq!(report.content_type, "application/pdf");
///
/// let logo = Attachment::from_bytes("logo.png", vec![0x89, 0x50]).inline();
/// assert!(logo.cid().unwrap().starts_with("cid:"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename for the attachment
    pub filename: String,
    /// MIME content type (e.g., "application/pdf", "image/png")
    pub content_type: String,
    /// Raw attachment data
    pub data: Vec<u8>,
    /// Whether this is an inline or regular attachment
    pub disposition: AttachmentType,
    /// Content-ID for inline attachments, without angle brackets or `cid:`
    pub content_id: Option<String>,
}

impl Attachment {
    /// Create a new attachment from raw bytes.
    ///
    /// Content type is guessed from the filename extension.
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(Path::new(&filename));

        Self {
            filename,
            content_type,
            data,
            disposition: AttachmentType::Attachment,
            content_id: None,
        }
    }

    /// Create a new attachment by reading a file.
    ///
    /// The filename is taken from the last path component and the content
    /// type is guessed from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MailError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();

        let data = std::fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MailError::AttachmentFileNotFound(path.display().to_string())
            } else {
                MailError::AttachmentReadError(format!("{}: {}", path.display(), e))
            }
        })?;

        Ok(Self {
            filename,
            content_type: guess_content_type(path),
            data,
            disposition: AttachmentType::Attachment,
            content_id: None,
        })
    }

    /// Override the filename.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Set the content type explicitly.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Mark as inline, generating a unique Content-ID if none is set.
    pub fn inline(mut self) -> Self {
        self.disposition = AttachmentType::Inline;
        if self.content_id.is_none() {
            self.content_id = Some(generate_content_id());
        }
        self
    }

    /// Set the Content-ID for inline attachments.
    pub fn content_id(mut self, cid: impl Into<String>) -> Self {
        self.content_id = Some(cid.into());
        self
    }

    /// The `cid:` URI for referencing this attachment from an HTML body.
    pub fn cid(&self) -> Option<String> {
        self.content_id.as_ref().map(|id| format!("cid:{}", id))
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_inline(&self) -> bool {
        self.disposition == AttachmentType::Inline
    }
}

fn guess_content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

fn generate_content_id() -> String {
    format!("{}@{}", uuid::Uuid::new_v4().simple(), CID_DOMAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let attachment = Attachment::from_bytes("test.txt", b"Hello".to_vec());
        assert_eq!(attachment.filename, "test.txt");
        assert_eq!(attachment.content_type, "text/plain");
        assert_eq!(attachment.data, b"Hello");
        assert_eq!(attachment.disposition, AttachmentType::Attachment);
        assert!(attachment.cid().is_none());
    }

    #[test]
    fn test_inline_generates_unique_cids() {
        let a = Attachment::from_bytes("logo.png", vec![1]).inline();
        let b = Attachment::from_bytes("logo.png", vec![1]).inline();
        assert_eq!(a.disposition, AttachmentType::Inline);
        assert_ne!(a.content_id, b.content_id);
        assert!(a.content_id.as_ref().unwrap().ends_with("@mailkit.generated"));
    }

    #[test]
    fn test_explicit_content_id_survives_inline() {
        let attachment = Attachment::from_bytes("image.png", vec![])
            .content_id("my-logo")
            .inline();
        assert_eq!(attachment.cid().as_deref(), Some("cid:my-logo"));
    }

    #[test]
    fn test_overrides() {
        let attachment = Attachment::from_bytes("a.bin", vec![])
            .filename("b.pdf")
            .content_type("application/x-custom");
        assert_eq!(attachment.filename, "b.pdf");
        assert_eq!(attachment.content_type, "application/x-custom");
    }

    #[test]
    fn test_missing_file() {
        let result = Attachment::from_path("/definitely/not/here.pdf");
        assert!(matches!(result, Err(MailError::AttachmentFileNotFound(_))));
    }
}
