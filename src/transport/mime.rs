//! Conversion of [`Message`] into a lettre MIME message.

use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Attachment as LettreAttachment, Mailbox, MultiPart, SinglePart};

use crate::address::Address;
use crate::attachment::Attachment;
use crate::error::MailError;
use crate::message::Message;

/// Build a lettre message.
///
/// With `keep_bcc` the Bcc header is written out, for transports that let
/// the MTA read recipients from the headers.
pub(crate) fn build_message(message: &Message, keep_bcc: bool) -> Result<lettre::Message, MailError> {
    let from = message
        .from
        .as_ref()
        .ok_or(MailError::MissingField("from"))?;

    if message.all_recipients().is_empty() {
        return Err(MailError::MissingField("to"));
    }

    let mut builder = lettre::Message::builder()
        .from(to_mailbox(from)?)
        .subject(message.subject.clone())
        .message_id(None)
        .raw_header(HeaderValue::new(
            HeaderName::new_from_ascii_str("X-Priority"),
            message.priority.to_string(),
        ));

    for to in &message.to {
        builder = builder.to(to_mailbox(to)?);
    }
    for cc in &message.cc {
        builder = builder.cc(to_mailbox(cc)?);
    }
    for bcc in &message.bcc {
        builder = builder.bcc(to_mailbox(bcc)?);
    }
    for reply_to in &message.reply_to {
        builder = builder.reply_to(to_mailbox(reply_to)?);
    }
    if keep_bcc {
        builder = builder.keep_bcc();
    }

    for (name, value) in &message.headers {
        let name = HeaderName::new_from_ascii(name.clone())
            .map_err(|_| MailError::BuildError(format!("Invalid header name: {}", name)))?;
        builder = builder.raw_header(HeaderValue::new(name, value.clone()));
    }

    let content_type = parse_content_type(&message.content_type_header())?;
    let body = message.body.clone().unwrap_or_default();

    if !message.has_attachments() {
        return Ok(builder.header(content_type).body(body)?);
    }

    let body_part = SinglePart::builder().header(content_type).body(body);

    let inline: Vec<&Attachment> = message.inline_attachments().collect();
    let regular: Vec<&Attachment> = message.regular_attachments().collect();

    // Body plus inline parts go in multipart/related, regular attachments
    // wrap that in multipart/mixed.
    let related = if inline.is_empty() {
        None
    } else {
        let mut related = MultiPart::related().singlepart(body_part.clone());
        for attachment in inline {
            related = related.singlepart(to_part(attachment)?);
        }
        Some(related)
    };

    let multipart = if regular.is_empty() {
        match related {
            Some(related) => related,
            None => MultiPart::mixed().singlepart(body_part),
        }
    } else {
        let mut mixed = match related {
            Some(related) => MultiPart::mixed().multipart(related),
            None => MultiPart::mixed().singlepart(body_part),
        };
        for attachment in regular {
            mixed = mixed.singlepart(to_part(attachment)?);
        }
        mixed
    };

    Ok(builder.multipart(multipart)?)
}

/// Message-ID header of a built message, without angle brackets.
pub(crate) fn message_id(message: &lettre::Message) -> Option<String> {
    message
        .headers()
        .get_raw("Message-ID")
        .map(|id| id.trim().trim_start_matches('<').trim_end_matches('>').to_string())
}

/// Convert our Address to lettre's Mailbox.
pub(crate) fn to_mailbox(addr: &Address) -> Result<Mailbox, MailError> {
    Ok(Mailbox::new(addr.name.clone(), to_lettre_address(addr)?))
}

pub(crate) fn to_lettre_address(addr: &Address) -> Result<lettre::Address, MailError> {
    addr.email
        .parse()
        .map_err(|e: lettre::address::AddressError| {
            MailError::InvalidAddress(format!("{}: {}", addr.email, e))
        })
}

fn parse_content_type(value: &str) -> Result<ContentType, MailError> {
    ContentType::parse(value)
        .map_err(|e| MailError::BuildError(format!("Invalid content type '{}': {}", value, e)))
}

fn to_part(attachment: &Attachment) -> Result<SinglePart, MailError> {
    let content_type = parse_content_type(&attachment.content_type)?;
    let builder = match &attachment.content_id {
        Some(cid) if attachment.is_inline() => LettreAttachment::new_inline(cid.clone()),
        _ => LettreAttachment::new(attachment.filename.clone()),
    };
    Ok(builder.body(attachment.data.clone(), content_type))
}
