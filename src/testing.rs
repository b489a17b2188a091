//! Assertion helpers for tests that send through a [`MemoryTransport`].
//!
//! # Example
//!
//! ```rust,ignore
//! use mailkit::transport::MemoryTransport;
//! use mailkit::testing::*;
//! use mailkit::Mailer;
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_welcome_flow() {
//!     let memory = Arc::new(MemoryTransport::new());
//!     let mut mailer = Mailer::default().with_transport(memory.clone());
//!
//!     // ... compose and send ...
//!
//!     assert_message_sent(&memory);
//!     assert_message_to(&memory, "user@example.com");
//!     assert_subject_contains(&memory, "Welcome");
//!     refute_message_to(&memory, "admin@example.com");
//!     assert_body_matches(&memory, r"<h1>.*</h1>");
//! }
//! ```

use regex::Regex;

use crate::message::Message;
use crate::storage::StoredMessage;
use crate::transport::MemoryTransport;

fn format_summary(messages: &[StoredMessage]) -> String {
    if messages.is_empty() {
        return "  (no messages sent)".to_string();
    }

    messages
        .iter()
        .enumerate()
        .map(|(i, stored)| {
            let m = &stored.message;
            let from = m
                .from
                .as_ref()
                .map(|a| a.email.as_str())
                .unwrap_or("<none>");
            format!(
                "  {}. To: [{}], From: {}, Subject: \"{}\"",
                i + 1,
                stored.accepted.join(", "),
                from,
                m.subject
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn last(memory: &MemoryTransport) -> StoredMessage {
    memory
        .last_message()
        .expect("Expected at least one message to be sent, but none were sent")
}

fn excerpt(text: &str) -> &str {
    let mut end = text.len().min(500);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn accepted_for(stored: &StoredMessage, email: &str) -> bool {
    stored.accepted.iter().any(|a| a.eq_ignore_ascii_case(email))
}

// ============================================================================
// Counts
// ============================================================================

/// # Panics
///
/// Panics if nothing was sent.
pub fn assert_message_sent(memory: &MemoryTransport) {
    assert!(
        memory.has_messages(),
        "Expected at least one message to be sent, but none were sent"
    );
}

/// # Panics
///
/// Panics if anything was sent.
pub fn assert_no_messages_sent(memory: &MemoryTransport) {
    let messages = memory.messages();
    assert!(
        messages.is_empty(),
        "Expected no messages to be sent, but {} were sent.\n\nMessages sent:\n{}",
        messages.len(),
        format_summary(&messages)
    );
}

/// # Panics
///
/// Panics if the count doesn't match.
pub fn assert_message_count(memory: &MemoryTransport, expected: usize) {
    let actual = memory.message_count();
    assert!(
        actual == expected,
        "Expected {} message(s) to be sent, but {} were sent.\n\nMessages sent:\n{}",
        expected,
        actual,
        format_summary(&memory.messages())
    );
}

// ============================================================================
// Recipients
// ============================================================================

/// Assert some message was accepted for `email` (to, cc or bcc).
pub fn assert_message_to(memory: &MemoryTransport, email: &str) {
    let messages = memory.messages();
    assert!(
        messages.iter().any(|stored| accepted_for(stored, email)),
        "Expected a message to be sent to '{}'.\n\nMessages sent:\n{}",
        email,
        format_summary(&messages)
    );
}

/// Assert no message was accepted for `email`.
pub fn refute_message_to(memory: &MemoryTransport, email: &str) {
    let messages = memory.messages();
    if let Some(found) = messages.iter().find(|stored| accepted_for(stored, email)) {
        panic!(
            "Expected no message to be sent to '{}', but found one.\n\nMatching message:\n  Subject: \"{}\"\n\nAll messages:\n{}",
            email,
            found.message.subject,
            format_summary(&messages)
        );
    }
}

/// Assert the last message was sent from `email`.
pub fn assert_message_from(memory: &MemoryTransport, email: &str) {
    let last = last(memory);
    let actual = last
        .message
        .from
        .as_ref()
        .map(|a| a.email.as_str())
        .unwrap_or("<none>");

    assert!(
        actual.eq_ignore_ascii_case(email),
        "Expected last message from '{}', but was from '{}'",
        email,
        actual
    );
}

// ============================================================================
// Content
// ============================================================================

pub fn assert_subject(memory: &MemoryTransport, subject: &str) {
    let messages = memory.messages();
    assert!(
        messages.iter().any(|stored| stored.message.subject == subject),
        "Expected a message with subject '{}'.\n\nMessages sent:\n{}",
        subject,
        format_summary(&messages)
    );
}

pub fn assert_subject_contains(memory: &MemoryTransport, text: &str) {
    let messages = memory.messages();
    assert!(
        messages.iter().any(|stored| stored.message.subject.contains(text)),
        "Expected a message with subject containing '{}'.\n\nMessages sent:\n{}",
        text,
        format_summary(&messages)
    );
}

/// Assert the last message body contains `text`.
pub fn assert_body_contains(memory: &MemoryTransport, text: &str) {
    let last = last(memory);
    let body = last.message.body.as_deref().unwrap_or("");

    assert!(
        body.contains(text),
        "Expected body to contain '{}', but it didn't.\n\nBody (first 500 chars):\n{}",
        text,
        excerpt(body)
    );
}

/// Assert the last message body matches a regex.
pub fn assert_body_matches(memory: &MemoryTransport, pattern: &str) {
    let last = last(memory);
    let body = last.message.body.as_deref().unwrap_or("");
    let re = Regex::new(pattern).expect("Invalid regex pattern");

    assert!(
        re.is_match(body),
        "Expected body to match pattern '{}', but it didn't.\n\nBody (first 500 chars):\n{}",
        pattern,
        excerpt(body)
    );
}

/// Assert the last message subject matches a regex.
pub fn assert_subject_matches(memory: &MemoryTransport, pattern: &str) {
    let last = last(memory);
    let re = Regex::new(pattern).expect("Invalid regex pattern");

    assert!(
        re.is_match(&last.message.subject),
        "Expected subject to match pattern '{}', but was '{}'",
        pattern,
        last.message.subject
    );
}

/// Assert the raw MIME of the last message contains a header line.
pub fn assert_raw_contains(memory: &MemoryTransport, text: &str) {
    let last = last(memory);
    assert!(
        last.raw.contains(text),
        "Expected raw message to contain '{}'.\n\nRaw (first 500 chars):\n{}",
        text,
        excerpt(&last.raw)
    );
}

/// Assert the last message carries an attachment named `filename`.
pub fn assert_has_attachment(memory: &MemoryTransport, filename: &str) {
    let last = last(memory);
    let names: Vec<&str> = last
        .message
        .attachments
        .iter()
        .map(|a| a.filename.as_str())
        .collect();

    assert!(
        names.contains(&filename),
        "Expected message to have attachment '{}'.\n\nAttachments: [{}]",
        filename,
        names.join(", ")
    );
}

/// Assert some message matches a predicate.
pub fn assert_message_matches<F>(memory: &MemoryTransport, predicate: F)
where
    F: Fn(&Message) -> bool,
{
    assert!(
        !memory.find_messages(predicate).is_empty(),
        "Expected a message matching the predicate, but none was found.\n\nMessages sent:\n{}",
        format_summary(&memory.messages())
    );
}
