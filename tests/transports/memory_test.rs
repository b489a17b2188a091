//! Memory transport tests.

use mailkit::transport::MemoryTransport;
use mailkit::{Message, MemoryStorage, Priority, Storage, Transport};
use std::sync::Arc;

fn avengers() -> Message {
    let mut message = Message::new();
    message
        .set_from("tony.stark@example.com")
        .set_to("steve.rogers@example.com")
        .set_cc("natasha.romanoff@example.com")
        .set_bcc("nick.fury@example.com")
        .set_subject("Hello, Avengers!")
        .set_body("Hello!");
    message
}

// ============================================================================
// Capture
// ============================================================================

#[tokio::test]
async fn captures_sent_messages() {
    let memory = MemoryTransport::new();
    let report = memory.send(&avengers()).await.unwrap();

    assert_eq!(report.accepted, 3);
    assert_eq!(memory.message_count(), 1);
    assert!(memory.sent_to("steve.rogers@example.com"));
    assert!(memory.sent_to("nick.fury@example.com"));
    assert!(memory.sent_with_subject("Hello, Avengers!"));
}

#[tokio::test]
async fn raw_message_hides_bcc() {
    let memory = MemoryTransport::new();
    memory.send(&avengers()).await.unwrap();

    let stored = memory.last_message().unwrap();
    assert!(stored.raw.contains("Cc: natasha.romanoff@example.com"));
    assert!(!stored.raw.contains("nick.fury@example.com"));
}

#[tokio::test]
async fn newest_message_first() {
    let memory = MemoryTransport::new();
    for subject in ["first", "second"] {
        let mut message = avengers();
        message.set_subject(subject);
        memory.send(&message).await.unwrap();
    }

    let subjects: Vec<String> = memory
        .messages()
        .into_iter()
        .map(|s| s.message.subject)
        .collect();
    assert_eq!(subjects, ["second", "first"]);
}

#[tokio::test]
async fn shares_storage() {
    let storage = MemoryStorage::shared();
    let memory = MemoryTransport::with_storage(Arc::clone(&storage));

    let report = memory.send(&avengers()).await.unwrap();
    let stored = storage.get(&report.message_id).unwrap();
    assert_eq!(stored.accepted.len(), 3);
}

#[tokio::test]
async fn find_messages_by_predicate() {
    let memory = MemoryTransport::new();
    let mut urgent = avengers();
    urgent.set_priority(Priority::Highest);
    memory.send(&urgent).await.unwrap();
    memory.send(&avengers()).await.unwrap();

    let found = memory.find_messages(|m| m.priority == Priority::Highest);
    assert_eq!(found.len(), 1);
}

// ============================================================================
// Failure Simulation
// ============================================================================

#[tokio::test]
async fn can_simulate_failure() {
    let memory = MemoryTransport::new();
    memory.set_failure("SMTP connection refused");

    let result = memory.send(&avengers()).await;
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("SMTP connection refused"));

    memory.clear_failure();
    assert!(memory.send(&avengers()).await.is_ok());
}

#[tokio::test]
async fn rejections_are_case_insensitive() {
    let memory = MemoryTransport::new();
    memory.reject("Nick.Fury@example.com");

    let report = memory.send(&avengers()).await.unwrap();
    assert_eq!(report.accepted, 2);
    assert_eq!(report.failed[0].email, "nick.fury@example.com");

    memory.clear_rejections();
    let report = memory.send(&avengers()).await.unwrap();
    assert!(report.failed.is_empty());
}

#[test]
fn name_is_memory() {
    assert_eq!(MemoryTransport::new().name(), "memory");
}
