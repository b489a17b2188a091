//! Logger transport tests.

use mailkit::transport::LoggerTransport;
use mailkit::{Attachment, Message, Transport};

#[tokio::test]
async fn send_returns_report() {
    let transport = LoggerTransport::new();

    let mut message = Message::new();
    message
        .set_from("tony.stark@example.com")
        .set_to("steve.rogers@example.com")
        .set_subject("Hello, Avengers!")
        .set_body("Hello!");

    let report = transport.send(&message).await.unwrap();
    assert_eq!(report.accepted, 1);
    assert!(!report.message_id.is_empty());
}

#[tokio::test]
async fn full_logging_with_all_fields() {
    let transport = LoggerTransport::full();

    let mut message = Message::new();
    message
        .set_from(("T Stark", "tony.stark@example.com"))
        .set_to([
            ("Steve Rogers", "steve.rogers@example.com"),
            ("Bruce Banner", "bruce.banner@example.com"),
        ])
        .set_cc("natasha.romanoff@example.com")
        .set_bcc("nick.fury@example.com")
        .set_reply_to("pepper.potts@example.com")
        .set_subject("Hello, Avengers!")
        .set_body("<h1>Hello</h1>")
        .attach(Attachment::from_bytes("plan.txt", b"assemble".to_vec()));

    let report = transport.send(&message).await.unwrap();
    assert_eq!(report.accepted, 4);
    assert!(report.failed.is_empty());
}
