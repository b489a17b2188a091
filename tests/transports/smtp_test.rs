//! SMTP transport tests. Delivery runs against a scripted server on
//! 127.0.0.1.

use mailkit::transport::SmtpTransport;
use mailkit::{
    MailError, Mailer, MailerConfig, Message, SmtpConfig, TlsMode, Transport, TransportConfig,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ============================================================================
// Scripted server
// ============================================================================

/// Replies that differ from a server accepting everything.
#[derive(Clone, Default)]
struct Script {
    /// Advertise AUTH and answer it with this reply.
    auth: Option<&'static str>,
    /// Reply to MAIL FROM.
    mail: Option<&'static str>,
    /// Recipients answered with 550 at RCPT TO.
    unknown_users: Vec<&'static str>,
    /// Reply once the message payload has been received.
    data: Option<&'static str>,
}

/// Serve one SMTP session and return the commands it received, with
/// `<message>` standing for the DATA payload.
async fn serve(script: Script) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = socket.into_split();
        let mut reader = BufReader::new(reader);
        let mut commands = Vec::new();

        writer.write_all(b"220 fake.example.com ESMTP\r\n").await.unwrap();

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let command = line.trim_end().to_string();
            let verb = command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();
            commands.push(command.clone());

            let reply = match verb.as_str() {
                "EHLO" if script.auth.is_some() => {
                    "250-fake.example.com\r\n250 AUTH PLAIN LOGIN".to_string()
                }
                "EHLO" => "250 fake.example.com".to_string(),
                "AUTH" => script.auth.unwrap_or("235 2.7.0 OK").to_string(),
                "MAIL" => script.mail.unwrap_or("250 2.1.0 OK").to_string(),
                "RCPT" if script.unknown_users.iter().any(|u| command.contains(u)) => {
                    "550 5.1.1 user unknown".to_string()
                }
                "RCPT" => "250 2.1.5 OK".to_string(),
                "DATA" => {
                    writer.write_all(b"354 go ahead\r\n").await.unwrap();
                    loop {
                        let mut data = String::new();
                        if reader.read_line(&mut data).await.unwrap() == 0 || data == ".\r\n" {
                            break;
                        }
                    }
                    commands.push("<message>".to_string());
                    script.data.unwrap_or("250 2.0.0 queued").to_string()
                }
                "QUIT" => {
                    writer.write_all(b"221 2.0.0 bye\r\n").await.unwrap();
                    break;
                }
                "RSET" | "NOOP" => "250 2.0.0 OK".to_string(),
                _ => "502 5.5.2 unrecognized".to_string(),
            };
            writer.write_all(format!("{}\r\n", reply).as_bytes()).await.unwrap();
        }

        commands
    });

    (port, handle)
}

fn local_smtp(port: u16) -> SmtpConfig {
    SmtpConfig {
        timeout: Some(5),
        ..SmtpConfig::new("127.0.0.1").port(port).tls(TlsMode::None)
    }
}

fn avengers_message() -> Message {
    let mut message = Message::new();
    message
        .set_from("tony.stark@example.com")
        .set_to(vec!["steve.rogers@example.com", "bruce.banner@example.com"])
        .set_subject("Assemble")
        .set_body("<p>Now.</p>");
    message
}

fn is_smtp_error(result: &Result<impl std::fmt::Debug, MailError>) -> bool {
    matches!(
        result,
        Err(MailError::Transport {
            transport: "smtp",
            ..
        })
    )
}

#[test]
fn builds_from_loose_options() {
    let options: BTreeMap<String, serde_json::Value> = serde_json::from_value(json!({
        "host": "mail.example.com",
        "port": "2525",
        "username": "tony",
        "password": "jarvis",
        "encryption": "tls",
        "timeout": 30,
        "localDomain": "stark.example.com",
    }))
    .unwrap();

    let config = match TransportConfig::from_options("smtp", &options).unwrap() {
        TransportConfig::Smtp(smtp) => smtp,
        other => panic!("expected smtp, got {:?}", other),
    };
    assert_eq!(config.timeout_duration(), Some(Duration::from_secs(30)));
    assert_eq!(config.local_domain.as_deref(), Some("stark.example.com"));

    let transport = SmtpTransport::new(config).unwrap();
    assert_eq!(transport.host(), "mail.example.com");
    assert_eq!(transport.port(), 2525);
    assert_eq!(transport.tls(), TlsMode::Tls);
    assert_eq!(transport.config().username.as_deref(), Some("tony"));
}

#[tokio::test]
async fn unreachable_server_aborts_send() {
    let transport = SmtpTransport::new(SmtpConfig {
        timeout: Some(2),
        ..SmtpConfig::new("127.0.0.1").port(1).tls(TlsMode::None)
    })
    .unwrap();

    let mut message = Message::new();
    message
        .set_from("tony.stark@example.com")
        .set_to(vec!["steve.rogers@example.com", "bruce.banner@example.com"]);

    let result = transport.send(&message).await;
    assert!(is_smtp_error(&result));
}

// ============================================================================
// Delivery
// ============================================================================

#[tokio::test]
async fn delivers_to_every_accepted_recipient() {
    let (port, server) = serve(Script::default()).await;
    let transport = SmtpTransport::new(local_smtp(port)).unwrap();

    let report = transport.send(&avengers_message()).await.unwrap();
    assert_eq!(report.accepted, 2);
    assert!(report.failed.is_empty());

    let commands = server.await.unwrap();
    assert!(commands[1].starts_with("MAIL FROM:<tony.stark@example.com>"));
    assert_eq!(
        commands.iter().filter(|c| c.starts_with("RCPT TO")).count(),
        2
    );
    assert!(commands.contains(&"<message>".to_string()));
}

#[tokio::test]
async fn refused_recipient_is_recorded_and_others_delivered() {
    let (port, server) = serve(Script {
        unknown_users: vec!["bruce.banner@example.com"],
        ..Script::default()
    })
    .await;

    let mut mailer = Mailer::new(MailerConfig {
        transport: TransportConfig::Smtp(local_smtp(port)),
        from: "tony.stark@example.com".into(),
        ..MailerConfig::default()
    });
    mailer.set_to(vec!["steve.rogers@example.com", "bruce.banner@example.com"]);
    mailer.set_subject("Assemble");
    mailer.set_body("<p>Now.</p>");

    let accepted = mailer.send().await.unwrap();
    assert_eq!(accepted, 1);

    let failed: Vec<&str> = mailer
        .failed_recipients()
        .unwrap()
        .iter()
        .map(|a| a.email.as_str())
        .collect();
    assert_eq!(failed, vec!["bruce.banner@example.com"]);

    // One transaction, so the message went out once to the accepted recipient.
    let commands = server.await.unwrap();
    assert_eq!(commands.iter().filter(|c| c.starts_with("MAIL")).count(), 1);
    assert!(commands.contains(&"<message>".to_string()));
}

#[tokio::test]
async fn every_recipient_refused_skips_data() {
    let (port, server) = serve(Script {
        unknown_users: vec!["steve.rogers@example.com", "bruce.banner@example.com"],
        ..Script::default()
    })
    .await;
    let transport = SmtpTransport::new(local_smtp(port)).unwrap();

    let report = transport.send(&avengers_message()).await.unwrap();
    assert_eq!(report.accepted, 0);
    assert_eq!(report.failed.len(), 2);

    let commands = server.await.unwrap();
    assert!(!commands.iter().any(|c| c == "DATA"));
}

#[tokio::test]
async fn rejected_sender_aborts_send() {
    let (port, server) = serve(Script {
        mail: Some("550 5.7.1 sender rejected"),
        ..Script::default()
    })
    .await;

    let mut mailer = Mailer::new(MailerConfig {
        transport: TransportConfig::Smtp(local_smtp(port)),
        from: "tony.stark@example.com".into(),
        ..MailerConfig::default()
    });
    mailer.set_to(vec!["steve.rogers@example.com", "bruce.banner@example.com"]);

    let result = mailer.send().await;
    assert!(is_smtp_error(&result));
    assert_eq!(mailer.failed_recipients(), None);

    let commands = server.await.unwrap();
    assert!(!commands.iter().any(|c| c.starts_with("RCPT")));
}

#[tokio::test]
async fn rejected_credentials_abort_send() {
    let (port, server) = serve(Script {
        auth: Some("535 5.7.8 authentication failed"),
        ..Script::default()
    })
    .await;
    let transport =
        SmtpTransport::new(local_smtp(port).credentials("tony", "wrong-password")).unwrap();

    let result = transport.send(&avengers_message()).await;
    assert!(is_smtp_error(&result));

    let commands = server.await.unwrap();
    assert!(commands.iter().any(|c| c.starts_with("AUTH")));
    assert!(!commands.iter().any(|c| c.starts_with("MAIL")));
}

#[tokio::test]
async fn rejected_message_aborts_send() {
    let (port, server) = serve(Script {
        data: Some("554 5.7.1 message refused"),
        ..Script::default()
    })
    .await;
    let transport = SmtpTransport::new(local_smtp(port)).unwrap();

    let result = transport.send(&avengers_message()).await;
    assert!(is_smtp_error(&result));

    let commands = server.await.unwrap();
    assert!(commands.contains(&"<message>".to_string()));
}
