//! Mailer configuration.
//!
//! Transport selection is an explicit [`TransportConfig`] enum. The loose
//! "type plus option map" form is still accepted through
//! [`TransportConfig::from_options`], which rejects unknown keys up front
//! instead of failing when the transport is first built.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use crate::address::{Address, Recipients};
use crate::error::MailError;
use crate::message::Priority;

/// Command used by the sendmail and mail transports when none is configured.
pub const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

/// TLS mode for SMTP connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TlsMode {
    /// No TLS (dangerous, only for localhost)
    None,
    /// STARTTLS - upgrade to TLS after connecting (port 587)
    #[default]
    StartTls,
    /// Implicit TLS - connect with TLS from start (port 465)
    Tls,
}

impl TlsMode {
    fn parse(value: &str) -> Result<Self, MailError> {
        match value.to_lowercase().as_str() {
            "" | "none" | "plain" => Ok(Self::None),
            "starttls" | "start_tls" => Ok(Self::StartTls),
            "tls" | "ssl" => Ok(Self::Tls),
            other => Err(MailError::Configuration(format!(
                "Unknown SMTP encryption '{}'. Valid values are: none, starttls, tls, ssl",
                other
            ))),
        }
    }

    /// Conventional port for this mode.
    pub fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::StartTls => 587,
            Self::Tls => 465,
        }
    }
}

/// SMTP connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    /// Defaults to the conventional port for `tls`.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: TlsMode,
    /// Socket timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Name announced in EHLO.
    #[serde(default)]
    pub local_domain: Option<String>,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            password: None,
            tls: TlsMode::default(),
            timeout: None,
            local_domain: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn tls(mut self, mode: TlsMode) -> Self {
        self.tls = mode;
        self
    }

    /// The port that will actually be used.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.tls.default_port())
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

/// Which transport delivers messages, and how it is set up.
///
/// Deserializes from a `type`-tagged object:
///
/// ```
/// use mailkit::TransportConfig;
///
/// let config: TransportConfig = serde_json::from_str(
///     r#"{"type": "smtp", "host": "smtp.example.com", "port": 587}"#,
/// ).unwrap();
/// assert_eq!(config.kind(), "smtp");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    /// SMTP relay.
    Smtp(SmtpConfig),
    /// Local sendmail binary, envelope passed as arguments.
    Sendmail {
        #[serde(default)]
        command: Option<String>,
    },
    /// Local mail handoff: the message is piped to the MTA with `-t -i` and
    /// the opaque extra parameters. This is the default.
    Mail {
        #[serde(default)]
        command: Option<String>,
        #[serde(default)]
        params: Vec<String>,
    },
    /// In-memory capture, for development and tests.
    Memory,
    /// Emit tracing events only.
    Logger {
        #[serde(default)]
        full: bool,
    },
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mail {
            command: None,
            params: Vec::new(),
        }
    }
}

impl TransportConfig {
    /// Short name of the selected transport kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Smtp(_) => "smtp",
            Self::Sendmail { .. } => "sendmail",
            Self::Mail { .. } => "mail",
            Self::Memory => "memory",
            Self::Logger { .. } => "logger",
        }
    }

    /// Build a configuration from a transport type name and an option map.
    ///
    /// Typed transports validate every key. Any unrecognized type selects
    /// the default mail transport and takes the whole map as its opaque
    /// parameter bag.
    ///
    /// ```
    /// use mailkit::TransportConfig;
    /// use serde_json::json;
    /// use std::collections::BTreeMap;
    ///
    /// let mut options = BTreeMap::new();
    /// options.insert("host".to_string(), json!("smtp.example.com"));
    /// options.insert("port".to_string(), json!(587));
    /// let config = TransportConfig::from_options("smtp", &options).unwrap();
    /// assert_eq!(config.kind(), "smtp");
    ///
    /// options.insert("colour".to_string(), json!("blue"));
    /// assert!(TransportConfig::from_options("smtp", &options).is_err());
    /// ```
    pub fn from_options(kind: &str, options: &BTreeMap<String, Value>) -> Result<Self, MailError> {
        match kind.to_lowercase().as_str() {
            "smtp" => {
                let mut smtp = SmtpConfig::new("localhost");
                let mut tls_set = false;
                for (key, value) in options {
                    match key.as_str() {
                        "host" => smtp.host = option_string(key, value)?,
                        "port" => smtp.port = Some(option_u16(key, value)?),
                        "username" => smtp.username = Some(option_string(key, value)?),
                        "password" => smtp.password = Some(option_string(key, value)?),
                        "encryption" | "tls" => {
                            smtp.tls = match value {
                                Value::Null => TlsMode::None,
                                Value::Bool(true) => TlsMode::Tls,
                                Value::Bool(false) => TlsMode::None,
                                other => TlsMode::parse(&option_string(key, other)?)?,
                            };
                            tls_set = true;
                        }
                        "timeout" => smtp.timeout = Some(option_seconds(key, value)?),
                        "local_domain" | "localDomain" => {
                            smtp.local_domain = Some(option_string(key, value)?)
                        }
                        _ => return Err(unknown_option("smtp", key)),
                    }
                }
                // The loose form defaults to a plain connection, as the
                // classic `smtp` option set did.
                if !tls_set {
                    smtp.tls = TlsMode::None;
                }
                Ok(Self::Smtp(smtp))
            }
            "sendmail" => {
                let mut command = None;
                for (key, value) in options {
                    match key.as_str() {
                        "command" => command = Some(option_string(key, value)?),
                        _ => return Err(unknown_option("sendmail", key)),
                    }
                }
                Ok(Self::Sendmail { command })
            }
            "memory" => match options.keys().next() {
                Some(key) => Err(unknown_option("memory", key)),
                None => Ok(Self::Memory),
            },
            "logger" | "logger_full" => {
                let mut full = kind.eq_ignore_ascii_case("logger_full");
                for (key, value) in options {
                    match (key.as_str(), value) {
                        ("full", Value::Bool(flag)) => full = *flag,
                        ("full", _) => {
                            return Err(MailError::Configuration(
                                "logger option 'full' must be a boolean".into(),
                            ))
                        }
                        _ => return Err(unknown_option("logger", key)),
                    }
                }
                Ok(Self::Logger { full })
            }
            _ => Ok(Self::Mail {
                command: None,
                params: flatten_params(options),
            }),
        }
    }
}

fn unknown_option(transport: &str, key: &str) -> MailError {
    MailError::Configuration(format!(
        "Unknown option '{}' for {} transport",
        key, transport
    ))
}

fn option_string(key: &str, value: &Value) -> Result<String, MailError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(MailError::Configuration(format!(
            "Option '{}' must be a string",
            key
        ))),
    }
}

fn option_u16(key: &str, value: &Value) -> Result<u16, MailError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        MailError::Configuration(format!(
            "Option '{}' must be an integer between 0 and 65535",
            key
        ))
    })
}

fn option_seconds(key: &str, value: &Value) -> Result<u64, MailError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        MailError::Configuration(format!(
            "Option '{}' must be a non-negative whole number of seconds",
            key
        ))
    })
}

fn flatten_params(options: &BTreeMap<String, Value>) -> Vec<String> {
    fn push(value: &Value, out: &mut Vec<String>) {
        match value {
            Value::Null => {}
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|item| push(item, out)),
            other => out.push(other.to_string()),
        }
    }

    let mut params = Vec::new();
    for value in options.values() {
        push(value, &mut params);
    }
    params
}

/// Configuration for a [`Mailer`](crate::Mailer).
///
/// Fields are read when the corresponding lazy object is first built;
/// changes made afterwards do not reach an already-built message or
/// transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    pub priority: Priority,
    pub charset: String,
    pub content_type: String,
    pub transport: TransportConfig,
    /// Default sender. Accepts `"a@x"` or `{"a@x": "Name"}` when deserialized.
    #[serde(deserialize_with = "deserialize_sender")]
    pub from: Address,
    /// Directory holding views, may start with an alias such as `@app`.
    pub view_path: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            priority: Priority::Normal,
            charset: "utf-8".to_string(),
            content_type: "text/html".to_string(),
            transport: TransportConfig::default(),
            from: Address::with_name("Webmaster", "webmaster@localhost"),
            view_path: "@app/views/mailer".to_string(),
        }
    }
}

fn deserialize_sender<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    let recipients = Recipients::deserialize(deserializer)?;
    recipients
        .first()
        .cloned()
        .ok_or_else(|| serde::de::Error::custom("sender must contain one address"))
}

impl MailerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `MAIL_TRANSPORT` | `smtp`, `sendmail`, `memory`, `logger`, `logger_full`; anything else or unset selects `mail` |
    /// | `MAIL_FROM` / `MAIL_FROM_NAME` | Default sender |
    /// | `MAIL_PRIORITY` | 1 (highest) to 5 (lowest) |
    /// | `MAIL_CHARSET` / `MAIL_CONTENT_TYPE` | Body charset and MIME type |
    /// | `MAIL_VIEW_PATH` | View directory (aliases allowed) |
    /// | `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `SMTP_TLS` | SMTP settings |
    /// | `SENDMAIL_COMMAND` | Binary for `sendmail` and `mail` transports |
    /// | `MAIL_EXTRA_PARAMS` | Whitespace-separated extra parameters for `mail` |
    pub fn from_env() -> Result<Self, MailError> {
        let mut config = Self::default();

        if let Ok(email) = env::var("MAIL_FROM") {
            config.from = match env::var("MAIL_FROM_NAME") {
                Ok(name) => Address::with_name(name, email),
                Err(_) => Address::new(email),
            };
        }
        if let Ok(priority) = env::var("MAIL_PRIORITY") {
            let value: i64 = priority.trim().parse().map_err(|_| {
                MailError::Configuration(format!("MAIL_PRIORITY is not a number: {}", priority))
            })?;
            config.priority = Priority::clamped(value);
        }
        if let Ok(charset) = env::var("MAIL_CHARSET") {
            config.charset = charset;
        }
        if let Ok(content_type) = env::var("MAIL_CONTENT_TYPE") {
            config.content_type = content_type;
        }
        if let Ok(view_path) = env::var("MAIL_VIEW_PATH") {
            config.view_path = view_path;
        }

        let kind = env::var("MAIL_TRANSPORT")
            .map(|k| k.to_lowercase())
            .unwrap_or_default();

        config.transport = match kind.as_str() {
            "smtp" => {
                let host = env::var("SMTP_HOST")
                    .map_err(|_| MailError::Configuration("SMTP_HOST not set".into()))?;
                let tls = match env::var("SMTP_TLS") {
                    Ok(mode) => TlsMode::parse(&mode)?,
                    Err(_) => TlsMode::default(),
                };
                let mut smtp = SmtpConfig::new(host).tls(tls);
                if let Ok(port) = env::var("SMTP_PORT") {
                    smtp.port = Some(port.trim().parse().map_err(|_| {
                        MailError::Configuration(format!("SMTP_PORT is not a valid port: {}", port))
                    })?);
                }
                let username = env::var("SMTP_USERNAME").unwrap_or_default();
                if !username.is_empty() {
                    smtp = smtp.credentials(username, env::var("SMTP_PASSWORD").unwrap_or_default());
                }
                TransportConfig::Smtp(smtp)
            }
            "sendmail" => TransportConfig::Sendmail {
                command: env::var("SENDMAIL_COMMAND").ok(),
            },
            "memory" => TransportConfig::Memory,
            "logger" => TransportConfig::Logger { full: false },
            "logger_full" => TransportConfig::Logger { full: true },
            other => {
                if !other.is_empty() && other != "mail" {
                    tracing::debug!(
                        transport = other,
                        "Unrecognized MAIL_TRANSPORT, using mail transport"
                    );
                }
                TransportConfig::Mail {
                    command: env::var("SENDMAIL_COMMAND").ok(),
                    params: env::var("MAIL_EXTRA_PARAMS")
                        .map(|p| p.split_whitespace().map(String::from).collect())
                        .unwrap_or_default(),
                }
            }
        };

        Ok(config)
    }
}
