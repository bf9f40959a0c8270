//! Control-channel wire protocol.
//!
//! This module owns **every message that crosses the control boundary**
//! between the agent and its controlling process. Both directions are
//! newline-delimited JSON, one object per line.
//!
//! ## Inbound (controller → agent)
//!
//! | `command` | Fields                                     |
//! |-----------|--------------------------------------------|
//! | `connect` | `options: {host, port, username, auth?, version?}` |
//! | `chat`    | `message`                                  |
//! | `quit`    | *(none)*                                   |
//! | `follow`  | `username`                                 |
//! | `come`    | `username`                                 |
//! | `stop`    | *(none)*                                   |
//! | `voice`   | `username`, `text`                         |
//!
//! ## Outbound (agent → controller)
//!
//! `{"type": <status|info|chat|error>, "data": ...}`
//!
//! ## Design rules
//!
//! 1. A line that does not decode into a [`Command`] is dropped without output.
//! 2. Unknown `command` tags fail to decode, so they are dropped the same way.
//! 3. Exactly one [`Record`] per reported event; no batching.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{AuthMode, ConnectionParams, VersionSpec};

// ---------------------------------------------------------------------------
// Inbound commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    Connect { options: ConnectOptions },
    Chat { message: String },
    Quit,
    Follow { username: String },
    Stop,
    Come { username: String },
    Voice { username: String, text: String },
}

/// `options` object of a `connect` command.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ConnectOptions {
    pub host: String,
    /// Controllers send the port as a number or as a numeric string.
    #[serde(deserialize_with = "port_number_or_string")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub auth: AuthMode,
    /// `"auto"` or absent lets the server pick the protocol version.
    /// A bare JSON number is taken as its decimal text.
    #[serde(default, deserialize_with = "version_number_or_string")]
    pub version: Option<String>,
}

impl From<ConnectOptions> for ConnectionParams {
    fn from(o: ConnectOptions) -> Self {
        ConnectionParams {
            host: o.host,
            port: o.port,
            username: o.username,
            auth: o.auth,
            version: VersionSpec::from(o.version),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u16),
    Text(String),
}

fn port_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(raw) => raw.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionValue {
    Text(String),
    Number(serde_json::Number),
}

fn version_number_or_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<VersionValue>::deserialize(deserializer)?.map(|v| match v {
            VersionValue::Text(raw) => raw,
            VersionValue::Number(n) => n.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Outbound records
// ---------------------------------------------------------------------------

/// Lifecycle labels carried by `status` records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StatusLabel {
    Ready,
    Spawned,
    Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatPayload {
    pub username: String,
    pub message: String,
}

/// One outbound line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Record {
    Status(StatusLabel),
    Info(String),
    Chat(ChatPayload),
    Error(String),
}

impl Record {
    pub fn status(label: StatusLabel) -> Self {
        Record::Status(label)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Record::Info(message.into())
    }

    pub fn chat(username: impl Into<String>, message: impl Into<String>) -> Self {
        Record::Chat(ChatPayload {
            username: username.into(),
            message: message.into(),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Record::Error(message.into())
    }

    /// The `type` tag this record is written with.
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Status(_) => "status",
            Record::Info(_) => "info",
            Record::Chat(_) => "chat",
            Record::Error(_) => "error",
        }
    }
}
