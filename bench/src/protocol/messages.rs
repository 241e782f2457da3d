use serde::{Deserialize, Serialize};

/// Kind of an event envelope
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Join a session under a username
    Login,
    /// Apply an edit to the shared document
    Change,
}

/// Outer envelope of every frame sent to the service.
///
/// `data` holds the JSON-encoded payload ([`LoginMsg`] or [`ChangeMsg`]) as a
/// string, so the service can route on the envelope before decoding the body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub username: String,
    pub session: String,
    pub event: EventKind,
    pub data: String,
    /// Unix timestamp in nanoseconds
    pub ts: i64,
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginMsg {
    pub username: String,
    pub session_id: String,
}

/// Position in the document, zero-based
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Range {
    pub row: u64,
    pub column: u64,
}

impl Range {
    pub const fn new(row: u64, column: u64) -> Self {
        Self { row, column }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Insert,
}

/// Change payload, shaped like an editor delta
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeMsg {
    /// Originating client. Serialized as `null` when absent.
    pub id: Option<u64>,
    pub action: Action,
    pub start: Range,
    pub end: Range,
    pub lines: Vec<String>,
}

impl ChangeMsg {
    /// Insert of one descriptive line followed by a line break at the top
    /// of the document.
    pub fn scripted_insert(client: u64, seq: usize) -> Self {
        Self {
            id: Some(client),
            action: Action::Insert,
            start: Range::new(0, 0),
            end: Range::new(1, 0),
            lines: vec![format!("message ({}, {})", client, seq), String::new()],
        }
    }
}

impl Event {
    /// Build a login envelope. The payload is encoded eagerly.
    pub fn login(msg: &LoginMsg, ts: i64) -> Result<Self, serde_json::Error> {
        Ok(Self {
            username: msg.username.clone(),
            session: msg.session_id.clone(),
            event: EventKind::Login,
            data: serde_json::to_string(msg)?,
            ts,
        })
    }

    /// Build a change envelope for `username` in `session`.
    pub fn change(
        username: &str,
        session: &str,
        msg: &ChangeMsg,
        ts: i64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            username: username.to_string(),
            session: session.to_string(),
            event: EventKind::Change,
            data: serde_json::to_string(msg)?,
            ts,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the nested payload
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.data)
    }
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Login => "login",
            EventKind::Change => "change",
        }
    }
}
