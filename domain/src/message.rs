use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

const DISCRIMINANT: &str = "id";

/// Wire discriminants. The numbering is shared with deployed clients and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Matched = 0,
    CountDown = 1,
    Click = 2,
    GameOver = 3,
    Name = 4,
    NamePlease = 5,
    ClickCount = 6,
    WinCount = 7,
}

impl MessageKind {
    const ALL: [MessageKind; 8] = [
        MessageKind::Matched,
        MessageKind::CountDown,
        MessageKind::Click,
        MessageKind::GameOver,
        MessageKind::Name,
        MessageKind::NamePlease,
        MessageKind::ClickCount,
        MessageKind::WinCount,
    ];

    fn from_discriminant(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| u64::from(*kind as u8) == id)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            MessageKind::Matched => "MATCHED",
            MessageKind::CountDown => "COUNTDOWN",
            MessageKind::Click => "CLICK",
            MessageKind::GameOver => "GAMEOVER",
            MessageKind::Name => "NAME",
            MessageKind::NamePlease => "NAMEPLEASE",
            MessageKind::ClickCount => "CLICKCOUNT",
            MessageKind::WinCount => "WINCOUNT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message is not a record")]
    NotARecord,

    #[error("message has no `id` field")]
    MissingKind,

    #[error("unknown message kind {0}")]
    UnknownKind(String),

    #[error("{kind} message is missing `{field}`")]
    MissingField { kind: MessageKind, field: &'static str },

    #[error("{kind} field `{field}` should be {expected}, found {found}")]
    WrongType {
        kind: MessageKind,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    WinCount { count: u32 },
    NamePlease,
    Name { name: String },
    Matched { opponent_name: String },
    CountDown { value: u32 },
    Click,
    ClickCount { your_count: u32, their_count: u32 },
    GameOver { won: bool },
}

impl Message {
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::WinCount { .. } => MessageKind::WinCount,
            Message::NamePlease => MessageKind::NamePlease,
            Message::Name { .. } => MessageKind::Name,
            Message::Matched { .. } => MessageKind::Matched,
            Message::CountDown { .. } => MessageKind::CountDown,
            Message::Click => MessageKind::Click,
            Message::ClickCount { .. } => MessageKind::ClickCount,
            Message::GameOver { .. } => MessageKind::GameOver,
        }
    }

    /// Serializes into a flat JSON object. Keys come out sorted, so equal messages encode identically.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut record = Map::new();
        record.insert(DISCRIMINANT.into(), Value::from(self.kind() as u8));
        match self {
            Message::WinCount { count } => {
                record.insert("count".into(), Value::from(*count));
            }
            Message::Name { name } => {
                record.insert("name".into(), Value::from(name.as_str()));
            }
            Message::Matched { opponent_name } => {
                record.insert("opponentName".into(), Value::from(opponent_name.as_str()));
            }
            Message::CountDown { value } => {
                record.insert("value".into(), Value::from(*value));
            }
            Message::ClickCount {
                your_count,
                their_count,
            } => {
                record.insert("yourCount".into(), Value::from(*your_count));
                record.insert("theirCount".into(), Value::from(*their_count));
            }
            Message::GameOver { won } => {
                record.insert("won".into(), Value::from(*won));
            }
            Message::NamePlease | Message::Click => {}
        }
        Value::Object(record).to_string()
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let Value::Object(record) = serde_json::from_str::<Value>(text)? else {
            return Err(ProtocolError::NotARecord);
        };

        let kind = match record.get(DISCRIMINANT) {
            None => return Err(ProtocolError::MissingKind),
            Some(id) => id
                .as_u64()
                .and_then(MessageKind::from_discriminant)
                .ok_or_else(|| ProtocolError::UnknownKind(id.to_string()))?,
        };

        let fields = Fields { kind, record: &record };
        let message = match kind {
            MessageKind::WinCount => Message::WinCount {
                count: fields.count("count")?,
            },
            MessageKind::NamePlease => Message::NamePlease,
            MessageKind::Name => Message::Name {
                name: fields.string("name")?,
            },
            MessageKind::Matched => Message::Matched {
                opponent_name: fields.string("opponentName")?,
            },
            MessageKind::CountDown => Message::CountDown {
                value: fields.count("value")?,
            },
            MessageKind::Click => Message::Click,
            MessageKind::ClickCount => Message::ClickCount {
                your_count: fields.count("yourCount")?,
                their_count: fields.count("theirCount")?,
            },
            MessageKind::GameOver => Message::GameOver {
                won: fields.flag("won")?,
            },
        };
        Ok(message)
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Message::decode(text)
    }
}

struct Fields<'a> {
    kind: MessageKind,
    record: &'a Map<String, Value>,
}

impl Fields<'_> {
    fn get(
        &self,
        field: &'static str,
    ) -> Result<&Value, ProtocolError> {
        self.record.get(field).ok_or(ProtocolError::MissingField { kind: self.kind, field })
    }

    fn wrong_type(
        &self,
        field: &'static str,
        expected: &'static str,
        found: &Value,
    ) -> ProtocolError {
        ProtocolError::WrongType {
            kind: self.kind,
            field,
            expected,
            found: type_name(found),
        }
    }

    fn string(
        &self,
        field: &'static str,
    ) -> Result<String, ProtocolError> {
        match self.get(field)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(self.wrong_type(field, "a string", other)),
        }
    }

    fn count(
        &self,
        field: &'static str,
    ) -> Result<u32, ProtocolError> {
        let value = self.get(field)?;
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| self.wrong_type(field, "a non-negative integer", value))
    }

    fn flag(
        &self,
        field: &'static str,
    ) -> Result<bool, ProtocolError> {
        match self.get(field)? {
            Value::Bool(b) => Ok(*b),
            other => Err(self.wrong_type(field, "a boolean", other)),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
