use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codecs::xml::XmlCodec;
use crate::error::{EnvelopeError, Result};
use crate::interfaces::codec::EnvelopeCodec;

const DEFAULT_CODEC: XmlCodec = XmlCodec::new();

/// A tagged message: `kind` says what the message is, `payload` carries it.
///
/// Both fields are always present; an unset field is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub payload: String,
}

impl MessageEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(kind: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// Encodes with the default XML format (declaration, four-space indent).
    pub fn encode(&self) -> Result<String> {
        DEFAULT_CODEC.encode(self)
    }

    pub fn decode(text: &str) -> Result<Self> {
        DEFAULT_CODEC.decode(text)
    }
}

impl FromStr for MessageEnvelope {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl fmt::Display for MessageEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes)", self.kind, self.payload.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_is_empty_fields() {
        assert_eq!(MessageEnvelope::new(), MessageEnvelope::with_fields("", ""));
        assert_eq!(MessageEnvelope::new().kind, "");
        assert_eq!(MessageEnvelope::new().payload, "");
    }

    #[test]
    fn with_fields_keeps_values_verbatim() {
        let envelope = MessageEnvelope::with_fields("  join ", String::from("\tlobby\n"));
        assert_eq!(envelope.kind, "  join ");
        assert_eq!(envelope.payload, "\tlobby\n");
    }

    #[test]
    fn from_str_decodes() {
        let envelope: MessageEnvelope = "<message><type>ping</type></message>".parse().unwrap();
        assert_eq!(envelope, MessageEnvelope::with_fields("ping", ""));
    }

    #[test]
    fn display_shows_kind_and_payload_size() {
        let envelope = MessageEnvelope::with_fields("chat", "hello");
        assert_eq!(envelope.to_string(), "chat (5 bytes)");
    }

    #[test]
    fn serde_uses_type_name_and_defaults_missing_fields() {
        let envelope = MessageEnvelope::with_fields("chat", "hi");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value, serde_json::json!({"type": "chat", "payload": "hi"}));

        let partial: MessageEnvelope = serde_json::from_str(r#"{"payload":"hi"}"#).unwrap();
        assert_eq!(partial, MessageEnvelope::with_fields("", "hi"));
    }
}
