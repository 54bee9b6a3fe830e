//! Text-frame codec for presence events.
//!
//! Decoding validates field by field so a rejected frame always carries the reason:
//! unparseable text, an unrecognized `type`, or a missing required field. Unknown
//! extra fields are ignored.

use serde_json::{Map, Value};

use crate::messages::{PresenceEvent, PresenceEventKind, TeamPresence};

const TYPE_FIELD: &str = "type";
const PLAYER_ID_FIELD: &str = "playerId";
const PLAYER_NAME_FIELD: &str = "playerName";
const TEAM_ID_FIELD: &str = "teamId";

/// Reasons an inbound frame is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Not a JSON object with a string `type`, or a field has the wrong JSON type
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// `type` is present but names no known event
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// A field required by the matched event kind is absent
    #[error("Missing required field '{field}' for '{kind}' event")]
    MissingField {
        kind: PresenceEventKind,
        field: &'static str,
    },
}

impl CodecError {
    fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }
}

/// Parse one inbound text frame into a typed event.
pub fn decode(raw: &str) -> Result<PresenceEvent, CodecError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| CodecError::malformed(e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(CodecError::malformed("expected a JSON object"));
    };

    let discriminant = match object.get(TYPE_FIELD) {
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err(CodecError::malformed("'type' must be a string")),
        None => return Err(CodecError::malformed("missing 'type' discriminant")),
    };

    let kind = PresenceEventKind::from_wire(discriminant)
        .ok_or_else(|| CodecError::UnknownEventType(discriminant.to_string()))?;

    let presence = TeamPresence {
        player_id: required_str(&object, kind, PLAYER_ID_FIELD)?,
        player_name: required_str(&object, kind, PLAYER_NAME_FIELD)?,
        team_id: required_str(&object, kind, TEAM_ID_FIELD)?,
    };

    Ok(kind.into_event(presence))
}

/// Serialize an event into its canonical text form.
///
/// Field order is fixed: `type`, `playerId`, `playerName`, `teamId`.
pub fn encode(event: &PresenceEvent) -> String {
    let presence = event.presence();
    format!(
        r#"{{"{TYPE_FIELD}":"{}","{PLAYER_ID_FIELD}":{},"{PLAYER_NAME_FIELD}":{},"{TEAM_ID_FIELD}":{}}}"#,
        event.kind().as_str(),
        json_str(&presence.player_id),
        json_str(&presence.player_name),
        json_str(&presence.team_id),
    )
}

/// Quote and escape `s` as a JSON string literal.
fn json_str(s: &str) -> String {
    Value::String(s.to_owned()).to_string()
}

fn required_str(
    object: &Map<String, Value>,
    kind: PresenceEventKind,
    field: &'static str,
) -> Result<String, CodecError> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(CodecError::malformed(format!(
            "'{field}' must be a string, got {}",
            json_type_name(other)
        ))),
        None => Err(CodecError::MissingField { kind, field }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANA_JOINS: &str = r#"{"type":"join","playerId":"p1","playerName":"Ana","teamId":"t1"}"#;

    #[test]
    fn decodes_join() {
        let event = decode(ANA_JOINS).unwrap();
        assert_eq!(event, PresenceEvent::join("p1", "Ana", "t1"));
    }

    #[test]
    fn decodes_leave_regardless_of_field_order() {
        let raw = r#"{"teamId":"t9","playerName":"Ben","type":"leave","playerId":"p2"}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event, PresenceEvent::leave("p2", "Ben", "t9"));
    }

    #[test]
    fn ignores_unknown_extra_fields() {
        let raw = r#"{"type":"join","playerId":"p1","playerName":"Ana","teamId":"t1","color":"red"}"#;
        assert_eq!(decode(raw).unwrap(), PresenceEvent::join("p1", "Ana", "t1"));
    }

    #[test]
    fn encode_is_canonical() {
        let event = PresenceEvent::join("p1", "Ana", "t1");
        assert_eq!(encode(&event), ANA_JOINS);

        let leave = PresenceEvent::leave("p1", "Ana", "t1");
        assert_eq!(
            encode(&leave),
            r#"{"type":"leave","playerId":"p1","playerName":"Ana","teamId":"t1"}"#
        );
    }

    #[test]
    fn encode_escapes_like_serde() {
        let event = PresenceEvent::leave("p\n1", "Zoë \"Z\" \\ Müller", "t\u{1}");
        let encoded = encode(&event);
        assert_eq!(encoded, serde_json::to_string(&event).unwrap());
        assert_eq!(
            encoded,
            r#"{"type":"leave","playerId":"p\n1","playerName":"Zoë \"Z\" \\ Müller","teamId":"t\u0001"}"#
        );
    }

    #[test]
    fn decode_inverts_encode() {
        let events = [
            PresenceEvent::join("p1", "Ana", "t1"),
            PresenceEvent::leave("p2", "Ben", "t2"),
            PresenceEvent::join("", "", ""),
            PresenceEvent::leave("ü-7", "Zoë \"Z\" Müller", "team/α"),
        ];
        for event in events {
            assert_eq!(decode(&encode(&event)).unwrap(), event);
        }
    }

    #[test]
    fn rejects_text_that_is_not_json() {
        assert!(matches!(
            decode("not json at all"),
            Err(CodecError::MalformedPayload(_))
        ));
        assert!(matches!(decode(""), Err(CodecError::MalformedPayload(_))));
    }

    #[test]
    fn rejects_json_that_is_not_an_object() {
        assert!(matches!(
            decode(r#"["join","p1"]"#),
            Err(CodecError::MalformedPayload(_))
        ));
        assert!(matches!(decode("42"), Err(CodecError::MalformedPayload(_))));
    }

    #[test]
    fn rejects_missing_or_non_string_type() {
        let raw = r#"{"playerId":"p1","playerName":"Ana","teamId":"t1"}"#;
        assert!(matches!(decode(raw), Err(CodecError::MalformedPayload(_))));

        let raw = r#"{"type":7,"playerId":"p1","playerName":"Ana","teamId":"t1"}"#;
        assert!(matches!(decode(raw), Err(CodecError::MalformedPayload(_))));
    }

    #[test]
    fn rejects_unknown_event_type() {
        let raw = r#"{"type":"kick","playerId":"p1","playerName":"Ana","teamId":"t1"}"#;
        assert_eq!(
            decode(raw),
            Err(CodecError::UnknownEventType("kick".to_string()))
        );
    }

    #[test]
    fn reports_each_missing_field() {
        let cases = [
            (
                r#"{"type":"join","playerName":"Ana","teamId":"t1"}"#,
                PresenceEventKind::Join,
                "playerId",
            ),
            (
                r#"{"type":"join","playerId":"p1","teamId":"t1"}"#,
                PresenceEventKind::Join,
                "playerName",
            ),
            (
                r#"{"type":"leave","playerId":"p1","playerName":"Ana"}"#,
                PresenceEventKind::Leave,
                "teamId",
            ),
        ];
        for (raw, kind, field) in cases {
            assert_eq!(decode(raw), Err(CodecError::MissingField { kind, field }));
        }
    }

    #[test]
    fn rejects_non_string_field_values() {
        let raw = r#"{"type":"join","playerId":1,"playerName":"Ana","teamId":"t1"}"#;
        assert!(matches!(decode(raw), Err(CodecError::MalformedPayload(_))));

        let raw = r#"{"type":"join","playerId":"p1","playerName":null,"teamId":"t1"}"#;
        assert!(matches!(decode(raw), Err(CodecError::MalformedPayload(_))));
    }
}
