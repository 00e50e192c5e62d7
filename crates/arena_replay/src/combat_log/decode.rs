//! JSON batch decoding
//!
//! The networking layer hands over one JSON array per battle. The outer shape
//! must be valid (an array of `{tick, kind, payload}`); individual entries that
//! fail are dropped with a diagnostic so one bad event never costs the battle.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::events::{CombatEvent, EventKind, Tick, KNOWN_KINDS};
use crate::logger;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event #{index} ({kind}) has a malformed payload: {reason}")]
    Payload {
        index: usize,
        kind: String,
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    tick: Tick,
    kind: String,
    #[serde(default)]
    payload: Value,
}

/// Decode a batch; entries with malformed payloads are skipped
pub fn decode_events(json: &str) -> Result<Vec<CombatEvent>, DecodeError> {
    let raw: Vec<RawEvent> = serde_json::from_str(json)?;
    let mut events = Vec::with_capacity(raw.len());

    for (index, entry) in raw.into_iter().enumerate() {
        match decode_entry(index, entry) {
            Ok(event) => events.push(event),
            Err(err) => logger::log_warning(&format!("⚠️ CombatLog decode: skipping {}", err)),
        }
    }

    Ok(events)
}

fn decode_entry(index: usize, raw: RawEvent) -> Result<CombatEvent, DecodeError> {
    if !KNOWN_KINDS.contains(&raw.kind.as_str()) {
        return Ok(CombatEvent::new(raw.tick, EventKind::Unknown(raw.kind)));
    }

    let tagged = json!({ "kind": raw.kind, "payload": raw.payload });
    let kind = serde_json::from_value::<EventKind>(tagged).map_err(|err| DecodeError::Payload {
        index,
        kind: raw.kind.clone(),
        reason: err.to_string(),
    })?;

    Ok(CombatEvent::new(raw.tick, kind))
}

/// Encode events back to the wire format (unknown kinds are dropped)
pub fn encode_events(events: &[CombatEvent]) -> Result<String, DecodeError> {
    let known: Vec<&CombatEvent> = events
        .iter()
        .filter(|event| !matches!(event.kind, EventKind::Unknown(_)))
        .collect();
    Ok(serde_json::to_string(&known)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_kinds() {
        let json = r#"[
            { "tick": 0, "kind": "CombatStart", "payload": { "roster": [
                { "instanceId": "A", "unitId": "knight", "teamId": "p1", "x": 0, "y": 0 }
            ] } },
            { "tick": 5, "kind": "UnitMove", "payload": { "instanceId": "A", "x": 1, "y": 0 } },
            { "tick": 10, "kind": "CombatEnd", "payload": { "winnerTeamId": "p1" } }
        ]"#;

        let events = decode_events(json).expect("valid batch");
        assert_eq!(events.len(), 3);
        assert_eq!(events[1], CombatEvent::unit_move(5, "A", 1, 0));
        assert_eq!(events[2], CombatEvent::combat_end(10, Some("p1")));

        let EventKind::CombatStart { roster } = &events[0].kind else {
            panic!("expected CombatStart");
        };
        assert_eq!(roster[0].unit_id, "knight");
        assert_eq!(roster[0].stats.max_health, 0); // absent → default block
    }

    #[test]
    fn test_unknown_kind_is_preserved_as_unknown() {
        let json = r#"[{ "tick": 3, "kind": "UnitTaunt", "payload": { "instanceId": "A" } }]"#;
        let events = decode_events(json).expect("valid batch");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Unknown("UnitTaunt".to_string()));
    }

    #[test]
    fn test_malformed_payload_is_skipped() {
        let json = r#"[
            { "tick": 1, "kind": "UnitMove", "payload": { "instanceId": "A" } },
            { "tick": 2, "kind": "UnitDeath", "payload": { "instanceId": "B" } }
        ]"#;
        let events = decode_events(json).expect("outer shape is valid");

        assert_eq!(events, vec![CombatEvent::unit_death(2, "B", None)]);
    }

    #[test]
    fn test_broken_outer_shape_is_an_error() {
        assert!(matches!(decode_events("{ \"tick\": 1 }"), Err(DecodeError::Json(_))));
        assert!(decode_events("not json").is_err());
    }

    #[test]
    fn test_encode_skips_unknown() {
        let events = vec![
            CombatEvent::unit_attack(4, "A", "B"),
            CombatEvent::new(5, EventKind::Unknown("Emote".to_string())),
        ];
        let json = encode_events(&events).expect("encodable");

        assert!(json.contains("\"kind\":\"UnitAttack\""));
        assert!(json.contains("\"attackerId\":\"A\""));
        assert!(!json.contains("Emote"));
        assert_eq!(decode_events(&json).expect("decodable").len(), 1);
    }
}
