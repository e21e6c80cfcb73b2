//! Wire codec for testing-message frames
//!
//! Base format of a frame is:
//!
//! ```text
//! @@<{"name":"message-name","attributes":{"attribute":"value"}}>
//! ```
//!
//! Encoding and decoding are pure functions; all scanning state lives in
//! the demuxer. `decode` distinguishes "not a frame" (no envelope markers,
//! `Ok(None)`) from "a frame we cannot read" (`Err(Error::Protocol)`), so
//! callers can fall back to plain-output handling for the former while
//! surfacing the latter.

use std::collections::HashMap;

use serde_json::Value;

use testwire_core::prelude::*;
use testwire_core::{EventKind, TestEvent};

/// Marker opening a protocol frame
pub const MESSAGE_START: &str = "@@<";
/// Marker closing a protocol frame. Decode requires the text to *end with*
/// this, not merely contain it; producers emit it as the final character of
/// the frame's line.
pub const MESSAGE_END: &str = ">";

const NAME_FIELD: &str = "name";
const ATTRIBUTES_FIELD: &str = "attributes";

/// Strip the envelope markers from a frame
///
/// Returns the trimmed inner payload if both markers are present.
pub(crate) fn strip_envelope(text: &str) -> Option<&str> {
    if text.starts_with(MESSAGE_START) && text.ends_with(MESSAGE_END) {
        Some(text[MESSAGE_START.len()..text.len() - MESSAGE_END.len()].trim())
    } else {
        None
    }
}

/// Encode an event as a wire frame.
///
/// The `attributes` object is omitted entirely when the map is empty. For
/// any kind with a canonical name this is the exact inverse of [`decode`].
pub fn encode(kind: &EventKind, attributes: &HashMap<String, String>) -> String {
    let mut object = serde_json::Map::new();
    object.insert(
        NAME_FIELD.to_string(),
        Value::String(kind.canonical_name().to_string()),
    );
    if !attributes.is_empty() {
        let entries: serde_json::Map<String, Value> = attributes
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        object.insert(ATTRIBUTES_FIELD.to_string(), Value::Object(entries));
    }
    format!("{}{}{}", MESSAGE_START, Value::Object(object), MESSAGE_END)
}

/// Decode a wire frame back into an event.
///
/// Returns `Ok(None)` when the envelope markers are absent, so the caller
/// can treat the text as plain output. Once inside the envelope, any parse
/// failure is a hard [`Error::Protocol`]: malformed JSON, a payload that is
/// not an object, a missing or non-string `name`, an `attributes` field
/// that is not an object, or a non-string attribute value. Unknown extra
/// top-level fields are tolerated for forward compatibility.
pub fn decode(text: &str) -> Result<Option<TestEvent>> {
    let Some(payload) = strip_envelope(text) else {
        return Ok(None);
    };

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| Error::protocol(format!("invalid JSON in frame: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::protocol("frame payload is not a JSON object"))?;

    let name = match object.get(NAME_FIELD) {
        None => return Err(Error::protocol("frame payload has no \"name\" field")),
        Some(raw) => raw
            .as_str()
            .ok_or_else(|| Error::protocol("\"name\" field is not a string"))?,
    };

    let mut attributes = HashMap::new();
    if let Some(raw) = object.get(ATTRIBUTES_FIELD) {
        let entries = raw
            .as_object()
            .ok_or_else(|| Error::protocol("\"attributes\" field is not a JSON object"))?;
        for (key, value) in entries {
            let value = value.as_str().ok_or_else(|| {
                Error::protocol(format!("attribute {key:?} has a non-string value"))
            })?;
            attributes.insert(key.clone(), value.to_string());
        }
    }

    Ok(Some(TestEvent::new(EventKind::resolve(name), attributes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_strip_envelope_valid() {
        assert_eq!(
            strip_envelope(r#"@@<{"name":"test-started"}>"#),
            Some(r#"{"name":"test-started"}"#)
        );
    }

    #[test]
    fn test_strip_envelope_trims_inner_whitespace() {
        assert_eq!(strip_envelope("@@< payload >"), Some("payload"));
    }

    #[test]
    fn test_strip_envelope_invalid() {
        assert_eq!(strip_envelope("no markers"), None);
        assert_eq!(strip_envelope("@@<missing end"), None);
        assert_eq!(strip_envelope("missing start>"), None);
    }

    #[test]
    fn test_encode_bare_event_omits_attributes() {
        let frame = encode(&EventKind::TestingStarted, &HashMap::new());
        assert_eq!(frame, r#"@@<{"name":"testing-started"}>"#);
    }

    #[test]
    fn test_round_trip_all_known_kinds() {
        let kinds = [
            EventKind::TestingStarted,
            EventKind::TestingFinished,
            EventKind::SuiteStarted,
            EventKind::SuiteFinished,
            EventKind::TestStarted,
            EventKind::TestFinished,
            EventKind::TestFailed,
            EventKind::TestIgnored,
        ];
        let attributes = attrs(&[("name", "com.example.FooTest"), ("duration", "17")]);

        for kind in kinds {
            let frame = encode(&kind, &attributes);
            let event = decode(&frame).unwrap().unwrap();
            assert_eq!(event.kind(), &kind);
            assert_eq!(event.attributes(), &attributes);
        }
    }

    #[test]
    fn test_round_trip_empty_attributes() {
        let frame = encode(&EventKind::TestingFinished, &HashMap::new());
        let event = decode(&frame).unwrap().unwrap();
        assert_eq!(event.kind(), &EventKind::TestingFinished);
        assert!(event.attributes().is_empty());
    }

    #[test]
    fn test_round_trip_value_containing_terminator_char() {
        // A '>' inside an attribute value must not confuse the envelope
        // boundary: the JSON object always closes before the final '>'.
        let attributes = attrs(&[("name", "assert a > b")]);
        let frame = encode(&EventKind::TestFailed, &attributes);
        assert!(frame.ends_with(MESSAGE_END));
        let event = decode(&frame).unwrap().unwrap();
        assert_eq!(event.attr("name"), Some("assert a > b"));
    }

    #[test]
    fn test_decode_no_envelope_returns_none() {
        assert!(decode("hello world").unwrap().is_none());
        assert!(decode("").unwrap().is_none());
        assert!(decode("@@<unterminated").unwrap().is_none());
    }

    #[test]
    fn test_decode_unknown_name_is_not_an_error() {
        let event = decode(r#"@@<{"name":"frobnicate"}>"#).unwrap().unwrap();
        assert_eq!(
            event.kind(),
            &EventKind::Unknown("frobnicate".to_string())
        );
        assert!(event.attributes().is_empty());
    }

    #[test]
    fn test_decode_malformed_json_is_protocol_error() {
        let err = decode("@@<not json>").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_non_object_payload_is_protocol_error() {
        let err = decode("@@<42>").unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_missing_name_is_protocol_error() {
        let err = decode(r#"@@<{"attributes":{}}>"#).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_non_string_name_is_protocol_error() {
        let err = decode(r#"@@<{"name":7}>"#).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_non_object_attributes_is_protocol_error() {
        let err = decode(r#"@@<{"name":"test-started","attributes":[1,2]}>"#).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));

        // null is "present but not an object", not "absent"
        let err = decode(r#"@@<{"name":"test-started","attributes":null}>"#).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_non_string_attribute_value_is_protocol_error() {
        let err =
            decode(r#"@@<{"name":"test-finished","attributes":{"duration":42}}>"#).unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_decode_tolerates_unknown_top_level_fields() {
        let event = decode(r#"@@<{"name":"test-started","timestamp":"12:00","attributes":{"name":"t1"}}>"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.kind(), &EventKind::TestStarted);
        assert_eq!(event.test_name(), Some("t1"));
    }

    #[test]
    fn test_decode_tolerates_whitespace_inside_envelope() {
        let event = decode("@@<  {\"name\":\"testing-started\"}  >")
            .unwrap()
            .unwrap();
        assert_eq!(event.kind(), &EventKind::TestingStarted);
    }
}
