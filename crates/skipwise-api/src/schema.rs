//! Tolerant decoding of community skip-segment payloads.
//!
//! Providers disagree on field names and layout. Two shapes are accepted:
//!
//! - flat arrays (`segments`, `skipSegments`, `results`, or a bare array) of
//!   tagged items such as `{"type": "intro", "start": 0, "end": 85}`;
//! - objects keyed by segment type, such as `{"intro": {"start": 0, "end": 85}}`,
//!   optionally wrapped in `segments`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

const WRAPPER_KEYS: &[&str] = &["segments", "skipSegments", "results"];
const TAG_KEYS: &[&str] = &["type", "skipType", "segmentType", "category"];
const START_KEYS: &[&str] = &["start", "startTime", "showSkipPromptAt"];
const END_KEYS: &[&str] = &["end", "endTime", "hideSkipPromptAt"];

/// A provider segment with its raw type tag, in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSegment {
    pub tag: String,
    pub start_secs: i64,
    pub end_secs: i64,
}

/// Extract every well-formed segment from a provider response body.
///
/// Items without a tag, without both times, or with `end <= start` are dropped.
/// Returns `ApiError::Parse` only when the body is neither an object nor an array.
pub fn parse_segments(body: &Value) -> Result<Vec<RemoteSegment>, ApiError> {
    match body {
        Value::Array(items) => Ok(parse_flat(items)),
        Value::Object(obj) => {
            for key in WRAPPER_KEYS {
                match obj.get(*key) {
                    Some(Value::Array(items)) => return Ok(parse_flat(items)),
                    Some(Value::Object(nested)) => return Ok(parse_keyed(nested)),
                    _ => {}
                }
            }
            Ok(parse_keyed(obj))
        }
        other => Err(ApiError::Parse(format!(
            "unexpected segment payload: {}",
            kind_name(other)
        ))),
    }
}

fn parse_flat(items: &[Value]) -> Vec<RemoteSegment> {
    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let tag = TAG_KEYS
                .iter()
                .find_map(|k| item.get(*k).and_then(Value::as_str))?;
            segment_from(tag, item)
        })
        .collect()
}

fn parse_keyed(obj: &Map<String, Value>) -> Vec<RemoteSegment> {
    obj.iter()
        .filter_map(|(tag, value)| segment_from(tag, value.as_object()?))
        .collect()
}

fn segment_from(tag: &str, item: &Map<String, Value>) -> Option<RemoteSegment> {
    let start = read_secs(item, START_KEYS, "start_ms")?;
    let end = read_secs(item, END_KEYS, "end_ms")?;
    if start < 0 || end <= start {
        tracing::debug!(tag, start, end, "dropping invalid remote segment");
        return None;
    }
    Some(RemoteSegment {
        tag: tag.to_string(),
        start_secs: start,
        end_secs: end,
    })
}

fn read_secs(item: &Map<String, Value>, keys: &[&str], ms_key: &str) -> Option<i64> {
    if let Some(secs) = keys.iter().find_map(|k| item.get(*k).and_then(number)) {
        return Some(secs.floor() as i64);
    }
    item.get(ms_key)
        .and_then(number)
        .map(|ms| (ms / 1000.0).floor() as i64)
}

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seg(tag: &str, start: i64, end: i64) -> RemoteSegment {
        RemoteSegment {
            tag: tag.into(),
            start_secs: start,
            end_secs: end,
        }
    }

    #[test]
    fn test_introhater_shape() {
        let body = json!({
            "segments": [
                {"type": "intro", "start": 0, "end": 85.6},
                {"type": "credits", "start": 1250, "end": 1320}
            ]
        });
        let segments = parse_segments(&body).unwrap();
        assert_eq!(segments, vec![seg("intro", 0, 85), seg("credits", 1250, 1320)]);
    }

    #[test]
    fn test_introskipper_shape() {
        let body = json!({
            "skipSegments": [
                {"skipType": "Intro", "showSkipPromptAt": 12.4, "hideSkipPromptAt": 98.0},
                {"skipType": "Recap", "showSkipPromptAt": "0", "hideSkipPromptAt": "11"}
            ]
        });
        let segments = parse_segments(&body).unwrap();
        assert_eq!(segments, vec![seg("Intro", 12, 98), seg("Recap", 0, 11)]);
    }

    #[test]
    fn test_bare_array_with_millis() {
        let body = json!([
            {"category": "outro", "start_ms": 1_200_000, "end_ms": 1_290_500},
            {"segmentType": "preview", "startTime": 1300, "endTime": 1320}
        ]);
        let segments = parse_segments(&body).unwrap();
        assert_eq!(segments, vec![seg("outro", 1200, 1290), seg("preview", 1300, 1320)]);
    }

    #[test]
    fn test_keyed_shape() {
        let body = json!({
            "segments": {
                "intro": {"start": 0, "end": 90},
                "credits": {"start": 1200, "end": 1320}
            }
        });
        let mut segments = parse_segments(&body).unwrap();
        segments.sort_by_key(|s| s.start_secs);
        assert_eq!(segments, vec![seg("intro", 0, 90), seg("credits", 1200, 1320)]);
    }

    #[test]
    fn test_unwrapped_keyed_shape() {
        let body = json!({"recap": {"startTime": 5, "endTime": 40}, "status": "ok"});
        assert_eq!(parse_segments(&body).unwrap(), vec![seg("recap", 5, 40)]);
    }

    #[test]
    fn test_invalid_items_dropped() {
        let body = json!({
            "segments": [
                {"type": "intro", "start": 90, "end": 10},
                {"type": "recap", "start": -5, "end": 10},
                {"start": 0, "end": 10},
                {"type": "credits", "start": "soon", "end": 10},
                {"type": "intro", "start": 0},
                "garbage"
            ]
        });
        assert!(parse_segments(&body).unwrap().is_empty());
    }

    #[test]
    fn test_non_container_payload() {
        assert!(parse_segments(&json!("nope")).is_err());
        assert!(parse_segments(&json!(null)).is_err());
    }
}
