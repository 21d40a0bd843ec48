//! `/update_rpc` body → [`PresenceUpdate`].
//!
//! Derivation rules, first non-empty source wins:
//!
//! | Output       | Source                                                     |
//! |--------------|------------------------------------------------------------|
//! | `state`      | `activity_state` → `activity_name` → [`DEFAULT_STATE`]     |
//! | `details`    | `activity_details` → `""`                                  |
//! | `links`      | object entries of `buttons` with non-empty label and url, first two |
//! | `time_range` | `start_timestamp` / `end_timestamp` (epoch seconds)        |
//!
//! Text fields accept strings, numbers and booleans (rendered as text); `null`
//! counts as absent. Objects or arrays in a text field are rejected.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::constants::{DEFAULT_STATE, MAX_LINKS, fields};
use crate::errors::ValidationError;
use crate::presence::{Link, PresenceUpdate, TimeRange};

type Payload = Map<String, Value>;

/// Normalize a raw body using the current instant as "now".
pub fn normalize(body: &[u8]) -> Result<PresenceUpdate, ValidationError> {
    normalize_at(body, Utc::now())
}

/// Normalize a raw body with an explicit processing instant.
///
/// `now` becomes the range start when the payload supplies only an end.
pub fn normalize_at(body: &[u8], now: DateTime<Utc>) -> Result<PresenceUpdate, ValidationError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;
    let Value::Object(payload) = value else {
        return Err(ValidationError::MalformedPayload(format!(
            "expected a JSON object, found {}",
            value_kind(&value)
        )));
    };

    let state = match non_empty_text(&payload, fields::ACTIVITY_STATE)? {
        Some(state) => state,
        None => non_empty_text(&payload, fields::ACTIVITY_NAME)?
            .unwrap_or_else(|| DEFAULT_STATE.to_string()),
    };
    let details = text(&payload, fields::ACTIVITY_DETAILS)?.unwrap_or_default();

    Ok(PresenceUpdate {
        state,
        details,
        time_range: time_range(&payload, now)?,
        links: links(&payload),
    })
}

fn text(payload: &Payload, field: &str) -> Result<Option<String>, ValidationError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(Value::Array(_) | Value::Object(_)) => {
            Err(ValidationError::InvalidField(field.to_string()))
        }
    }
}

fn non_empty_text(payload: &Payload, field: &str) -> Result<Option<String>, ValidationError> {
    Ok(text(payload, field)?.filter(|s| !s.is_empty()))
}

/// Button parts never fail the request; an unusable part drops the button.
fn button_part(button: &Payload, key: &str) -> String {
    match button.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn links(payload: &Payload) -> Vec<Link> {
    let Some(Value::Array(buttons)) = payload.get(fields::BUTTONS) else {
        return Vec::new();
    };
    buttons
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|b| Link::new(button_part(b, fields::LABEL), button_part(b, fields::URL)))
        .take(MAX_LINKS)
        .collect()
}

fn timestamp(payload: &Payload, field: &str) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidField(field.to_string())),
    }
}

fn time_range(payload: &Payload, now: DateTime<Utc>) -> Result<Option<TimeRange>, ValidationError> {
    let start = timestamp(payload, fields::START_TIMESTAMP)?;
    let end = timestamp(payload, fields::END_TIMESTAMP)?;
    Ok(match (start, end) {
        (None, None) => None,
        (start, end) => Some(TimeRange {
            start: start.unwrap_or(now),
            end,
        }),
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
