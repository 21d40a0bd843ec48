//! `SET_ACTIVITY` command bodies.

use serde_json::{Map, Value, json};
use shadow_core::PresenceUpdate;

/// Activity object for `update`. Empty details and an empty link list are
/// omitted; Discord rejects empty strings and empty button arrays.
pub fn activity(update: &PresenceUpdate) -> Value {
    let mut activity = Map::new();
    let _ = activity.insert("state".into(), Value::String(update.state.clone()));
    if !update.details.is_empty() {
        let _ = activity.insert("details".into(), Value::String(update.details.clone()));
    }
    if let Some(range) = update.time_range {
        let mut timestamps = Map::new();
        let _ = timestamps.insert("start".into(), range.start.timestamp().into());
        if let Some(end) = range.end {
            let _ = timestamps.insert("end".into(), end.timestamp().into());
        }
        let _ = activity.insert("timestamps".into(), Value::Object(timestamps));
    }
    if !update.links.is_empty() {
        let buttons = update
            .links
            .iter()
            .map(|link| json!({"label": link.label, "url": link.url}))
            .collect();
        let _ = activity.insert("buttons".into(), Value::Array(buttons));
    }
    Value::Object(activity)
}

/// Full command frame body. `None` clears the presence.
pub fn set_activity(pid: u32, update: Option<&PresenceUpdate>, nonce: &str) -> Value {
    let mut args = Map::new();
    let _ = args.insert("pid".into(), pid.into());
    if let Some(update) = update {
        let _ = args.insert("activity".into(), activity(update));
    }
    json!({
        "cmd": "SET_ACTIVITY",
        "args": args,
        "nonce": nonce,
    })
}
