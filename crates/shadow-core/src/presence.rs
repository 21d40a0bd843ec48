//! The normalized presence record handed to a [`PresenceSink`](crate::PresenceSink).

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A labeled clickable URL attached to a presence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Link {
    /// Button text. Never empty.
    pub label: String,
    /// Button target. Never empty.
    pub url: String,
}

impl Link {
    /// Build a link, returning `None` when either part is empty.
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Option<Self> {
        let label = label.into();
        let url = url.into();
        if label.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self { label, url })
    }
}

/// Start/end instants shown as elapsed or remaining time.
///
/// `start` is always set; a payload that only supplies an end gets the
/// processing instant as its start. `start <= end` is not enforced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    /// When the activity began.
    pub start: DateTime<Utc>,
    /// When the activity ends, if known.
    pub end: Option<DateTime<Utc>>,
}

/// A validated presence ready for broadcasting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PresenceUpdate {
    /// Primary status line. Never empty.
    pub state: String,
    /// Secondary status line, possibly empty.
    pub details: String,
    /// Present only when the payload carried a timestamp.
    pub time_range: Option<TimeRange>,
    /// At most [`MAX_LINKS`](crate::constants::MAX_LINKS) entries, in payload order.
    pub links: Vec<Link>,
}

impl PresenceUpdate {
    /// Number of links, zero when none survived filtering.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// One-line summary used by the user-visible log.
    pub fn summary(&self) -> String {
        format!(
            "Update: State='{}', Details='{}', ButtonCount='{}'",
            self.state,
            self.details,
            self.link_count()
        )
    }
}
