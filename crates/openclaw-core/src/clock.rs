//! Clock & Identity (C1): UTC timestamp helpers and short correlation ids.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC instant.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp as ISO 8601 with a trailing `Z`, second precision ,
/// the wire format every persisted timestamp in this crate uses.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current UTC timestamp, already formatted per [`format_ts`].
pub fn now_string() -> String {
    format_ts(now())
}

/// Parse a persisted timestamp. Accepts the `Z`-suffixed form this crate
/// writes as well as any other RFC 3339 variant a future caller might supply.
pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// A short, process-unique identifier, used as the default log correlation
/// id when the environment doesn't supply one.
pub fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
