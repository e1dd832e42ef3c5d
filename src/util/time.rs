use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// On-disk timestamp format used by task records and session files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Error type for user-supplied date strings.
#[derive(Debug, thiserror::Error)]
#[error("could not parse date: {0}")]
pub struct DateParseError(pub String);

/// Current local time, truncated to whole seconds so it round-trips
/// through the timestamp format.
pub fn now() -> NaiveDateTime {
    let t = Local::now().naive_local();
    t.with_nanosecond(0).unwrap_or(t)
}

/// Parse a user-supplied date string, as accepted by `--at` and the
/// export window flags. Date-only strings mean midnight; time-only
/// strings mean today.
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, DateParseError> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).unwrap_or_else(|| d.and_time(NaiveTime::MIN)));
    }
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Ok(now().date().and_time(t));
        }
    }
    Err(DateParseError(s.to_string()))
}

/// Format a timestamp in the on-disk format.
pub fn format_timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

/// Format a duration as a compact `XhYmZs` string. Leading zero
/// components are dropped; a zero duration formats as the empty string.
pub fn format_duration(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    let mut out = String::new();
    if hours != 0 {
        out.push_str(&format!("{}h", hours));
    }
    if minutes != 0 || hours != 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if seconds != 0 || minutes != 0 || hours != 0 {
        out.push_str(&format!("{}s", seconds));
    }
    out
}

/// Format a duration as a clock-style `H:MM:SS` string. Used by the
/// daily report, where durations line up in columns.
pub fn format_hms(d: Duration) -> String {
    let total = d.num_seconds().max(0);
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

// ---------------------------------------------------------------------------
// Serde adapters for the timestamp format
// ---------------------------------------------------------------------------

/// Serialize/deserialize a `NaiveDateTime` as a `TIMESTAMP_FORMAT` string.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(t: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&t.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Serialize/deserialize an `Option<NaiveDateTime>` as a timestamp string
/// or null.
pub mod timestamp_opt {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S>(t: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match t {
            Some(t) => serializer.serialize_str(&t.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) => NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
