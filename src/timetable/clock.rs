//! Wall-clock helpers. School times are `HH:MM` at one-minute resolution.

use super::error::{Result, TimetableError};
use chrono::{NaiveTime, Timelike};

/// Parses `HH:MM`. `HH:MM:SS` is accepted when the seconds are zero, since
/// stored rows sometimes carry them; `HH.MM` is accepted as written on paper
/// timetables.
pub fn parse_clock(raw: &str) -> Result<NaiveTime> {
    let t = raw.trim().replace('.', ":");
    let parsed = NaiveTime::parse_from_str(&t, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&t, "%H:%M:%S"))
        .map_err(|_| TimetableError::InvalidTime(format!("expected HH:MM, got {:?}", raw)))?;
    if parsed.second() != 0 || parsed.nanosecond() != 0 {
        return Err(TimetableError::InvalidTime(format!(
            "{:?} has seconds; times are whole minutes",
            raw
        )));
    }
    Ok(parsed)
}

pub fn format_clock(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// `07:00 - 08:00`
pub fn range_label(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", format_clock(start), format_clock(end))
}

pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes()
}

/// Serde adapter for `NaiveTime` fields stored as `HH:MM`.
pub mod hhmm {
    use super::{format_clock, parse_clock};
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_clock(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_clock(&raw).map_err(serde::de::Error::custom)
    }
}
