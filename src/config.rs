use crate::db;
use crate::timetable::grid::{FixedSlot, DEFAULT_FIXED_SLOT_LABEL};
use crate::timetable::{CalendarConfig, PeriodCalendar};
use anyhow::Context;
use rusqlite::Connection;
use serde_json::{json, Map, Value as JsonValue};
use std::path::{Path, PathBuf};

pub const CALENDAR_ENV: &str = "TIMETABLED_CALENDAR";
pub const LOG_ENV: &str = "TIMETABLED_LOG";
pub const SETUP_KEY: &str = "setup.timetable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSource {
    BuiltIn,
    File(PathBuf),
}

impl CalendarSource {
    pub fn from_env() -> Self {
        match std::env::var_os(CALENDAR_ENV) {
            Some(p) if !p.is_empty() => CalendarSource::File(PathBuf::from(p)),
            _ => CalendarSource::BuiltIn,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CalendarSource::BuiltIn => "built-in".to_string(),
            CalendarSource::File(p) => p.to_string_lossy().to_string(),
        }
    }
}

pub fn load_calendar(source: &CalendarSource) -> anyhow::Result<PeriodCalendar> {
    match source {
        CalendarSource::BuiltIn => {
            PeriodCalendar::school_default().context("built-in calendar is invalid")
        }
        CalendarSource::File(path) => load_calendar_file(path),
    }
}

fn load_calendar_file(path: &Path) -> anyhow::Result<PeriodCalendar> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read calendar {}", path.to_string_lossy()))?;
    let config: CalendarConfig = serde_json::from_str(&text)
        .with_context(|| format!("calendar {} is invalid JSON", path.to_string_lossy()))?;
    PeriodCalendar::from_config(config)
        .with_context(|| format!("calendar {} rejected", path.to_string_lossy()))
}

/// Log filter directive: `TIMETABLED_LOG`, then `RUST_LOG`, then `info`.
pub fn log_filter() -> String {
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .filter_map(|k| std::env::var(k).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Per-workspace timetable settings, stored as JSON under `setup.timetable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableSetup {
    pub fixed_slot_enabled: bool,
    pub fixed_slot_label: String,
}

impl Default for TimetableSetup {
    fn default() -> Self {
        Self {
            fixed_slot_enabled: true,
            fixed_slot_label: DEFAULT_FIXED_SLOT_LABEL.to_string(),
        }
    }
}

impl TimetableSetup {
    /// Stored setup merged over the defaults. A missing row means defaults.
    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        let obj = match db::settings_get_json(conn, SETUP_KEY)? {
            Some(JsonValue::Object(obj)) => obj,
            Some(other) => anyhow::bail!("setting {} must be an object, got {}", SETUP_KEY, other),
            None => Map::new(),
        };
        Ok(Self::from_object(&obj))
    }

    fn from_object(obj: &Map<String, JsonValue>) -> Self {
        let defaults = Self::default();
        let fixed_slot_enabled = obj
            .get("fixedSlotEnabled")
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.fixed_slot_enabled);
        let fixed_slot_label = obj
            .get("fixedSlotLabel")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.fixed_slot_label);
        Self {
            fixed_slot_enabled,
            fixed_slot_label,
        }
    }

    /// Applies the keys present in `patch`; unknown keys are ignored.
    pub fn patched(&self, patch: &Map<String, JsonValue>) -> Self {
        let mut merged = self.to_json().as_object().cloned().unwrap_or_default();
        for (k, v) in patch {
            merged.insert(k.clone(), v.clone());
        }
        Self::from_object(&merged)
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_set_json(conn, SETUP_KEY, &self.to_json())
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "fixedSlotEnabled": self.fixed_slot_enabled,
            "fixedSlotLabel": self.fixed_slot_label,
        })
    }

    pub fn fixed_slot(&self) -> Option<FixedSlot> {
        self.fixed_slot_enabled
            .then(|| FixedSlot::flag_ceremony(self.fixed_slot_label.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_patch_keeps_defaults_for_missing_or_blank_keys() {
        let base = TimetableSetup::default();
        let patch = json!({ "fixedSlotLabel": "   ", "unrelated": 3 });
        let got = base.patched(patch.as_object().unwrap());
        assert_eq!(got, base);

        let patch = json!({ "fixedSlotEnabled": false });
        let got = base.patched(patch.as_object().unwrap());
        assert!(!got.fixed_slot_enabled);
        assert!(got.fixed_slot().is_none());
        assert!(base.fixed_slot().is_some());
    }

    #[test]
    fn corrupt_stored_setup_is_reported() {
        let dir = std::env::temp_dir().join(format!("timetabled-setup-{}", uuid::Uuid::new_v4()));
        let conn = db::open_db(&dir).unwrap();
        assert_eq!(TimetableSetup::load(&conn).unwrap(), TimetableSetup::default());

        conn.execute(
            "INSERT INTO settings(key, value_json) VALUES(?, ?)",
            [SETUP_KEY, "{not json"],
        )
        .unwrap();
        let err = TimetableSetup::load(&conn).unwrap_err();
        assert!(format!("{:#}", err).contains("is not JSON"));

        conn.execute(
            "UPDATE settings SET value_json = ? WHERE key = ?",
            ["[1, 2]", SETUP_KEY],
        )
        .unwrap();
        let err = TimetableSetup::load(&conn).unwrap_err();
        assert!(err.to_string().contains("must be an object"));

        drop(conn);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_calendar_file_is_an_error() {
        let source = CalendarSource::File(PathBuf::from("/nonexistent/calendar.json"));
        let err = load_calendar(&source).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read calendar"));
        assert!(load_calendar(&CalendarSource::BuiltIn).is_ok());
    }
}
