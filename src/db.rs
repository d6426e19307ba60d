use crate::timetable::clock::{format_clock, parse_clock};
use crate::timetable::{SchoolDay, ScheduleEntry};
use anyhow::{anyhow, Context};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "timetable.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schedule_entries(
            id TEXT PRIMARY KEY,
            teacher_id TEXT NOT NULL,
            weekday TEXT NOT NULL,
            class_id TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL
        )",
        [],
    )?;
    // Workspaces created before subjects were tracked lack these columns.
    ensure_entries_subject(&conn)?;
    ensure_entries_updated_at(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedule_entries_teacher ON schedule_entries(teacher_id, weekday)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_schedule_entries_class ON schedule_entries(class_id)",
        [],
    )?;

    Ok(conn)
}

fn ensure_entries_subject(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "schedule_entries", "subject")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE schedule_entries ADD COLUMN subject TEXT NOT NULL DEFAULT ''",
        [],
    )?;
    Ok(())
}

fn ensure_entries_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "schedule_entries", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE schedule_entries ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(text) => Ok(Some(
            serde_json::from_str(&text).with_context(|| format!("setting {} is not JSON", key))?,
        )),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

/// Persistence of schedule entries. Implementations do not check overlaps.
pub trait ScheduleStore {
    /// A teacher's entries ordered by day, then start time.
    fn list_entries(&self, teacher_id: &str) -> anyhow::Result<Vec<ScheduleEntry>>;
    fn get_entry(&self, id: &str) -> anyhow::Result<Option<ScheduleEntry>>;
    fn create_entry(&self, entry: &ScheduleEntry) -> anyhow::Result<()>;
    /// False when no row has `entry.id`.
    fn update_entry(&self, entry: &ScheduleEntry) -> anyhow::Result<bool>;
    /// False when no row has `id`.
    fn delete_entry(&self, id: &str) -> anyhow::Result<bool>;
}

struct EntryRow {
    id: String,
    teacher_id: String,
    weekday: String,
    class_id: String,
    subject: String,
    start_time: String,
    end_time: String,
}

impl EntryRow {
    fn from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            teacher_id: r.get(1)?,
            weekday: r.get(2)?,
            class_id: r.get(3)?,
            subject: r.get(4)?,
            start_time: r.get(5)?,
            end_time: r.get(6)?,
        })
    }

    fn into_entry(self) -> anyhow::Result<ScheduleEntry> {
        let weekday: SchoolDay = self
            .weekday
            .parse()
            .map_err(|e| anyhow!("entry {}: {}", self.id, e))?;
        let start = parse_clock(&self.start_time).map_err(|e| anyhow!("entry {}: {}", self.id, e))?;
        let end = parse_clock(&self.end_time).map_err(|e| anyhow!("entry {}: {}", self.id, e))?;
        Ok(ScheduleEntry {
            id: self.id,
            teacher_id: self.teacher_id,
            weekday,
            class_id: self.class_id,
            subject: self.subject,
            start,
            end,
        })
    }
}

const ENTRY_COLUMNS: &str = "id, teacher_id, weekday, class_id, subject, start_time, end_time";

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl ScheduleStore for Connection {
    fn list_entries(&self, teacher_id: &str) -> anyhow::Result<Vec<ScheduleEntry>> {
        let sql = format!(
            "SELECT {} FROM schedule_entries WHERE teacher_id = ? ORDER BY start_time, rowid",
            ENTRY_COLUMNS
        );
        let mut stmt = self.prepare(&sql)?;
        let rows = stmt
            .query_map([teacher_id], EntryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let mut entries = rows
            .into_iter()
            .map(EntryRow::into_entry)
            .collect::<anyhow::Result<Vec<_>>>()?;
        // Stable: keeps start_time order within a day.
        entries.sort_by_key(|e| e.weekday);
        Ok(entries)
    }

    fn get_entry(&self, id: &str) -> anyhow::Result<Option<ScheduleEntry>> {
        let sql = format!("SELECT {} FROM schedule_entries WHERE id = ?", ENTRY_COLUMNS);
        let row = self
            .query_row(&sql, [id], EntryRow::from_row)
            .optional()?;
        row.map(EntryRow::into_entry).transpose()
    }

    fn create_entry(&self, entry: &ScheduleEntry) -> anyhow::Result<()> {
        self.execute(
            "INSERT INTO schedule_entries(id, teacher_id, weekday, class_id, subject, start_time, end_time, updated_at)
             VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &entry.id,
                &entry.teacher_id,
                entry.weekday.as_str(),
                &entry.class_id,
                &entry.subject,
                format_clock(entry.start),
                format_clock(entry.end),
                now_ts(),
            ),
        )?;
        Ok(())
    }

    fn update_entry(&self, entry: &ScheduleEntry) -> anyhow::Result<bool> {
        let changed = self.execute(
            "UPDATE schedule_entries
             SET teacher_id = ?, weekday = ?, class_id = ?, subject = ?, start_time = ?, end_time = ?, updated_at = ?
             WHERE id = ?",
            (
                &entry.teacher_id,
                entry.weekday.as_str(),
                &entry.class_id,
                &entry.subject,
                format_clock(entry.start),
                format_clock(entry.end),
                now_ts(),
                &entry.id,
            ),
        )?;
        Ok(changed > 0)
    }

    fn delete_entry(&self, id: &str) -> anyhow::Result<bool> {
        let changed = self.execute("DELETE FROM schedule_entries WHERE id = ?", [id])?;
        Ok(changed > 0)
    }
}
