use crate::config::TimetableSetup;
use crate::db::ScheduleStore;
use crate::ipc::helpers::{
    db_conn, optional_day, optional_str, optional_time, optional_u32, required_day,
    required_str, required_u32, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::timetable::clock::range_label;
use crate::timetable::{build_grid, EntryDraft, PeriodCalendar, Placement, ScheduleEntry};
use serde_json::json;
use uuid::Uuid;

pub fn entry_json(entry: &ScheduleEntry, calendar: &PeriodCalendar) -> serde_json::Value {
    let mut v = serde_json::to_value(entry).unwrap_or_else(|_| json!({ "id": entry.id }));
    v["periods"] = json!(entry.periods(calendar));
    v["label"] = json!(range_label(entry.start, entry.end));
    v
}

/// `startPeriod`/`endPeriod` win over `startTime`/`endTime`. A lone
/// `startPeriod` places a single period.
fn placement_from(params: &serde_json::Value) -> Result<Option<Placement>, HandlerErr> {
    if let Some(start) = optional_u32(params, "startPeriod")? {
        let end = optional_u32(params, "endPeriod")?.unwrap_or(start);
        return Ok(Some(Placement::Periods { start, end }));
    }
    if optional_u32(params, "endPeriod")?.is_some() {
        return Err(HandlerErr::bad_params("endPeriod requires startPeriod"));
    }
    match (optional_time(params, "startTime")?, optional_time(params, "endTime")?) {
        (Some(start), Some(end)) => Ok(Some(Placement::Times { start, end })),
        (None, None) => Ok(None),
        _ => Err(HandlerErr::bad_params(
            "startTime and endTime must be given together",
        )),
    }
}

fn entries_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let teacher_id = required_str(params, "teacherId")?;
    let day = optional_day(params, "weekday")?;
    let entries = conn
        .list_entries(&teacher_id)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?;
    let rows: Vec<serde_json::Value> = entries
        .iter()
        .filter(|e| day.map_or(true, |d| e.weekday == d))
        .map(|e| entry_json(e, &state.calendar))
        .collect();
    Ok(json!({ "entries": rows }))
}

fn entries_create(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let draft = EntryDraft {
        teacher_id: required_str(params, "teacherId")?,
        weekday: required_day(params, "weekday")?,
        class_id: required_str(params, "classId")?,
        subject: required_str(params, "subject")?,
        placement: placement_from(params)?.ok_or_else(|| {
            HandlerErr::bad_params("missing startPeriod (or startTime/endTime)")
        })?,
    };
    let entry = draft.into_entry(Uuid::new_v4().to_string(), &state.calendar)?;
    conn.create_entry(&entry).map_err(|e| {
        HandlerErr::store("db_insert_failed", e)
            .with_details(json!({ "table": "schedule_entries" }))
    })?;
    tracing::info!(
        entry_id = %entry.id,
        teacher_id = %entry.teacher_id,
        weekday = %entry.weekday,
        "entry created"
    );
    Ok(json!({ "entry": entry_json(&entry, &state.calendar) }))
}

fn entries_update(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let entry_id = required_str(params, "entryId")?;
    let existing = conn
        .get_entry(&entry_id)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?
        .ok_or_else(|| HandlerErr::new("not_found", "entry not found"))?;

    let weekday = optional_day(params, "weekday")?.unwrap_or(existing.weekday);
    let placement = match placement_from(params)? {
        Some(p) => Some(p),
        // Moving to another day re-checks the stored times against that day.
        None if weekday != existing.weekday => Some(Placement::Times {
            start: existing.start,
            end: existing.end,
        }),
        None => None,
    };

    let teacher_id = optional_str(params, "teacherId").unwrap_or_else(|| existing.teacher_id.clone());
    let class_id = optional_str(params, "classId").unwrap_or_else(|| existing.class_id.clone());
    let subject = optional_str(params, "subject").unwrap_or_else(|| existing.subject.clone());

    let updated = match placement {
        Some(placement) => EntryDraft {
            teacher_id,
            weekday,
            class_id,
            subject,
            placement,
        }
        .into_entry(existing.id.clone(), &state.calendar)?,
        None => ScheduleEntry {
            teacher_id,
            class_id,
            subject,
            ..existing
        },
    };

    let found = conn.update_entry(&updated).map_err(|e| {
        HandlerErr::store("db_update_failed", e)
            .with_details(json!({ "table": "schedule_entries" }))
    })?;
    if !found {
        return Err(HandlerErr::new("not_found", "entry not found"));
    }
    tracing::info!(entry_id = %updated.id, "entry updated");
    Ok(json!({ "entry": entry_json(&updated, &state.calendar) }))
}

fn entries_delete(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let entry_id = required_str(params, "entryId")?;
    let found = conn
        .delete_entry(&entry_id)
        .map_err(|e| HandlerErr::store("db_delete_failed", e))?;
    if !found {
        return Err(HandlerErr::new("not_found", "entry not found"));
    }
    tracing::info!(entry_id = %entry_id, "entry deleted");
    Ok(json!({ "ok": true }))
}

/// Delete whatever occupies one grid cell. The ceremony cell refuses.
fn entries_delete_cell(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let teacher_id = required_str(params, "teacherId")?;
    let day = required_day(params, "weekday")?;
    let period = required_u32(params, "period")?;

    let entries = conn
        .list_entries(&teacher_id)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?;
    let fixed = TimetableSetup::load(conn)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?
        .fixed_slot();
    let grid = build_grid(&state.calendar, &entries, fixed.as_ref());

    let Some(entry) = grid.deletable_entry(day, period)? else {
        return Err(HandlerErr::new("not_found", "no entry in that cell")
            .with_details(json!({ "weekday": day, "period": period })));
    };
    let entry_id = entry.id.clone();
    conn.delete_entry(&entry_id)
        .map_err(|e| HandlerErr::store("db_delete_failed", e))?;
    tracing::info!(entry_id = %entry_id, weekday = %day, period, "cell cleared");
    Ok(json!({ "deletedEntryId": entry_id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "entries.list" => Some(respond(req, entries_list(state, &req.params))),
        "entries.create" => Some(respond(req, entries_create(state, &req.params))),
        "entries.update" => Some(respond(req, entries_update(state, &req.params))),
        "entries.delete" => Some(respond(req, entries_delete(state, &req.params))),
        "entries.deleteCell" => Some(respond(req, entries_delete_cell(state, &req.params))),
        _ => None,
    }
}
