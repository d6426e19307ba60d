use crate::config::TimetableSetup;
use crate::db::ScheduleStore;
use crate::ipc::handlers::calendar::{break_json, period_json};
use crate::ipc::helpers::{db_conn, optional_str, required_day, required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::timetable::{
    blocks_for_day, build_grid, todays_blocks, GridCell, GridRow, ScheduleBlock, SchoolDay,
};
use chrono::{Datelike, NaiveDate};
use serde_json::json;

fn cell_json(cell: &GridCell<'_>) -> serde_json::Value {
    let mut v = json!({ "kind": cell.kind(), "available": cell.is_available() });
    match cell {
        GridCell::Empty => {}
        GridCell::Fixed(slot) => {
            v["deletable"] = json!(false);
            v["label"] = json!(slot.label);
        }
        GridCell::Entry(e) => {
            v["entryId"] = json!(e.id);
            v["classId"] = json!(e.class_id);
            v["subject"] = json!(e.subject);
        }
    }
    v
}

fn row_json(row: &GridRow<'_>) -> serde_json::Value {
    match row {
        GridRow::Period { period, cell } => {
            let mut v = period_json(period);
            v["kind"] = json!("period");
            v["cell"] = cell_json(cell);
            v
        }
        GridRow::Break(b) => {
            let mut v = break_json(b);
            v["kind"] = json!("break");
            v
        }
    }
}

fn block_json(block: &ScheduleBlock) -> serde_json::Value {
    let mut v = serde_json::to_value(block).unwrap_or_else(|_| json!({}));
    v["label"] = json!(block.label());
    v["timeLabel"] = json!(block.time_label());
    v
}

fn grid_open(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let teacher_id = required_str(params, "teacherId")?;
    let entries = conn
        .list_entries(&teacher_id)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?;
    let fixed = TimetableSetup::load(conn)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?
        .fixed_slot();
    let grid = build_grid(&state.calendar, &entries, fixed.as_ref());

    let days: Vec<serde_json::Value> = SchoolDay::ALL
        .iter()
        .map(|day| {
            json!({
                "weekday": day,
                "periodCount": state.calendar.day(*day).period_count(),
                "rows": grid.layout(*day).iter().map(row_json).collect::<Vec<_>>(),
            })
        })
        .collect();
    let unplaced: Vec<&str> = grid.unplaced().iter().map(|e| e.id.as_str()).collect();
    if !unplaced.is_empty() {
        tracing::warn!(teacher_id = %teacher_id, count = unplaced.len(), "entries off the period table");
    }

    Ok(json!({
        "teacherId": teacher_id,
        "maxPeriods": state.calendar.max_period_count(),
        "fixedSlot": fixed,
        "days": days,
        "unplaced": unplaced,
    }))
}

fn blocks_list(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let teacher_id = required_str(params, "teacherId")?;
    let day = required_day(params, "weekday")?;
    let entries = conn
        .list_entries(&teacher_id)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?;
    let blocks = blocks_for_day(&state.calendar, &entries, day);
    Ok(json!({
        "weekday": day,
        "blocks": blocks.iter().map(block_json).collect::<Vec<_>>(),
    }))
}

fn blocks_today(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let teacher_id = required_str(params, "teacherId")?;
    let date = match optional_str(params, "date") {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| HandlerErr::bad_params("date must be YYYY-MM-DD"))?,
        None => chrono::Local::now().date_naive(),
    };
    let entries = conn
        .list_entries(&teacher_id)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?;
    let blocks = todays_blocks(&state.calendar, &entries, date);
    let weekday = SchoolDay::try_from(date.weekday()).ok();
    Ok(json!({
        "date": date.format("%Y-%m-%d").to_string(),
        "weekday": weekday,
        "schoolDay": weekday.is_some(),
        "blocks": blocks.iter().map(block_json).collect::<Vec<_>>(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grid.open" => Some(respond(req, grid_open(state, &req.params))),
        "blocks.list" => Some(respond(req, blocks_list(state, &req.params))),
        "blocks.today" => Some(respond(req, blocks_today(state, &req.params))),
        _ => None,
    }
}
