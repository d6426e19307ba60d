use crate::config::TimetableSetup;
use crate::ipc::helpers::{db_conn, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

const SECTION_TIMETABLE: &str = "timetable";

fn setup_get(state: &AppState) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let setup = TimetableSetup::load(conn).map_err(|e| HandlerErr::store("db_query_failed", e))?;
    Ok(json!({ SECTION_TIMETABLE: setup.to_json() }))
}

fn setup_update(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let conn = db_conn(state)?;
    let section = params
        .get("section")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing section"))?;
    if section != SECTION_TIMETABLE {
        return Err(HandlerErr::bad_params("unknown section"));
    }
    let patch = params
        .get("patch")
        .and_then(|v| v.as_object())
        .ok_or_else(|| HandlerErr::bad_params("patch must be an object"))?;
    if let Some(v) = patch.get("fixedSlotEnabled") {
        if !v.is_boolean() {
            return Err(HandlerErr::bad_params("fixedSlotEnabled must be boolean"));
        }
    }
    if let Some(v) = patch.get("fixedSlotLabel") {
        if !v.is_string() {
            return Err(HandlerErr::bad_params("fixedSlotLabel must be a string"));
        }
    }

    let updated = TimetableSetup::load(conn)
        .map_err(|e| HandlerErr::store("db_query_failed", e))?
        .patched(patch);
    updated
        .save(conn)
        .map_err(|e| HandlerErr::store("db_update_failed", e))?;
    tracing::info!(
        fixed_slot_enabled = updated.fixed_slot_enabled,
        "timetable setup updated"
    );
    Ok(json!({ SECTION_TIMETABLE: updated.to_json() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(respond(req, setup_get(state))),
        "setup.update" => Some(respond(req, setup_update(state, &req.params))),
        _ => None,
    }
}
