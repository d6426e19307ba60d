use crate::ipc::helpers::{
    optional_day, required_day, required_time, required_u32, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::timetable::calendar::{BreakWindow, PeriodDefinition, SchoolDay};
use crate::timetable::clock::{format_clock, minutes_between, range_label};
use crate::timetable::resolver::{periods_to_time_range, time_range_to_periods};
use serde_json::json;

pub fn period_json(p: &PeriodDefinition) -> serde_json::Value {
    json!({
        "index": p.index,
        "startTime": format_clock(p.start),
        "endTime": format_clock(p.end),
        "minutes": minutes_between(p.start, p.end),
        "label": range_label(p.start, p.end),
    })
}

pub fn break_json(b: &BreakWindow) -> serde_json::Value {
    json!({
        "afterPeriod": b.after_period,
        "startTime": format_clock(b.start),
        "endTime": format_clock(b.end),
        "label": b.label,
    })
}

fn day_json(state: &AppState, day: SchoolDay) -> Result<serde_json::Value, HandlerErr> {
    let periods = state.calendar.periods_of(day)?;
    let breaks = state.calendar.breaks_of(day)?;
    Ok(json!({
        "weekday": day,
        "periodCount": periods.len(),
        "periods": periods.iter().map(period_json).collect::<Vec<_>>(),
        "breaks": breaks.iter().map(break_json).collect::<Vec<_>>(),
    }))
}

fn calendar_get(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let days = match optional_day(params, "weekday")? {
        Some(day) => vec![day_json(state, day)?],
        None => SchoolDay::ALL
            .iter()
            .map(|d| day_json(state, *d))
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(json!({
        "maxPeriods": state.calendar.max_period_count(),
        "days": days,
    }))
}

fn calendar_resolve(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let day = required_day(params, "weekday")?;
    let start = required_u32(params, "startPeriod")?;
    let end = required_u32(params, "endPeriod")?;
    let range = periods_to_time_range(&state.calendar, day, start, end)?;
    Ok(json!({
        "weekday": day,
        "startTime": format_clock(range.start),
        "endTime": format_clock(range.end),
        "label": range_label(range.start, range.end),
    }))
}

fn calendar_period(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let day = required_day(params, "weekday")?;
    let index = required_u32(params, "index")?;
    let (start, end) = state.calendar.time_range_of(day, index)?;
    let recess = state
        .calendar
        .breaks_of(day)?
        .iter()
        .find(|b| b.after_period == index)
        .map(break_json);
    Ok(json!({
        "weekday": day,
        "index": index,
        "startTime": format_clock(start),
        "endTime": format_clock(end),
        "label": range_label(start, end),
        "breakAfter": recess,
    }))
}

fn calendar_periods_for(
    state: &AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let day = required_day(params, "weekday")?;
    let start = required_time(params, "startTime")?;
    let end = required_time(params, "endTime")?;
    let periods = time_range_to_periods(&state.calendar, day, start, end)?;
    Ok(json!({
        "weekday": day,
        "periods": periods,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calendar.get" => Some(respond(req, calendar_get(state, &req.params))),
        "calendar.period" => Some(respond(req, calendar_period(state, &req.params))),
        "calendar.resolve" => Some(respond(req, calendar_resolve(state, &req.params))),
        "calendar.periodsFor" => Some(respond(req, calendar_periods_for(state, &req.params))),
        _ => None,
    }
}
