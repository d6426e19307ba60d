use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::timetable::clock::parse_clock;
use crate::timetable::{SchoolDay, TimetableError};
use chrono::NaiveTime;
use rusqlite::Connection;
use serde_json::Value;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    /// Infrastructure failure; `{:#}` keeps the anyhow context chain.
    pub fn store(code: &'static str, e: anyhow::Error) -> Self {
        Self::new(code, format!("{:#}", e))
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> Value {
        tracing::warn!(request_id = id, code = self.code, "{}", self.message);
        err(id, self.code, self.message, self.details)
    }
}

impl From<TimetableError> for HandlerErr {
    fn from(e: TimetableError) -> Self {
        Self::new(e.code(), e.to_string())
    }
}

pub fn respond(req: &Request, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    }
}

pub fn db_conn(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    optional_str(params, key).ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_u32(params: &Value, key: &str) -> Result<Option<u32>, HandlerErr> {
    let Some(v) = params.get(key) else {
        return Ok(None);
    };
    if v.is_null() {
        return Ok(None);
    }
    v.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| HandlerErr::bad_params(format!("{} must be a positive integer", key)))
}

pub fn required_u32(params: &Value, key: &str) -> Result<u32, HandlerErr> {
    optional_u32(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Day names go through the engine so weekends report `unknown_weekday`.
pub fn required_day(params: &Value, key: &str) -> Result<SchoolDay, HandlerErr> {
    let raw = required_str(params, key)?;
    Ok(raw.parse::<SchoolDay>()?)
}

pub fn optional_day(params: &Value, key: &str) -> Result<Option<SchoolDay>, HandlerErr> {
    optional_str(params, key)
        .map(|raw| raw.parse::<SchoolDay>().map_err(HandlerErr::from))
        .transpose()
}

pub fn optional_time(params: &Value, key: &str) -> Result<Option<NaiveTime>, HandlerErr> {
    optional_str(params, key)
        .map(|raw| parse_clock(&raw).map_err(HandlerErr::from))
        .transpose()
}

pub fn required_time(params: &Value, key: &str) -> Result<NaiveTime, HandlerErr> {
    optional_time(params, key)?.ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}
