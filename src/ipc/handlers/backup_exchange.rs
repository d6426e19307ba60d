use crate::backup;
use crate::db;
use crate::ipc::helpers::{optional_str, required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn target_workspace(state: &AppState, params: &serde_json::Value) -> Result<PathBuf, HandlerErr> {
    optional_str(params, "workspacePath")
        .map(PathBuf::from)
        .or_else(|| state.workspace.clone())
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

fn export_bundle(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let out_path = required_str(params, "outPath")?;
    let workspace_path = target_workspace(state, params)?;

    if let Some(conn) = state.db.as_ref() {
        let _ = conn.execute_batch("PRAGMA wal_checkpoint(FULL)");
    }

    let export = backup::export_workspace_bundle(&workspace_path, &PathBuf::from(&out_path))
        .map_err(|e| HandlerErr::store("io_failed", e).with_details(json!({ "path": out_path })))?;
    tracing::info!(path = %out_path, sha256 = %export.db_sha256, "workspace bundle exported");

    Ok(json!({
        "ok": true,
        "path": out_path,
        "bundleFormat": export.bundle_format,
        "entryCount": export.entry_count,
        "dbSha256": export.db_sha256,
    }))
}

/// Restores the connection a failed import had to release.
fn reopen_previous(state: &mut AppState) {
    let Some(path) = state.workspace.clone() else {
        return;
    };
    match db::open_db(&path) {
        Ok(conn) => state.db = Some(conn),
        Err(e) => {
            tracing::error!(workspace = %path.to_string_lossy(), "reopen after failed import: {:#}", e);
        }
    }
}

fn import_bundle(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let in_path = required_str(params, "inPath")?;
    let workspace_path = target_workspace(state, params)?;

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return Err(HandlerErr::new("not_found", "bundle file not found")
            .with_details(json!({ "path": in_path })));
    }

    // Only the open workspace's file is about to be replaced.
    let replacing_open = state.workspace.as_deref() == Some(workspace_path.as_path());
    if replacing_open {
        state.db = None;
    }

    let import = match backup::import_workspace_bundle(&src, &workspace_path) {
        Ok(v) => v,
        Err(e) => {
            if replacing_open {
                reopen_previous(state);
            }
            return Err(HandlerErr::store("io_failed", e).with_details(json!({ "path": in_path })));
        }
    };
    let conn = db::open_db(&workspace_path).map_err(|e| HandlerErr::store("db_open_failed", e))?;
    state.workspace = Some(workspace_path.clone());
    state.db = Some(conn);
    tracing::info!(
        path = %in_path,
        workspace = %workspace_path.to_string_lossy(),
        format = %import.bundle_format_detected,
        "workspace bundle imported"
    );

    Ok(json!({
        "ok": true,
        "workspacePath": workspace_path.to_string_lossy(),
        "bundleFormatDetected": import.bundle_format_detected,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(respond(req, export_bundle(state, &req.params))),
        "backup.importWorkspaceBundle" => Some(respond(req, import_bundle(state, &req.params))),
        _ => None,
    }
}
