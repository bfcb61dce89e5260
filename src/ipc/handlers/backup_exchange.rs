use std::path::PathBuf;

use serde_json::json;

use super::required_str;
use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn workspace_path(state: &AppState, req: &Request) -> Result<PathBuf, serde_json::Value> {
    if let Ok(p) = required_str(req, "workspacePath") {
        return Ok(PathBuf::from(p));
    }
    state
        .workspace
        .clone()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn handle_export_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace_path(state, req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let out_path = match required_str(req, "outPath") {
        Ok(p) => PathBuf::from(p),
        Err(resp) => return resp,
    };
    match backup::export_workspace_bundle(&ws, &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormat": summary.bundle_format,
                "dbSha256": summary.db_sha256,
                "outPath": out_path.to_string_lossy(),
            }),
        ),
        Err(e) => err(&req.id, "backup_export_failed", e.to_string(), None),
    }
}

fn handle_import_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match workspace_path(state, req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let in_path = match required_str(req, "inPath") {
        Ok(p) => PathBuf::from(p),
        Err(resp) => return resp,
    };

    // Drop the open connection before the db file is swapped out.
    let had_db = state.db.take().is_some();
    match backup::import_workspace_bundle(&in_path, &ws) {
        Ok(summary) => match crate::store::open_db(&ws) {
            Ok(conn) => {
                state.db = Some(conn);
                state.workspace = Some(ws);
                ok(
                    &req.id,
                    json!({ "bundleFormatDetected": summary.bundle_format_detected }),
                )
            }
            Err(e) => err(&req.id, "db_open_failed", e.to_string(), None),
        },
        Err(e) => {
            // Restore a usable connection when the import failed mid-way.
            if had_db {
                state.db = crate::store::open_db(&ws).ok();
            }
            err(&req.id, "backup_import_failed", e.to_string(), None)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_export_bundle(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_import_bundle(state, req)),
        _ => None,
    }
}
