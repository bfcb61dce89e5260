pub mod backup_exchange;
pub mod classes;
pub mod core;
pub mod grades;
pub mod import_paste;
pub mod items;
pub mod semesters;

use rusqlite::Connection;
use serde_json::Value as JsonValue;

use super::error::err;
use super::types::{AppState, Request};
use crate::model::{AcademicItem, Semester};
use crate::store;

pub(crate) fn db_conn<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub(crate) fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub(crate) fn optional_str(params: &JsonValue, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The three persisted documents, read together.
pub(crate) struct PersistedState {
    pub items: Vec<AcademicItem>,
    pub semesters: Vec<Semester>,
    pub current_semester_id: String,
}

pub(crate) fn load_state(
    conn: &Connection,
    req: &Request,
) -> Result<PersistedState, serde_json::Value> {
    let items = store::read_items(conn)
        .map_err(|e| err(&req.id, "db_read_failed", e.to_string(), None))?;
    let semesters = store::read_semesters(conn)
        .map_err(|e| err(&req.id, "db_read_failed", e.to_string(), None))?;
    let current_semester_id = store::read_current_semester(conn)
        .map_err(|e| err(&req.id, "db_read_failed", e.to_string(), None))?;
    Ok(PersistedState {
        items,
        semesters,
        current_semester_id,
    })
}

/// Resolve the semester a request targets: explicit `semesterId` param,
/// else the current selection, else the only/first semester.
pub(crate) fn resolve_semester<'a>(
    state: &'a PersistedState,
    req: &Request,
) -> Result<&'a Semester, serde_json::Value> {
    if let Some(id) = optional_str(&req.params, "semesterId") {
        return state
            .semesters
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| err(&req.id, "not_found", "semester not found", None));
    }
    state
        .semesters
        .iter()
        .find(|s| s.id == state.current_semester_id)
        .or_else(|| state.semesters.first())
        .ok_or_else(|| err(&req.id, "not_found", "no semesters yet", None))
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
