use serde_json::json;

use super::{db_conn, load_state, required_str};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store;

fn handle_semesters_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    ok(
        &req.id,
        json!({
            "semesters": persisted.semesters,
            "currentSemesterId": persisted.current_semester_id,
        }),
    )
}

fn handle_semesters_set_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let semester_id = match required_str(req, "semesterId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    if !persisted.semesters.iter().any(|s| s.id == semester_id) {
        return err(&req.id, "not_found", "semester not found", None);
    }
    if let Err(e) = store::write_current_semester(conn, &semester_id) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "currentSemesterId": semester_id }))
}

fn handle_semesters_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let semester_id = match required_str(req, "semesterId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let before = persisted.semesters.len();
    persisted.semesters.retain(|s| s.id != semester_id);
    if persisted.semesters.len() == before {
        return err(&req.id, "not_found", "semester not found", None);
    }
    persisted.items.retain(|i| i.semester_id != semester_id);

    let current = if persisted.current_semester_id == semester_id {
        persisted
            .semesters
            .first()
            .map(|s| s.id.clone())
            .unwrap_or_default()
    } else {
        persisted.current_semester_id.clone()
    };

    if let Err(e) = store::write_items(conn, &persisted.items)
        .and_then(|_| store::write_semesters(conn, &persisted.semesters))
        .and_then(|_| store::write_current_semester(conn, &current))
    {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(
        &req.id,
        json!({
            "deleted": semester_id,
            "currentSemesterId": current,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "semesters.list" => Some(handle_semesters_list(state, req)),
        "semesters.setCurrent" => Some(handle_semesters_set_current(state, req)),
        "semesters.delete" => Some(handle_semesters_delete(state, req)),
        _ => None,
    }
}
