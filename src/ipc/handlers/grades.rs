use serde_json::json;

use super::{db_conn, load_state, required_str, resolve_semester};
use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::normalize_class_code;

fn handle_class_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let class_code = match required_str(req, "classCode") {
        Ok(v) => normalize_class_code(&v),
        Err(resp) => return resp,
    };
    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let semester = match resolve_semester(&persisted, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    if !semester
        .classes
        .iter()
        .any(|c| normalize_class_code(&c.code) == class_code)
    {
        return err(&req.id, "not_found", "class not found", None);
    }

    let summary = calc::class_grade_summary(&persisted.items, semester, &class_code);
    ok(&req.id, json!({ "summary": summary }))
}

fn handle_semester_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let semester = match resolve_semester(&persisted, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let summaries: Vec<calc::ClassGradeSummary> = semester
        .classes
        .iter()
        .map(|c| calc::class_grade_summary(&persisted.items, semester, &c.code))
        .collect();
    ok(
        &req.id,
        json!({ "semesterId": semester.id, "summaries": summaries }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.classSummary" => Some(handle_class_summary(state, req)),
        "grades.semesterSummary" => Some(handle_semester_summary(state, req)),
        _ => None,
    }
}
