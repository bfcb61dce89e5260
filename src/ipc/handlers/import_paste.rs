use chrono::NaiveDate;
use serde_json::json;

use super::{db_conn, load_state, required_str, today};
use crate::import::{merge_import, ImportMode};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{AcademicItem, ClassInfo};
use crate::parse::free_text::{default_annotation_rules, parse_free_text, AnnotationRule};
use crate::parse::tabular::parse_tabular;
use crate::parse::ParseError;
use crate::store;

/// Classes the parser should treat as already known: the target semester's
/// class list, or nothing when no semester exists yet.
fn known_classes(state: &super::PersistedState) -> Vec<ClassInfo> {
    state
        .semesters
        .iter()
        .find(|s| s.id == state.current_semester_id)
        .or_else(|| state.semesters.first())
        .map(|s| s.classes.clone())
        .unwrap_or_default()
}

fn parse_error(req: &Request, e: ParseError) -> serde_json::Value {
    err(&req.id, e.code(), e.message(), None)
}

fn handle_preview_tabular(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let text = match required_str(req, "text") {
        Ok(t) => t,
        Err(_) => return parse_error(req, ParseError::EmptyInput),
    };
    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match parse_tabular(&text, &known_classes(&persisted), today()) {
        Ok(batch) => ok(
            &req.id,
            json!({
                "items": batch.items,
                "newClasses": batch.new_classes,
            }),
        ),
        Err(e) => parse_error(req, e),
    }
}

fn handle_preview_free_text(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let text = match required_str(req, "text") {
        Ok(t) => t,
        Err(_) => return parse_error(req, ParseError::EmptyInput),
    };
    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let rules: Vec<AnnotationRule> = match req.params.get("annotationRules") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("invalid annotationRules: {}", e),
                    None,
                )
            }
        },
        None => default_annotation_rules(),
    };

    match parse_free_text(&text, &known_classes(&persisted), today(), &rules) {
        Ok(outcome) => ok(
            &req.id,
            json!({
                "candidates": outcome.candidates,
                "newClasses": outcome.new_classes,
            }),
        ),
        Err(e) => parse_error(req, e),
    }
}

fn valid_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn handle_commit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let mode_str = match required_str(req, "mode") {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let Some(mode) = ImportMode::from_str(&mode_str) else {
        return err(
            &req.id,
            "bad_params",
            "mode must be one of: replace, add",
            None,
        );
    };

    let items: Vec<AcademicItem> = match req.params.get("items") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "bad_params", format!("invalid items: {}", e), None),
        },
        None => return err(&req.id, "bad_params", "missing items", None),
    };
    let classes: Vec<ClassInfo> = match req.params.get("classes") {
        Some(raw) => match serde_json::from_value(raw.clone()) {
            Ok(v) => v,
            Err(e) => {
                return err(&req.id, "bad_params", format!("invalid classes: {}", e), None)
            }
        },
        None => Vec::new(),
    };

    for item in &items {
        if item.title.trim().is_empty() {
            return err(&req.id, "bad_params", "item titles must not be empty", None);
        }
        if !valid_iso_date(&item.due_date) {
            return err(
                &req.id,
                "bad_params",
                format!("invalid dueDate: {}", item.due_date),
                Some(json!({ "itemId": item.id })),
            );
        }
    }

    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let outcome = match merge_import(
        &persisted.items,
        &persisted.semesters,
        &persisted.current_semester_id,
        items,
        classes,
        mode,
        today(),
    ) {
        Ok(o) => o,
        Err(e) => return err(&req.id, e.code(), e.message(), None),
    };

    // Persist the complete next state; three whole-document writes.
    if let Err(e) = store::write_items(conn, &outcome.items)
        .and_then(|_| store::write_semesters(conn, &outcome.semesters))
        .and_then(|_| store::write_current_semester(conn, &outcome.current_semester_id))
    {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }

    let semester = outcome
        .semesters
        .iter()
        .find(|s| s.id == outcome.current_semester_id);

    ok(
        &req.id,
        json!({
            "mode": mode_str,
            "semester": semester,
            "semesters": outcome.semesters,
            "items": outcome.items,
            "currentSemesterId": outcome.current_semester_id,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "import.previewTabular" => Some(handle_preview_tabular(state, req)),
        "import.previewFreeText" => Some(handle_preview_free_text(state, req)),
        "import.commit" => Some(handle_commit(state, req)),
        _ => None,
    }
}
