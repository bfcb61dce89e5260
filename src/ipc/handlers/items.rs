use chrono::NaiveDate;
use serde_json::{json, Value as JsonValue};

use super::{db_conn, load_state, optional_str, required_str, resolve_semester};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{new_id, AcademicItem, ItemStatus, ItemType};
use crate::parse::kind;
use crate::store;

fn valid_iso_date(s: &str) -> Option<String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn handle_items_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    if persisted.semesters.is_empty() {
        return ok(&req.id, json!({ "items": [] }));
    }
    let semester = match resolve_semester(&persisted, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let items: Vec<&AcademicItem> = persisted
        .items
        .iter()
        .filter(|i| i.belongs_to(semester))
        .collect();
    ok(&req.id, json!({ "items": items, "semesterId": semester.id }))
}

fn handle_items_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let title = match required_str(req, "title") {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let due_raw = match required_str(req, "dueDate") {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let Some(due_date) = valid_iso_date(&due_raw) else {
        return err(
            &req.id,
            "bad_params",
            format!("dueDate must be YYYY-MM-DD, got {}", due_raw),
            None,
        );
    };

    let mut persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let semester_id = match resolve_semester(&persisted, req) {
        Ok(s) => s.id.clone(),
        Err(resp) => return resp,
    };

    let item_type: ItemType = match req.params.get("type").and_then(|v| v.as_str()) {
        Some(raw) => match serde_json::from_value(JsonValue::String(raw.to_string())) {
            Ok(t) => t,
            Err(_) => kind::classify(raw),
        },
        None => kind::classify(&title),
    };

    let class_code = optional_str(&req.params, "classCode").unwrap_or_default();
    let class_name = optional_str(&req.params, "className").unwrap_or_else(|| class_code.clone());

    let item = AcademicItem {
        id: new_id(),
        title,
        class_code,
        class_name,
        item_type,
        status: ItemStatus::default(),
        due_date,
        time: optional_str(&req.params, "time"),
        grade: None,
        is_late: None,
        days_late: None,
        grade_category: None,
        semester_id,
    };

    persisted.items.push(item.clone());
    if let Err(e) = store::write_items(conn, &persisted.items) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "item": item }))
}

fn apply_patch(item: &mut AcademicItem, patch: &JsonValue) -> Result<(), String> {
    let Some(obj) = patch.as_object() else {
        return Err("patch must be an object".to_string());
    };
    for (key, value) in obj {
        match key.as_str() {
            "title" => {
                let t = value.as_str().unwrap_or("").trim().to_string();
                if t.is_empty() {
                    return Err("title must not be empty".to_string());
                }
                item.title = t;
            }
            "status" => {
                item.status = serde_json::from_value(value.clone())
                    .map_err(|_| "status must be one of: not-started, in-progress, completed")?;
            }
            "type" => {
                item.item_type = serde_json::from_value(value.clone())
                    .map_err(|_| "unknown item type")?;
            }
            "dueDate" => {
                let raw = value.as_str().unwrap_or("");
                item.due_date = valid_iso_date(raw)
                    .ok_or_else(|| format!("dueDate must be YYYY-MM-DD, got {}", raw))?;
            }
            "time" => {
                item.time = value.as_str().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
            }
            "grade" => {
                item.grade = if value.is_null() { None } else { value.as_f64() };
            }
            "isLate" => {
                item.is_late = if value.is_null() { None } else { value.as_bool() };
            }
            "daysLate" => {
                item.days_late = if value.is_null() { None } else { value.as_i64() };
            }
            "gradeCategory" => {
                item.grade_category = value
                    .as_str()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
            }
            other => return Err(format!("unknown patch field: {}", other)),
        }
    }
    Ok(())
}

fn handle_items_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let item_id = match required_str(req, "itemId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(patch) = req.params.get("patch") else {
        return err(&req.id, "bad_params", "missing patch", None);
    };

    let mut persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(item) = persisted.items.iter_mut().find(|i| i.id == item_id) else {
        return err(&req.id, "not_found", "item not found", None);
    };
    if let Err(message) = apply_patch(item, patch) {
        return err(&req.id, "bad_params", message, None);
    }
    let updated = item.clone();
    if let Err(e) = store::write_items(conn, &persisted.items) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "item": updated }))
}

fn handle_items_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let item_id = match required_str(req, "itemId") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let mut persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let before = persisted.items.len();
    persisted.items.retain(|i| i.id != item_id);
    if persisted.items.len() == before {
        return err(&req.id, "not_found", "item not found", None);
    }
    if let Err(e) = store::write_items(conn, &persisted.items) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "deleted": item_id }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "items.list" => Some(handle_items_list(state, req)),
        "items.create" => Some(handle_items_create(state, req)),
        "items.update" => Some(handle_items_update(state, req)),
        "items.delete" => Some(handle_items_delete(state, req)),
        _ => None,
    }
}
