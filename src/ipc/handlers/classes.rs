use serde_json::{json, Value as JsonValue};

use super::{db_conn, load_state, required_str, resolve_semester};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{normalize_class_code, ClassInfo};
use crate::store;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    if persisted.semesters.is_empty() {
        return ok(&req.id, json!({ "classes": [] }));
    }
    let semester = match resolve_semester(&persisted, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    // Include item counts so the UI can show a useful dashboard.
    let classes: Vec<serde_json::Value> = semester
        .classes
        .iter()
        .map(|c| {
            let item_count = persisted
                .items
                .iter()
                .filter(|i| i.semester_id == semester.id && i.class_code == c.code)
                .count();
            let mut v = serde_json::to_value(c).unwrap_or_else(|_| json!({}));
            v["itemCount"] = json!(item_count);
            v["gradeWeights"] = semester
                .grade_weights
                .get(&c.code)
                .cloned()
                .unwrap_or(JsonValue::Null);
            v
        })
        .collect();

    ok(
        &req.id,
        json!({ "classes": classes, "semesterId": semester.id }),
    )
}

fn apply_class_patch(class: &mut ClassInfo, patch: &JsonValue) -> Result<(), String> {
    let Some(obj) = patch.as_object() else {
        return Err("patch must be an object".to_string());
    };
    for (key, value) in obj {
        match key.as_str() {
            "name" => {
                let name = value.as_str().unwrap_or("").trim().to_string();
                if name.is_empty() {
                    return Err("name must not be empty".to_string());
                }
                class.name = name;
            }
            "color" => {
                let color = value.as_str().unwrap_or("").trim().to_string();
                if color.is_empty() {
                    return Err("color must not be empty".to_string());
                }
                class.color = color;
            }
            "hasLatePenalty" => {
                class.has_late_penalty = value.as_bool().ok_or("hasLatePenalty must be boolean")?;
            }
            "killSwitch" => {
                class.kill_switch = if value.is_null() { None } else { value.as_bool() };
            }
            other => return Err(format!("unknown patch field: {}", other)),
        }
    }
    Ok(())
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let code = match required_str(req, "code") {
        Ok(v) => normalize_class_code(&v),
        Err(resp) => return resp,
    };
    let Some(patch) = req.params.get("patch") else {
        return err(&req.id, "bad_params", "missing patch", None);
    };

    let mut persisted = match load_state(conn, req) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let semester_id = match resolve_semester(&persisted, req) {
        Ok(s) => s.id.clone(),
        Err(resp) => return resp,
    };
    let Some(semester) = persisted
        .semesters
        .iter_mut()
        .find(|s| s.id == semester_id)
    else {
        return err(&req.id, "not_found", "semester not found", None);
    };
    let Some(class) = semester
        .classes
        .iter_mut()
        .find(|c| normalize_class_code(&c.code) == code)
    else {
        return err(&req.id, "not_found", "class not found", None);
    };
    if let Err(message) = apply_class_patch(class, patch) {
        return err(&req.id, "bad_params", message, None);
    }
    let updated = class.clone();
    if let Err(e) = store::write_semesters(conn, &persisted.semesters) {
        return err(&req.id, "db_write_failed", e.to_string(), None);
    }
    ok(&req.id, json!({ "class": updated }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.update" => Some(handle_classes_update(state, req)),
        _ => None,
    }
}
