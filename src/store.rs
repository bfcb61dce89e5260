use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::model::{AcademicItem, Semester};

pub const KEY_ITEMS: &str = "items";
pub const KEY_SEMESTERS: &str = "semesters";
pub const KEY_CURRENT_SEMESTER: &str = "currentSemesterId";

/// Open (or create) the planner database inside a workspace directory.
/// State is three whole JSON documents in a key-value table; there are no
/// partial writes and no schema versioning.
pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("planner.sqlite3");
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn document_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM documents WHERE key = ?", [key], |r| {
            r.get(0)
        })
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub fn document_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO documents(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key, &text),
    )?;
    Ok(())
}

pub fn read_items(conn: &Connection) -> anyhow::Result<Vec<AcademicItem>> {
    match document_get_json(conn, KEY_ITEMS)? {
        Some(v) => Ok(serde_json::from_value(v)?),
        None => Ok(Vec::new()),
    }
}

pub fn write_items(conn: &Connection, items: &[AcademicItem]) -> anyhow::Result<()> {
    document_set_json(conn, KEY_ITEMS, &serde_json::to_value(items)?)
}

pub fn read_semesters(conn: &Connection) -> anyhow::Result<Vec<Semester>> {
    match document_get_json(conn, KEY_SEMESTERS)? {
        Some(v) => Ok(serde_json::from_value(v)?),
        None => Ok(Vec::new()),
    }
}

pub fn write_semesters(conn: &Connection, semesters: &[Semester]) -> anyhow::Result<()> {
    document_set_json(conn, KEY_SEMESTERS, &serde_json::to_value(semesters)?)
}

pub fn read_current_semester(conn: &Connection) -> anyhow::Result<String> {
    match document_get_json(conn, KEY_CURRENT_SEMESTER)? {
        Some(serde_json::Value::String(id)) => Ok(id),
        _ => Ok(String::new()),
    }
}

pub fn write_current_semester(conn: &Connection, semester_id: &str) -> anyhow::Result<()> {
    document_set_json(
        conn,
        KEY_CURRENT_SEMESTER,
        &serde_json::Value::String(semester_id.to_string()),
    )
}
