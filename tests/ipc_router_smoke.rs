use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_plannerd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn plannerd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn raw_request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = raw_request(stdin, reader, id, method, params);
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("plannerd-router-smoke");
    let bundle_out = workspace.join("smoke-backup.plannerbackup.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health["ok"], true);

    // Any stateful method before a workspace is selected must say so.
    let early = request(
        &mut stdin,
        &mut reader,
        "2",
        "items.list",
        json!({}),
    );
    assert_eq!(early["error"]["code"], "no_workspace");

    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let preview = request(
        &mut stdin,
        &mut reader,
        "4",
        "import.previewFreeText",
        json!({ "text": "Feb 15 2026 - ECON330 - Quiz 1\nMATH101 final exam 5/8/2026" }),
    );
    assert_eq!(preview["ok"], true);
    let candidates = preview["result"]["candidates"]
        .as_array()
        .expect("candidates")
        .clone();
    assert_eq!(candidates.len(), 2);

    let commit = request(
        &mut stdin,
        &mut reader,
        "5",
        "import.commit",
        json!({
            "mode": "replace",
            "items": candidates.iter().map(|c| c["item"].clone()).collect::<Vec<_>>(),
            "classes": preview["result"]["newClasses"],
        }),
    );
    assert_eq!(commit["ok"], true);
    let semester_id = commit["result"]["currentSemesterId"]
        .as_str()
        .expect("semester id")
        .to_string();
    assert!(!semester_id.is_empty());

    let listed = request(&mut stdin, &mut reader, "6", "items.list", json!({}));
    assert_eq!(listed["result"]["items"].as_array().expect("items").len(), 2);

    let created = request(
        &mut stdin,
        &mut reader,
        "7",
        "items.create",
        json!({
            "title": "Reading response",
            "dueDate": "2026-03-10",
            "classCode": "ECON330"
        }),
    );
    let item_id = created["result"]["item"]["id"]
        .as_str()
        .expect("item id")
        .to_string();

    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "items.update",
        json!({ "itemId": item_id, "patch": { "status": "completed" } }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "items.delete",
        json!({ "itemId": item_id }),
    );

    let classes = request(&mut stdin, &mut reader, "10", "classes.list", json!({}));
    assert_eq!(
        classes["result"]["classes"].as_array().expect("classes").len(),
        2
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "classes.update",
        json!({ "code": "ECON330", "patch": { "color": "teal" } }),
    );

    let semesters = request(&mut stdin, &mut reader, "12", "semesters.list", json!({}));
    assert_eq!(semesters["result"]["currentSemesterId"], semester_id);
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "semesters.setCurrent",
        json!({ "semesterId": semester_id }),
    );

    let _ = request(
        &mut stdin,
        &mut reader,
        "14",
        "grades.classSummary",
        json!({ "classCode": "ECON330" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "15",
        "grades.semesterSummary",
        json!({}),
    );

    let _ = request(
        &mut stdin,
        &mut reader,
        "16",
        "backup.exportWorkspaceBundle",
        json!({
            "workspacePath": workspace.to_string_lossy(),
            "outPath": bundle_out.to_string_lossy()
        }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "17",
        "backup.importWorkspaceBundle",
        json!({
            "workspacePath": workspace.to_string_lossy(),
            "inPath": bundle_out.to_string_lossy()
        }),
    );

    let unknown = raw_request(
        &mut stdin,
        &mut reader,
        "18",
        "planner.noSuchMethod",
        json!({}),
    );
    assert_eq!(unknown["error"]["code"], "not_implemented");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
