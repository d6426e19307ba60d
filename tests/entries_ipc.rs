mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, select_workspace, spawn_sidecar, str_field, temp_dir};

#[test]
fn entries_create_by_periods_or_aligned_times() {
    let workspace = temp_dir("timetable-entries-create");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let by_periods = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "entries.create",
        json!({
            "teacherId": "guru-1",
            "weekday": "monday",
            "classId": "7A",
            "subject": "Matematika",
            "startPeriod": 2,
            "endPeriod": 3
        }),
    );
    let entry = &by_periods["entry"];
    assert_eq!(entry["start"], json!("08:00"));
    assert_eq!(entry["end"], json!("09:20"));
    assert_eq!(entry["periods"], json!([2, 3]));
    assert_eq!(entry["label"], json!("08:00 - 09:20"));
    assert!(!str_field(entry, "id").is_empty());

    let by_times = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "entries.create",
        json!({
            "teacherId": "guru-1",
            "weekday": "Jumat",
            "classId": "8B",
            "subject": "IPA",
            "startTime": "09:35",
            "endTime": "10:45"
        }),
    );
    assert_eq!(by_times["entry"]["weekday"], json!("friday"));
    assert_eq!(by_times["entry"]["periods"], json!([5, 6]));

    let single = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "entries.create",
        json!({
            "teacherId": "guru-1",
            "weekday": "wednesday",
            "classId": "9C",
            "subject": "Bahasa",
            "startPeriod": 9
        }),
    );
    assert_eq!(single["entry"]["start"], json!("13:05"));
    assert_eq!(single["entry"]["end"], json!("13:45"));

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "entries.list",
        json!({ "teacherId": "guru-1" }),
    );
    let days: Vec<&str> = listed["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .map(|e| str_field(e, "weekday"))
        .collect();
    assert_eq!(days, vec!["monday", "wednesday", "friday"]);

    let monday_only = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "entries.list",
        json!({ "teacherId": "guru-1", "weekday": "monday" }),
    );
    assert_eq!(monday_only["entries"].as_array().map(|a| a.len()), Some(1));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn entries_create_rejects_bad_placements() {
    let workspace = temp_dir("timetable-entries-reject");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let base = |extra: serde_json::Value| {
        let mut params = json!({
            "teacherId": "guru-1",
            "weekday": "monday",
            "classId": "7A",
            "subject": "Matematika"
        });
        for (k, v) in extra.as_object().expect("object") {
            params[k] = v.clone();
        }
        params
    };

    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "entries.create",
        base(json!({ "startTime": "08:10", "endTime": "09:20" })),
    );
    assert_eq!(code, "unaligned_range");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "entries.create",
        base(json!({ "startPeriod": 3, "endPeriod": 2 })),
    );
    assert_eq!(code, "invalid_period_range");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "entries.create",
        base(json!({ "startPeriod": 1, "endPeriod": 10 })),
    );
    assert_eq!(code, "invalid_period_range");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "entries.create",
        base(json!({ "weekday": "saturday", "startPeriod": 1 })),
    );
    assert_eq!(code, "unknown_weekday");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "entries.create",
        base(json!({ "startTime": "7:00pm", "endTime": "08:00" })),
    );
    assert_eq!(code, "bad_time");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "entries.create",
        base(json!({ "startTime": "07:00" })),
    );
    assert_eq!(code, "bad_params");

    let code = request_err(&mut stdin, &mut reader, "7", "entries.create", base(json!({})));
    assert_eq!(code, "bad_params");

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "entries.list",
        json!({ "teacherId": "guru-1" }),
    );
    assert_eq!(listed["entries"], json!([]));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn entries_require_a_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let code = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "entries.list",
        json!({ "teacherId": "guru-1" }),
    );
    assert_eq!(code, "no_workspace");
}

#[test]
fn entries_update_and_delete() {
    let workspace = temp_dir("timetable-entries-update");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "entries.create",
        json!({
            "teacherId": "guru-1",
            "weekday": "monday",
            "classId": "7A",
            "subject": "Matematika",
            "startPeriod": 2,
            "endPeriod": 3
        }),
    );
    let entry_id = str_field(&created["entry"], "id").to_string();

    let renamed = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "entries.update",
        json!({ "entryId": entry_id, "subject": "Fisika" }),
    );
    assert_eq!(renamed["entry"]["subject"], json!("Fisika"));
    assert_eq!(renamed["entry"]["start"], json!("08:00"));

    // 08:00 opens no Tuesday period, so a bare day change is refused.
    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "entries.update",
        json!({ "entryId": entry_id, "weekday": "tuesday" }),
    );
    assert_eq!(code, "unaligned_range");

    let moved = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "entries.update",
        json!({ "entryId": entry_id, "weekday": "tuesday", "startPeriod": 2, "endPeriod": 3 }),
    );
    assert_eq!(moved["entry"]["weekday"], json!("tuesday"));
    assert_eq!(moved["entry"]["start"], json!("07:40"));
    assert_eq!(moved["entry"]["end"], json!("09:00"));
    assert_eq!(moved["entry"]["subject"], json!("Fisika"));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "entries.update",
        json!({ "entryId": "missing", "subject": "x" }),
    );
    assert_eq!(code, "not_found");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "entries.delete",
        json!({ "entryId": entry_id }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "entries.delete",
        json!({ "entryId": entry_id }),
    );
    assert_eq!(code, "not_found");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn delete_cell_clears_the_occupying_entry() {
    let workspace = temp_dir("timetable-entries-delete-cell");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "entries.create",
        json!({
            "teacherId": "guru-1",
            "weekday": "thursday",
            "classId": "8A",
            "subject": "Sejarah",
            "startPeriod": 5,
            "endPeriod": 6
        }),
    );
    let entry_id = str_field(&created["entry"], "id").to_string();

    let code = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "entries.deleteCell",
        json!({ "teacherId": "guru-1", "weekday": "thursday", "period": 4 }),
    );
    assert_eq!(code, "not_found");

    let code = request_err(
        &mut stdin,
        &mut reader,
        "3",
        "entries.deleteCell",
        json!({ "teacherId": "guru-1", "weekday": "friday", "period": 7 }),
    );
    assert_eq!(code, "period_not_found");

    // Any cell the entry covers removes the whole entry.
    let deleted = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "entries.deleteCell",
        json!({ "teacherId": "guru-1", "weekday": "thursday", "period": 6 }),
    );
    assert_eq!(deleted["deletedEntryId"], json!(entry_id));

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "entries.list",
        json!({ "teacherId": "guru-1" }),
    );
    assert_eq!(listed["entries"], json!([]));

    let _ = std::fs::remove_dir_all(workspace);
}
