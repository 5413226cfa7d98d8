//! Persistence round-trips and storage failures.

use std::fs;

use chrono::NaiveDate;
use taskgate::config::Config;
use taskgate::{
    Effect, JsonFileStorage, MemoryStorage, Priority, Storage, TaskController, TaskFields, TaskId,
};

use crate::fixtures::{add, memory_controller, release_pipeline, TempTaskFile};

fn sorted_deps(mut ids: Vec<TaskId>) -> Vec<TaskId> {
    ids.sort();
    ids
}

#[test]
fn test_file_round_trip_preserves_content() {
    let file = TempTaskFile::new();
    let before = {
        let mut c = file.open();
        let ids = release_pipeline(&mut c);
        c.edit_task(
            ids[4],
            TaskFields::new("Docs")
                .category("Work")
                .priority(Priority::Medium)
                .due(NaiveDate::from_ymd_opt(2026, 12, 1).unwrap())
                .depends_on([ids[0]]),
        )
        .unwrap();
        c.toggle_completion(ids[0]).unwrap();
        c.tasks().to_vec()
    };

    let after = file.open().tasks().to_vec();
    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(b.id, a.id);
        assert_eq!(b.text, a.text);
        assert_eq!(b.category, a.category);
        assert_eq!(b.priority, a.priority);
        assert_eq!(b.due_date, a.due_date);
        assert_eq!(b.completed, a.completed);
        assert_eq!(b.created_at, a.created_at);
        assert_eq!(
            sorted_deps(b.depends_on.clone()),
            sorted_deps(a.depends_on.clone())
        );
    }
}

#[test]
fn test_ids_are_not_reused_across_sessions() {
    let file = TempTaskFile::new();
    {
        let mut c = file.open();
        add(&mut c, "a", &[]);
        let b = add(&mut c, "b", &[]);
        c.delete_task(b).unwrap();
    }
    let mut c = file.open();
    let next = add(&mut c, "c", &[]);
    assert_eq!(next, TaskId(3));
}

#[test]
fn test_every_mutation_writes_once() {
    let mut c = memory_controller();
    let a = add(&mut c, "a", &[]);
    let b = add(&mut c, "b", &[a]);
    c.edit_task(b, TaskFields::new("b2").depends_on([a])).unwrap();
    c.toggle_completion(a).unwrap();
    c.delete_task(b).unwrap();
    c.clear_completed().unwrap();
    assert_eq!(c.storage().writes(), 6);
    assert!(c.storage().saved().unwrap().tasks.is_empty());
}

#[test]
fn test_write_failure_is_reported_not_fatal() {
    let storage = MemoryStorage::new();
    let mut c = TaskController::open(&storage, Config::default()).unwrap();
    let a = add(&mut c, "a", &[]);

    storage.set_fail_writes(true);
    let receipt = c.toggle_completion(a).unwrap();
    assert!(receipt
        .effects
        .iter()
        .any(|e| matches!(e, Effect::PersistenceFailed { .. })));
    assert!(c.store().get(a).unwrap().completed);
    assert!(!storage.saved().unwrap().tasks[0].completed);

    storage.set_fail_writes(false);
    let receipt = c.create_task(TaskFields::new("b")).unwrap();
    assert!(receipt.persisted());
    assert!(storage.saved().unwrap().tasks[0].completed);
}

#[test]
fn test_loads_browser_export_with_string_ids_and_dangling_refs() {
    let file = TempTaskFile::new();
    fs::write(
        &file.path,
        r#"[
          {"id": 1700000000000, "text": "Design", "category": "Work", "priority": "High",
           "dueDate": "2026-01-10", "dependsOn": [], "completed": false,
           "createdAt": "2026-01-01T10:00:00.000Z"},
          {"id": "1700000000001", "text": "Build", "category": "Work", "priority": "Medium",
           "dueDate": "", "dependsOn": ["1700000000000", 5], "completed": false,
           "createdAt": "2026-01-01T10:00:01.000Z"}
        ]"#,
    )
    .unwrap();

    let mut c = file.open();
    let build = TaskId(1_700_000_000_001);
    assert_eq!(c.store().get(build).unwrap().depends_on, vec![TaskId(1_700_000_000_000)]);
    assert!(c.dependency_status(build).unwrap().blocked);

    let next = add(&mut c, "Ship", &[]);
    assert_eq!(next, TaskId(1_700_000_000_002));

    let saved = JsonFileStorage::new(&file.path).load().unwrap().unwrap();
    assert_eq!(saved.tasks.len(), 3);
    assert_eq!(saved.next_id, 1_700_000_000_003);
}

#[test]
fn test_corrupt_file_fails_to_open() {
    let file = TempTaskFile::new();
    fs::write(&file.path, "{ not json").unwrap();
    let result = TaskController::open(JsonFileStorage::new(&file.path), Config::default());
    assert!(result.is_err());
}

#[test]
fn test_loads_export_with_text_ids_and_lowercase_priority() {
    let file = TempTaskFile::new();
    fs::write(
        &file.path,
        r#"[
          {"id": "design", "text": "Design", "priority": "high",
           "dependsOn": [], "completed": false,
           "createdAt": "2026-01-01T10:00:00.000Z"},
          {"id": "build", "text": "Build", "priority": "low",
           "dependsOn": ["design"], "completed": false,
           "createdAt": "2026-01-01T10:00:01.000Z"}
        ]"#,
    )
    .unwrap();

    let mut c = file.open();
    let ids: Vec<TaskId> = c.tasks().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![TaskId(1), TaskId(2)]);
    assert_eq!(c.tasks()[0].priority, Priority::High);
    assert_eq!(c.store().get(TaskId(2)).unwrap().depends_on, vec![TaskId(1)]);
    assert!(c.toggle_completion(TaskId(2)).is_err());

    assert_eq!(add(&mut c, "Ship", &[]), TaskId(3));
}

#[test]
fn test_file_holding_last_id_is_refused_without_panic() {
    let file = TempTaskFile::new();
    let record = format!(
        r#"[{{"id": {}, "text": "edge", "completed": false,
             "createdAt": "2026-01-01T10:00:00.000Z"}}]"#,
        u64::MAX
    );
    fs::write(&file.path, record).unwrap();

    let result = TaskController::open(JsonFileStorage::new(&file.path), Config::default());
    assert!(matches!(result, Err(taskgate::Error::Validation(_))));
}
