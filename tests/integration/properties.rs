//! Invariants checked over generated task lists.

use proptest::prelude::*;
use taskgate::{DependencyView, MemoryStorage, TaskController, TaskFields, TaskId};

use crate::fixtures::memory_controller;

const MAX_TASKS: u64 = 12;

/// One dependency list per task. Entries may name the task itself, a later
/// task, or an id past the end of the list.
fn dependency_lists() -> impl Strategy<Value = Vec<Vec<u64>>> {
    proptest::collection::vec(
        proptest::collection::vec(1..=MAX_TASKS + 2, 0..4),
        1..=MAX_TASKS as usize,
    )
}

fn build(lists: &[Vec<u64>]) -> TaskController<MemoryStorage> {
    let mut c = memory_controller();
    for i in 0..lists.len() {
        c.create_task(TaskFields::new(&format!("task {}", i + 1))).unwrap();
    }
    // Wire dependencies afterwards so forward references and cycles occur.
    for (i, deps) in lists.iter().enumerate() {
        let id = TaskId(i as u64 + 1);
        let fields = TaskFields::new(&format!("task {}", i + 1))
            .depends_on(deps.iter().map(|d| TaskId(*d)));
        c.edit_task(id, fields).unwrap();
    }
    c
}

proptest! {
    #[test]
    fn prop_unblocked_when_all_dependencies_done_or_gone(lists in dependency_lists()) {
        let mut c = build(&lists);
        // Complete whatever can be completed, repeatedly.
        for _ in 0..lists.len() {
            let ids: Vec<TaskId> = c.tasks().iter().map(|t| t.id).collect();
            for id in ids {
                if !c.store().get(id).unwrap().completed {
                    let _ = c.toggle_completion(id);
                }
            }
        }
        let view = DependencyView::new(c.store());
        for task in c.store().all() {
            let satisfied = task
                .depends_on
                .iter()
                .all(|d| c.store().get(*d).map_or(true, |dep| dep.completed));
            prop_assert_eq!(view.is_blocked(task), !task.completed && !satisfied);
        }
    }

    #[test]
    fn prop_no_dangling_references_after_deletes(
        lists in dependency_lists(),
        deletes in proptest::collection::vec(1..=MAX_TASKS, 0..6),
    ) {
        let mut c = build(&lists);
        for id in deletes {
            let id = TaskId(id);
            if c.store().contains(id) {
                c.delete_task(id).unwrap();
            }
        }
        for task in c.store().all() {
            for dep in &task.depends_on {
                prop_assert!(c.store().contains(*dep), "task {} keeps {}", task.id, dep);
            }
        }
    }

    #[test]
    fn prop_selection_is_stripped_of_self_unknown_and_duplicates(lists in dependency_lists()) {
        let c = build(&lists);
        let count = lists.len() as u64;
        for (i, deps) in lists.iter().enumerate() {
            let own = i as u64 + 1;
            let mut expected: Vec<TaskId> = Vec::new();
            for dep in deps {
                let dep = TaskId(*dep);
                if dep.0 != own && dep.0 <= count && !expected.contains(&dep) {
                    expected.push(dep);
                }
            }
            let task = c.store().get(TaskId(own)).unwrap();
            prop_assert!(!task.depends_on.contains(&task.id));
            prop_assert_eq!(&task.depends_on, &expected);
        }
    }

    #[test]
    fn prop_reopen_always_succeeds(lists in dependency_lists()) {
        let mut c = build(&lists);
        let ids: Vec<TaskId> = c.tasks().iter().map(|t| t.id).collect();
        for id in &ids {
            let _ = c.toggle_completion(*id);
        }
        for id in ids {
            if c.store().get(id).unwrap().completed {
                prop_assert!(c.toggle_completion(id).is_ok());
                prop_assert!(!c.store().get(id).unwrap().completed);
            }
        }
    }
}
