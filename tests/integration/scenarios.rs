//! Dependency gating walkthroughs.

use taskgate::{CompletionState, Error, TaskFields, TaskId};

use crate::fixtures::{add, memory_controller, release_pipeline};

#[test]
fn test_complete_after_dependency_is_done() {
    let mut c = memory_controller();
    let design = add(&mut c, "Design", &[]);
    let build = add(&mut c, "Build", &[design]);

    c.toggle_completion(design).unwrap();
    let receipt = c.toggle_completion(build).unwrap();

    assert_eq!(receipt.value.to, CompletionState::Complete);
    assert!(c.store().get(build).unwrap().completed);
}

#[test]
fn test_complete_before_dependency_is_refused() {
    let mut c = memory_controller();
    let design = add(&mut c, "Design", &[]);
    let build = add(&mut c, "Build", &[design]);

    let err = c.toggle_completion(build).unwrap_err();
    match &err {
        Error::DependencyBlocked {
            id,
            count,
            blockers,
        } => {
            assert_eq!(*id, build);
            assert_eq!(*count, 1);
            assert_eq!(blockers, &vec![design]);
        }
        other => panic!("expected DependencyBlocked, got {:?}", other),
    }
    assert!(err.user_message().contains("blocked by 1 unfinished task"));
    assert!(!c.store().get(build).unwrap().completed);
}

#[test]
fn test_mutual_dependency_soft_locks_until_delete() {
    let mut c = memory_controller();
    let first = add(&mut c, "First", &[]);
    let second = add(&mut c, "Second", &[first]);
    c.edit_task(first, TaskFields::new("First").depends_on([second]))
        .unwrap();

    for _ in 0..3 {
        assert!(matches!(
            c.toggle_completion(first),
            Err(Error::DependencyBlocked { .. })
        ));
        assert!(matches!(
            c.toggle_completion(second),
            Err(Error::DependencyBlocked { .. })
        ));
    }
    assert_eq!(c.cycles(), vec![vec![first, second]]);

    c.delete_task(second).unwrap();
    assert!(c.store().get(first).unwrap().depends_on.is_empty());
    assert!(c.toggle_completion(first).is_ok());
    assert!(c.cycles().is_empty());
}

#[test]
fn test_deleted_dependency_no_longer_blocks() {
    let mut c = memory_controller();
    let design = add(&mut c, "Design", &[]);
    let build = add(&mut c, "Build", &[design]);

    c.delete_task(design).unwrap();

    assert!(!c.store().get(build).unwrap().depends_on.contains(&design));
    assert!(c.toggle_completion(build).is_ok());
}

#[test]
fn test_editing_out_dependency_unblocks_immediately() {
    let mut c = memory_controller();
    let design = add(&mut c, "Design", &[]);
    let build = add(&mut c, "Build", &[design]);
    assert!(c.dependency_status(build).unwrap().blocked);

    let receipt = c.edit_task(build, TaskFields::new("Build")).unwrap();

    assert!(!receipt.reevaluated()[0].blocked);
    assert!(!c.store().get(design).unwrap().completed);
    assert!(c.toggle_completion(build).is_ok());
}

#[test]
fn test_reopening_dependency_reblocks_future_attempts_only() {
    let mut c = memory_controller();
    let ids = release_pipeline(&mut c);
    let (design, build, docs) = (ids[0], ids[1], ids[4]);

    c.toggle_completion(design).unwrap();
    c.toggle_completion(build).unwrap();

    // Reopen Design: Build stays completed; Docs becomes blocked again.
    let receipt = c.toggle_completion(design).unwrap();
    assert_eq!(receipt.value.to, CompletionState::Incomplete);
    assert!(c.store().get(build).unwrap().completed);
    let docs_status = receipt
        .reevaluated()
        .iter()
        .find(|s| s.id == docs)
        .unwrap();
    assert!(docs_status.blocked);

    // Build can be reopened, but not completed again until Design is.
    c.toggle_completion(build).unwrap();
    assert!(c.toggle_completion(build).is_err());
}

#[test]
fn test_blocker_count_matches_unmet_dependencies() {
    let mut c = memory_controller();
    let ids = release_pipeline(&mut c);
    let ship = ids[3];

    match c.toggle_completion(ship) {
        Err(Error::DependencyBlocked { count, blockers, .. }) => {
            assert_eq!(count, 2);
            assert_eq!(blockers, vec![ids[1], ids[2]]);
        }
        other => panic!("expected refusal, got {:?}", other),
    }
}

#[test]
fn test_operations_on_deleted_task_are_not_found() {
    let mut c = memory_controller();
    let id = add(&mut c, "Temporary", &[]);
    c.delete_task(id).unwrap();

    assert!(matches!(c.toggle_completion(id), Err(Error::NotFound(_))));
    assert!(matches!(
        c.edit_task(id, TaskFields::new("again")),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(c.delete_task(id), Err(Error::NotFound(_))));
    assert!(matches!(c.delete_task(TaskId(999)), Err(Error::NotFound(_))));
}

#[test]
fn test_progress_tracks_completion_and_clear() {
    let mut c = memory_controller();
    let ids = release_pipeline(&mut c);
    c.toggle_completion(ids[0]).unwrap();
    c.toggle_completion(ids[4]).unwrap();
    assert_eq!(c.progress().to_string(), "2 of 5 tasks completed");

    c.clear_completed().unwrap();
    assert_eq!(c.progress().to_string(), "0 of 3 tasks completed");
    assert!(!c.dependency_status(ids[1]).unwrap().blocked);
}
