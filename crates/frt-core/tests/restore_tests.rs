//! Restore failure handling and compensating rollback

use frt_core::{Prompt, RestoreState, SyncService, WorkspaceConfig};
use frt_test_utils::TestWorkspace;
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;

/// Three applied replacements: a, b and c, each "<x>1" -> "<x>2".
fn three_replacements(ws: &TestWorkspace) {
    ws.rule("", r#"{"strategyType":"FileName"}"#);
    for name in ["a", "b", "c"] {
        ws.stage(&format!("{name}.txt"), format!("{name}2"));
        ws.target_file(&format!("{name}.txt"), format!("{name}1"));
    }
}

fn service_answering(ws: &TestWorkspace, retry: bool, rollback: bool) -> SyncService {
    let confirm = move |prompt: &Prompt<'_>| match prompt {
        Prompt::Apply { .. } => true,
        Prompt::RetryUndo { .. } => retry,
        Prompt::Rollback { .. } => rollback,
    };
    SyncService::new(WorkspaceConfig::rooted_at(ws.root()), Box::new(confirm))
}

#[test]
fn test_rollback_reverts_completed_undo() {
    let ws = TestWorkspace::new();
    three_replacements(&ws);
    let mut service = service_answering(&ws, false, true);
    let result = service.apply(service.plan_update(false).unwrap());
    assert_eq!(result.success_count, 3);

    // Undo runs c, b, a: losing b's backup fails the second step.
    let b_backup = result.operation_records[1].target_file_sign.clone().unwrap();
    assert!(service.store().remove(&b_backup).unwrap());
    let blobs_before = service.store().digests();
    let before = ws.target_snapshot();

    let restored = service.restore(&result);

    assert_eq!(restored.state, RestoreState::RolledBack);
    assert_eq!(restored.success_count, 1);
    assert_eq!(restored.failure_count, 1);
    assert_eq!(restored.rollback_count, 1);
    assert!(restored.partial_restore);
    assert_eq!(ws.target_snapshot(), before);
    ws.assert_target("c.txt", "c2");
    assert_eq!(service.store().digests(), blobs_before);
}

#[test]
fn test_declined_rollback_leaves_partial_restore() {
    let ws = TestWorkspace::new();
    three_replacements(&ws);
    let mut service = service_answering(&ws, false, false);
    let result = service.apply(service.plan_update(false).unwrap());

    let b_backup = result.operation_records[1].target_file_sign.clone().unwrap();
    service.store().remove(&b_backup).unwrap();

    let restored = service.restore(&result);
    assert_eq!(restored.state, RestoreState::LeftInconsistent);
    assert_eq!(restored.rollback_count, 0);
    ws.assert_target("c.txt", "c1");
    ws.assert_target("b.txt", "b2");
    ws.assert_target("a.txt", "a2");
}

#[test]
fn test_retry_after_repair_completes() {
    let ws = TestWorkspace::new();
    three_replacements(&ws);

    let attempts = Rc::new(Cell::new(0));
    let counter = Rc::clone(&attempts);
    let blocker = ws.target().join("b.txt");
    let in_the_way = blocker.clone();
    let confirm = move |prompt: &Prompt<'_>| {
        if let Prompt::RetryUndo { .. } = prompt {
            counter.set(counter.get() + 1);
            // Clear the obstruction before agreeing to retry.
            std::fs::remove_dir_all(&in_the_way).unwrap();
        }
        true
    };
    let mut service = SyncService::new(WorkspaceConfig::rooted_at(ws.root()), Box::new(confirm));
    let result = service.apply(service.plan_update(false).unwrap());

    std::fs::remove_file(&blocker).unwrap();
    std::fs::create_dir_all(blocker.join("nested")).unwrap();

    let restored = service.restore(&result);
    assert_eq!(attempts.get(), 1);
    assert_eq!(restored.state, RestoreState::Completed);
    assert_eq!(restored.success_count, 3);
    assert_eq!(restored.failure_count, 0);
    ws.assert_target("a.txt", "a1");
    ws.assert_target("b.txt", "b1");
    ws.assert_target("c.txt", "c1");
}
