//! Workflow tests across planning, apply, catalog and restore
//!
//! Each test drives a [`SyncService`] the way a long-running caller would:
//! several runs against one workspace, then undo in reverse order.

use frt_core::{AutoConfirm, OperationType, RestoreState, SyncService, WorkspaceConfig};
use frt_test_utils::TestWorkspace;
use pretty_assertions::assert_eq;
use std::fs;

fn service_from_config_file(ws: &TestWorkspace) -> SyncService {
    let config = WorkspaceConfig::load(&ws.write_config()).unwrap();
    SyncService::new(config, Box::new(AutoConfirm(true)))
}

#[test]
fn test_layered_rules_then_reverse_restore() {
    let ws = TestWorkspace::new();
    ws.rule("", r#"{"strategyType":"FileName","patterns":["*.cfg"]}"#);
    ws.rule(
        "mods",
        r#"{"strategyType":"ContentUnit","patterns":["*.jar"],"excludePatterns":["*-dev*"]}"#,
    );
    ws.target_file("game.cfg", "difficulty=easy");
    ws.target_file("mods/alpha-1.0.jar", "alpha 1.0");
    ws.target_file("mods/beta-2.0.jar", "beta 2.0");
    let original = ws.target_snapshot();

    let mut service = service_from_config_file(&ws);

    // Run 1: config replace, alpha upgrade, new gamma, dev build ignored.
    ws.stage("game.cfg", "difficulty=hard");
    ws.stage("mods/alpha-1.1.jar", "alpha 1.1");
    ws.stage("mods/gamma-0.1.jar", "gamma 0.1");
    ws.stage("mods/delta-dev-1.jar", "dev build");
    let plan = service.plan_update(false).unwrap();
    assert_eq!(plan.count(OperationType::Replace), 2);
    assert_eq!(plan.count(OperationType::Add), 1);
    let first = service.apply(plan);
    assert!(first.success);
    let first_name = service.commit(&first).unwrap();

    ws.assert_target("game.cfg", "difficulty=hard");
    ws.assert_target("mods/alpha-1.0.jar", "alpha 1.1");
    ws.assert_target("mods/gamma-0.1.jar", "gamma 0.1");
    ws.assert_target_absent("mods/delta-dev-1.jar");
    let after_first = ws.target_snapshot();

    // Run 2: delete beta through the delete tree.
    ws.delete_rule("mods", r#"{"strategyType":"ContentUnit"}"#);
    ws.mark_deleted("mods/beta-9.9.jar");
    let second = service.apply(service.plan_delete().unwrap());
    assert_eq!(second.success_count, 1);
    let second_name = service.commit(&second).unwrap();
    ws.assert_target_absent("mods/beta-2.0.jar");

    let names: Vec<String> = service
        .list_entries()
        .unwrap()
        .entries
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&first_name) && names.contains(&second_name));

    let undo_second = service.restore_entry(&second_name).unwrap();
    assert_eq!(undo_second.state, RestoreState::Completed);
    assert_eq!(ws.target_snapshot(), after_first);

    let undo_first = service.restore_entry(&first_name).unwrap();
    assert_eq!(undo_first.state, RestoreState::Completed);
    assert_eq!(ws.target_snapshot(), original);
}

#[test]
fn test_restore_survives_a_new_service_instance() {
    let ws = TestWorkspace::new();
    ws.rule("", r#"{"strategyType":"FileName"}"#);
    ws.target_file("notes/readme.txt", "v1");
    ws.stage("notes/readme.txt", "v2");

    let name = {
        let mut service = service_from_config_file(&ws);
        let result = service.apply(service.plan_update(false).unwrap());
        service.commit(&result).unwrap()
    };
    ws.assert_target("notes/readme.txt", "v2");

    let mut service = service_from_config_file(&ws);
    let outcome = service.restore_entry(&name).unwrap();
    assert_eq!(outcome.state, RestoreState::Completed);
    assert_eq!(outcome.success_count, 1);
    ws.assert_target("notes/readme.txt", "v1");
}

#[test]
fn test_prune_run_removes_units_missing_from_staging() {
    let ws = TestWorkspace::new();
    ws.rule("", r#"{"strategyType":"ContentUnit"}"#);
    ws.target_file("keep-1.0.jar", "keep");
    ws.target_file("stale-3.2.jar", "stale");
    ws.stage("keep-1.0.jar", "keep");

    let mut service = service_from_config_file(&ws);
    let plan = service.plan_update(true).unwrap();
    assert_eq!(plan.count(OperationType::Delete), 1);
    assert_eq!(plan.count(OperationType::Replace), 0);

    let result = service.apply(plan);
    let name = service.commit(&result).unwrap();
    ws.assert_target_absent("stale-3.2.jar");
    ws.assert_target("keep-1.0.jar", "keep");

    service.restore_entry(&name).unwrap();
    ws.assert_target("stale-3.2.jar", "stale");
}

#[test]
fn test_catalog_entry_is_plain_camel_case_json() {
    let ws = TestWorkspace::new();
    ws.rule("", r#"{"strategyType":"FileName"}"#);
    ws.stage("a.txt", "a");

    let mut service = service_from_config_file(&ws);
    let result = service.apply(service.plan_update(false).unwrap());
    let name = service.commit(&result).unwrap();

    let path = ws.backup().join("record").join(format!("{name}.json"));
    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value["successCount"], 1);
    let record = &value["operationRecords"][0];
    assert_eq!(record["operationType"], "Add");
    assert_eq!(record["strategyType"], "FileName");
    assert!(record["sourceFileSign"].as_str().unwrap().starts_with("sha256:"));
}
