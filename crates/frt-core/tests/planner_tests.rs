//! Traversal-order and inheritance tests for the planner

use frt_core::{AutoConfirm, NameVersionInspector, NodeKind, OperationType, Planner};
use frt_test_utils::TestWorkspace;
use frt_test_utils::tree::write_file;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn plan(ws: &TestWorkspace, allowed: &[OperationType]) -> frt_core::Plan {
    Planner::new()
        .plan(
            &ws.staging(),
            &ws.target(),
            allowed,
            &AutoConfirm(true),
            &NameVersionInspector,
        )
        .unwrap()
}

fn added(plan: &frt_core::Plan) -> Vec<String> {
    plan.records
        .iter()
        .filter(|r| r.operation_type == OperationType::Add)
        .map(|r| {
            r.source_path
                .strip_prefix(plan.source_root.as_path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_inherited_rule_reaches_grandchildren() {
    let ws = TestWorkspace::new();
    ws.rule("a", r#"{"strategyType":"FileName","patterns":["*.txt"],"inheritToSubfolders":true}"#);
    ws.stage("a/one.txt", "1");
    ws.stage("a/b/two.txt", "2");
    ws.stage("a/b/c/three.txt", "3");
    ws.stage("a/b/skip.bin", "x");

    let plan = plan(&ws, &[OperationType::Add]);
    assert_eq!(added(&plan), vec!["a/one.txt", "a/b/two.txt", "a/b/c/three.txt"]);
}

#[test]
fn test_broken_chain_is_not_regained() {
    let ws = TestWorkspace::new();
    ws.rule("a", r#"{"strategyType":"FileName","inheritToSubfolders":true}"#);
    ws.rule("a/b", r#"{"strategyType":"FileName","inheritToSubfolders":false}"#);
    ws.stage("a/b/in-b.txt", "b");
    ws.stage("a/b/c/in-c.txt", "c");

    let plan = plan(&ws, &[OperationType::Add]);
    assert_eq!(added(&plan), vec!["a/b/in-b.txt"]);
}

#[test]
fn test_non_inheriting_rule_still_governs_own_files() {
    let ws = TestWorkspace::new();
    ws.rule("", r#"{"strategyType":"FileName"}"#);
    ws.stage("top.txt", "t");
    ws.stage("sub/nested.txt", "n");

    let plan = plan(&ws, &[OperationType::Add]);
    assert_eq!(added(&plan), vec!["top.txt"]);
}

#[test]
fn test_declined_confirmation_skips_record() {
    let ws = TestWorkspace::new();
    ws.rule("", r#"{"strategyType":"FileName","confirmBeforeApply":true}"#);
    ws.stage("ask.txt", "?");

    let plan = Planner::new()
        .plan(
            &ws.staging(),
            &ws.target(),
            &[OperationType::Add],
            &AutoConfirm(false),
            &NameVersionInspector,
        )
        .unwrap();
    assert!(plan.records.is_empty());
    assert_eq!(plan.skips.len(), 1);
}

fn tree_paths() -> impl Strategy<Value = Vec<String>> {
    let dirs = prop::collection::vec(prop::sample::select(vec!["da", "db", "dc"]), 0..3);
    let file = prop::sample::select(vec!["f0.txt", "f1.txt", "f2.txt"]);
    prop::collection::vec((dirs, file), 1..12).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(dirs, file)| {
                let mut segments: Vec<&str> = dirs;
                segments.push(file);
                segments.join("/")
            })
            .collect()
    })
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_every_node_visited_once_files_first(paths in tree_paths()) {
        let ws = TestWorkspace::new();
        let mut expected: BTreeSet<String> = BTreeSet::new();
        expected.insert(String::new());
        for path in &paths {
            write_file(&ws.staging(), path, "x");
            let mut current = path.as_str();
            while !current.is_empty() {
                expected.insert(current.to_string());
                current = parent_of(current);
            }
        }

        let plan = plan(&ws, &[OperationType::Add]);
        let visited: Vec<&str> = plan.visited.iter().map(|v| v.path.as_str()).collect();
        let unique: BTreeSet<String> = visited.iter().map(|s| s.to_string()).collect();

        prop_assert_eq!(visited.len(), unique.len());
        prop_assert_eq!(unique, expected);

        for (i, a) in plan.visited.iter().enumerate() {
            for b in &plan.visited[i + 1..] {
                let siblings = !a.path.is_empty() && parent_of(&a.path) == parent_of(&b.path);
                if siblings {
                    prop_assert!(
                        !(a.kind == NodeKind::Folder && b.kind == NodeKind::File),
                        "folder {} visited before file {}", a.path, b.path
                    );
                }
            }
        }
    }
}
