//! History tree integration tests: building, persisting, layout and backfill planning.

use chrono::Utc;
use dep_ledger::history::{
    layout, load_history, plan_backfill, update_history, CommitInfo, HistorySnapshot, HistoryTree,
    NodeGroup, RecordedScans,
};
use dep_ledger::ledger::Ledger;
use dep_ledger::model::Scan;
use dep_ledger::store::{DocumentStore, MemoryStore};
use std::collections::BTreeMap;
use std::sync::Arc;

const REPO: &str = "acme/api";

/// c1 <- c2 <- c3   (main, default)
///         \ f1     (feature)
fn snapshot() -> HistorySnapshot {
    let commit = |sha: &str, parents: &[&str]| {
        CommitInfo::new(sha, parents.iter().map(|p| p.to_string()).collect())
    };
    HistorySnapshot {
        commits: vec![
            commit("c3", &["c2"]),
            commit("f1", &["c2"]),
            commit("c2", &["c1"]),
            commit("c1", &[]),
        ],
        branch_heads: BTreeMap::from([
            ("feature".to_string(), "f1".to_string()),
            ("main".to_string(), "c3".to_string()),
        ]),
        default_branch: Some("main".to_string()),
        tags: BTreeMap::from([
            ("c1".to_string(), vec!["v0.1".to_string()]),
            ("c3".to_string(), vec!["v1.0".to_string(), "v1.0".to_string()]),
        ]),
    }
}

fn tree() -> HistoryTree {
    let snap = snapshot();
    HistoryTree::from_commits(
        &snap.commits,
        &snap.branch_heads,
        snap.default_branch.as_deref(),
        &snap.tags,
    )
}

fn record_empty_scan(ledger: &Ledger, sha: &str) {
    let scan = Scan {
        repo_full_name: REPO.to_string(),
        sha: sha.to_string(),
        refs: vec![],
        dependencies: vec![],
        issues: vec![],
        files_scanned: vec![],
        timestamp: Utc::now(),
    };
    ledger.record_scan(&scan, "refs/heads/main", &[]).unwrap();
}

// ============================================================================
// Building
// ============================================================================

mod building {
    use super::*;

    #[test]
    fn branches_claim_first_parent_chains() {
        let tree = tree();
        assert_eq!(tree.len(), 4);
        for sha in ["c1", "c2", "c3"] {
            assert_eq!(tree.get(sha).unwrap().branch, "main", "{sha}");
        }
        assert_eq!(tree.get("f1").unwrap().branch, "feature");

        assert!(tree.get("c1").unwrap().is_start_of_branch);
        assert!(tree.get("f1").unwrap().is_start_of_branch);
        assert!(!tree.get("c2").unwrap().is_start_of_branch);
        assert_eq!(tree.get("c3").unwrap().tags, vec!["v1.0"]);
    }

    #[test]
    fn leaves_are_branch_tips() {
        assert_eq!(tree().leaves(), vec!["c3", "f1"]);
    }
}

// ============================================================================
// Persistence
// ============================================================================

mod persistence {
    use super::*;

    #[test]
    fn update_merges_new_commits_and_tags() {
        let store = MemoryStore::new();
        assert!(update_history(&store, REPO, &snapshot()).unwrap());

        let mut next = snapshot();
        next.commits.insert(0, CommitInfo::new("c4", vec!["c3".to_string()]));
        next.branch_heads.insert("main".to_string(), "c4".to_string());
        next.tags.insert("c3".to_string(), vec!["v1.0".to_string(), "v1.0.1".to_string()]);
        next.default_branch = None;
        assert!(update_history(&store, REPO, &next).unwrap());
        assert!(!update_history(&store, REPO, &next).unwrap());

        let doc = load_history(&store, REPO).unwrap().expect("history stored");
        assert_eq!(doc.repository, REPO);
        assert_eq!(doc.default_branch.as_deref(), Some("main"));
        assert_eq!(doc.tree.len(), 5);
        assert_eq!(doc.tree.get("c4").unwrap().branch, "main");
        assert_eq!(doc.tree.get("c3").unwrap().tags, vec!["v1.0", "v1.0.1"]);
    }
}

// ============================================================================
// Layout
// ============================================================================

mod graph_layout {
    use super::*;

    #[test]
    fn full_depth_places_branches_in_lanes() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let ledger = Ledger::new(store);
        record_empty_scan(&ledger, "c3");

        let graph = layout(&tree(), 10, &RecordedScans::new(&ledger, REPO));
        let positions: Vec<(&str, i64, i64)> = graph
            .nodes
            .iter()
            .map(|n| (n.id.as_str(), n.x, n.y))
            .collect();
        assert_eq!(
            positions,
            vec![("c1", 0, 0), ("c2", 0, -150), ("c3", 0, -300), ("f1", 200, -300)]
        );

        let c1 = &graph.nodes[0];
        assert_eq!(c1.label_secondary, "main\nv0.1");
        assert_eq!(graph.nodes[3].label_secondary, "feature");
        assert_eq!(graph.nodes[2].group, NodeGroup::Good);
        assert_eq!(c1.group, NodeGroup::Bad);

        let edges: Vec<(&str, &str)> = graph
            .edges
            .iter()
            .map(|e| (e.from.as_str(), e.to.as_str()))
            .collect();
        assert_eq!(edges, vec![("c1", "c2"), ("c2", "c3"), ("c2", "f1")]);
    }

    #[test]
    fn shallow_depth_moves_old_tags_to_grid() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let ledger = Ledger::new(store);

        let graph = layout(&tree(), 1, &RecordedScans::new(&ledger, REPO));
        assert_eq!(graph.nodes.len(), 4);
        let c1 = graph.nodes.iter().find(|n| n.id == "c1").unwrap();
        assert_eq!((c1.x, c1.y), (400, -100));
        assert_eq!(c1.label_secondary, "v0.1");
        assert!(graph.edges.iter().all(|e| e.from != "c1"));
    }

    #[test]
    fn layout_serializes_for_the_graph_viewer() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let ledger = Ledger::new(store);
        let graph = layout(&tree(), 10, &RecordedScans::new(&ledger, REPO));
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"][0]["labelSecondary"], "main\nv0.1");
        assert_eq!(json["nodes"][0]["group"], "bad");
        assert_eq!(json["edges"][0]["arrows"], "to");
    }
}

// ============================================================================
// Backfill
// ============================================================================

mod backfill {
    use super::*;

    #[test]
    fn plans_only_unrecorded_tagged_commits() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let ledger = Ledger::new(store);
        record_empty_scan(&ledger, "c3");
        let record = ledger.load_repository(REPO).unwrap();

        let tasks = plan_backfill(REPO, &tree(), record.as_ref());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].after_sha, "c1");
        assert_eq!(tasks[0].ref_name, "refs/tags/v0.1");
        assert_eq!(tasks[0].repository_full_name, REPO);
    }

    #[test]
    fn without_a_record_every_tagged_commit_is_planned() {
        let tasks = plan_backfill(REPO, &tree(), None);
        let shas: Vec<_> = tasks.iter().map(|t| t.after_sha.as_str()).collect();
        assert_eq!(shas, vec!["c1", "c3"]);
    }
}
