//! Visualization graph for a history tree.

use super::tree::{Direction, HistoryTree};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::utils::short_sha;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

const LANE_WIDTH: i64 = 200;
const ROW_HEIGHT: i64 = 150;
const GRID_GAP: i64 = 200;
const GRID_COLUMN_WIDTH: i64 = 150;
const GRID_ROW_HEIGHT: i64 = 100;

/// Whether a commit already has a recorded scan
pub trait ScanPresence: Sync {
    fn scan_exists(&self, sha: &str) -> Result<bool>;
}

/// [`ScanPresence`] backed by the ledger's scan documents
pub struct RecordedScans<'a> {
    ledger: &'a Ledger,
    full_name: &'a str,
}

impl<'a> RecordedScans<'a> {
    pub fn new(ledger: &'a Ledger, full_name: &'a str) -> Self {
        Self { ledger, full_name }
    }
}

impl ScanPresence for RecordedScans<'_> {
    fn scan_exists(&self, sha: &str) -> Result<bool> {
        self.ledger.scan_exists(self.full_name, sha)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeGroup {
    /// A scan exists for the commit
    Good,
    /// No scan, or the lookup failed
    Bad,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "labelSecondary")]
    pub label_secondary: String,
    pub group: NodeGroup,
    pub x: i64,
    pub y: i64,
}

/// Edge from a parent to its child
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub from: String,
    pub to: String,
    pub arrows: String,
}

impl LayoutEdge {
    fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            arrows: "to".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

/// Lay out the most recent `depth` generations of `tree`.
///
/// Commits in the leaves-rooted subtree are placed in one lane per branch, oldest at the
/// bottom. Tagged commits that fall outside the subtree are stacked in a square grid to
/// the right of the lanes, without edges.
pub fn layout(tree: &HistoryTree, depth: usize, presence: &dyn ScanPresence) -> Layout {
    let leaves = tree.leaves();
    let mut sub = tree.generate_subtree(&leaves, Direction::Up, depth);

    let mut edges: BTreeSet<LayoutEdge> = BTreeSet::new();
    sub.reset_all_weights(0);
    for root in &leaves {
        sub.traverse_from(root, Direction::Up, 1, |node, weight| {
            if node.weight == weight {
                return (false, weight);
            }
            node.weight = weight;
            for parent in &node.parents {
                edges.insert(LayoutEdge::new(parent, &node.sha));
            }
            (true, weight)
        });
    }

    sub.reset_all_weights(-1);
    let max = leaves
        .iter()
        .map(|leaf| sub.calculate_heights(leaf, Direction::Up, 0))
        .max()
        .unwrap_or(0)
        .max(0);
    sub.reverse_weights(max);

    let mut placed: Vec<_> = sub.nodes().collect();
    placed.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.sha.cmp(&b.sha)));

    let mut lanes: HashMap<&str, i64> = HashMap::new();
    let mut max_x = 0;
    let mut nodes: Vec<LayoutNode> = Vec::with_capacity(placed.len());
    for node in placed {
        let next_lane = lanes.len() as i64;
        let lane = *lanes.entry(node.branch.as_str()).or_insert(next_lane);
        let x = lane * LANE_WIDTH;
        max_x = max_x.max(x);

        let mut secondary: Vec<&str> = Vec::new();
        if node.is_start_of_branch && !node.branch.is_empty() {
            secondary.push(&node.branch);
        }
        secondary.extend(node.tags.iter().map(String::as_str));

        nodes.push(LayoutNode {
            id: node.sha.clone(),
            label: short_sha(&node.sha).to_string(),
            label_secondary: secondary.join("\n"),
            group: NodeGroup::Bad,
            x,
            y: node.weight * -ROW_HEIGHT,
        });
    }

    let outside: Vec<_> = tree
        .nodes()
        .filter(|n| !n.tags.is_empty() && !sub.contains(&n.sha))
        .collect();
    if !outside.is_empty() {
        let square = (outside.len() as f64).sqrt().ceil() as usize;
        let mut level = max;
        for (i, node) in outside.iter().enumerate() {
            if i % square == 0 {
                level = max;
            } else {
                level -= 1;
            }
            nodes.push(LayoutNode {
                id: node.sha.clone(),
                label: short_sha(&node.sha).to_string(),
                label_secondary: node.tags.join("\n"),
                group: NodeGroup::Bad,
                x: max_x + GRID_GAP + (i / square) as i64 * GRID_COLUMN_WIDTH,
                y: level * -GRID_ROW_HEIGHT,
            });
        }
    }

    let scanned: Vec<bool> = nodes
        .par_iter()
        .map(|node| match presence.scan_exists(&node.id) {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(sha = %node.id, error = %e, "scan lookup failed during layout");
                false
            }
        })
        .collect();
    for (node, found) in nodes.iter_mut().zip(scanned) {
        node.group = if found { NodeGroup::Good } else { NodeGroup::Bad };
    }

    tracing::debug!(nodes = nodes.len(), edges = edges.len(), depth, "history layout built");
    Layout {
        nodes,
        edges: edges.into_iter().collect(),
    }
}
