//! Commit DAG for one repository with scratch weights for traversal passes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Which edges a traversal follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards parents (older commits)
    Up,
    /// Towards children (newer commits)
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryNode {
    pub sha: String,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub is_start_of_branch: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Scratch value for the current pass; never persisted
    #[serde(skip)]
    pub weight: i64,
}

impl HistoryNode {
    pub fn new(sha: impl Into<String>, parents: Vec<String>) -> Self {
        Self {
            sha: sha.into(),
            parents,
            branch: String::new(),
            is_start_of_branch: false,
            tags: Vec::new(),
            weight: 0,
        }
    }
}

/// sha -> node, iterated in sha order.
///
/// A parent sha missing from the map marks the edge of the known history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryTree {
    nodes: BTreeMap<String, HistoryNode>,
}

impl HistoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: HistoryNode) {
        self.nodes.insert(node.sha.clone(), node);
    }

    #[must_use]
    pub fn get(&self, sha: &str) -> Option<&HistoryNode> {
        self.nodes.get(sha)
    }

    pub fn get_mut(&mut self, sha: &str) -> Option<&mut HistoryNode> {
        self.nodes.get_mut(sha)
    }

    #[must_use]
    pub fn contains(&self, sha: &str) -> bool {
        self.nodes.contains_key(sha)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &HistoryNode> {
        self.nodes.values()
    }

    /// Nodes that are nobody's parent, in sha order
    #[must_use]
    pub fn leaves(&self) -> Vec<String> {
        let referenced: BTreeSet<&str> = self
            .nodes
            .values()
            .flat_map(|n| n.parents.iter().map(String::as_str))
            .collect();
        self.nodes
            .keys()
            .filter(|sha| !referenced.contains(sha.as_str()))
            .cloned()
            .collect()
    }

    /// Neighbours of `sha` inside the tree, in sha order
    #[must_use]
    pub fn neighbors(&self, sha: &str, direction: Direction) -> Vec<String> {
        let mut out: Vec<String> = match direction {
            Direction::Up => self
                .nodes
                .get(sha)
                .map(|n| {
                    n.parents
                        .iter()
                        .filter(|p| self.nodes.contains_key(p.as_str()))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            Direction::Down => self
                .nodes
                .values()
                .filter(|n| n.parents.iter().any(|p| p == sha))
                .map(|n| n.sha.clone())
                .collect(),
        };
        out.sort();
        out.dedup();
        out
    }

    /// Nodes within `depth` steps of `roots`, with only the edges between kept nodes.
    ///
    /// Roots absent from the tree are ignored. A depth of zero keeps just the roots.
    #[must_use]
    pub fn generate_subtree(&self, roots: &[String], direction: Direction, depth: usize) -> Self {
        let mut included: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<(String, usize)> = VecDeque::new();
        for root in roots {
            if self.contains(root) && included.insert(root.clone()) {
                queue.push_back((root.clone(), 0));
            }
        }
        while let Some((sha, distance)) = queue.pop_front() {
            if distance >= depth {
                continue;
            }
            for next in self.neighbors(&sha, direction) {
                if included.insert(next.clone()) {
                    queue.push_back((next, distance + 1));
                }
            }
        }

        let mut sub = Self::new();
        for sha in &included {
            if let Some(node) = self.nodes.get(sha) {
                let mut node = node.clone();
                node.parents.retain(|p| included.contains(p));
                sub.insert(node);
            }
        }
        sub
    }

    /// Walk from `start`, calling `visit(node, weight)` on each arrival.
    ///
    /// `visit` returns whether to continue past this node and the weight it settled on;
    /// neighbours are then visited with that weight plus one. Order is depth-first with
    /// neighbours taken in sha order, so repeated runs produce identical weights.
    pub fn traverse_from<F>(&mut self, start: &str, direction: Direction, initial_weight: i64, mut visit: F)
    where
        F: FnMut(&mut HistoryNode, i64) -> (bool, i64),
    {
        let mut stack: Vec<(String, i64)> = vec![(start.to_string(), initial_weight)];
        while let Some((sha, weight)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&sha) else {
                continue;
            };
            let (descend, settled) = visit(node, weight);
            if !descend {
                continue;
            }
            let next = self.neighbors(&sha, direction);
            for neighbor in next.into_iter().rev() {
                stack.push((neighbor, settled + 1));
            }
        }
    }

    /// Longest-path distance from `start`, written into each node's weight.
    ///
    /// Weights only grow, so call [`reset_all_weights`](Self::reset_all_weights) with a
    /// value below `seed` first. Returns the largest weight assigned.
    pub fn calculate_heights(&mut self, start: &str, direction: Direction, seed: i64) -> i64 {
        let mut max = i64::MIN;
        self.traverse_from(start, direction, seed, |node, weight| {
            if weight > node.weight {
                node.weight = weight;
                max = max.max(weight);
                (true, weight)
            } else {
                (false, weight)
            }
        });
        max
    }

    pub fn reset_all_weights(&mut self, value: i64) {
        for node in self.nodes_mut() {
            node.weight = value;
        }
    }

    /// Flip the weight scale so that `max` becomes 0
    pub fn reverse_weights(&mut self, max: i64) {
        for node in self.nodes_mut() {
            node.weight = max - node.weight;
        }
    }

    fn nodes_mut(&mut self) -> impl Iterator<Item = &mut HistoryNode> {
        self.nodes.values_mut()
    }
}
