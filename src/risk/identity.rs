//! File identity across renames.
//!
//! Every rename seen in the window is an edge `old -> new`. A path's
//! canonical identity is the end of the chain of edges leaving it, so a file
//! modified under an old name and later renamed accumulates under its final
//! name. The graph must hold every rename of the window before `resolve` is
//! meaningful.

use std::collections::{HashMap, HashSet};

use crate::git::{ChangeKind, CommitRecord};

/// Directed rename graph over path strings.
#[derive(Debug, Clone, Default)]
pub struct RenameGraph {
    edges: HashMap<String, String>,
}

impl RenameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from every rename in `commits`, in order.
    pub fn from_commits(commits: &[CommitRecord]) -> Self {
        let mut graph = Self::new();
        for commit in commits {
            for change in &commit.changes {
                if change.kind != ChangeKind::Rename {
                    continue;
                }
                if let (Some(old), Some(new)) = (&change.old_path, &change.new_path) {
                    graph.record_rename(old, new);
                }
            }
        }
        graph
    }

    /// Record one rename. A later rename of the same path replaces the earlier edge.
    pub fn record_rename(&mut self, old_path: &str, new_path: &str) {
        if old_path == new_path {
            return;
        }
        self.edges.insert(old_path.to_string(), new_path.to_string());
    }

    /// Number of recorded edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Follow renames from `path` to its canonical identity.
    ///
    /// Stops at a path with no outgoing edge. On a cycle, returns the first
    /// path reached a second time.
    pub fn resolve(&self, path: &str) -> String {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = path;
        visited.insert(current);

        while let Some(next) = self.edges.get(current) {
            let revisited = !visited.insert(next.as_str());
            current = next;
            if revisited {
                break;
            }
        }

        current.to_string()
    }
}
