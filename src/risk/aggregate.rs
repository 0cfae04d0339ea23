//! Single-pass accumulation of per-file activity and per-developer profiles.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::classifier::FixClassifier;
use super::identity::RenameGraph;
use crate::core::ChangeFilter;
use crate::git::{ChangeKind, CommitRecord};

/// Accumulated history of one canonical file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileActivity {
    /// Eligible commits touching the file.
    pub modifications: u32,
    /// Fix commits touching the file.
    pub fix_touches: u32,
    pub lines_added: u64,
    pub lines_removed: u64,
    /// Timestamps of the fix commits that touched the file, in traversal order.
    pub fix_timestamps: Vec<i64>,
}

impl FileActivity {
    /// Total lines changed.
    pub fn churn(&self) -> u64 {
        self.lines_added + self.lines_removed
    }
}

/// What one author has done so far in the traversal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeveloperProfile {
    pub commits: u32,
    pub fix_commits: u32,
    /// Timestamp of the author's first commit in the window.
    pub first_commit: i64,
    /// Canonical ids the author modified.
    pub files: BTreeSet<String>,
}

impl DeveloperProfile {
    fn new(first_commit: i64) -> Self {
        Self {
            commits: 0,
            fix_commits: 0,
            first_commit,
            files: BTreeSet::new(),
        }
    }
}

/// Developer profiles keyed by author identity.
///
/// Built fresh for each run; a profile is only ever extended, never rewritten.
#[derive(Debug, Clone, Default)]
pub struct Developers {
    profiles: BTreeMap<String, DeveloperProfile>,
}

impl Developers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a commit by `author`, creating the profile on first sight.
    pub fn record_commit(&mut self, author: &str, timestamp: i64, is_fix: bool) -> &mut DeveloperProfile {
        let profile = self
            .profiles
            .entry(author.to_string())
            .or_insert_with(|| DeveloperProfile::new(timestamp));
        profile.commits += 1;
        if is_fix {
            profile.fix_commits += 1;
        }
        profile
    }

    pub fn get(&self, author: &str) -> Option<&DeveloperProfile> {
        self.profiles.get(author)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeveloperProfile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Result of the accumulation pass.
#[derive(Debug, Clone, Default)]
pub struct Activity {
    pub files: BTreeMap<String, FileActivity>,
    pub commits: usize,
    pub fix_commits: usize,
    /// Modify changes that passed the filter.
    pub eligible_changes: usize,
    /// Latest commit timestamp seen; `None` for an empty stream.
    pub reference_time: Option<i64>,
}

/// Walks a chronologically ordered commit list and accumulates activity.
pub struct ChangeAggregator<'a> {
    classifier: &'a FixClassifier,
    filter: &'a ChangeFilter,
    renames: &'a RenameGraph,
}

impl<'a> ChangeAggregator<'a> {
    pub fn new(classifier: &'a FixClassifier, filter: &'a ChangeFilter, renames: &'a RenameGraph) -> Self {
        Self {
            classifier,
            filter,
            renames,
        }
    }

    /// Accumulate `commits`, which must already be in chronological order.
    pub fn aggregate(&self, commits: &[CommitRecord], developers: &mut Developers) -> Activity {
        let mut activity = Activity::default();

        for commit in commits {
            let is_fix = self.classifier.is_fix(&commit.message);
            activity.commits += 1;
            if is_fix {
                activity.fix_commits += 1;
            }
            activity.reference_time = Some(
                activity
                    .reference_time
                    .map_or(commit.timestamp, |t| t.max(commit.timestamp)),
            );

            let profile = developers.record_commit(&commit.author, commit.timestamp, is_fix);

            // A file counts once per commit even if several paths resolve to it.
            let mut touched: BTreeMap<String, (u64, u64)> = BTreeMap::new();
            for change in &commit.changes {
                if change.kind != ChangeKind::Modify {
                    continue;
                }
                let Some(path) = change.new_path.as_deref() else {
                    continue;
                };
                if !self.filter.is_eligible(path) {
                    continue;
                }
                activity.eligible_changes += 1;
                let lines = touched.entry(self.renames.resolve(path)).or_default();
                lines.0 += u64::from(change.added);
                lines.1 += u64::from(change.removed);
            }

            for (id, (added, removed)) in touched {
                let file = activity.files.entry(id.clone()).or_default();
                file.modifications += 1;
                file.lines_added += added;
                file.lines_removed += removed;
                if is_fix {
                    file.fix_touches += 1;
                    file.fix_timestamps.push(commit.timestamp);
                }
                profile.files.insert(id);
            }
        }

        tracing::debug!(
            "Aggregated {} commits ({} fixes) into {} files",
            activity.commits,
            activity.fix_commits,
            activity.files.len()
        );
        activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::FileChange;

    const DAY: i64 = 86_400;

    fn commit(id: &str, author: &str, ts: i64, message: &str, changes: Vec<FileChange>) -> CommitRecord {
        CommitRecord {
            id: id.to_string(),
            author: author.to_string(),
            author_name: author.to_string(),
            timestamp: ts,
            message: message.to_string(),
            changes,
        }
    }

    fn run(commits: &[CommitRecord]) -> (Activity, Developers) {
        let classifier = FixClassifier::default();
        let filter = ChangeFilter::default();
        let renames = RenameGraph::from_commits(commits);
        let mut developers = Developers::new();
        let activity = ChangeAggregator::new(&classifier, &filter, &renames).aggregate(commits, &mut developers);
        (activity, developers)
    }

    #[test]
    fn test_rename_accumulates_on_final_path() {
        let commits = vec![
            commit("c1", "a@x.io", 0, "initial", vec![FileChange::modify("m.py", 10, 0)]),
            commit("c2", "b@x.io", 5 * DAY, "fix crash in m", vec![FileChange::modify("m.py", 2, 1)]),
            commit("c3", "a@x.io", 10 * DAY, "rename", vec![FileChange::rename("m.py", "n.py", 0, 0)]),
        ];
        let (activity, developers) = run(&commits);

        assert_eq!(activity.files.len(), 1);
        let n = &activity.files["n.py"];
        assert_eq!(n.modifications, 2);
        assert_eq!(n.fix_touches, 1);
        assert_eq!(n.churn(), 13);
        assert_eq!(n.fix_timestamps, vec![5 * DAY]);
        assert_eq!(activity.reference_time, Some(10 * DAY));
        assert_eq!(activity.commits, 3);
        assert_eq!(activity.fix_commits, 1);
        assert_eq!(activity.eligible_changes, 2);

        let a = developers.get("a@x.io").unwrap();
        assert_eq!(a.commits, 2);
        assert_eq!(a.first_commit, 0);
        assert!(a.files.contains("n.py"));
        let b = developers.get("b@x.io").unwrap();
        assert_eq!(b.fix_commits, 1);
        assert_eq!(b.first_commit, 5 * DAY);
    }

    #[test]
    fn test_rename_chain_accumulates_on_last_name() {
        let commits = vec![
            commit("c1", "a@x.io", 0, "fix parser", vec![FileChange::modify("a.py", 3, 1)]),
            commit("c2", "a@x.io", DAY, "move", vec![FileChange::rename("a.py", "b.py", 0, 0)]),
            commit("c3", "a@x.io", 2 * DAY, "move again", vec![FileChange::rename("b.py", "c.py", 0, 0)]),
            commit("c4", "a@x.io", 3 * DAY, "tune", vec![FileChange::modify("c.py", 2, 2)]),
        ];
        let (activity, _) = run(&commits);

        assert_eq!(activity.files.keys().collect::<Vec<_>>(), vec!["c.py"]);
        let c = &activity.files["c.py"];
        assert_eq!(c.modifications, 2);
        assert_eq!(c.fix_touches, 1);
        assert_eq!(c.churn(), 8);
        assert!(!activity.files.contains_key("a.py"));
        assert!(!activity.files.contains_key("b.py"));
    }

    #[test]
    fn test_rename_back_keeps_edits_on_original_name() {
        let commits = vec![
            commit("c1", "a@x.io", 0, "edit", vec![FileChange::modify("a.py", 1, 0)]),
            commit("c2", "a@x.io", DAY, "move", vec![FileChange::rename("a.py", "b.py", 0, 0)]),
            commit("c3", "a@x.io", 2 * DAY, "edit", vec![FileChange::modify("b.py", 1, 0)]),
            commit("c4", "a@x.io", 3 * DAY, "move back", vec![FileChange::rename("b.py", "a.py", 0, 0)]),
            commit("c5", "a@x.io", 4 * DAY, "edit", vec![FileChange::modify("a.py", 1, 0)]),
        ];
        let (activity, _) = run(&commits);

        assert_eq!(activity.files["a.py"].modifications, 2);
        assert_eq!(activity.files["b.py"].modifications, 1);
    }

    #[test]
    fn test_test_only_fix_contributes_nothing() {
        let commits = vec![commit(
            "c1",
            "a@x.io",
            0,
            "hotfix",
            vec![FileChange::modify("tests/test_x.py", 4, 4)],
        )];
        let (activity, developers) = run(&commits);

        assert!(activity.files.is_empty());
        assert_eq!(activity.fix_commits, 1);
        assert_eq!(developers.get("a@x.io").unwrap().fix_commits, 1);
        assert!(developers.get("a@x.io").unwrap().files.is_empty());
    }

    #[test]
    fn test_only_modifications_count() {
        let commits = vec![commit(
            "c1",
            "a@x.io",
            0,
            "fix things",
            vec![
                FileChange::add("new.py", 20),
                FileChange::delete("old.py", 5),
                FileChange::modify("kept.py", 1, 1),
                FileChange::modify("README.md", 3, 0),
            ],
        )];
        let (activity, _) = run(&commits);

        assert_eq!(activity.files.keys().collect::<Vec<_>>(), vec!["kept.py"]);
        assert_eq!(activity.eligible_changes, 1);
    }

    #[test]
    fn test_every_file_of_a_commit_contributes() {
        let commits = vec![commit(
            "c1",
            "a@x.io",
            0,
            "fix both",
            vec![FileChange::modify("a.rs", 1, 0), FileChange::modify("b.rs", 0, 1)],
        )];
        let (activity, _) = run(&commits);
        assert_eq!(activity.files["a.rs"].fix_touches, 1);
        assert_eq!(activity.files["b.rs"].fix_touches, 1);
    }

    #[test]
    fn test_paths_merging_in_one_commit_count_once() {
        let commits = vec![
            commit("c1", "a@x.io", 0, "fix", vec![
                FileChange::modify("a.go", 1, 0),
                FileChange::modify("b.go", 2, 0),
            ]),
            commit("c2", "a@x.io", DAY, "merge files", vec![FileChange::rename("a.go", "b.go", 0, 0)]),
        ];
        let (activity, _) = run(&commits);
        let b = &activity.files["b.go"];
        assert_eq!(b.modifications, 1);
        assert_eq!(b.fix_touches, 1);
        assert_eq!(b.churn(), 3);
        assert_eq!(activity.eligible_changes, 2);
    }

    #[test]
    fn test_empty_stream() {
        let (activity, developers) = run(&[]);
        assert!(activity.files.is_empty());
        assert_eq!(activity.reference_time, None);
        assert!(developers.is_empty());
    }
}
