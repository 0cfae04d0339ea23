//! Per-file risk signals derived from aggregated activity.
//!
//! Each calculator is a pure function of the accumulation pass. Files a
//! calculator does not mention read as zero.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::aggregate::{Activity, Developers};

const SECONDS_PER_DAY: i64 = 86_400;

/// The risk signals, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    RecencyFix,
    FixFrequency,
    ModFrequency,
    Churn,
    DevInexperience,
}

impl Signal {
    pub const ALL: [Signal; 5] = [
        Signal::RecencyFix,
        Signal::FixFrequency,
        Signal::ModFrequency,
        Signal::Churn,
        Signal::DevInexperience,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::RecencyFix => "recency_fix",
            Signal::FixFrequency => "fix_frequency",
            Signal::ModFrequency => "mod_frequency",
            Signal::Churn => "churn",
            Signal::DevInexperience => "dev_inexperience",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signal values of one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSignals {
    pub recency_fix: f64,
    pub fix_frequency: f64,
    pub mod_frequency: f64,
    pub churn: f64,
    pub dev_inexperience: f64,
}

impl FileSignals {
    pub fn get(&self, signal: Signal) -> f64 {
        match signal {
            Signal::RecencyFix => self.recency_fix,
            Signal::FixFrequency => self.fix_frequency,
            Signal::ModFrequency => self.mod_frequency,
            Signal::Churn => self.churn,
            Signal::DevInexperience => self.dev_inexperience,
        }
    }

    fn set(&mut self, signal: Signal, value: f64) {
        match signal {
            Signal::RecencyFix => self.recency_fix = value,
            Signal::FixFrequency => self.fix_frequency = value,
            Signal::ModFrequency => self.mod_frequency = value,
            Signal::Churn => self.churn = value,
            Signal::DevInexperience => self.dev_inexperience = value,
        }
    }
}

/// Whole days from `earlier` to `current`, floored and never negative.
pub fn days_between(current: i64, earlier: i64) -> i64 {
    (current - earlier).max(0) / SECONDS_PER_DAY
}

/// Sum of `1 / log2(2 + days)` over the fix commits touching each file.
pub fn recency_fix(activity: &Activity, current: i64) -> BTreeMap<String, f64> {
    activity
        .files
        .iter()
        .filter(|(_, file)| !file.fix_timestamps.is_empty())
        .map(|(id, file)| {
            let score = file
                .fix_timestamps
                .iter()
                .map(|&ts| 1.0 / (2.0 + days_between(current, ts) as f64).log2())
                .sum();
            (id.clone(), score)
        })
        .collect()
}

/// Number of fix commits touching each file.
pub fn fix_frequency(activity: &Activity) -> BTreeMap<String, f64> {
    activity
        .files
        .iter()
        .filter(|(_, file)| file.fix_touches > 0)
        .map(|(id, file)| (id.clone(), f64::from(file.fix_touches)))
        .collect()
}

/// Number of eligible commits touching each file.
pub fn mod_frequency(activity: &Activity) -> BTreeMap<String, f64> {
    activity
        .files
        .iter()
        .map(|(id, file)| (id.clone(), f64::from(file.modifications)))
        .collect()
}

/// Lines added plus lines removed.
pub fn churn(activity: &Activity) -> BTreeMap<String, f64> {
    activity
        .files
        .iter()
        .map(|(id, file)| (id.clone(), file.churn() as f64))
        .collect()
}

/// Sum over the developers who touched each file of `1 / (1 + days since
/// their first commit)`. Newcomers weigh close to one, veterans close to zero.
pub fn dev_inexperience(developers: &Developers, current: i64) -> BTreeMap<String, f64> {
    let mut scores: BTreeMap<String, f64> = BTreeMap::new();
    for (_, profile) in developers.iter() {
        let term = 1.0 / (1.0 + days_between(current, profile.first_commit) as f64);
        for id in &profile.files {
            *scores.entry(id.clone()).or_insert(0.0) += term;
        }
    }
    scores
}

/// Every signal for every file with activity.
pub fn compute(activity: &Activity, developers: &Developers) -> BTreeMap<String, FileSignals> {
    let Some(current) = activity.reference_time else {
        return BTreeMap::new();
    };

    let mut signals: BTreeMap<String, FileSignals> = activity
        .files
        .keys()
        .map(|id| (id.clone(), FileSignals::default()))
        .collect();

    let calculated = [
        (Signal::RecencyFix, recency_fix(activity, current)),
        (Signal::FixFrequency, fix_frequency(activity)),
        (Signal::ModFrequency, mod_frequency(activity)),
        (Signal::Churn, churn(activity)),
        (Signal::DevInexperience, dev_inexperience(developers, current)),
    ];

    for (signal, values) in calculated {
        for (id, value) in values {
            if let Some(entry) = signals.get_mut(&id) {
                entry.set(signal, value);
            }
        }
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChangeFilter;
    use crate::git::{CommitRecord, FileChange};
    use crate::risk::aggregate::ChangeAggregator;
    use crate::risk::classifier::FixClassifier;
    use crate::risk::identity::RenameGraph;

    const DAY: i64 = SECONDS_PER_DAY;

    fn commit(author: &str, ts: i64, message: &str, changes: Vec<FileChange>) -> CommitRecord {
        CommitRecord {
            id: format!("{author}-{ts}"),
            author: author.to_string(),
            author_name: author.to_string(),
            timestamp: ts,
            message: message.to_string(),
            changes,
        }
    }

    fn signals_for(commits: &[CommitRecord]) -> BTreeMap<String, FileSignals> {
        let classifier = FixClassifier::default();
        let filter = ChangeFilter::default();
        let renames = RenameGraph::from_commits(commits);
        let mut developers = Developers::new();
        let activity = ChangeAggregator::new(&classifier, &filter, &renames).aggregate(commits, &mut developers);
        compute(&activity, &developers)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(10 * DAY, 5 * DAY), 5);
        assert_eq!(days_between(10 * DAY, 10 * DAY - 1), 0);
        assert_eq!(days_between(DAY + DAY / 2, 0), 1);
        assert_eq!(days_between(0, DAY), 0);
    }

    #[test]
    fn test_three_commit_rename_scenario() {
        let commits = vec![
            commit("a@x.io", 0, "initial", vec![FileChange::modify("m.py", 10, 0)]),
            commit("a@x.io", 5 * DAY, "fix crash in m", vec![FileChange::modify("m.py", 2, 1)]),
            commit("a@x.io", 10 * DAY, "rename", vec![FileChange::rename("m.py", "n.py", 0, 0)]),
        ];
        let signals = signals_for(&commits);

        assert_eq!(signals.len(), 1);
        let n = signals["n.py"];
        assert_close(n.mod_frequency, 2.0);
        assert_close(n.fix_frequency, 1.0);
        assert_close(n.churn, 13.0);
        assert_close(n.recency_fix, 1.0 / 7f64.log2());
        assert_close(n.dev_inexperience, 1.0 / 11.0);
    }

    #[test]
    fn test_refactor_only_has_no_fix_signals() {
        let commits = vec![commit("a@x.io", 0, "refactor", vec![FileChange::modify("lib.rs", 4, 2)])];
        let signals = signals_for(&commits);

        let lib = signals["lib.rs"];
        assert_eq!(lib.recency_fix, 0.0);
        assert_eq!(lib.fix_frequency, 0.0);
        assert_close(lib.mod_frequency, 1.0);
        assert_close(lib.churn, 6.0);
        assert_close(lib.dev_inexperience, 1.0);
    }

    #[test]
    fn test_fix_on_reference_day_scores_one() {
        let commits = vec![commit("a@x.io", 3 * DAY, "fix", vec![FileChange::modify("a.go", 1, 1)])];
        let signals = signals_for(&commits);
        assert_close(signals["a.go"].recency_fix, 1.0);
    }

    #[test]
    fn test_dev_inexperience_sums_over_developers() {
        let commits = vec![
            commit("old@x.io", 0, "start", vec![FileChange::modify("x.ts", 1, 0)]),
            commit("new@x.io", 9 * DAY, "tweak", vec![FileChange::modify("x.ts", 1, 0)]),
        ];
        let signals = signals_for(&commits);
        assert_close(signals["x.ts"].dev_inexperience, 1.0 / 10.0 + 1.0);
    }

    #[test]
    fn test_get_matches_fields() {
        let s = FileSignals {
            recency_fix: 1.0,
            fix_frequency: 2.0,
            mod_frequency: 3.0,
            churn: 4.0,
            dev_inexperience: 5.0,
        };
        let values: Vec<f64> = Signal::ALL.iter().map(|&sig| s.get(sig)).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(Signal::DevInexperience.to_string(), "dev_inexperience");
    }

    #[test]
    fn test_empty_activity() {
        let signals = compute(&Activity::default(), &Developers::new());
        assert!(signals.is_empty());
    }
}
