//! Defect-risk scoring from commit history.
//!
//! Files that were fixed often and recently, churned heavily, and touched by
//! developers new to the repository are the likeliest to need the next fix.
//!
//! # Pipeline
//!
//! 1. Restrict the commit stream to the window and sort it by time.
//! 2. Pass 1 builds the rename graph from every rename in the window.
//! 3. Pass 2 accumulates per-file activity under canonical ids, plus
//!    developer profiles.
//! 4. Five signals are derived per file: recency of fixes, fix frequency,
//!    modification frequency, churn and developer inexperience.
//! 5. Each signal is weighted by its share of the total variance and the
//!    weighted sum, rounded to four places, is the file's score.

mod aggregate;
mod classifier;
mod identity;
mod score;
mod signals;
mod weights;

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::config::Config;
use crate::core::{ChangeFilter, Result, Window};
use crate::git::{ChangeKind, CommitRecord, CommitSource};

pub use aggregate::{Activity, ChangeAggregator, DeveloperProfile, Developers, FileActivity};
pub use classifier::FixClassifier;
pub use identity::RenameGraph;
pub use score::{basename, rank, raw_score, round_score, score_files, KeyMode, RankedFile, SCORE_PRECISION};
pub use signals::{days_between, FileSignals, Signal};
pub use weights::{population_variance, SignalWeight, Weights};

/// Risk scoring engine.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    classifier: FixClassifier,
    filter: ChangeFilter,
    key_mode: KeyMode,
}

impl Analyzer {
    /// Create an analyzer with the default vocabulary and filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            classifier: FixClassifier::new(config.classifier.vocabulary())?,
            filter: ChangeFilter::from_config(&config.filter)?,
            key_mode: config.output.key,
        })
    }

    pub fn with_classifier(mut self, classifier: FixClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_filter(mut self, filter: ChangeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    pub fn key_mode(&self) -> KeyMode {
        self.key_mode
    }

    /// Score every file with activity in `window`.
    pub fn analyze<S>(&self, source: &S, window: &Window) -> Result<Analysis>
    where
        S: CommitSource + ?Sized,
    {
        let start = Instant::now();
        let commits = source.commits(window)?;
        let analysis = self.analyze_commits(commits, window);

        tracing::info!(
            "Risk analysis completed in {:?}: {} files from {} commits",
            start.elapsed(),
            analysis.files.len(),
            analysis.summary.commits_scanned
        );

        Ok(analysis)
    }

    /// Score an already materialized commit list.
    pub fn analyze_commits(&self, commits: Vec<CommitRecord>, window: &Window) -> Analysis {
        let history = History::new(commits, window);

        let renames = RenameGraph::from_commits(history.commits());
        tracing::debug!("Rename graph: {} edges", renames.len());

        let mut developers = Developers::new();
        let activity = ChangeAggregator::new(&self.classifier, &self.filter, &renames)
            .aggregate(history.commits(), &mut developers);

        let signals = signals::compute(&activity, &developers);
        let weights = Weights::from_signals(&signals);
        let scores = score_files(&signals, &weights, self.key_mode);

        let mut files: Vec<FileScore> = signals
            .iter()
            .map(|(path, file_signals)| FileScore {
                path: path.clone(),
                key: self.key_mode.key(path),
                score: round_score(raw_score(file_signals, &weights)),
                signals: *file_signals,
            })
            .collect();
        files.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.path.cmp(&b.path))
        });

        let summary = Summary {
            commits_scanned: activity.commits,
            fix_commits: activity.fix_commits,
            eligible_changes: activity.eligible_changes,
            files_scored: files.len(),
            developers: developers.len(),
            renames: renames.len(),
        };

        Analysis {
            generated_at: Utc::now(),
            window: *window,
            reference_time: activity.reference_time.and_then(to_datetime),
            key_mode: self.key_mode,
            ranking: rank(&scores),
            scores,
            files,
            weights,
            summary,
        }
    }

    /// Fix commits in `window` with the canonical ids of their eligible files.
    pub fn fix_commits<S>(&self, source: &S, window: &Window) -> Result<Vec<FixCommit>>
    where
        S: CommitSource + ?Sized,
    {
        let history = History::new(source.commits(window)?, window);
        let renames = RenameGraph::from_commits(history.commits());

        let fixes = history
            .commits()
            .iter()
            .filter(|c| self.classifier.is_fix(&c.message))
            .map(|c| {
                let mut files: Vec<String> = c
                    .changes
                    .iter()
                    .filter(|change| change.kind == ChangeKind::Modify)
                    .filter_map(|change| change.new_path.as_deref())
                    .filter(|path| self.filter.is_eligible(path))
                    .map(|path| renames.resolve(path))
                    .collect();
                files.sort();
                files.dedup();
                FixCommit {
                    id: c.id.clone(),
                    author: c.author.clone(),
                    timestamp: to_datetime(c.timestamp),
                    summary: c.message.lines().next().unwrap_or("").to_string(),
                    files,
                }
            })
            .collect();

        Ok(fixes)
    }
}

/// The window's commits, materialized once so both passes see the same
/// sequence.
struct History {
    commits: Vec<CommitRecord>,
}

impl History {
    fn new(mut commits: Vec<CommitRecord>, window: &Window) -> Self {
        commits.retain(|c| window.contains(c.timestamp));
        // Stable: commits sharing a timestamp keep the source order.
        commits.sort_by_key(|c| c.timestamp);
        Self { commits }
    }

    fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }
}

fn to_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(timestamp, 0).single()
}

/// Risk analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub generated_at: DateTime<Utc>,
    pub window: Window,
    /// Latest commit time in the window; ages are measured from here.
    pub reference_time: Option<DateTime<Utc>>,
    pub key_mode: KeyMode,
    /// Rounded score per report key.
    pub scores: BTreeMap<String, f64>,
    /// `scores` sorted by score descending, then key.
    pub ranking: Vec<RankedFile>,
    /// Per canonical file detail, sorted like `ranking`.
    pub files: Vec<FileScore>,
    pub weights: Weights,
    pub summary: Summary,
}

impl Analysis {
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// The `n` highest-ranked entries, or all of them.
    pub fn top(&self, n: Option<usize>) -> &[RankedFile] {
        match n {
            Some(n) => &self.ranking[..n.min(self.ranking.len())],
            None => &self.ranking,
        }
    }

    /// Keep only the `n` highest-ranked keys and the files behind them.
    pub fn limit(&mut self, n: usize) {
        self.ranking.truncate(n);
        let kept: std::collections::BTreeSet<&str> =
            self.ranking.iter().map(|r| r.key.as_str()).collect();
        self.scores.retain(|key, _| kept.contains(key.as_str()));
        self.files.retain(|f| kept.contains(f.key.as_str()));
    }
}

/// Score and signals of one canonical file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileScore {
    pub path: String,
    /// Report key under the analysis key mode.
    pub key: String,
    pub score: f64,
    pub signals: FileSignals,
}

/// Counts describing a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub commits_scanned: usize,
    pub fix_commits: usize,
    pub eligible_changes: usize,
    pub files_scored: usize,
    pub developers: usize,
    pub renames: usize,
}

/// A commit classified as a defect fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixCommit {
    pub id: String,
    pub author: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// First line of the message.
    pub summary: String,
    pub files: Vec<String>,
}
