//! Batch runs: score many repositories and windows from one file.
//!
//! A batch file is TOML with one `[[run]]` table per row:
//!
//! ```toml
//! [[run]]
//! repository = "https://github.com/owner/repo"
//! branch = "main"
//! from_date = "2024-01-01"
//! to_date = "2024-06-30"
//! clone_to = "/tmp/checkouts"
//! ground_truth = "truth/repo.csv"
//! ```
//!
//! A `.csv` batch file is also accepted, one row per run under a header
//! naming `github_url` (or `repository`), `from_date` and `to_date`, plus the
//! optional `branch`, `clone_to` and `ground_truth` columns.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::core::{progress, Error, Result};
use crate::eval::{evaluate_analysis, split_csv_line, EvaluationReport, GroundTruth, PredictionRule};
use crate::git::GitRepo;
use crate::risk::{Analysis, Analyzer};

/// Mine one repository and score it.
///
/// The window is validated before the repository is opened or cloned.
pub fn score_repository(run: &RunConfig, analyzer: &Analyzer) -> Result<Analysis> {
    let window = run.validate()?;
    let spinner = progress::create_spinner(&format!("Mining {} ({window})", run.repository));

    let result = GitRepo::for_run(run).and_then(|repo| {
        let history = repo.history(run.branch.as_deref())?;
        analyzer.analyze(&history, &window)
    });

    spinner.finish_and_clear();
    result
}

/// A parsed batch file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchFile {
    #[serde(default, rename = "run")]
    pub runs: Vec<BatchRow>,
}

/// One row of a batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub repository: String,
    #[serde(default)]
    pub branch: Option<String>,
    pub from_date: String,
    pub to_date: String,
    #[serde(default)]
    pub clone_to: Option<PathBuf>,
    #[serde(default)]
    pub ground_truth: Option<PathBuf>,
}

impl BatchRow {
    /// The run this row describes. `clone_to` falls back to `default_clone_to`.
    pub fn run_config(&self, default_clone_to: Option<&Path>) -> RunConfig {
        RunConfig {
            repository: self.repository.clone(),
            clone_to: self
                .clone_to
                .clone()
                .or_else(|| default_clone_to.map(Path::to_path_buf)),
            branch: self.branch.clone(),
            from_date: Some(self.from_date.clone()),
            to_date: Some(self.to_date.clone()),
        }
    }
}

impl BatchFile {
    /// Load a batch file. Relative `ground_truth` paths resolve against the
    /// batch file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let mut batch = if is_csv {
            Self::parse_csv(&content)?
        } else {
            Self::parse(&content)?
        };

        if let Some(dir) = path.parent() {
            for row in &mut batch.runs {
                if let Some(truth) = &row.ground_truth {
                    if truth.is_relative() {
                        row.ground_truth = Some(dir.join(truth));
                    }
                }
            }
        }
        Ok(batch)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse a CSV batch file. Columns are found by header name.
    pub fn parse_csv(content: &str) -> Result<Self> {
        let mut lines = content.lines();
        let Some(first) = lines.next() else {
            return Ok(Self::default());
        };

        let header = split_csv_line(first);
        let column = |names: &[&str]| header.iter().position(|h| names.contains(&h.as_str()));
        let require = |names: &[&str]| {
            column(names)
                .ok_or_else(|| Error::config(format!("batch CSV has no {} column", names[0])))
        };
        let repository = require(&["github_url", "repository"])?;
        let from_date = require(&["from_date"])?;
        let to_date = require(&["to_date"])?;
        let branch = column(&["branch"]);
        let clone_to = column(&["clone_to"]);
        let ground_truth = column(&["ground_truth"]);

        let mut runs = Vec::new();
        for (i, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields = split_csv_line(line);
            let field = |col: usize| fields.get(col).filter(|f| !f.is_empty()).cloned();
            let required = |col: usize, name: &str| {
                field(col)
                    .ok_or_else(|| Error::config(format!("batch CSV line {}: missing {name}", i + 2)))
            };

            runs.push(BatchRow {
                repository: required(repository, "github_url")?,
                branch: branch.and_then(field),
                from_date: required(from_date, "from_date")?,
                to_date: required(to_date, "to_date")?,
                clone_to: clone_to.and_then(field).map(PathBuf::from),
                ground_truth: ground_truth.and_then(field).map(PathBuf::from),
            });
        }
        Ok(Self { runs })
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Result of one batch row.
#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    /// 1-based row number.
    pub row: usize,
    pub repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RowOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub rows: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_success()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Runs batch rows one after another.
pub struct BatchRunner<'a> {
    analyzer: &'a Analyzer,
    rule: PredictionRule,
    default_clone_to: Option<PathBuf>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(analyzer: &'a Analyzer) -> Self {
        Self {
            analyzer,
            rule: PredictionRule::default(),
            default_clone_to: None,
        }
    }

    pub fn with_rule(mut self, rule: PredictionRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_default_clone_to(mut self, clone_to: Option<PathBuf>) -> Self {
        self.default_clone_to = clone_to;
        self
    }

    /// Run every row. A failing row is recorded and the batch moves on.
    pub fn run(&self, batch: &BatchFile) -> BatchReport {
        let start = Instant::now();
        let bar = progress::create_batch_progress(batch.len());
        let mut rows = Vec::with_capacity(batch.len());

        for (i, row) in batch.runs.iter().enumerate() {
            bar.set_message(row.repository.clone());
            let outcome = match self.run_row(row) {
                Ok((analysis, evaluation)) => RowOutcome {
                    row: i + 1,
                    repository: row.repository.clone(),
                    analysis: Some(analysis),
                    evaluation,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Batch row {} ({}) failed: {e}", i + 1, row.repository);
                    RowOutcome {
                        row: i + 1,
                        repository: row.repository.clone(),
                        analysis: None,
                        evaluation: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            rows.push(outcome);
            bar.inc(1);
        }
        bar.finish_and_clear();

        let report = BatchReport { rows };
        tracing::info!(
            "Batch completed in {:?}: {} rows, {} failed",
            start.elapsed(),
            report.rows.len(),
            report.failures()
        );
        report
    }

    fn run_row(&self, row: &BatchRow) -> Result<(Analysis, Option<EvaluationReport>)> {
        let run = row.run_config(self.default_clone_to.as_deref());
        // Load ground truth first so a bad path fails before any cloning.
        let truth = row.ground_truth.as_ref().map(GroundTruth::load).transpose()?;
        let analysis = score_repository(&run, self.analyzer)?;
        let evaluation = truth.map(|t| evaluate_analysis(&analysis, &t, &self.rule));
        Ok((analysis, evaluation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"
[[run]]
repository = "https://github.com/owner/one"
branch = "main"
from_date = "2024-01-01"
to_date = "2024-03-31"
ground_truth = "truth/one.csv"

[[run]]
repository = "/srv/repos/two"
from_date = "2023-06-01"
to_date = "2023-06-30"
clone_to = "/tmp/checkouts"
"#;

    #[test]
    fn test_parse_batch_file() {
        let batch = BatchFile::parse(BATCH).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.runs[0].branch.as_deref(), Some("main"));
        assert_eq!(batch.runs[1].branch, None);
        assert_eq!(batch.runs[1].clone_to, Some(PathBuf::from("/tmp/checkouts")));
    }

    #[test]
    fn test_parse_rejects_missing_dates() {
        let result = BatchFile::parse("[[run]]\nrepository = \"x\"\n");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_empty_batch_file() {
        assert!(BatchFile::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_load_resolves_ground_truth_relative_to_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("batch.toml");
        std::fs::write(&path, BATCH).unwrap();

        let batch = BatchFile::load(&path).unwrap();
        assert_eq!(batch.runs[0].ground_truth, Some(temp.path().join("truth/one.csv")));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            BatchFile::load("/nonexistent/batch.toml"),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_parse_csv_batch() {
        let csv = "github_url,branch,from_date,to_date\n\
                   https://github.com/owner/one,main,2024-01-01,2024-03-31\n\
                   \n\
                   /srv/repos/two,,2023-06-01,2023-06-30\n";
        let batch = BatchFile::parse_csv(csv).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.runs[0].repository, "https://github.com/owner/one");
        assert_eq!(batch.runs[0].branch.as_deref(), Some("main"));
        assert_eq!(batch.runs[0].to_date, "2024-03-31");
        assert_eq!(batch.runs[1].branch, None);
        assert_eq!(batch.runs[1].ground_truth, None);
    }

    #[test]
    fn test_parse_csv_requires_columns() {
        let result = BatchFile::parse_csv("github_url,branch,from_date\nx,main,2024-01-01\n");
        assert!(matches!(result, Err(Error::Config(_))));

        let result = BatchFile::parse_csv("repository,from_date,to_date\nx,2024-01-01\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_csv_by_extension() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("runs.csv");
        std::fs::write(
            &path,
            "repository,from_date,to_date,ground_truth\n/srv/a,2024-01-01,2024-01-31,truth/a.txt\n",
        )
        .unwrap();

        let batch = BatchFile::load(&path).unwrap();
        assert_eq!(batch.runs[0].repository, "/srv/a");
        assert_eq!(batch.runs[0].ground_truth, Some(temp.path().join("truth/a.txt")));
    }

    #[test]
    fn test_run_config_clone_to_fallback() {
        let batch = BatchFile::parse(BATCH).unwrap();
        let default = PathBuf::from("/var/cache/fixrisk");

        let first = batch.runs[0].run_config(Some(&default));
        assert_eq!(first.clone_to, Some(default.clone()));
        assert_eq!(first.from_date.as_deref(), Some("2024-01-01"));

        let second = batch.runs[1].run_config(Some(&default));
        assert_eq!(second.clone_to, Some(PathBuf::from("/tmp/checkouts")));
    }

    #[test]
    fn test_score_repository_rejects_bad_window_before_git() {
        let run = RunConfig {
            repository: "/nonexistent/repo".to_string(),
            from_date: Some("2024-13-01".to_string()),
            to_date: Some("2024-12-31".to_string()),
            ..Default::default()
        };
        let result = score_repository(&run, &Analyzer::new());
        assert!(matches!(result, Err(Error::InvalidDate { .. })));
    }

    #[test]
    fn test_failing_rows_do_not_stop_batch() {
        let batch = BatchFile::parse(
            r#"
[[run]]
repository = "/nonexistent/one"
from_date = "2024-01-01"
to_date = "2024-01-31"

[[run]]
repository = "/nonexistent/two"
from_date = "2024-02-01"
to_date = "2024-01-01"
"#,
        )
        .unwrap();
        let analyzer = Analyzer::new();
        let report = BatchRunner::new(&analyzer).run(&batch);

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.failures(), 2);
        assert!(!report.is_success());
        assert_eq!(report.rows[1].row, 2);
        assert!(report.rows[1].error.as_deref().unwrap().contains("Configuration"));
    }
}
