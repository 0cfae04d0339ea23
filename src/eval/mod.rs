//! Ground-truth evaluation of risk predictions.
//!
//! Compares the files an analysis flags against a list of files known to
//! have been fixed, and reports precision, recall and F1.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::core::{Error, Result};
use crate::risk::{basename, Analysis, KeyMode};

/// Column holding file paths in CSV ground-truth files.
pub const GROUND_TRUTH_COLUMN: &str = "modified_files";

/// Files known to be defective.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroundTruth {
    files: BTreeSet<String>,
}

impl GroundTruth {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(Into::into)
                .filter(|f: &String| !f.is_empty())
                .collect(),
        }
    }

    /// Load ground truth from a file.
    ///
    /// A first line naming a `modified_files` column marks a CSV file; any
    /// other file is read as one path per line, skipping blanks and `#`
    /// comments.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::GroundTruth(format!("{}: {e}", path.display())))
    }

    /// Parse ground-truth content.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let mut lines = content.lines();
        let Some(first) = lines.next() else {
            return Ok(Self::default());
        };

        let header = split_csv_line(first);
        match header.iter().position(|h| h == GROUND_TRUTH_COLUMN) {
            Some(column) => {
                let mut files = BTreeSet::new();
                for (i, line) in lines.enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let fields = split_csv_line(line);
                    let field = fields
                        .get(column)
                        .ok_or_else(|| format!("line {}: missing {GROUND_TRUTH_COLUMN} column", i + 2))?;
                    if !field.is_empty() {
                        files.insert(field.clone());
                    }
                }
                Ok(Self { files })
            }
            None => Ok(Self::new(
                content
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .map(str::to_string),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    /// Ground truth in the key space of `mode`.
    pub fn keyed(&self, mode: KeyMode) -> BTreeSet<String> {
        match mode {
            KeyMode::Path => self.files.clone(),
            KeyMode::Basename => self.files.iter().map(|f| basename(f).to_string()).collect(),
        }
    }
}

/// Split one CSV line, honouring double-quoted fields.
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

/// Which scored files count as predicted defective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionRule {
    /// Only keys scoring strictly above this are predicted.
    pub min_score: f64,
    /// Keep at most this many of the highest-ranked keys.
    pub top: Option<usize>,
}

impl Default for PredictionRule {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            top: None,
        }
    }
}

impl PredictionRule {
    /// Predicted keys of an analysis.
    pub fn predict(&self, analysis: &Analysis) -> BTreeSet<String> {
        let above = analysis
            .ranking
            .iter()
            .filter(|r| r.score > self.min_score)
            .map(|r| r.key.clone());
        match self.top {
            Some(n) => above.take(n).collect(),
            None => above.collect(),
        }
    }
}

/// Outcome of comparing predictions with ground truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub ground_truth_total: usize,
    pub predicted_total: usize,
    pub true_positives: Vec<String>,
    pub false_positives: Vec<String>,
    pub false_negatives: Vec<String>,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Compare a predicted key set with the ground truth key set.
pub fn evaluate(predicted: &BTreeSet<String>, truth: &BTreeSet<String>) -> EvaluationReport {
    let true_positives: Vec<String> = predicted.intersection(truth).cloned().collect();
    let false_positives: Vec<String> = predicted.difference(truth).cloned().collect();
    let false_negatives: Vec<String> = truth.difference(predicted).cloned().collect();

    let tp = true_positives.len() as f64;
    let precision = ratio(tp, tp + false_positives.len() as f64);
    let recall = ratio(tp, tp + false_negatives.len() as f64);
    let f1 = ratio(2.0 * precision * recall, precision + recall);

    EvaluationReport {
        ground_truth_total: truth.len(),
        predicted_total: predicted.len(),
        true_positives,
        false_positives,
        false_negatives,
        precision,
        recall,
        f1,
    }
}

/// Evaluate an analysis against ground truth in the analysis key mode.
pub fn evaluate_analysis(analysis: &Analysis, truth: &GroundTruth, rule: &PredictionRule) -> EvaluationReport {
    evaluate(&rule.predict(analysis), &truth.keyed(analysis.key_mode))
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
