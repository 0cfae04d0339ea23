//! Weighted scoring and report keys.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::signals::{FileSignals, Signal};
use super::weights::Weights;
use crate::core::{Error, Result};

/// Decimal places kept in reported scores.
pub const SCORE_PRECISION: i32 = 4;

/// How files are keyed in the score mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// Canonical repository-relative path.
    #[default]
    Path,
    /// File name only; files sharing a name are summed.
    Basename,
}

impl KeyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyMode::Path => "path",
            KeyMode::Basename => "basename",
        }
    }

    /// Report key of a canonical path under this mode.
    pub fn key(&self, path: &str) -> String {
        match self {
            KeyMode::Path => path.to_string(),
            KeyMode::Basename => basename(path).to_string(),
        }
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "path" => Ok(KeyMode::Path),
            "basename" => Ok(KeyMode::Basename),
            _ => Err(Error::config(format!("unknown key mode: {s}"))),
        }
    }
}

/// Last path segment.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Round to [`SCORE_PRECISION`] decimal places.
pub fn round_score(value: f64) -> f64 {
    let factor = 10f64.powi(SCORE_PRECISION);
    (value * factor).round() / factor
}

/// Unrounded weighted sum of a file's signals.
pub fn raw_score(signals: &FileSignals, weights: &Weights) -> f64 {
    Signal::ALL
        .iter()
        .map(|&signal| weights.get(signal) * signals.get(signal))
        .sum()
}

/// Rounded score per report key. Keys that collide are summed before rounding.
pub fn score_files(
    files: &BTreeMap<String, FileSignals>,
    weights: &Weights,
    mode: KeyMode,
) -> BTreeMap<String, f64> {
    let mut raw: BTreeMap<String, f64> = BTreeMap::new();
    for (path, signals) in files {
        *raw.entry(mode.key(path)).or_insert(0.0) += raw_score(signals, weights);
    }
    raw.into_iter()
        .map(|(key, score)| (key, round_score(score)))
        .collect()
}

/// One entry of the ranked score list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFile {
    pub key: String,
    pub score: f64,
}

/// Scores sorted descending, ties broken by key.
pub fn rank(scores: &BTreeMap<String, f64>) -> Vec<RankedFile> {
    let mut ranked: Vec<RankedFile> = scores
        .iter()
        .map(|(key, &score)| RankedFile {
            key: key.clone(),
            score,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(&b.key))
    });
    ranked
}
