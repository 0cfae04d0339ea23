//! Defect-fix commit classification from commit messages.

use regex::{Regex, RegexBuilder};

use crate::config::DEFAULT_FIX_KEYWORDS;
use crate::core::{Error, Result};

/// Case-insensitive substring match against a fix vocabulary.
///
/// Substring semantics are deliberate: "fixes", "bugfix" and "hotfix" all
/// match, and so does "prefix". Precision is tuned through the vocabulary.
#[derive(Debug, Clone)]
pub struct FixClassifier {
    /// `None` when the vocabulary is empty; nothing is a fix then.
    pattern: Option<Regex>,
}

impl Default for FixClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_FIX_KEYWORDS.iter().copied()).expect("valid regex")
    }
}

impl FixClassifier {
    /// Build a classifier from a vocabulary of terms.
    pub fn new<I, S>(vocabulary: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = vocabulary
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(&t))
            .collect();

        if terms.is_empty() {
            return Ok(Self { pattern: None });
        }

        let pattern = RegexBuilder::new(&terms.join("|"))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::config(format!("invalid fix vocabulary: {e}")))?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Does the message indicate a defect fix?
    pub fn is_fix(&self, message: &str) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(message))
    }
}
