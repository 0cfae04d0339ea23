//! Ignore filter deciding which changed paths may carry a risk signal.

use std::collections::HashSet;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use super::{Error, Language, Result};
use crate::config::FilterConfig;

/// Decides whether a path is an eligible source file.
///
/// A path passes when it is written in an accepted language, is not a test
/// file (unless test exclusion is turned off), and matches no exclude glob.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    /// Accepted languages; `None` accepts every known language.
    languages: Option<HashSet<Language>>,
    exclude: GlobSet,
    exclude_tests: bool,
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self {
            languages: None,
            exclude: GlobSet::empty(),
            exclude_tests: true,
        }
    }
}

impl ChangeFilter {
    /// Build a filter from configuration.
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::config(format!("invalid exclude pattern '{pattern}': {e}")))?;
            builder.add(glob);
        }
        let exclude = builder
            .build()
            .map_err(|e| Error::config(format!("invalid exclude patterns: {e}")))?;

        let languages = if config.languages.is_empty() {
            None
        } else {
            Some(config.languages.iter().copied().collect())
        };

        Ok(Self {
            languages,
            exclude,
            exclude_tests: config.exclude_tests,
        })
    }

    /// Restrict the filter to the given languages.
    pub fn with_languages(mut self, languages: impl IntoIterator<Item = Language>) -> Self {
        self.languages = Some(languages.into_iter().collect());
        self
    }

    /// True when a change to `path` may contribute to a file's signals.
    pub fn is_eligible(&self, path: &str) -> bool {
        let Some(lang) = Language::detect(Path::new(path)) else {
            return false;
        };
        if let Some(accepted) = &self.languages {
            if !accepted.contains(&lang) {
                return false;
            }
        }
        if self.exclude_tests && is_test_file(path) {
            return false;
        }
        !self.exclude.is_match(path)
    }
}

/// Test file heuristics shared across ecosystems.
pub fn is_test_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    let parts: Vec<&str> = lower.split('/').collect();

    // Directory-based patterns
    for (idx, part) in parts.iter().enumerate() {
        if idx + 1 == parts.len() {
            break;
        }
        match *part {
            "test" | "tests" | "spec" | "specs" | "__tests__" | "__mocks__" | "testdata"
            | "fixtures" => return true,
            _ => {}
        }
    }

    let Some(filename) = parts.last() else {
        return false;
    };

    // _test.go, _spec.rb
    if filename.contains("_test.") || filename.contains("_spec.") {
        return true;
    }
    // test_*.py, conftest.py
    if filename.starts_with("test_") || *filename == "conftest.py" {
        return true;
    }
    // *.test.ts, *.spec.js
    let dot_parts: Vec<&str> = filename.split('.').collect();
    if dot_parts.len() >= 3 {
        let second_last = dot_parts[dot_parts.len() - 2];
        if second_last == "test" || second_last == "spec" {
            return true;
        }
    }

    false
}
