//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Language, Result, Window};
use crate::risk::KeyMode;

/// Default fix vocabulary, matched as case-insensitive substrings.
pub const DEFAULT_FIX_KEYWORDS: &[&str] = &[
    "fix",
    "bug",
    "defect",
    "error",
    "crash",
    "regression",
    "hotfix",
    "patch",
    "fault",
    "failure",
    "issue",
    "mistake",
    "incorrect",
    "repair",
    "resolve",
];

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository and window to score.
    pub run: RunConfig,
    /// Which changed paths are eligible.
    pub filter: FilterConfig,
    /// Fix commit vocabulary.
    pub classifier: ClassifierConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Env vars with `FIXRISK_` prefix
    /// override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("FIXRISK_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Load configuration from a directory, looking for `fixrisk.toml` or
    /// `.fixrisk/fixrisk.toml`.
    ///
    /// Missing files are skipped and defaults used.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("fixrisk.toml")))
            .merge(Toml::file(dir.join(".fixrisk/fixrisk.toml")))
            .merge(Env::prefixed("FIXRISK_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))
    }

    /// Default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// The repository, branch and window of one scoring run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// URL or local path of the repository.
    pub repository: String,
    /// Checkout destination when `repository` is remote.
    pub clone_to: Option<PathBuf>,
    /// Branch to walk; the current HEAD when unset.
    pub branch: Option<String>,
    /// First day of the window, `YYYY-MM-DD`.
    pub from_date: Option<String>,
    /// Last day of the window, `YYYY-MM-DD`.
    pub to_date: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repository: ".".to_string(),
            clone_to: None,
            branch: None,
            from_date: None,
            to_date: None,
        }
    }
}

impl RunConfig {
    /// Parse the window, failing before any repository access.
    pub fn window(&self) -> Result<Window> {
        let from = self
            .from_date
            .as_deref()
            .ok_or_else(|| Error::config("missing from_date"))?;
        let to = self
            .to_date
            .as_deref()
            .ok_or_else(|| Error::config("missing to_date"))?;
        Window::parse(from, to)
    }

    /// Check required fields and the window together.
    pub fn validate(&self) -> Result<Window> {
        if self.repository.trim().is_empty() {
            return Err(Error::config("missing repository"));
        }
        if let Some(branch) = &self.branch {
            if branch.trim().is_empty() {
                return Err(Error::config("branch must not be empty"));
            }
        }
        self.window()
    }
}

/// Filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Accepted languages; empty accepts every known source language.
    pub languages: Vec<Language>,
    /// Exclude patterns (glob).
    pub exclude: Vec<String>,
    /// Drop test files.
    pub exclude_tests: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            exclude: Vec::new(),
            exclude_tests: true,
        }
    }
}

/// Fix classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base vocabulary.
    pub keywords: Vec<String>,
    /// Terms appended to `keywords`.
    pub extra_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_FIX_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            extra_keywords: Vec::new(),
        }
    }
}

impl ClassifierConfig {
    /// Combined vocabulary, blank terms removed.
    pub fn vocabulary(&self) -> Vec<String> {
        self.keywords
            .iter()
            .chain(self.extra_keywords.iter())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format.
    pub format: OutputFormat,
    /// How files are keyed in the score mapping.
    pub key: KeyMode,
    /// Limit the ranking to the first N files.
    pub top: Option<usize>,
    /// Color output.
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            key: KeyMode::Path,
            top: None,
            color: true,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON format.
    Json,
    /// Markdown format.
    Markdown,
}
