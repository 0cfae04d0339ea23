//! Commit listing with per-file change kinds and line counts.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result, Window};

const RECORD_SEP: char = '\u{1e}';
const FIELD_SEP: char = '\u{1f}';

/// One historical commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit SHA.
    pub id: String,
    /// Author identity (email).
    pub author: String,
    /// Author display name.
    pub author_name: String,
    /// Author timestamp, unix seconds.
    pub timestamp: i64,
    /// Full commit message.
    pub message: String,
    /// Files changed in this commit, in diff order.
    pub changes: Vec<FileChange>,
}

/// A file change in a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    /// Lines added.
    pub added: u32,
    /// Lines removed.
    pub removed: u32,
}

impl FileChange {
    /// A content modification of `path`.
    pub fn modify(path: impl Into<String>, added: u32, removed: u32) -> Self {
        let path = path.into();
        Self {
            kind: ChangeKind::Modify,
            old_path: Some(path.clone()),
            new_path: Some(path),
            added,
            removed,
        }
    }

    /// A newly added file.
    pub fn add(path: impl Into<String>, added: u32) -> Self {
        Self {
            kind: ChangeKind::Add,
            old_path: None,
            new_path: Some(path.into()),
            added,
            removed: 0,
        }
    }

    /// A deleted file.
    pub fn delete(path: impl Into<String>, removed: u32) -> Self {
        Self {
            kind: ChangeKind::Delete,
            old_path: Some(path.into()),
            new_path: None,
            added: 0,
            removed,
        }
    }

    /// A rename from `old` to `new`.
    pub fn rename(old: impl Into<String>, new: impl Into<String>, added: u32, removed: u32) -> Self {
        Self {
            kind: ChangeKind::Rename,
            old_path: Some(old.into()),
            new_path: Some(new.into()),
            added,
            removed,
        }
    }

    /// The path the change leaves behind, falling back to the old path.
    pub fn path(&self) -> Option<&str> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }
}

/// Type of file change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
    Rename,
    Other,
}

impl ChangeKind {
    /// Map a `git log --raw` status to a change kind.
    pub fn from_status(status: &str) -> Self {
        match status.chars().next() {
            Some('A') => Self::Add,
            Some('M') => Self::Modify,
            Some('D') => Self::Delete,
            Some('R') => Self::Rename,
            _ => Self::Other,
        }
    }
}

/// List non-merge commits reachable from `revision` inside `window`, oldest first.
pub fn get_log(root: &Path, revision: &str, window: &Window) -> Result<Vec<CommitRecord>> {
    // %x1e / %x1f render as RECORD_SEP / FIELD_SEP.
    let format = "--format=%x1e%H%x1f%ae%x1f%an%x1f%at%x1f%B%x1f";
    let output = Command::new("git")
        .args(["-c", "core.quotePath=false", "log"])
        .args(["--reverse", "--no-merges", "--no-color", "-M", "--raw", "--numstat"])
        .arg(format)
        .arg(format!("--since={}", window.since_arg()))
        .arg(format!("--until={}", window.until_arg()))
        .arg(revision)
        .arg("--")
        .current_dir(root)
        .output()
        .map_err(|e| Error::git(format!("Failed to run git log: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::git(format!(
            "git log {revision} failed: {}",
            stderr.trim()
        )));
    }

    Ok(parse_log(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse the output of [`get_log`]'s git invocation.
pub fn parse_log(output: &str) -> Vec<CommitRecord> {
    output
        .split(RECORD_SEP)
        .filter(|chunk| !chunk.trim().is_empty())
        .filter_map(|chunk| {
            let record = parse_record(chunk);
            if record.is_none() {
                tracing::warn!("Skipping malformed git log record");
            }
            record
        })
        .collect()
}

fn parse_record(chunk: &str) -> Option<CommitRecord> {
    let mut fields = chunk.splitn(6, FIELD_SEP);
    let id = fields.next()?.trim().to_string();
    let author = fields.next()?.to_string();
    let author_name = fields.next()?.to_string();
    let timestamp = fields.next()?.trim().parse::<i64>().ok()?;
    let message = fields.next()?.trim().to_string();
    let diff = fields.next().unwrap_or("");

    if id.is_empty() {
        return None;
    }

    let mut raw = Vec::new();
    let mut numstat = Vec::new();
    for line in diff.lines() {
        if line.is_empty() {
            continue;
        }
        if line.starts_with(':') {
            if let Some(change) = parse_raw_line(line) {
                raw.push(change);
            }
        } else if let Some(counts) = parse_numstat_line(line) {
            numstat.push(counts);
        }
    }

    if !numstat.is_empty() && numstat.len() != raw.len() {
        tracing::warn!(
            "Commit {id}: {} raw entries but {} numstat entries",
            raw.len(),
            numstat.len()
        );
    }

    let changes = raw
        .into_iter()
        .enumerate()
        .map(|(i, mut change)| {
            if let Some((added, removed)) = numstat.get(i) {
                change.added = *added;
                change.removed = *removed;
            }
            change
        })
        .collect();

    Some(CommitRecord {
        id,
        author,
        author_name,
        timestamp,
        message,
        changes,
    })
}

/// `:100644 100644 <sha> <sha> M\tpath` or `... R087\told\tnew`.
fn parse_raw_line(line: &str) -> Option<FileChange> {
    let mut parts = line.split('\t');
    let meta = parts.next()?;
    let status = meta.split_whitespace().last()?;
    let kind = ChangeKind::from_status(status);
    let first = parts.next().map(unquote)?;
    let second = parts.next().map(unquote);

    let (old_path, new_path) = match kind {
        ChangeKind::Add => (None, Some(first)),
        ChangeKind::Delete => (Some(first), None),
        ChangeKind::Modify => (Some(first.clone()), Some(first)),
        ChangeKind::Rename => (Some(first), Some(second?)),
        ChangeKind::Other => match second {
            Some(second) => (Some(first), Some(second)),
            None => (Some(first.clone()), Some(first)),
        },
    };

    Some(FileChange {
        kind,
        old_path,
        new_path,
        added: 0,
        removed: 0,
    })
}

/// `added\tremoved\tpath`; binary files report `-` and count as zero.
fn parse_numstat_line(line: &str) -> Option<(u32, u32)> {
    let mut parts = line.splitn(3, '\t');
    let added = parts.next()?;
    let removed = parts.next()?;
    parts.next()?;
    let count = |s: &str| -> Option<u32> {
        if s == "-" {
            Some(0)
        } else {
            s.parse().ok()
        }
    };
    Some((count(added)?, count(removed)?))
}

fn unquote(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1]
            .replace("\\\"", "\"")
            .replace("\\\\", "\\")
    } else {
        trimmed.to_string()
    }
}
