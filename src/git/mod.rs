//! Git access: the commit stream the risk engine consumes.

mod log;
mod remote;

use std::path::{Path, PathBuf};

use gix::Repository;

use crate::config::RunConfig;
use crate::core::{Error, Result, Window};

pub use log::{parse_log, ChangeKind, CommitRecord, FileChange};
pub use remote::{clone_remote, is_remote, CloneOptions};

/// Supplies the commits of one repository inside a window.
///
/// Implementations must return the same sequence when queried twice with the
/// same window.
pub trait CommitSource {
    /// Commits inside `window`, oldest first.
    fn commits(&self, window: &Window) -> Result<Vec<CommitRecord>>;
}

impl CommitSource for [CommitRecord] {
    fn commits(&self, window: &Window) -> Result<Vec<CommitRecord>> {
        Ok(self
            .iter()
            .filter(|c| window.contains(c.timestamp))
            .cloned()
            .collect())
    }
}

impl CommitSource for Vec<CommitRecord> {
    fn commits(&self, window: &Window) -> Result<Vec<CommitRecord>> {
        self.as_slice().commits(window)
    }
}

/// Git repository wrapper for history mining.
pub struct GitRepo {
    /// The gix repository handle.
    repo: Repository,
    /// Repository root path.
    root: PathBuf,
}

impl GitRepo {
    /// Open a git repository at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = gix::open(path).map_err(|e| {
            Error::git(format!("Failed to open repository {}: {e}", path.display()))
        })?;
        let root = repo
            .workdir()
            .ok_or_else(|| Error::git("Not a work tree"))?
            .to_path_buf();

        Ok(Self { repo, root })
    }

    /// Open the repository a run points at, cloning it first when remote.
    pub fn for_run(run: &RunConfig) -> Result<Self> {
        if is_remote(&run.repository) {
            let options = CloneOptions {
                clone_to: run.clone_to.clone(),
            };
            let path = clone_remote(&run.repository, &options)?;
            Self::open(path)
        } else {
            Self::open(&run.repository)
        }
    }

    /// Get the repository root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the current branch name.
    pub fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| Error::git(format!("Failed to get HEAD: {e}")))?;

        match head.referent_name() {
            Some(name) => {
                let full = name.as_bstr().to_string();
                Ok(full
                    .strip_prefix("refs/heads/")
                    .map(str::to_string)
                    .unwrap_or(full))
            }
            None => Ok("HEAD".to_string()),
        }
    }

    /// Resolve a branch name to a revision `git log` accepts.
    ///
    /// Local branches win over `origin` remote-tracking branches. Without a
    /// branch the current HEAD is used; `None` means HEAD is unborn.
    pub fn resolve_revision(&self, branch: Option<&str>) -> Result<Option<String>> {
        let Some(branch) = branch else {
            return Ok(self.repo.head_id().ok().map(|_| "HEAD".to_string()));
        };

        let candidates = [
            format!("refs/heads/{branch}"),
            format!("refs/remotes/origin/{branch}"),
        ];
        for candidate in candidates {
            let found = self
                .repo
                .try_find_reference(candidate.as_str())
                .map_err(|e| Error::git(format!("Failed to look up {candidate}: {e}")))?;
            if found.is_some() {
                return Ok(Some(candidate));
            }
        }

        Err(Error::git(format!("Branch not found: {branch}")))
    }

    /// The commit stream of `branch` (or HEAD).
    pub fn history(&self, branch: Option<&str>) -> Result<GitHistory<'_>> {
        let revision = self.resolve_revision(branch)?;
        if branch.is_none() {
            if let Ok(name) = self.current_branch() {
                tracing::debug!("Using current branch {name}");
            }
        }
        if revision.is_none() {
            tracing::warn!("{} has no commits", self.root.display());
        }
        Ok(GitHistory {
            repo: self,
            revision,
        })
    }
}

/// Commits reachable from one revision of a [`GitRepo`].
pub struct GitHistory<'a> {
    repo: &'a GitRepo,
    revision: Option<String>,
}

impl GitHistory<'_> {
    /// The resolved revision, if the repository has any commits.
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }
}

impl CommitSource for GitHistory<'_> {
    fn commits(&self, window: &Window) -> Result<Vec<CommitRecord>> {
        match &self.revision {
            Some(revision) => log::get_log(self.repo.root(), revision, window),
            None => Ok(Vec::new()),
        }
    }
}
