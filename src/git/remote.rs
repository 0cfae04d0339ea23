//! Remote repository cloning.

use std::path::{Path, PathBuf};

use crate::core::{Error, Result};

/// Clone options for remote repositories.
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Parent directory for the checkout (defaults to a temp dir).
    pub clone_to: Option<PathBuf>,
}

/// Whether a repository location names a remote rather than a local path.
pub fn is_remote(location: &str) -> bool {
    const SCHEMES: &[&str] = &["http://", "https://", "ssh://", "git://", "file://"];
    SCHEMES.iter().any(|scheme| location.starts_with(scheme)) || location.starts_with("git@")
}

/// Clone a remote repository, reusing an earlier clone at the same destination.
///
/// The checkout lands in `<clone_to>/<repo-name>`.
pub fn clone_remote(url: &str, options: &CloneOptions) -> Result<PathBuf> {
    let parent = options
        .clone_to
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("fixrisk-repos"));
    std::fs::create_dir_all(&parent)?;
    let target = parent.join(repo_dir_name(url)?);

    if is_existing_clone(&target) {
        tracing::info!("Reusing existing clone at {}", target.display());
        return Ok(target);
    }

    tracing::info!("Cloning {url} into {}", target.display());
    let mut prepare = gix::prepare_clone(url.to_string(), &target)
        .map_err(|e| Error::Remote(format!("Failed to prepare clone: {e}")))?;

    let (_repo, _outcome) = prepare
        .fetch_only(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
        .map_err(|e| Error::Remote(format!("Failed to clone {url}: {e}")))?;

    Ok(target)
}

fn is_existing_clone(target: &Path) -> bool {
    target.join(".git").is_dir()
}

/// Directory name for a clone: the last URL segment without `.git`.
fn repo_dir_name(url: &str) -> Result<String> {
    let name = url
        .trim_end_matches('/')
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or("")
        .trim_end_matches(".git");
    if name.is_empty() {
        return Err(Error::Remote(format!("Invalid repository URL: {url}")));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://github.com/owner/repo"));
        assert!(is_remote("git@github.com:owner/repo.git"));
        assert!(is_remote("file:///srv/git/repo.git"));
        assert!(!is_remote("."));
        assert!(!is_remote("/home/dev/repo"));
        assert!(!is_remote("owner/repo"));
    }

    #[test]
    fn test_repo_dir_name() {
        assert_eq!(repo_dir_name("https://github.com/owner/repo").unwrap(), "repo");
        assert_eq!(repo_dir_name("https://github.com/owner/repo.git/").unwrap(), "repo");
        assert_eq!(repo_dir_name("git@github.com:owner/tool.git").unwrap(), "tool");
        assert!(repo_dir_name("https://").is_err());
    }

    #[test]
    fn test_existing_clone_is_reused() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("repo/.git")).unwrap();
        let options = CloneOptions {
            clone_to: Some(temp.path().to_path_buf()),
        };
        let target = clone_remote("https://example.invalid/owner/repo.git", &options).unwrap();
        assert_eq!(target, temp.path().join("repo"));
    }
}
