//! Repository discovery

use std::path::{Path, PathBuf};

use crate::{GitError, GitResult};

/// Working tree root of `repo`; the git dir for bare repositories.
pub(crate) fn repository_root(repo: &gix::Repository) -> PathBuf {
    normalize(repo.workdir().unwrap_or_else(|| repo.path()))
}

/// Root of the repository containing `path`, searching parent directories.
pub(crate) fn discover_root(path: &Path) -> GitResult<PathBuf> {
    if !path.exists() {
        return Err(GitError::RepoNotFound(path.to_path_buf()));
    }
    let repo = gix::discover(path)?;
    Ok(repository_root(&repo))
}

/// Canonical form of `path` for comparisons; the path itself when it cannot be resolved.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
