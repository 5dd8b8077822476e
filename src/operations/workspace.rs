//! Workspace model and repository resolution
//!
//! A workspace is a project directory plus the repositories known inside
//! it. Resolution picks the repository whose root is the workspace root,
//! falling back to the first known one, and snapshots the state a push
//! needs: branch, remotes and upstream.

use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use super::open::{discover_root, normalize, repository_root};
use super::status::{RemoteInfo, TrackInfo, current_branch, list_remotes, tracking_info};
use crate::{GitError, GitResult};

/// A project directory and the repositories registered for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    repositories: Vec<PathBuf>,
}

impl Workspace {
    /// Build a workspace from an explicit repository list.
    ///
    /// Order matters: it decides the fallback when no repository sits at
    /// `root` itself.
    pub fn new(root: impl Into<PathBuf>, repositories: Vec<PathBuf>) -> Self {
        Self {
            root: root.into(),
            repositories,
        }
    }

    /// Scan `root` for repositories.
    ///
    /// The repository enclosing `root` (found by walking up) comes first,
    /// followed by repositories nested up to `scan_depth` levels below
    /// `root`, in path order.
    pub async fn discover(root: impl AsRef<Path>, scan_depth: usize) -> GitResult<Self> {
        let root = root.as_ref().to_path_buf();

        tokio::task::spawn_blocking(move || discover_workspace(&root, scan_depth))
            .await
            .map_err(|e| GitError::Internal(format!("Task join error: {e}")))?
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repositories(&self) -> &[PathBuf] {
        &self.repositories
    }

    /// Root of the repository a push should target.
    pub fn select_repository(&self) -> GitResult<&Path> {
        let root = normalize(&self.root);

        self.repositories
            .iter()
            .find(|candidate| normalize(candidate) == root)
            .or_else(|| self.repositories.first())
            .map(PathBuf::as_path)
            .ok_or(GitError::NoRepositoryFound)
    }
}

fn discover_workspace(root: &Path, scan_depth: usize) -> GitResult<Workspace> {
    if !root.is_dir() {
        return Err(GitError::InvalidInput(format!(
            "Workspace root is not a directory: {}",
            root.display()
        )));
    }
    let root = normalize(root);
    let mut repositories = Vec::new();

    match discover_root(&root) {
        Ok(enclosing) => repositories.push(enclosing),
        Err(e) => log::debug!("No repository encloses {}: {e}", root.display()),
    }

    let mut nested: Vec<PathBuf> = WalkDir::new(&root)
        .max_depth(scan_depth)
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git")
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir() && entry.path().join(".git").exists())
        .map(|entry| normalize(entry.path()))
        .collect();
    nested.sort();

    for path in nested {
        if !repositories.contains(&path) {
            repositories.push(path);
        }
    }

    log::debug!(
        "Workspace {} has {} repositories",
        root.display(),
        repositories.len()
    );
    Ok(Workspace { root, repositories })
}

/// Snapshot of the repository a push targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// Working tree root
    pub root: PathBuf,
    /// Checked-out branch; `None` on a detached HEAD
    pub current_branch: Option<String>,
    /// Configured remotes, ordered by name
    pub remotes: Vec<RemoteInfo>,
    /// Upstream of the current branch
    pub tracking: Option<TrackInfo>,
}

impl Repository {
    /// Remote the push goes to: the upstream's remote, else the first configured one.
    pub fn push_remote(&self) -> Option<&RemoteInfo> {
        self.tracking
            .as_ref()
            .and_then(|track| self.remotes.iter().find(|remote| remote.name == track.remote))
            .or_else(|| self.remotes.first())
    }
}

/// Resolve the target repository of `workspace`.
///
/// Fails with [`GitError::NoRepositoryFound`] when the workspace knows no
/// repository. A missing upstream is not an error; neither is a HEAD whose
/// branch cannot be read, which resolves to `current_branch: None`.
pub async fn resolve(workspace: &Workspace) -> GitResult<Repository> {
    let path = workspace.select_repository()?.to_path_buf();

    tokio::task::spawn_blocking(move || resolve_blocking(&path))
        .await
        .map_err(|e| GitError::Internal(format!("Task join error: {e}")))?
}

fn resolve_blocking(path: &Path) -> GitResult<Repository> {
    let repo = gix::open(path)?;
    let root = repository_root(&repo);

    let current_branch = current_branch(&repo).unwrap_or_else(|e| {
        log::warn!("Cannot read HEAD of {}: {e}", root.display());
        None
    });
    let remotes = list_remotes(&repo);
    let tracking = current_branch
        .as_deref()
        .and_then(|branch| tracking_info(&repo, branch));

    log::debug!(
        "Resolved repository {} (branch: {:?}, upstream: {:?})",
        root.display(),
        current_branch,
        tracking
    );
    Ok(Repository {
        root,
        current_branch,
        remotes,
        tracking,
    })
}
