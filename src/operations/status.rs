//! Repository state needed to build a push: branch, remotes, upstream

use gix::bstr::ByteSlice;
use serde::Serialize;

use crate::{GitError, GitResult};

/// A configured remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteInfo {
    /// Remote name (e.g., "origin")
    pub name: String,
    /// `remote.<name>.url`
    pub fetch_url: Option<String>,
    /// `remote.<name>.pushurl`, falling back to the fetch URL
    pub push_url: Option<String>,
}

impl RemoteInfo {
    /// URL a push to this remote goes to.
    pub fn url(&self) -> Option<&str> {
        self.push_url.as_deref().or(self.fetch_url.as_deref())
    }
}

/// Upstream tracking link of a local branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    /// Remote name from `branch.<name>.remote`
    pub remote: String,
    /// Remote branch from `branch.<name>.merge`, without `refs/heads/`
    pub remote_branch: String,
}

/// Name of the checked-out branch; `None` on a detached HEAD.
pub(crate) fn current_branch(repo: &gix::Repository) -> GitResult<Option<String>> {
    let head = repo.head().map_err(|e| GitError::Gix(Box::new(e)))?;

    Ok(head.referent_name().and_then(|name| {
        name.shorten()
            .to_str()
            .ok()
            .map(std::string::ToString::to_string)
    }))
}

/// Configured remotes, ordered by name.
pub(crate) fn list_remotes(repo: &gix::Repository) -> Vec<RemoteInfo> {
    let config = repo.config_snapshot();

    repo.remote_names()
        .iter()
        .map(|name| {
            let name = name.to_str_lossy().into_owned();
            let fetch_url = config
                .string(format!("remote.{name}.url"))
                .map(|url| url.to_string());
            let push_url = config
                .string(format!("remote.{name}.pushurl"))
                .map(|url| url.to_string())
                .or_else(|| fetch_url.clone());
            RemoteInfo {
                name,
                fetch_url,
                push_url,
            }
        })
        .collect()
}

/// Upstream of `branch`, if both `remote` and `merge` are configured for it.
pub(crate) fn tracking_info(repo: &gix::Repository, branch: &str) -> Option<TrackInfo> {
    let config = repo.config_snapshot();
    let branch_section = format!("branch.{branch}");

    let remote = config
        .string(format!("{branch_section}.remote"))
        .map(|s| s.to_string())?;
    let merge = config
        .string(format!("{branch_section}.merge"))
        .map(|s| s.to_string())?;

    Some(TrackInfo {
        remote,
        remote_branch: merge.trim_start_matches("refs/heads/").to_string(),
    })
}

/// Summary line of the commit `HEAD` points at.
pub(crate) fn head_commit_title(repo: &gix::Repository) -> GitResult<String> {
    let mut head = repo.head().map_err(|e| GitError::Gix(Box::new(e)))?;
    let commit = head
        .peel_to_commit()
        .map_err(|e| GitError::Gix(Box::new(e)))?;
    let message = commit.message().map_err(|e| GitError::Gix(Box::new(e)))?;

    Ok(message.title.to_str_lossy().trim().to_string())
}
