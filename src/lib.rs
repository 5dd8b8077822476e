//! `git_push_mr` - push a branch with merge-request push options
//!
//! This library resolves the repository of a workspace, derives the
//! `merge_request.*` server options from the branch and the change title,
//! runs `git push` in the background while streaming its output, and picks
//! the merge-request URL out of the `remote:` lines the server prints.
//! Repository state is read with the gix (Gitoxide) library; the push
//! itself goes through the git CLI because gix has no push support.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

// Module declarations
pub mod browser;
pub mod config;
pub mod operations;
pub mod orchestrator;
pub mod runtime;

pub use runtime::CancellationToken;

pub use config::{PushConfig, TitleSource};

pub use browser::{
    BrowserLauncher, CommandSpawner, OpenStrategy, OsFamily, SystemBrowser, SystemSpawner,
};

pub use operations::{
    GitProgress, GitPushRunner, LineSink, OutputBuffer, OutputLine, OutputStream, PushInvocation,
    PushOption, PushOptions, PushResult, PushRunner, RemoteInfo, Repository, TrackInfo, Workspace,
    build_push_options, changelist_title, extract_merge_request_url, parse_progress, resolve,
};

pub use orchestrator::{
    ERROR_NOTIFICATION_ID, LogNotifier, Notifier, PushOrchestrator, PushOutcome, PushState,
    SUCCESS_NOTIFICATION_ID,
};

/// Error types for push operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Gix error: {0}")]
    Gix(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("No git repository found")]
    NoRepositoryFound,

    #[error("Repository not found at path: {0}")]
    RepoNotFound(PathBuf),

    #[error("Failed to launch `{program}`: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    PushFailed(String),

    #[error("Push cancelled")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a failed invocation, as reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoRepositoryFound,
    LaunchFailed,
    PushFailed,
    Cancelled,
    Internal,
}

impl GitError {
    /// Reporting category of this error.
    ///
    /// Anything that is not one of the push-specific failures is an
    /// internal fault from the resolution or option-building stages.
    pub fn kind(&self) -> FailureKind {
        match self {
            GitError::NoRepositoryFound | GitError::RepoNotFound(_) => {
                FailureKind::NoRepositoryFound
            }
            GitError::LaunchFailed { .. } => FailureKind::LaunchFailed,
            GitError::PushFailed(_) => FailureKind::PushFailed,
            GitError::Cancelled => FailureKind::Cancelled,
            GitError::Gix(_) | GitError::InvalidInput(_) | GitError::Internal(_) => {
                FailureKind::Internal
            }
        }
    }
}

impl From<gix::open::Error> for GitError {
    fn from(e: gix::open::Error) -> Self {
        GitError::Gix(Box::new(e))
    }
}

impl From<gix::discover::Error> for GitError {
    fn from(e: gix::discover::Error) -> Self {
        GitError::Gix(Box::new(e))
    }
}

/// Convenience result alias.
pub type GitResult<T> = Result<T, GitError>;
