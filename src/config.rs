//! Push configuration
//!
//! Settings the binary collects from flags and environment variables and
//! hands to [`PushOrchestrator`](crate::PushOrchestrator). Everything has a
//! default, so `PushConfig::default()` reproduces the plain workflow:
//! push to `origin` with `git`, title from the HEAD commit, open the browser.

use serde::{Deserialize, Serialize};

/// Remote name pushed to when nothing else is configured.
pub const DEFAULT_REMOTE: &str = "origin";

/// Executable used for the push when nothing else is configured.
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// Where the merge-request title comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "value")]
pub enum TitleSource {
    /// Use this exact text.
    Explicit(String),
    /// Summary line of the commit `HEAD` points at.
    #[default]
    HeadCommit,
    /// Never send a title.
    None,
}

/// Configuration for one `git-push-mr` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Backend executable (defaults to "git")
    pub git_program: String,
    /// Remote passed after `--set-upstream` (defaults to "origin")
    pub remote: String,
    /// Merge-request title source
    pub title: TitleSource,
    /// Open the merge request in a browser once it is known
    pub open_browser: bool,
    /// Directory depth searched for nested repositories
    pub scan_depth: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            git_program: DEFAULT_GIT_PROGRAM.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            title: TitleSource::default(),
            open_browser: true,
            scan_depth: 2,
        }
    }
}
