//! Git push with merge-request push options
//!
//! Builds and runs
//!
//! ```text
//! git push --set-upstream origin <branch> --progress -o merge_request.create [-o ...]
//! ```
//!
//! through the native git CLI, since gix doesn't yet support push. The
//! `merge_request.*` options are understood by GitLab, which answers with
//! `remote:` lines pointing at the created merge request:
//!
//! ```text
//! remote: View merge request for feature/login:
//! remote:   https://gitlab.example.com/group/proj/-/merge_requests/42
//! ```
//!
//! **Dependency**: Requires git to be installed and available in PATH
//! (or configured through `PushConfig::git_program`).
//!
//! # Authentication
//!
//! The push relies on git's configured authentication. Because
//! `GIT_TERMINAL_PROMPT=0` is set, HTTPS remotes need a credential helper
//! and SSH remotes need a loaded key; otherwise the push fails right away
//! with a setup hint instead of hanging on a prompt.

mod options;
mod progress;
mod runner;
mod url;

use std::fmt;
use std::path::{Path, PathBuf};

pub use options::build_push_options;
pub use progress::{GitProgress, parse_progress};
pub use runner::{GitPushRunner, LineSink, OutputBuffer, PushRunner};
pub use url::extract_merge_request_url;

use super::workspace::Repository;
use crate::GitError;

/// One `-o` server option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOption {
    pub key: &'static str,
    pub value: Option<String>,
}

impl PushOption {
    pub fn flag(key: &'static str) -> Self {
        Self { key, value: None }
    }

    pub fn with_value(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for PushOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.key),
            None => f.write_str(self.key),
        }
    }
}

/// Ordered server options for one push
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOptions(Vec<PushOption>);

impl PushOptions {
    pub fn push(&mut self, option: PushOption) {
        self.0.push(option);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PushOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Options rendered as `key` / `key=value`, in order.
    pub fn rendered(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Alternating `-o` / option arguments, in order.
    pub fn to_args(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|option| ["-o".to_string(), option.to_string()])
            .collect()
    }
}

impl<'a> IntoIterator for &'a PushOptions {
    type Item = &'a PushOption;
    type IntoIter = std::slice::Iter<'a, PushOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The concrete push command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushInvocation {
    work_dir: PathBuf,
    remote: String,
    remote_url: Option<String>,
    branch: Option<String>,
    options: PushOptions,
}

impl PushInvocation {
    /// Push `repository`'s current branch to `remote` with `options`.
    ///
    /// The remote URL override is taken from the upstream's remote, or the
    /// first configured remote when there is no upstream.
    pub fn new(repository: &Repository, remote: impl Into<String>, options: PushOptions) -> Self {
        Self {
            work_dir: repository.root.clone(),
            remote: remote.into(),
            remote_url: repository
                .push_remote()
                .and_then(|remote| remote.url())
                .map(str::to_string),
            branch: repository.current_branch.clone(),
            options,
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn options(&self) -> &PushOptions {
        &self.options
    }

    /// Arguments after the program name.
    ///
    /// The branch is left out on a detached HEAD; git then pushes per its
    /// own `push.default` rules.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "push".to_string(),
            "--set-upstream".to_string(),
            self.remote.clone(),
        ];
        if let Some(branch) = &self.branch {
            args.push(branch.clone());
        }
        args.push("--progress".to_string());
        args.extend(self.options.to_args());
        args
    }

    /// Shell-like rendering for logs and dry runs.
    pub fn command_line(&self, program: &str) -> String {
        std::iter::once(program.to_string())
            .chain(self.args().into_iter().map(|arg| {
                if arg.is_empty() || arg.contains(char::is_whitespace) {
                    format!("'{}'", arg.replace('\'', r"'\''"))
                } else {
                    arg
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Which pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One line of subprocess output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }
}

/// Result of running one push
#[derive(Debug)]
pub struct PushResult {
    /// Exit code, when the process ran to completion
    pub exit_code: Option<i32>,
    /// Every output line, joined with `\n`; empty when the push never ran
    /// to completion
    pub output: String,
    /// Why the push failed; `None` on success
    pub error: Option<GitError>,
}

impl PushResult {
    pub fn succeeded(exit_code: Option<i32>) -> Self {
        Self {
            exit_code,
            output: String::new(),
            error: None,
        }
    }

    pub fn failed(exit_code: Option<i32>, error_text: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: String::new(),
            error: Some(GitError::PushFailed(error_text.into())),
        }
    }

    pub fn launch_failed(program: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            exit_code: None,
            output: String::new(),
            error: Some(GitError::LaunchFailed {
                program: program.into(),
                source,
            }),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            exit_code: None,
            output: String::new(),
            error: Some(GitError::Cancelled),
        }
    }

    /// Attach the captured output.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// Error text to show the user; `None` on success.
    pub fn error_text(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn into_error(self) -> Option<GitError> {
        self.error
    }
}
