//! Push orchestration
//!
//! Ties resolution, option building, the background push and URL
//! extraction together and reports exactly one outcome per run:
//!
//! ```text
//! Idle -> ResolvingRepository -> BuildingOptions -> Running -> ExtractingUrl -> Completed(Success)
//!               |                                      |
//!               +--------------------------------------+----> Completed(Failure)
//! ```
//!
//! The push runs on a spawned tokio task. `run` awaits it, so notification
//! and browser opening happen on the caller's task once the process has
//! exited, never on the worker.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::browser::{BrowserLauncher, SystemBrowser};
use crate::config::{DEFAULT_REMOTE, PushConfig, TitleSource};
use crate::operations::{
    GitPushRunner, LineSink, OutputLine, PushInvocation, PushResult, PushRunner,
    Repository, Workspace, build_push_options, changelist_title, extract_merge_request_url,
    resolve,
};
use crate::{CancellationToken, FailureKind, GitError, GitResult};

pub const SUCCESS_NOTIFICATION_ID: &str = "git.push-mr.success";
pub const ERROR_NOTIFICATION_ID: &str = "git.push-mr.error";

/// User-visible reporting of push outcomes
pub trait Notifier: Send + Sync {
    fn notify_success(&self, id: &str, title: &str, message: &str);
    fn notify_error(&self, id: &str, title: &str, message: &str);
}

/// [`Notifier`] that writes to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_success(&self, id: &str, title: &str, message: &str) {
        log::info!("[{id}] {title}: {message}");
    }

    fn notify_error(&self, id: &str, title: &str, message: &str) {
        log::error!("[{id}] {title}: {message}");
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PushOutcome {
    Success {
        repository: PathBuf,
        branch: Option<String>,
        merge_request_url: Option<String>,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl PushOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PushOutcome::Success { .. })
    }

    pub fn merge_request_url(&self) -> Option<&str> {
        match self {
            PushOutcome::Success {
                merge_request_url, ..
            } => merge_request_url.as_deref(),
            PushOutcome::Failure { .. } => None,
        }
    }
}

/// Orchestration progress of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushState {
    Idle,
    ResolvingRepository,
    BuildingOptions,
    Running,
    ExtractingUrl,
    Completed(PushOutcome),
}

type StateObserver = Arc<dyn Fn(&PushState) + Send + Sync>;

/// Runs the resolve / build / push / extract workflow
pub struct PushOrchestrator {
    runner: Arc<dyn PushRunner>,
    notifier: Arc<dyn Notifier>,
    browser: Option<Arc<dyn BrowserLauncher>>,
    progress: Option<Arc<dyn LineSink>>,
    title_source: TitleSource,
    remote: String,
    observer: Option<StateObserver>,
}

impl PushOrchestrator {
    /// Orchestrator with no browser, no progress sink, HEAD-commit titles and `origin`.
    pub fn new(runner: Arc<dyn PushRunner>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            runner,
            notifier,
            browser: None,
            progress: None,
            title_source: TitleSource::default(),
            remote: DEFAULT_REMOTE.to_string(),
            observer: None,
        }
    }

    /// Orchestrator wired to the real git executable and system browser.
    pub fn from_config(config: &PushConfig, notifier: Arc<dyn Notifier>) -> Self {
        let orchestrator = Self::new(
            Arc::new(GitPushRunner::new(config.git_program.clone())),
            notifier,
        )
        .with_title_source(config.title.clone())
        .with_remote(config.remote.clone());

        if config.open_browser {
            orchestrator.with_browser(Arc::new(SystemBrowser::default()))
        } else {
            orchestrator
        }
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Also forward every output line to `sink` (e.g. a progress display).
    pub fn with_progress(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_title_source(mut self, title_source: TitleSource) -> Self {
        self.title_source = title_source;
        self
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Called on every state transition, in order.
    pub fn with_state_observer(
        mut self,
        observer: impl Fn(&PushState) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Resolve the repository and build the push without running it.
    pub async fn prepare(&self, workspace: &Workspace) -> GitResult<PushInvocation> {
        let repository = resolve(workspace).await?;
        Ok(self.build_invocation(repository).await)
    }

    /// Push `workspace`'s repository and report the outcome.
    ///
    /// Never fails: every error ends as `PushOutcome::Failure`, reported
    /// through the notifier exactly once.
    pub async fn run(&self, workspace: &Workspace, cancel: CancellationToken) -> PushOutcome {
        let mut state = PushState::Idle;

        self.enter(&mut state, PushState::ResolvingRepository);
        let repository = match resolve(workspace).await {
            Ok(repository) => repository,
            Err(e) => return self.fail(&mut state, "Error", e),
        };

        self.enter(&mut state, PushState::BuildingOptions);
        let invocation = self.build_invocation(repository.clone()).await;

        if cancel.is_cancelled() {
            return self.fail(&mut state, "Error", GitError::Cancelled);
        }

        self.enter(&mut state, PushState::Running);
        let runner = Arc::clone(&self.runner);
        let progress = self.progress.clone();
        let worker = tokio::spawn(async move {
            match &progress {
                Some(sink) => runner.run(&invocation, sink.as_ref(), &cancel).await,
                None => runner.run(&invocation, &discard, &cancel).await,
            }
        });
        let result = worker.await.unwrap_or_else(|e| PushResult {
            exit_code: None,
            output: String::new(),
            error: Some(GitError::Internal(format!("Push task failed: {e}"))),
        });

        let PushResult { output, error, .. } = result;
        if let Some(error) = error {
            return self.fail(&mut state, "Push error", error);
        }

        self.enter(&mut state, PushState::ExtractingUrl);
        let merge_request_url = extract_merge_request_url(&output);
        match &merge_request_url {
            Some(url) => log::debug!("Merge request URL: {url}"),
            None => log::debug!("No merge request URL in push output"),
        }

        let mut message = "Commits pushed successfully".to_string();
        if let Some(url) = &merge_request_url {
            message.push_str(&format!("\nMerge request: {url}"));
        }
        self.notifier
            .notify_success(SUCCESS_NOTIFICATION_ID, "Push success", &message);

        if let (Some(url), Some(browser)) = (&merge_request_url, &self.browser) {
            browser.open(url);
        }

        let outcome = PushOutcome::Success {
            repository: repository.root,
            branch: repository.current_branch,
            merge_request_url,
        };
        self.enter(&mut state, PushState::Completed(outcome.clone()));
        outcome
    }

    async fn build_invocation(&self, repository: Repository) -> PushInvocation {
        let source = self.title_source.clone();
        let lookup = repository.clone();
        let title = tokio::task::spawn_blocking(move || changelist_title(&lookup, &source))
            .await
            .unwrap_or_else(|e| {
                log::warn!("Title lookup failed: {e}");
                String::new()
            });

        let options = build_push_options(&repository, &title);
        PushInvocation::new(&repository, self.remote.clone(), options)
    }

    fn fail(&self, state: &mut PushState, title: &str, error: GitError) -> PushOutcome {
        let message = error.to_string();
        log::debug!("Push failed in {state:?}: {message}");

        self.notifier
            .notify_error(ERROR_NOTIFICATION_ID, title, &message);

        let outcome = PushOutcome::Failure {
            kind: error.kind(),
            message,
        };
        self.enter(state, PushState::Completed(outcome.clone()));
        outcome
    }

    fn enter(&self, state: &mut PushState, next: PushState) {
        log::debug!("Push state: {state:?} -> {next:?}");
        *state = next;
        if let Some(observer) = &self.observer {
            observer(state);
        }
    }
}

/// Sink for runs without a progress display.
fn discard(_: &OutputLine) {}
