//! Scratch repositories and fakes shared by the push tests.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use git_push_mr::{
    BrowserLauncher, CancellationToken, LineSink, Notifier, OutputLine, PushInvocation,
    PushResult, PushRunner,
};

pub const ORIGIN: &str = "[remote \"origin\"]\n\
    \turl = https://gitlab.example.com/group/proj.git\n\
    \tfetch = +refs/heads/*:refs/remotes/origin/*\n";

pub const MR_URL: &str = "https://gitlab.example.com/group/proj/-/merge_requests/17";

/// `git init` at `dir` with HEAD on `branch` and `extra_config` appended to `.git/config`.
pub fn init_repo(dir: &Path, branch: &str, extra_config: &str) {
    std::fs::create_dir_all(dir).unwrap();
    gix::init(dir).unwrap();
    std::fs::write(
        dir.join(".git").join("HEAD"),
        format!("ref: refs/heads/{branch}\n"),
    )
    .unwrap();

    if !extra_config.is_empty() {
        let mut config = OpenOptions::new()
            .append(true)
            .open(dir.join(".git").join("config"))
            .unwrap();
        config.write_all(extra_config.as_bytes()).unwrap();
    }
}

/// Output GitLab prints for a push that created a merge request.
pub fn gitlab_output(url: &str) -> Vec<String> {
    vec![
        "Enumerating objects: 5, done.".to_string(),
        "Writing objects:  50% (1/2)".to_string(),
        "Writing objects: 100% (2/2), 290 bytes | 290.00 KiB/s, done.".to_string(),
        "remote: ".to_string(),
        "remote: View merge request for feature/login:".to_string(),
        format!("remote:   {url}"),
        "To gitlab.example.com:group/proj.git".to_string(),
    ]
}

/// What one fake push prints and how it ends
#[derive(Debug, Default)]
pub struct Script {
    pub lines: Vec<String>,
    pub error: Option<String>,
    pub launch_error: bool,
    pub wait_for_cancel: bool,
}

impl Script {
    pub fn success(lines: Vec<String>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    pub fn failure(lines: Vec<String>, error: &str) -> Self {
        Self {
            lines,
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn launch_failure() -> Self {
        Self {
            launch_error: true,
            ..Self::default()
        }
    }

    pub fn until_cancelled() -> Self {
        Self {
            wait_for_cancel: true,
            ..Self::default()
        }
    }
}

/// Plays one script per run and records every invocation.
#[derive(Default)]
pub struct FakeRunner {
    scripts: Mutex<VecDeque<Script>>,
    invocations: Mutex<Vec<PushInvocation>>,
}

impl FakeRunner {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            invocations: Mutex::default(),
        }
    }

    pub fn invocations(&self) -> Vec<PushInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushRunner for FakeRunner {
    async fn run(
        &self,
        invocation: &PushInvocation,
        sink: &dyn LineSink,
        cancel: &CancellationToken,
    ) -> PushResult {
        self.invocations.lock().unwrap().push(invocation.clone());
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();

        if script.launch_error {
            return PushResult::launch_failed(
                "git",
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            );
        }

        for line in &script.lines {
            sink.on_line(&OutputLine::stderr(line.clone()));
        }

        if script.wait_for_cancel {
            cancel.cancelled().await;
            return PushResult::cancelled();
        }

        let result = match script.error {
            Some(text) => PushResult::failed(Some(1), text),
            None => PushResult::succeeded(Some(0)),
        };
        result.with_output(script.lines.join("\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub success: bool,
    pub id: String,
    pub title: String,
    pub message: String,
}

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    fn record(&self, success: bool, id: &str, title: &str, message: &str) {
        self.notifications.lock().unwrap().push(Notification {
            success,
            id: id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, id: &str, title: &str, message: &str) {
        self.record(true, id, title, message);
    }

    fn notify_error(&self, id: &str, title: &str, message: &str) {
        self.record(false, id, title, message);
    }
}

#[derive(Default)]
pub struct RecordingBrowser {
    opened: Mutex<Vec<String>>,
}

impl RecordingBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BrowserLauncher for RecordingBrowser {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}
