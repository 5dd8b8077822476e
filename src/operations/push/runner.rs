//! Push execution with streamed output

use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::progress::parse_progress;
use super::{OutputLine, OutputStream, PushInvocation, PushResult};
use crate::CancellationToken;
use crate::config::DEFAULT_GIT_PROGRAM;
use crate::operations::auth;

/// How long to keep reading, in total, after the process exited.
///
/// A helper spawned by git (an SSH control master, say) can inherit the
/// pipes and hold them open long after the push finished.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Receives subprocess output one line at a time, in emission order.
pub trait LineSink: Send + Sync {
    fn on_line(&self, line: &OutputLine);
}

impl<F> LineSink for F
where
    F: Fn(&OutputLine) + Send + Sync,
{
    fn on_line(&self, line: &OutputLine) {
        self(line)
    }
}

/// Append-only capture of one invocation's output
///
/// Allocate a fresh buffer per push: its contents feed URL extraction, so
/// sharing one across pushes would let an old URL leak into a new result.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    lines: Mutex<Vec<String>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// All captured lines joined with `\n`.
    pub fn joined(&self) -> String {
        self.lines().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|lines| lines.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LineSink for OutputBuffer {
    fn on_line(&self, line: &OutputLine) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.text.clone());
        }
    }
}

/// Executes a push and reports its output
#[async_trait]
pub trait PushRunner: Send + Sync {
    /// Run `invocation`, forwarding every output line to `sink` as it arrives.
    ///
    /// Never returns an `Err`: launch failures, non-zero exits and
    /// cancellation are all reported through [`PushResult`]. When this
    /// returns, every line has already been delivered.
    async fn run(
        &self,
        invocation: &PushInvocation,
        sink: &dyn LineSink,
        cancel: &CancellationToken,
    ) -> PushResult;
}

/// [`PushRunner`] backed by the git executable
#[derive(Debug, Clone)]
pub struct GitPushRunner {
    program: String,
}

impl GitPushRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GitPushRunner {
    fn default() -> Self {
        Self::new(DEFAULT_GIT_PROGRAM)
    }
}

#[async_trait]
impl PushRunner for GitPushRunner {
    async fn run(
        &self,
        invocation: &PushInvocation,
        sink: &dyn LineSink,
        cancel: &CancellationToken,
    ) -> PushResult {
        log::debug!(
            "Running `{}` in {}",
            invocation.command_line(&self.program),
            invocation.work_dir().display()
        );

        let mut cmd = Command::new(&self.program);
        cmd.current_dir(invocation.work_dir());
        cmd.args(invocation.args());
        auth::configure_command(&mut cmd);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return PushResult::launch_failed(&self.program, e),
        };

        // Both pipes feed one channel so lines reach the sink in arrival order.
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(
                stdout,
                OutputStream::Stdout,
                tx.clone(),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(
                stderr,
                OutputStream::Stderr,
                tx.clone(),
            )));
        }
        drop(tx);

        // Fresh per run: lines from an earlier push must never reach this result.
        let captured = OutputBuffer::new();
        let mut diagnostics = Vec::new();

        let status = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let _ = child.kill().await;
                    readers.iter().for_each(|reader| reader.abort());
                    log::debug!("Push in {} cancelled", invocation.work_dir().display());
                    return PushResult::cancelled();
                }
                Some(line) = rx.recv() => deliver(line, sink, &captured, &mut diagnostics),
                status = child.wait() => break status,
            }
        };

        // Exit status is known: cancellation no longer applies, and one
        // deadline bounds the whole drain.
        let deadline = Instant::now() + DRAIN_GRACE;
        loop {
            tokio::select! {
                biased;
                () = tokio::time::sleep_until(deadline) => {
                    log::debug!("Output pipes still open after exit, stop reading");
                    break;
                }
                next = rx.recv() => match next {
                    Some(line) => deliver(line, sink, &captured, &mut diagnostics),
                    None => break,
                },
            }
        }
        readers.iter().for_each(|reader| reader.abort());

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                return PushResult::failed(None, format!("Failed to wait for {}: {e}", self.program))
                    .with_output(captured.joined());
            }
        };

        if status.success() {
            log::debug!("Push finished with {status}");
            return PushResult::succeeded(status.code()).with_output(captured.joined());
        }

        let mut text = diagnostics.join("\n");
        if text.trim().is_empty() {
            text = format!("{} push exited with {status}", self.program);
        }
        if auth::is_auth_error(&text) {
            let url = invocation.remote_url().unwrap_or(invocation.remote());
            text.push_str("\n\n");
            text.push_str(&auth::auth_error_message(url));
        }
        log::debug!("Push failed with {status}");
        PushResult::failed(status.code(), text).with_output(captured.joined())
    }
}

fn deliver(
    line: OutputLine,
    sink: &dyn LineSink,
    captured: &OutputBuffer,
    diagnostics: &mut Vec<String>,
) {
    log::trace!("git: {}", line.text);
    if line.stream == OutputStream::Stderr && parse_progress(&line.text).is_none() {
        diagnostics.push(line.text.clone());
    }
    captured.on_line(&line);
    sink.on_line(&line);
}

async fn forward_lines<R>(mut reader: R, stream: OutputStream, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut splitter = LineSplitter::default();
    let mut chunk = [0u8; 4096];

    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) => {
                log::debug!("Stopped reading {stream:?}: {e}");
                break;
            }
        };
        for text in splitter.feed(&chunk[..read]) {
            if tx.send(OutputLine { stream, text }).is_err() {
                return;
            }
        }
    }

    if let Some(text) = splitter.finish() {
        let _ = tx.send(OutputLine { stream, text });
    }
}

/// Splits a byte stream into lines on `\n` and `\r`.
///
/// git redraws progress in place with `\r`, so each redraw becomes its own
/// line. Blank lines are dropped.
#[derive(Debug, Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' || byte == b'\r' {
                lines.extend(self.take());
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    fn finish(mut self) -> Option<String> {
        self.take()
    }

    fn take(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        if line.trim().is_empty() { None } else { Some(line) }
    }
}
