// git-push-mr: push the current branch and open the merge request it creates.
//
// Git output is forwarded to stderr as it arrives. The outcome goes to the
// terminal, and with --json also to stdout as one JSON object.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use git_push_mr::{
    CancellationToken, LineSink, Notifier, OutputLine, PushConfig, PushOrchestrator, TitleSource,
    Workspace, parse_progress,
};

#[derive(Parser, Debug)]
#[command(name = "git-push-mr")]
#[command(version, about = "Push the current branch and open its merge request", long_about = None)]
struct Cli {
    /// Workspace directory (defaults to the current directory)
    path: Option<PathBuf>,

    /// Merge-request title (defaults to the HEAD commit summary)
    #[arg(long, conflicts_with = "no_title")]
    title: Option<String>,

    /// Do not send a merge-request title
    #[arg(long)]
    no_title: bool,

    /// Git executable used for the push
    #[arg(long = "git", env = "GIT_PUSH_MR_GIT", default_value = "git")]
    git_program: String,

    /// Remote to push to
    #[arg(long, default_value = "origin")]
    remote: String,

    /// Do not open the merge request in a browser
    #[arg(long, env = "GIT_PUSH_MR_NO_BROWSER")]
    no_browser: bool,

    /// Directory depth searched for nested repositories
    #[arg(long, default_value_t = 2)]
    scan_depth: usize,

    /// Print the git command instead of running it
    #[arg(long)]
    dry_run: bool,

    /// Print the outcome as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Do not forward git output
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> PushConfig {
        let title = match (&self.title, self.no_title) {
            (Some(title), _) => TitleSource::Explicit(title.clone()),
            (None, true) => TitleSource::None,
            (None, false) => TitleSource::HeadCommit,
        };

        PushConfig {
            git_program: self.git_program.clone(),
            remote: self.remote.clone(),
            title,
            open_browser: !self.no_browser,
            scan_depth: self.scan_depth,
        }
    }
}

/// Prints notifications to stderr.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_success(&self, id: &str, title: &str, message: &str) {
        log::debug!("notification {id}");
        eprintln!("\u{2713} {title}: {message}");
    }

    fn notify_error(&self, id: &str, title: &str, message: &str) {
        log::debug!("notification {id}");
        eprintln!("\u{2717} {title}: {message}");
    }
}

/// Forwards git output to stderr, redrawing progress lines in place.
#[derive(Default)]
struct ConsoleProgress {
    // true while the cursor sits at the end of an unfinished progress line
    in_progress: Mutex<bool>,
}

impl LineSink for ConsoleProgress {
    fn on_line(&self, line: &OutputLine) {
        let Ok(mut in_progress) = self.in_progress.lock() else {
            return;
        };
        let mut stderr = std::io::stderr().lock();

        let result = match parse_progress(&line.text) {
            Some(progress) if progress.percent < 100 => {
                *in_progress = true;
                write!(stderr, "\r{}\x1b[K", line.text)
            }
            _ => {
                let prefix = if *in_progress { "\r" } else { "" };
                *in_progress = false;
                writeln!(stderr, "{prefix}{}\x1b[K", line.text)
            }
        };
        let _ = result.and_then(|()| stderr.flush());
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config();
    log::debug!("Configuration: {config:?}");

    let root = match &cli.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let workspace = Workspace::discover(&root, config.scan_depth)
        .await
        .with_context(|| format!("Failed to scan {}", root.display()))?;

    let mut orchestrator = PushOrchestrator::from_config(&config, Arc::new(ConsoleNotifier));
    if !cli.quiet {
        orchestrator = orchestrator.with_progress(Arc::new(ConsoleProgress::default()));
    }

    if cli.dry_run {
        let invocation = orchestrator.prepare(&workspace).await?;
        println!("{}", invocation.command_line(&config.git_program));
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupted, cancelling push");
            on_interrupt.cancel();
        }
    });

    let outcome = orchestrator.run(&workspace, cancel).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
