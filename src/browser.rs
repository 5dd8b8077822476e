//! Opening merge-request URLs in the user's browser
//!
//! Strategies are tried in order until one launches. A launch that fails is
//! logged and never surfaced: the push already succeeded.

use std::io;
use std::process::{Command, Stdio};
use std::sync::Arc;

/// Opens a URL somewhere the user can see it
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str);
}

/// Spawns a detached helper process
pub trait CommandSpawner: Send + Sync {
    fn spawn(&self, program: &str, args: &[String]) -> io::Result<()>;
}

/// [`CommandSpawner`] backed by [`std::process::Command`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner;

impl CommandSpawner for SystemSpawner {
    fn spawn(&self, program: &str, args: &[String]) -> io::Result<()> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    MacOs,
    Unix,
}

impl OsFamily {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Unix
        }
    }

    /// Platform opener for `url`
    fn command(self, url: &str) -> (&'static str, Vec<String>) {
        match self {
            OsFamily::Windows => (
                "rundll32",
                vec!["url.dll,FileProtocolHandler".to_string(), url.to_string()],
            ),
            OsFamily::MacOs => ("open", vec![url.to_string()]),
            OsFamily::Unix => ("xdg-open", vec![url.to_string()]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStrategy {
    /// The desktop's configured browser (`$BROWSER`)
    Desktop,
    /// The platform's URL opener
    Shell(OsFamily),
}

/// Browser launcher using the desktop setting, then the platform opener
pub struct SystemBrowser {
    strategies: Vec<OpenStrategy>,
    browser_command: Option<String>,
    spawner: Arc<dyn CommandSpawner>,
}

impl SystemBrowser {
    pub fn new(strategies: Vec<OpenStrategy>, spawner: Arc<dyn CommandSpawner>) -> Self {
        Self {
            strategies,
            browser_command: std::env::var("BROWSER").ok(),
            spawner,
        }
    }

    /// Override the `$BROWSER` value read at construction.
    pub fn with_browser_command(mut self, command: Option<String>) -> Self {
        self.browser_command = command.filter(|c| !c.trim().is_empty());
        self
    }

    fn try_strategy(&self, strategy: OpenStrategy, url: &str) -> bool {
        match strategy {
            OpenStrategy::Desktop => {
                let Some(setting) = &self.browser_command else {
                    log::debug!("No desktop browser configured");
                    return false;
                };
                desktop_commands(setting, url)
                    .into_iter()
                    .any(|(program, args)| self.launch(&program, &args))
            }
            OpenStrategy::Shell(os) => {
                let (program, args) = os.command(url);
                self.launch(program, &args)
            }
        }
    }

    fn launch(&self, program: &str, args: &[String]) -> bool {
        match self.spawner.spawn(program, args) {
            Ok(()) => {
                log::debug!("Opened browser with {program}");
                true
            }
            Err(e) => {
                log::debug!("Failed to launch {program}: {e}");
                false
            }
        }
    }
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::new(
            vec![OpenStrategy::Desktop, OpenStrategy::Shell(OsFamily::current())],
            Arc::new(SystemSpawner),
        )
    }
}

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) {
        if self
            .strategies
            .iter()
            .any(|strategy| self.try_strategy(*strategy, url))
        {
            return;
        }
        log::warn!("Could not open a browser for {url}");
    }
}

/// Commands from a `$BROWSER`-style setting.
///
/// Entries are colon separated; `%s` is replaced by the URL, otherwise the
/// URL is appended as the last argument.
fn desktop_commands(setting: &str, url: &str) -> Vec<(String, Vec<String>)> {
    setting
        .split(':')
        .filter_map(|entry| {
            let mut words = entry.split_whitespace();
            let program = words.next()?.to_string();
            let mut args: Vec<String> = words.map(|w| w.replace("%s", url)).collect();
            if !entry.contains("%s") {
                args.push(url.to_string());
            }
            Some((program, args))
        })
        .collect()
}
