//! Git progress line parsing

use std::sync::LazyLock;

use regex::Regex;

static PROGRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:remote:\s*)?([A-Za-z][A-Za-z ]*):\s+(\d{1,3})%(?:\s+\((\d+)/(\d+)\))?")
        .expect("progress pattern is valid")
});

/// One progress update, e.g. `Writing objects:  45% (9/20)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitProgress {
    pub phase: String,
    pub percent: u8,
    pub done: Option<u64>,
    pub total: Option<u64>,
}

/// Parse a progress line as printed by `git push --progress`.
pub fn parse_progress(line: &str) -> Option<GitProgress> {
    let captures = PROGRESS.captures(line.trim())?;

    let percent = captures.get(2)?.as_str().parse::<u8>().ok()?.min(100);
    let done = captures.get(3).and_then(|m| m.as_str().parse().ok());
    let total = captures.get(4).and_then(|m| m.as_str().parse().ok());

    Some(GitProgress {
        phase: captures.get(1)?.as_str().trim().to_string(),
        percent,
        done,
        total,
    })
}
