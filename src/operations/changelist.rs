//! Merge-request title lookup

use super::status::head_commit_title;
use super::workspace::Repository;
use crate::GitError;
use crate::config::TitleSource;

/// Title of the change being pushed.
///
/// Never fails: an unreadable source yields an empty title, which simply
/// leaves `merge_request.title` out of the push options.
pub fn changelist_title(repository: &Repository, source: &TitleSource) -> String {
    match source {
        TitleSource::Explicit(title) => title.clone(),
        TitleSource::None => String::new(),
        TitleSource::HeadCommit => {
            let title = gix::open(&repository.root)
                .map_err(GitError::from)
                .and_then(|repo| head_commit_title(&repo));
            match title {
                Ok(title) => title,
                Err(e) => {
                    log::warn!(
                        "No commit title available in {}: {e}",
                        repository.root.display()
                    );
                    String::new()
                }
            }
        }
    }
}
