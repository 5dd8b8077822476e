//! Merge-request push options

use super::{PushOption, PushOptions};
use crate::operations::workspace::Repository;

const CREATE: &str = "merge_request.create";
const TITLE: &str = "merge_request.title";
const TARGET: &str = "merge_request.target";

/// Branches with this prefix target `master` instead of the project default.
const HOTFIX_PREFIX: &str = "hotfix/";
const HOTFIX_TARGET: &str = "master";

/// Server options for pushing `repository`'s current branch.
///
/// Always `merge_request.create`; then `merge_request.title=<title>` when
/// the title is non-empty; then `merge_request.target=master` for
/// `hotfix/` branches. Nothing else, and always in that order.
pub fn build_push_options(repository: &Repository, changelist_title: &str) -> PushOptions {
    options_for(repository.current_branch.as_deref(), changelist_title)
}

fn options_for(branch: Option<&str>, changelist_title: &str) -> PushOptions {
    let mut options = PushOptions::default();
    options.push(PushOption::flag(CREATE));

    if !changelist_title.is_empty() {
        options.push(PushOption::with_value(TITLE, changelist_title));
    }

    if branch.is_some_and(|branch| branch.starts_with(HOTFIX_PREFIX)) {
        options.push(PushOption::with_value(TARGET, HOTFIX_TARGET));
    }

    options
}
