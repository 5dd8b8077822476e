//! Git operations module
//!
//! Repository inspection goes through the gix (Gitoxide) library; the push
//! runs the git CLI.

pub mod auth;
pub mod changelist;
pub mod open;
pub mod push;
pub mod status;
pub mod workspace;

// Re-export operation functions
pub use changelist::changelist_title;
pub use push::{
    GitProgress, GitPushRunner, LineSink, OutputBuffer, OutputLine, OutputStream, PushInvocation,
    PushOption, PushOptions, PushResult, PushRunner, build_push_options,
    extract_merge_request_url, parse_progress,
};
pub use status::{RemoteInfo, TrackInfo};
pub use workspace::{Repository, Workspace, resolve};
