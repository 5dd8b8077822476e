//! Git subprocess environment and authentication failure hints
//!
//! Single source of truth for:
//! - The environment every git subprocess runs with
//! - Recognising authentication failures in git's error output
//! - Generating setup hints for the remote that refused us

use gix::bstr::BStr;
use tokio::process::Command;

/// Apply the environment every push subprocess runs with.
///
/// - `GIT_TERMINAL_PROMPT=0` so a missing credential fails fast instead of
///   waiting on a prompt nobody can answer
/// - `LC_ALL=C`/`LANG=C` so the server's `remote:` lines and git's own
///   messages arrive in the English wording the URL extraction matches
pub fn configure_command(cmd: &mut Command) {
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd.env("LC_ALL", "C");
    cmd.env("LANG", "C");
}

/// Check if an error message indicates an authentication failure
pub fn is_auth_error(stderr: &str) -> bool {
    let s = stderr.to_lowercase();
    s.contains("authentication")
        || s.contains("permission denied")
        || s.contains("could not read username")
        || s.contains("could not read password")
        || s.contains("host key verification failed")
        || s.contains("repository not found") // Often means no access
}

/// Whether `url` reaches the remote over SSH.
fn is_ssh_url(url: &str) -> bool {
    match gix_url::parse(BStr::new(url.as_bytes())) {
        Ok(parsed) => parsed.scheme == gix_url::Scheme::Ssh,
        Err(_) => url.contains("git@") || url.starts_with("ssh://"),
    }
}

/// Generate helpful error message for authentication failures
pub fn auth_error_message(url: &str) -> String {
    if is_ssh_url(url) {
        format!(
            r#"SSH authentication failed for '{url}'.

Setup SSH authentication:

1. Ensure SSH key exists:
   ls ~/.ssh/id_ed25519 || ssh-keygen -t ed25519

2. Start ssh-agent and add key:
   eval "$(ssh-agent -s)"
   ssh-add ~/.ssh/id_ed25519

3. Add the public key to your GitLab profile

4. Test connection:
   ssh -T git@<gitlab-host>
"#
        )
    } else {
        format!(
            r#"HTTPS authentication failed for '{url}'.

Setup credential helper:

macOS:   git config --global credential.helper osxkeychain
Windows: git config --global credential.helper manager
Linux:   git config --global credential.helper store

Or store a personal access token:
  echo "https://oauth2:TOKEN@<gitlab-host>" > ~/.git-credentials
  git config --global credential.helper store
"#
        )
    }
}
