//! Prompt line rendering.
//!
//! The prompt has the form `[user@host:cwd]> `. A [`Prompt`] remembers whether the
//! current prompt has already been produced so that it is shown exactly once per
//! input event.

use anyhow::{Context, Result};
use nix::unistd::{User, gethostname, geteuid};
use std::path::Path;

/// Stands in for the user or host name when the lookup fails.
pub const UNKNOWN: &str = "<UNKNOWN>";

/// Builds the prompt line from its three parts.
pub fn format_prompt(user: &str, host: &str, cwd: &Path) -> String {
    format!("[{}@{}:{}]> ", user, host, cwd.display())
}

/// Name of the effective user, or [`UNKNOWN`].
pub fn username() -> String {
    match User::from_uid(geteuid()) {
        Ok(Some(user)) => user.name,
        Ok(None) => UNKNOWN.to_string(),
        Err(e) => {
            tracing::debug!("user lookup failed: {e}");
            UNKNOWN.to_string()
        }
    }
}

/// Name of the local host, or [`UNKNOWN`].
pub fn hostname() -> String {
    gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Tracks whether the prompt for the current input event was already produced.
#[derive(Debug, Default)]
pub struct Prompt {
    shown: bool,
}

impl Prompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the prompt text if it has not been shown yet, and marks it shown.
    ///
    /// Returns `Ok(None)` when the prompt was already produced since the last
    /// [`Prompt::invalidate`]. Failing to determine the working directory is an
    /// error: the shell cannot present a meaningful prompt without it.
    pub fn render(&mut self) -> Result<Option<String>> {
        if self.shown {
            return Ok(None);
        }
        let cwd = std::env::current_dir().context("failed to determine working directory")?;
        let text = format_prompt(&username(), &hostname(), &cwd);
        self.shown = true;
        Ok(Some(text))
    }

    /// Marks the prompt as stale: an input event happened since it was shown.
    pub fn invalidate(&mut self) {
        self.shown = false;
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }
}
