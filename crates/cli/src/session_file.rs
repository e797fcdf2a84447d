//! Persists the login session between CLI invocations.

use std::path::{Path, PathBuf};

use anyhow::Context;
use telemed_client::Session;

pub const DEFAULT_SESSION_FILE: &str = ".telemed-session.json";

/// Session file location: `TELEMED_SESSION_FILE` when set, else the default in the working directory.
pub fn session_path_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
}

pub fn save(path: &Path, session: &Session) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(session)?;
    std::fs::write(path, json).with_context(|| format!("writing session to {}", path.display()))?;
    Ok(())
}

/// The stored session, or `None` if there is none or it has expired.
pub fn load(path: &Path) -> anyhow::Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading session from {}", path.display()))?;
    let session: Session = serde_json::from_str(&text)
        .with_context(|| format!("parsing session file {}", path.display()))?;
    if session.is_expired() {
        tracing::info!(username = %session.username, "stored session has expired");
        return Ok(None);
    }
    Ok(Some(session))
}

pub fn clear(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("removing session file {}", path.display()))?;
    }
    Ok(())
}
