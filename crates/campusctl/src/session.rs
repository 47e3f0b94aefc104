//! Cached session id so consecutive `chat` calls share a conversation.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

fn session_file() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("campusctl").join("session"))
}

pub fn load_session_id() -> Option<String> {
    let path = session_file()?;
    let id = fs::read_to_string(path).ok()?;
    let id = id.trim().to_string();
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

pub fn store_session_id(session_id: &str) -> Result<()> {
    let path = session_file().context("no data directory available")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, session_id)?;
    Ok(())
}
