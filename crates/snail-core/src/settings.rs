use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, PatchError, Result};

pub const DEFAULT_SERVER_URL: &str = "https://snail.hackclub.cc";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "ServerURL", default)]
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}

/// Reads settings, falling back to defaults when the file does not exist yet.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(err) => {
            return Err(PatchError::io(
                format!("failed to read settings file: {}", path.display()),
                err,
            ))
        }
    };

    let mut settings: Settings = serde_json::from_str(&raw).map_err(|err| {
        PatchError::io(
            format!("failed to parse settings file: {}", path.display()),
            io::Error::new(io::ErrorKind::InvalidData, err),
        )
    })?;
    if settings.server_url.trim().is_empty() {
        settings.server_url = DEFAULT_SERVER_URL.to_string();
    }
    Ok(settings)
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_path_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut rendered = serde_json::to_string_pretty(settings).map_err(|err| {
        PatchError::io(
            "failed to serialize settings",
            io::Error::new(io::ErrorKind::InvalidData, err),
        )
    })?;
    rendered.push('\n');
    fs::write(path, rendered)
        .with_path_context(|| format!("failed to write settings file: {}", path.display()))
}
