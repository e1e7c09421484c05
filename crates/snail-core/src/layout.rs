use std::path::{Path, PathBuf};

use crate::error::{PatchError, Result};

/// Per-user state under `~/.snail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnailLayout {
    root: PathBuf,
}

impl SnailLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn installer_dir(&self) -> PathBuf {
        self.root.join("installer")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.installer_dir().join("settings.json")
    }
}

pub fn user_home_dir() -> Option<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn default_snail_root() -> Result<PathBuf> {
    let home = user_home_dir().ok_or_else(|| {
        PatchError::io(
            "home directory is not set; cannot resolve ~/.snail",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        )
    })?;
    Ok(home.join(".snail"))
}
