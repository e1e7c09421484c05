use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PatchError, Result};
use crate::platform::{Platform, PlatformProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationTarget {
    profile: PlatformProfile,
    path: PathBuf,
}

impl InstallationTarget {
    pub fn new(profile: PlatformProfile, path: impl Into<PathBuf>) -> Self {
        Self {
            profile,
            path: path.into(),
        }
    }

    pub fn profile(&self) -> PlatformProfile {
        self.profile
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn archive_path(&self) -> PathBuf {
        self.profile.archive_path(&self.path)
    }

    pub fn is_installed(&self) -> bool {
        verify_installation(&self.profile, &self.path)
    }

    /// Resolves the archive path. The archive must be a regular file.
    pub fn locate_archive(&self) -> Result<PathBuf> {
        let archive = self.archive_path();
        match fs::metadata(&archive) {
            Ok(metadata) if metadata.is_file() => Ok(archive),
            Ok(_) => {
                debug!(path = %archive.display(), "archive is not a regular file");
                Err(PatchError::InvalidTarget {
                    path: self.path.clone(),
                })
            }
            Err(err) => {
                debug!(path = %archive.display(), error = %err, "archive not stat-able");
                Err(PatchError::InvalidTarget {
                    path: self.path.clone(),
                })
            }
        }
    }
}

/// Any stat failure counts as "not installed"; callers never see the reason.
pub fn verify_installation(profile: &PlatformProfile, install_path: &Path) -> bool {
    archive_exists(&profile.archive_path(install_path))
}

fn archive_exists(archive: &Path) -> bool {
    match fs::metadata(archive) {
        Ok(_) => true,
        Err(err) => {
            debug!(path = %archive.display(), error = %err, "archive not stat-able");
            false
        }
    }
}

/// Well-known installation locations, most common first.
pub fn installation_candidates(platform: Platform, home: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    match platform {
        Platform::MacOs => {
            candidates.push(PathBuf::from("/Applications/Slack.app"));
            if let Some(home) = home {
                candidates.push(home.join("Applications").join("Slack.app"));
            }
        }
        Platform::Windows => {
            candidates.push(PathBuf::from(r"C:\Program Files\Slack\slack.exe"));
            candidates.push(PathBuf::from(r"C:\Program Files (x86)\Slack\slack.exe"));
            if let Some(home) = home {
                candidates.push(
                    home.join("AppData")
                        .join("Local")
                        .join("slack")
                        .join("slack.exe"),
                );
            }
        }
        Platform::Linux => {
            candidates.push(PathBuf::from("/usr/lib/slack"));
            candidates.push(PathBuf::from("/usr/local/lib/slack"));
            candidates.push(PathBuf::from("/opt/slack"));
            if let Some(home) = home {
                candidates.push(home.join(".slack"));
            }
        }
    }
    candidates
}

pub fn detect_installation(profile: &PlatformProfile, candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|candidate| verify_installation(profile, candidate))
        .cloned()
}
