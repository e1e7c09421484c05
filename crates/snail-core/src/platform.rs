use std::path::{Path, PathBuf};

use crate::error::{PatchError, Result};

pub const ARCHIVE_FILE_NAME: &str = "app.asar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Linux,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MacOs => "darwin",
            Self::Windows => "windows",
            Self::Linux => "linux",
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            _ => Err(PatchError::UnsupportedPlatform {
                platform: input.to_string(),
            }),
        }
    }

    pub fn host() -> Result<Self> {
        Self::parse(std::env::consts::OS)
    }
}

/// The two package-runners the pipeline knows how to drive, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsRuntime {
    Bun,
    Npm,
}

impl JsRuntime {
    pub const PREFERENCE: [JsRuntime; 2] = [JsRuntime::Bun, JsRuntime::Npm];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bun => "bun",
            Self::Npm => "npm",
        }
    }
}

/// Shell utility used to clear the download quarantine marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuarantineCommand {
    Xattr,
    UnblockFile,
    None,
}

/// Every platform-conditional decision of the pipeline, resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    platform: Platform,
}

impl PlatformProfile {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn from_identifier(identifier: &str) -> Result<Self> {
        Platform::parse(identifier).map(Self::new)
    }

    pub fn host() -> Result<Self> {
        Platform::host().map(Self::new)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Location of `app.asar` for an installation path.
    ///
    /// On Windows the installation path names the executable, so the archive is
    /// resolved against its parent directory.
    pub fn archive_path(&self, install_path: &Path) -> PathBuf {
        match self.platform {
            Platform::MacOs => install_path
                .join("Contents")
                .join("Resources")
                .join(ARCHIVE_FILE_NAME),
            Platform::Windows => install_path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("resources")
                .join(ARCHIVE_FILE_NAME),
            Platform::Linux => install_path.join("resources").join(ARCHIVE_FILE_NAME),
        }
    }

    pub fn requires_code_signing(&self) -> bool {
        self.platform == Platform::MacOs
    }

    pub fn quarantine_command(&self) -> QuarantineCommand {
        match self.platform {
            Platform::MacOs => QuarantineCommand::Xattr,
            Platform::Windows => QuarantineCommand::UnblockFile,
            Platform::Linux => QuarantineCommand::None,
        }
    }

    /// Whether path arguments with spaces must be quoted for the child process.
    pub fn quotes_path_args(&self) -> bool {
        self.platform == Platform::Windows
    }

    /// Name searched on PATH to decide whether a runtime is installed.
    pub fn runtime_probe_name(&self, runtime: JsRuntime) -> &'static str {
        match (self.platform, runtime) {
            (Platform::Windows, JsRuntime::Bun) => "bun.exe",
            (Platform::Windows, JsRuntime::Npm) => "npm.cmd",
            (_, JsRuntime::Bun) => "bun",
            (_, JsRuntime::Npm) => "npm",
        }
    }

    /// Program used for the runtime's "execute package" form.
    pub fn package_exec_program(&self, runtime: JsRuntime) -> &'static str {
        match (self.platform, runtime) {
            (Platform::Windows, JsRuntime::Bun) => "bunx.exe",
            (Platform::Windows, JsRuntime::Npm) => "npx.cmd",
            (_, JsRuntime::Bun) => "bunx",
            (_, JsRuntime::Npm) => "npx",
        }
    }
}
