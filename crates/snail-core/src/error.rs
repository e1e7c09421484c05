use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = PatchError> = std::result::Result<T, E>;

/// Failures surfaced by the patch pipeline and its collaborators.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("invalid Slack installation: no app.asar found for {}", path.display())]
    InvalidTarget { path: PathBuf },

    #[error("unsupported operating system: {platform}")]
    UnsupportedPlatform { platform: String },

    #[error("archive not found at {}", path.display())]
    ArchiveNotFound { path: PathBuf },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to download {url}: {message}")]
    Network { url: String, message: String },

    #[error("{context}: `{command}` exited with status={status} output='{output}'")]
    ExternalTool {
        context: String,
        command: String,
        status: String,
        output: String,
    },

    #[error("no JavaScript runtime (bun or npm) found in PATH")]
    MissingRuntime,

    #[error("{operation} is not implemented yet")]
    NotImplemented { operation: &'static str },
}

impl PatchError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Short machine-friendly label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTarget { .. } => "invalid-target",
            Self::UnsupportedPlatform { .. } => "unsupported-platform",
            Self::ArchiveNotFound { .. } => "archive-not-found",
            Self::Io { .. } => "io",
            Self::Network { .. } => "network",
            Self::ExternalTool { .. } => "external-tool",
            Self::MissingRuntime => "missing-runtime",
            Self::NotImplemented { .. } => "not-implemented",
        }
    }
}

/// Mirrors `anyhow::Context` for io results so call sites read the same way.
pub trait IoResultExt<T> {
    fn with_path_context<F, S>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context<F, S>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| PatchError::io(context(), source))
    }
}
