mod error;
mod layout;
mod locator;
mod platform;
mod settings;

pub use error::{IoResultExt, PatchError, Result};
pub use layout::{default_snail_root, user_home_dir, SnailLayout};
pub use locator::{
    detect_installation, installation_candidates, verify_installation, InstallationTarget,
};
pub use platform::{JsRuntime, Platform, PlatformProfile, QuarantineCommand, ARCHIVE_FILE_NAME};
pub use settings::{load_settings, save_settings, Settings, DEFAULT_SERVER_URL};

#[cfg(test)]
mod tests;
