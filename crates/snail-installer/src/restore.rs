use std::path::Path;

use snail_core::{InstallationTarget, PatchError, Result};
use tracing::warn;

pub fn restore_backup(backup: &Path, target: &InstallationTarget) -> Result<()> {
    warn!(
        backup = %backup.display(),
        target = %target.path().display(),
        "restore requested but not implemented"
    );
    Err(PatchError::NotImplemented {
        operation: "restore",
    })
}
