use std::path::Path;
use std::process::Command;

use snail_core::{JsRuntime, PlatformProfile, QuarantineCommand, Result};

use crate::process::{escape_ps_single_quote, push_path_arg, run_command};

pub const INTEGRITY_FUSE: &str = "EnableEmbeddedAsarIntegrityValidation";
pub const FUSES_PACKAGE: &str = "@electron/fuses";
pub const QUARANTINE_ATTRIBUTE: &str = "com.apple.quarantine";

pub(crate) fn build_code_sign_command(app_path: &Path) -> Command {
    let mut command = Command::new("codesign");
    command
        .arg("--force")
        .arg("--sign")
        .arg("-")
        .arg("--deep")
        .arg("--preserve-metadata=identifier,entitlements")
        .arg(app_path);
    command
}

pub(crate) fn build_fuse_write_command(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    target: &Path,
) -> Command {
    let mut command = Command::new(profile.package_exec_program(runtime));
    command.arg(FUSES_PACKAGE).arg("write").arg("--app");
    push_path_arg(&mut command, profile, target);
    command.arg(format!("{INTEGRITY_FUSE}=off"));
    command
}

pub(crate) fn build_quarantine_command(profile: &PlatformProfile, target: &Path) -> Option<Command> {
    match profile.quarantine_command() {
        QuarantineCommand::Xattr => {
            let mut command = Command::new("xattr");
            command.arg("-d").arg(QUARANTINE_ATTRIBUTE).arg(target);
            Some(command)
        }
        QuarantineCommand::UnblockFile => {
            let mut command = Command::new("powershell");
            command.arg("-NoProfile").arg("-Command").arg(format!(
                "Unblock-File -Path '{}'",
                escape_ps_single_quote(target)
            ));
            Some(command)
        }
        QuarantineCommand::None => None,
    }
}

pub fn code_sign(app_path: &Path) -> Result<()> {
    code_sign_with_runner(app_path, run_command)
}

/// Ad-hoc deep re-signature that keeps the bundle identifier and entitlements.
pub fn code_sign_with_runner<RunCommand>(app_path: &Path, mut run: RunCommand) -> Result<()>
where
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
{
    let mut command = build_code_sign_command(app_path);
    run(&mut command, "failed to code sign app")
}

pub fn remove_integrity_fuse(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    target: &Path,
) -> Result<()> {
    remove_integrity_fuse_with_runner(profile, runtime, target, run_command)
}

pub fn remove_integrity_fuse_with_runner<RunCommand>(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    target: &Path,
    mut run: RunCommand,
) -> Result<()>
where
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
{
    let mut command = build_fuse_write_command(profile, runtime, target);
    run(&mut command, "failed to remove electron fuses")
}

pub fn clear_quarantine(profile: &PlatformProfile, target: &Path) -> Result<()> {
    clear_quarantine_with_runner(profile, target, run_command)
}

/// Returns `Ok` without running anything on platforms with no quarantine marker.
pub fn clear_quarantine_with_runner<RunCommand>(
    profile: &PlatformProfile,
    target: &Path,
    mut run: RunCommand,
) -> Result<()>
where
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
{
    let Some(mut command) = build_quarantine_command(profile, target) else {
        return Ok(());
    };
    run(&mut command, "failed to clear quarantine")
}
