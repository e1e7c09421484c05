use std::fs;
use std::path::Path;
use std::process::Command;

use snail_core::{IoResultExt, JsRuntime, PlatformProfile, Result};

use crate::fs_utils::remove_file_if_exists;
use crate::process::{push_path_arg, run_command};

const ASAR_PACKAGE: &str = "asar";

pub(crate) fn build_asar_extract_command(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    archive_path: &Path,
    dest_dir: &Path,
) -> Command {
    let mut command = Command::new(profile.package_exec_program(runtime));
    command.arg(ASAR_PACKAGE).arg("extract");
    push_path_arg(&mut command, profile, archive_path);
    push_path_arg(&mut command, profile, dest_dir);
    command
}

pub(crate) fn build_asar_pack_command(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    src_dir: &Path,
    archive_path: &Path,
) -> Command {
    let mut command = Command::new(profile.package_exec_program(runtime));
    command.arg(ASAR_PACKAGE).arg("pack");
    push_path_arg(&mut command, profile, src_dir);
    push_path_arg(&mut command, profile, archive_path);
    command
}

pub fn extract_archive(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<()> {
    extract_archive_with_runner(profile, runtime, archive_path, dest_dir, run_command)
}

/// Unpacks into a freshly created `dest_dir`; anything already there is discarded.
pub fn extract_archive_with_runner<RunCommand>(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    archive_path: &Path,
    dest_dir: &Path,
    mut run: RunCommand,
) -> Result<()>
where
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
{
    if dest_dir.exists() {
        fs::remove_dir_all(dest_dir)
            .with_path_context(|| format!("failed to clear {}", dest_dir.display()))?;
    }
    fs::create_dir_all(dest_dir)
        .with_path_context(|| format!("failed to create {}", dest_dir.display()))?;

    let mut command = build_asar_extract_command(profile, runtime, archive_path, dest_dir);
    run(&mut command, "failed to unpack asar")
}

pub fn pack_archive(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    src_dir: &Path,
    archive_path: &Path,
) -> Result<()> {
    pack_archive_with_runner(profile, runtime, src_dir, archive_path, run_command)
}

pub fn pack_archive_with_runner<RunCommand>(
    profile: &PlatformProfile,
    runtime: JsRuntime,
    src_dir: &Path,
    archive_path: &Path,
    mut run: RunCommand,
) -> Result<()>
where
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
{
    remove_file_if_exists(archive_path).with_path_context(|| {
        format!(
            "failed to remove existing archive before packing: {}",
            archive_path.display()
        )
    })?;

    let mut command = build_asar_pack_command(profile, runtime, src_dir, archive_path);
    run(&mut command, "failed to pack asar")
}
