use std::path::{Path, PathBuf};
use std::process::Command;

use reqwest::blocking::Client;
use snail_core::{
    InstallationTarget, IoResultExt, JsRuntime, PatchError, PlatformProfile, Result, SnailLayout,
};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::archive::{extract_archive_with_runner, pack_archive_with_runner};
use crate::backup::{backup_archive, BackupRecord};
use crate::fs_utils::copy_file;
use crate::inject::{
    default_http_client, download_inject_script, install_inject_script, patch_entry_module,
    EntryPatch, INJECT_SCRIPT_FILE,
};
use crate::process::run_command;
use crate::runtime::{is_on_search_path, probe_runtime_with};
use crate::trust::{
    clear_quarantine_with_runner, code_sign_with_runner, remove_integrity_fuse_with_runner,
};

const WORKDIR_PREFIX: &str = "snail-install-";
const EXTRACTED_DIR: &str = "app-unpacked";
const REPACKED_ARCHIVE: &str = "app-new.asar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStage {
    Verify,
    CreateTempDir,
    LocateArchive,
    Backup,
    ProbeRuntime,
    Extract,
    DownloadInject,
    CopyInject,
    PatchEntryModule,
    Repack,
    ReplaceOriginal,
    Cleanup,
    RestoreTrust,
    RemoveFuse,
    ClearQuarantine,
    Done,
}

impl PatchStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::CreateTempDir => "create-temp-dir",
            Self::LocateArchive => "locate-archive",
            Self::Backup => "backup",
            Self::ProbeRuntime => "probe-runtime",
            Self::Extract => "extract",
            Self::DownloadInject => "download-inject",
            Self::CopyInject => "copy-inject",
            Self::PatchEntryModule => "patch-entry-module",
            Self::Repack => "repack",
            Self::ReplaceOriginal => "replace-original",
            Self::Cleanup => "cleanup",
            Self::RestoreTrust => "restore-trust",
            Self::RemoveFuse => "remove-fuse",
            Self::ClearQuarantine => "clear-quarantine",
            Self::Done => "done",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Verify => "verifying Slack installation",
            Self::CreateTempDir => "creating working directory",
            Self::LocateArchive => "locating app.asar",
            Self::Backup => "backing up app.asar",
            Self::ProbeRuntime => "looking for bun or npm",
            Self::Extract => "extracting app.asar",
            Self::DownloadInject => "downloading inject.js",
            Self::CopyInject => "copying inject.js into the app",
            Self::PatchEntryModule => "patching the entry module",
            Self::Repack => "repacking app.asar",
            Self::ReplaceOriginal => "replacing the original app.asar",
            Self::Cleanup => "removing working directory",
            Self::RestoreTrust => "restoring app trust",
            Self::RemoveFuse => "disabling the asar integrity fuse",
            Self::ClearQuarantine => "clearing quarantine",
            Self::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub target: InstallationTarget,
    pub server_url: String,
    pub clear_quarantine: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchReport {
    pub archive_path: PathBuf,
    pub backup: BackupRecord,
    pub runtime: JsRuntime,
    pub entry_patch: EntryPatch,
    pub warnings: Vec<String>,
}

/// Temporary tree owned by one run: extracted app, downloaded script, repacked archive.
#[derive(Debug)]
pub struct WorkingDirectory {
    dir: TempDir,
}

impl WorkingDirectory {
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()
            .with_path_context(|| "failed to create temporary directory")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.path().join(EXTRACTED_DIR)
    }

    pub fn inject_script_path(&self) -> PathBuf {
        self.path().join(INJECT_SCRIPT_FILE)
    }

    pub fn repacked_archive_path(&self) -> PathBuf {
        self.path().join(REPACKED_ARCHIVE)
    }

    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

struct StagedPatch {
    archive_path: PathBuf,
    backup: BackupRecord,
    runtime: JsRuntime,
    entry_patch: EntryPatch,
}

pub fn run_patch<OnStage>(
    layout: &SnailLayout,
    request: &PatchRequest,
    on_stage: OnStage,
) -> Result<PatchReport>
where
    OnStage: FnMut(PatchStage),
{
    let client = default_http_client()?;
    run_patch_with_hooks(
        layout,
        request,
        &client,
        is_on_search_path,
        run_command,
        on_stage,
    )
}

/// Runs every stage in order and stops at the first failure. Nothing is rolled
/// back; the backup taken up front is the only recovery path.
pub fn run_patch_with_hooks<Lookup, RunCommand, OnStage>(
    layout: &SnailLayout,
    request: &PatchRequest,
    client: &Client,
    lookup: Lookup,
    mut run: RunCommand,
    mut on_stage: OnStage,
) -> Result<PatchReport>
where
    Lookup: Fn(&str) -> bool,
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
    OnStage: FnMut(PatchStage),
{
    let target = &request.target;
    let profile = target.profile();

    enter_stage(&mut on_stage, PatchStage::Verify);
    if !target.is_installed() {
        return Err(PatchError::InvalidTarget {
            path: target.path().to_path_buf(),
        });
    }

    enter_stage(&mut on_stage, PatchStage::CreateTempDir);
    let workdir = WorkingDirectory::create()?;
    info!(dir = %workdir.path().display(), "created working directory");

    let staged = stage_patched_archive(
        layout,
        request,
        &workdir,
        client,
        &lookup,
        &mut run,
        &mut on_stage,
    );

    enter_stage(&mut on_stage, PatchStage::Cleanup);
    let mut warnings = Vec::new();
    let workdir_path = workdir.path().to_path_buf();
    match workdir.close() {
        Ok(()) => info!(dir = %workdir_path.display(), "removed working directory"),
        Err(err) => {
            warn!(dir = %workdir_path.display(), error = %err, "failed to remove working directory");
            warnings.push(format!(
                "failed to remove temporary directory {}: {err}",
                workdir_path.display()
            ));
        }
    }

    if let Err(err) = &staged {
        warn!(kind = err.kind(), error = %err, "patch aborted");
    }
    let staged = staged?;

    enter_stage(&mut on_stage, PatchStage::RestoreTrust);
    if profile.requires_code_signing() {
        code_sign_with_runner(target.path(), &mut run)?;
        info!(app = %target.path().display(), "code signed app");
    }

    enter_stage(&mut on_stage, PatchStage::RemoveFuse);
    remove_integrity_fuse_with_runner(&profile, staged.runtime, target.path(), &mut run)?;

    if request.clear_quarantine {
        enter_stage(&mut on_stage, PatchStage::ClearQuarantine);
        if let Err(err) = clear_quarantine_with_runner(&profile, target.path(), &mut run) {
            warn!(error = %err, "quarantine could not be cleared");
            warnings.push(err.to_string());
        }
    }

    enter_stage(&mut on_stage, PatchStage::Done);
    Ok(PatchReport {
        archive_path: staged.archive_path,
        backup: staged.backup,
        runtime: staged.runtime,
        entry_patch: staged.entry_patch,
        warnings,
    })
}

fn stage_patched_archive<Lookup, RunCommand, OnStage>(
    layout: &SnailLayout,
    request: &PatchRequest,
    workdir: &WorkingDirectory,
    client: &Client,
    lookup: &Lookup,
    run: &mut RunCommand,
    on_stage: &mut OnStage,
) -> Result<StagedPatch>
where
    Lookup: Fn(&str) -> bool,
    RunCommand: FnMut(&mut Command, &str) -> Result<()>,
    OnStage: FnMut(PatchStage),
{
    let profile: PlatformProfile = request.target.profile();

    enter_stage(on_stage, PatchStage::LocateArchive);
    let archive_path = request.target.locate_archive()?;
    info!(archive = %archive_path.display(), "using app.asar");

    enter_stage(on_stage, PatchStage::Backup);
    let backup = backup_archive(layout, &archive_path)?;

    enter_stage(on_stage, PatchStage::ProbeRuntime);
    let runtime = probe_runtime_with(&profile, lookup).require()?;
    info!(runtime = runtime.as_str(), "using package runner");

    enter_stage(on_stage, PatchStage::Extract);
    let tree = workdir.extracted_dir();
    extract_archive_with_runner(&profile, runtime, &archive_path, &tree, &mut *run)?;

    enter_stage(on_stage, PatchStage::DownloadInject);
    let script = workdir.inject_script_path();
    download_inject_script(client, &request.server_url, &script)?;

    enter_stage(on_stage, PatchStage::CopyInject);
    install_inject_script(&script, &tree)?;

    enter_stage(on_stage, PatchStage::PatchEntryModule);
    let entry_patch = patch_entry_module(&tree)?;

    enter_stage(on_stage, PatchStage::Repack);
    let repacked = workdir.repacked_archive_path();
    pack_archive_with_runner(&profile, runtime, &tree, &repacked, &mut *run)?;

    enter_stage(on_stage, PatchStage::ReplaceOriginal);
    copy_file(&repacked, &archive_path)?;
    info!(archive = %archive_path.display(), "replaced original app.asar");

    Ok(StagedPatch {
        archive_path,
        backup,
        runtime,
        entry_patch,
    })
}

fn enter_stage<OnStage>(on_stage: &mut OnStage, stage: PatchStage)
where
    OnStage: FnMut(PatchStage),
{
    info!(stage = stage.as_str(), "{}", stage.description());
    on_stage(stage);
}
