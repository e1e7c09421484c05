use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use snail_core::{IoResultExt, PatchError, Result, SnailLayout};
use tracing::{debug, info, warn};

use crate::fs_utils::sha256_file;

const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub source: PathBuf,
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// `app.asar` at 2026-01-02 03:04:05 becomes `app-backup-20260102-030405.asar`.
pub fn backup_file_name(archive_path: &Path, created_at: &DateTime<Local>) -> String {
    let stem = archive_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "app".to_string());
    let timestamp = created_at.format(BACKUP_TIMESTAMP_FORMAT);
    match archive_path.extension() {
        Some(ext) => format!("{stem}-backup-{timestamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}-backup-{timestamp}"),
    }
}

pub fn backup_archive(layout: &SnailLayout, archive_path: &Path) -> Result<BackupRecord> {
    backup_archive_at(layout, archive_path, Local::now())
}

pub fn backup_archive_at(
    layout: &SnailLayout,
    archive_path: &Path,
    created_at: DateTime<Local>,
) -> Result<BackupRecord> {
    let source_metadata = match fs::metadata(archive_path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(PatchError::ArchiveNotFound {
                path: archive_path.to_path_buf(),
            })
        }
        Err(err) => {
            return Err(PatchError::io(
                format!("failed to stat {}", archive_path.display()),
                err,
            ))
        }
    };

    let backups_dir = layout.backups_dir();
    fs::create_dir_all(&backups_dir).with_path_context(|| {
        format!(
            "failed to create backup directory: {}",
            backups_dir.display()
        )
    })?;

    let backup_path = backups_dir.join(backup_file_name(archive_path, &created_at));
    let mut output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&backup_path)
        .with_path_context(|| format!("failed to create backup {}", backup_path.display()))?;

    let written = write_verified_backup(archive_path, &backup_path, &mut output, &source_metadata);
    drop(output);
    let backup_sha256 = match written {
        Ok(sha256) => sha256,
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(&backup_path) {
                warn!(
                    backup = %backup_path.display(),
                    error = %remove_err,
                    "failed to remove incomplete backup"
                );
            }
            return Err(err);
        }
    };

    info!(backup = %backup_path.display(), sha256 = %backup_sha256, "backup created");
    Ok(BackupRecord {
        source: archive_path.to_path_buf(),
        path: backup_path,
        created_at,
        sha256: backup_sha256,
    })
}

/// Copies, applies permissions and checks digests. The caller owns removal on failure.
fn write_verified_backup(
    archive_path: &Path,
    backup_path: &Path,
    output: &mut File,
    source_metadata: &fs::Metadata,
) -> Result<String> {
    let mut input = File::open(archive_path)
        .with_path_context(|| format!("failed to open {}", archive_path.display()))?;
    io::copy(&mut input, output).with_path_context(|| {
        format!(
            "failed to backup {} to {}",
            archive_path.display(),
            backup_path.display()
        )
    })?;
    fs::set_permissions(backup_path, source_metadata.permissions()).with_path_context(|| {
        format!(
            "failed to copy permissions onto backup {}",
            backup_path.display()
        )
    })?;

    let source_sha256 = sha256_file(archive_path)?;
    let backup_sha256 = sha256_file(backup_path)?;
    if source_sha256 != backup_sha256 {
        return Err(PatchError::io(
            format!(
                "backup verification failed: {} does not match {}",
                backup_path.display(),
                archive_path.display()
            ),
            io::Error::from(io::ErrorKind::InvalidData),
        ));
    }
    Ok(backup_sha256)
}

/// Lists whatever lives in the backup root. Never fails: an absent or unreadable
/// root is simply an empty listing, and unreadable entries are skipped.
pub fn list_backups(layout: &SnailLayout) -> Vec<BackupEntry> {
    let backups_dir = layout.backups_dir();
    let entries = match fs::read_dir(&backups_dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %backups_dir.display(), error = %err, "backup root not readable");
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|metadata| metadata.modified());
            match modified {
                Ok(modified) => Some(BackupEntry {
                    path: entry.path(),
                    modified,
                }),
                Err(err) => {
                    debug!(path = %entry.path().display(), error = %err, "skipping backup entry");
                    None
                }
            }
        })
        .collect()
}

pub fn sort_newest_first(entries: &mut [BackupEntry]) {
    entries.sort_by(|left, right| {
        right
            .modified
            .cmp(&left.modified)
            .then_with(|| right.path.cmp(&left.path))
    });
}
