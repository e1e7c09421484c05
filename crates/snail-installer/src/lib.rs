mod archive;
mod backup;
mod fs_utils;
mod inject;
mod pipeline;
mod process;
mod restore;
mod runtime;
mod trust;

pub use archive::{
    extract_archive, extract_archive_with_runner, pack_archive, pack_archive_with_runner,
};
pub use backup::{
    backup_archive, backup_archive_at, backup_file_name, list_backups, sort_newest_first,
    BackupEntry, BackupRecord,
};
pub use fs_utils::sha256_file;
pub use inject::{
    bundled_entry_module, default_http_client, download_inject_script, inject_script_url,
    install_inject_script, patch_entry_module, EntryPatch, INJECT_ASSET_PATH, INJECT_SCRIPT_FILE,
    LOADER_LINE, ROOT_ENTRY_MODULE,
};
pub use pipeline::{
    run_patch, run_patch_with_hooks, PatchReport, PatchRequest, PatchStage, WorkingDirectory,
};
pub use process::{describe_command, run_command};
pub use restore::restore_backup;
pub use runtime::{is_on_search_path, probe_runtime, probe_runtime_with, RuntimeProbe};
pub use trust::{
    clear_quarantine, clear_quarantine_with_runner, code_sign, code_sign_with_runner,
    remove_integrity_fuse, remove_integrity_fuse_with_runner, FUSES_PACKAGE, INTEGRITY_FUSE,
    QUARANTINE_ATTRIBUTE,
};
