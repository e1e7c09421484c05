use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use snail_core::{IoResultExt, PatchError, Result};
use tracing::info;

use crate::fs_utils::copy_file;

pub const INJECT_SCRIPT_FILE: &str = "inject.js";
pub const INJECT_ASSET_PATH: &str = "assets/inject.js";
pub const ROOT_ENTRY_MODULE: &str = "index.js";
pub const LOADER_LINE: &str = "require('./inject.js');\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPatch {
    /// `index.js` now loads the injected script.
    RootLoader(PathBuf),
    /// The bundle now starts with the full injected script.
    InlinedBundle(PathBuf),
}

impl EntryPatch {
    pub fn path(&self) -> &Path {
        match self {
            Self::RootLoader(path) | Self::InlinedBundle(path) => path,
        }
    }
}

pub fn bundled_entry_module(tree: &Path) -> PathBuf {
    tree.join("dist").join("main.bundle.cjs")
}

pub fn inject_script_url(server_url: &str) -> String {
    format!("{}/{INJECT_ASSET_PATH}", server_url.trim_end_matches('/'))
}

/// No request timeout: a download blocks until the body arrives or the connection drops.
pub fn default_http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("snail/", env!("CARGO_PKG_VERSION")))
        .timeout(None::<Duration>)
        .build()
        .map_err(|err| PatchError::Network {
            url: String::new(),
            message: format!("failed to build http client: {err}"),
        })
}

pub fn download_inject_script(client: &Client, server_url: &str, dest: &Path) -> Result<()> {
    let url = inject_script_url(server_url);
    let network_error = |message: String| PatchError::Network {
        url: url.clone(),
        message,
    };

    let response = client
        .get(&url)
        .send()
        .map_err(|err| network_error(err.to_string()))?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(network_error(format!("unexpected status {status}")));
    }
    let body = response
        .bytes()
        .map_err(|err| network_error(format!("failed reading body: {err}")))?;

    fs::write(dest, &body).with_path_context(|| format!("failed to write {}", dest.display()))?;
    info!(url = %url, bytes = body.len(), "downloaded inject script");
    Ok(())
}

pub fn install_inject_script(script_path: &Path, tree: &Path) -> Result<PathBuf> {
    let dest = tree.join(INJECT_SCRIPT_FILE);
    copy_file(script_path, &dest)?;
    Ok(dest)
}

/// Rewrites the entry module of an extracted tree so the injected script runs first.
///
/// Not idempotent: running it twice prepends twice, so every call must see a
/// fresh extraction.
pub fn patch_entry_module(tree: &Path) -> Result<EntryPatch> {
    let root_entry = tree.join(ROOT_ENTRY_MODULE);
    if root_entry.is_file() {
        let original = fs::read(&root_entry)
            .with_path_context(|| format!("failed to read {}", root_entry.display()))?;
        let mut patched = Vec::with_capacity(LOADER_LINE.len() + original.len());
        patched.extend_from_slice(LOADER_LINE.as_bytes());
        patched.extend_from_slice(&original);
        fs::write(&root_entry, patched)
            .with_path_context(|| format!("failed to write {}", root_entry.display()))?;
        info!(path = %root_entry.display(), "entry module now loads inject script");
        return Ok(EntryPatch::RootLoader(root_entry));
    }

    let bundle = bundled_entry_module(tree);
    let original = fs::read(&bundle)
        .with_path_context(|| format!("failed to read {}", bundle.display()))?;
    let script_path = tree.join(INJECT_SCRIPT_FILE);
    let script = fs::read(&script_path)
        .with_path_context(|| format!("failed to read {}", script_path.display()))?;

    let mut patched = Vec::with_capacity(script.len() + 1 + original.len());
    patched.extend_from_slice(&script);
    if !script.ends_with(b"\n") {
        patched.push(b'\n');
    }
    patched.extend_from_slice(&original);
    fs::write(&bundle, patched)
        .with_path_context(|| format!("failed to write {}", bundle.display()))?;
    info!(path = %bundle.display(), "inject script inlined into bundle");
    Ok(EntryPatch::InlinedBundle(bundle))
}
