use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use semver::Version;
use serde::Deserialize;

const INFO_PATH: &str = "info.json";
const UNKNOWN_TAG: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RemoteInfo {
    pub(crate) version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VersionStatus {
    UpToDate,
    UpdateAvailable(Version),
    Ahead(Version),
    /// The server has no release tag, or one that is not semver.
    Unknown(String),
}

pub(crate) fn info_url(server_url: &str) -> String {
    format!("{}/{INFO_PATH}", server_url.trim_end_matches('/'))
}

pub(crate) fn fetch_remote_info(client: &Client, server_url: &str) -> Result<RemoteInfo> {
    let url = info_url(server_url);
    let response = client
        .get(&url)
        .send()
        .with_context(|| format!("failed to fetch {url}"))?;
    if response.status() != StatusCode::OK {
        return Err(anyhow!(
            "failed to fetch {url}: unexpected status {}",
            response.status()
        ));
    }
    let body = response
        .bytes()
        .with_context(|| format!("failed to read response body from {url}"))?;
    serde_json::from_slice(&body).with_context(|| format!("failed to parse {url}"))
}

pub(crate) fn parse_release_tag(tag: &str) -> Option<Version> {
    let trimmed = tag.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_TAG) {
        return None;
    }
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).ok()
}

pub(crate) fn compare_versions(local: &Version, remote_tag: &str) -> VersionStatus {
    let Some(remote) = parse_release_tag(remote_tag) else {
        return VersionStatus::Unknown(remote_tag.to_string());
    };
    match remote.cmp(local) {
        std::cmp::Ordering::Greater => VersionStatus::UpdateAvailable(remote),
        std::cmp::Ordering::Less => VersionStatus::Ahead(remote),
        std::cmp::Ordering::Equal => VersionStatus::UpToDate,
    }
}
