use std::env;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use semver::Version;
use snail_core::{
    default_snail_root, detect_installation, installation_candidates, load_settings,
    save_settings, user_home_dir, InstallationTarget, PatchError, PlatformProfile, Settings,
    SnailLayout, DEFAULT_SERVER_URL,
};
use snail_installer::{
    default_http_client, list_backups, restore_backup, run_patch, sort_newest_first, BackupEntry,
    PatchRequest,
};
use tracing::info;

use crate::completion::write_completions_script;
use crate::remote::{compare_versions, fetch_remote_info, VersionStatus};
use crate::render::{format_patch_report_lines, TerminalRenderer};
use crate::{Cli, Commands, ConfigCommands, PatchArgs, TargetArgs};

pub(crate) const SERVER_URL_ENV: &str = "SERVER_URL";

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let renderer = TerminalRenderer::current();

    match cli.command.unwrap_or(Commands::Patch(cli.patch)) {
        Commands::Patch(args) => {
            let layout = default_layout()?;
            run_patch_command(&layout, args, renderer)?;
        }
        Commands::Verify(args) => {
            let target = resolve_installation(&args)?;
            let archive = target.locate_archive()?;
            renderer.print_status(
                "ok",
                &format!(
                    "found Slack at {} (archive {})",
                    target.path().display(),
                    archive.display()
                ),
            );
        }
        Commands::Backups => {
            let layout = default_layout()?;
            let mut entries = list_backups(&layout);
            if entries.is_empty() {
                renderer.print_status(
                    "info",
                    &format!("no backups in {}", layout.backups_dir().display()),
                );
                return Ok(());
            }
            sort_newest_first(&mut entries);
            renderer.print_lines(&format_backup_lines(&entries));
        }
        Commands::Restore { backup, target } => {
            let target = resolve_installation(&target)?;
            restore_backup(&backup, &target)
                .with_context(|| format!("failed to restore {}", backup.display()))?;
        }
        Commands::Config { command } => {
            let layout = default_layout()?;
            run_config_command(&layout, command, renderer)?;
        }
        Commands::Version { server_url } => {
            let layout = default_layout()?;
            let server_url = resolve_server_url(
                server_url.as_deref(),
                env::var(SERVER_URL_ENV).ok(),
                || load_settings(&layout.settings_path()),
            )?;
            run_version_command(&server_url, renderer)?;
        }
        Commands::Completions { shell } => {
            let mut stdout = std::io::stdout();
            write_completions_script(shell, &mut stdout)?;
        }
    }

    Ok(())
}

fn default_layout() -> Result<SnailLayout> {
    Ok(SnailLayout::new(default_snail_root()?))
}

fn run_patch_command(layout: &SnailLayout, args: PatchArgs, renderer: TerminalRenderer) -> Result<()> {
    let target = resolve_installation(&args.target)?;
    let server_url = resolve_server_url(
        args.server_url.as_deref(),
        env::var(SERVER_URL_ENV).ok(),
        || load_settings(&layout.settings_path()),
    )?;
    let arch = args.arch.as_deref().unwrap_or(env::consts::ARCH);
    info!(
        os = target.profile().platform().as_str(),
        arch,
        server = %server_url,
        "patch requested"
    );

    renderer.print_section("patch");
    renderer.print_status(
        "info",
        &format!(
            "patching {} ({}/{arch}) from {server_url}",
            target.path().display(),
            target.profile().platform().as_str()
        ),
    );

    let install_path = target.path().to_path_buf();
    let request = PatchRequest {
        target,
        server_url,
        clear_quarantine: !args.no_clear_quarantine,
    };
    let mut progress = renderer.start_stages();
    match run_patch(layout, &request, |stage| progress.enter(stage)) {
        Ok(report) => {
            progress.finish_success();
            renderer.print_lines(&format_patch_report_lines(&report, renderer.style()));
            Ok(())
        }
        Err(err) => {
            progress.finish_abandon();
            Err(err).with_context(|| format!("failed to patch {}", install_path.display()))
        }
    }
}

fn run_config_command(
    layout: &SnailLayout,
    command: ConfigCommands,
    renderer: TerminalRenderer,
) -> Result<()> {
    let settings_path = layout.settings_path();
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(&settings_path)?;
            renderer.print_lines(&format_config_lines(
                &settings_path,
                &settings,
                env::var(SERVER_URL_ENV).ok().as_deref(),
            ));
        }
        ConfigCommands::SetServerUrl { url } => {
            let url = validate_server_url(&url)?;
            let mut settings = load_settings(&settings_path)?;
            settings.server_url = url;
            save_settings(&settings_path, &settings)?;
            renderer.print_status(
                "ok",
                &format!(
                    "server URL set to {} in {}",
                    settings.server_url,
                    settings_path.display()
                ),
            );
        }
    }
    Ok(())
}

fn run_version_command(server_url: &str, renderer: TerminalRenderer) -> Result<()> {
    let local = Version::parse(env!("CARGO_PKG_VERSION"))
        .with_context(|| "failed to parse the CLI's own version")?;
    renderer.print_status("info", &format!("snail {local}"));

    let client = default_http_client()?;
    let remote = fetch_remote_info(&client, server_url)?;
    let (status, message) = describe_version_status(&compare_versions(&local, &remote.version));
    renderer.print_status(status, &format!("{server_url}: {message}"));
    Ok(())
}

pub(crate) fn describe_version_status(status: &VersionStatus) -> (&'static str, String) {
    match status {
        VersionStatus::UpToDate => ("ok", "up to date".to_string()),
        VersionStatus::UpdateAvailable(remote) => ("warn", format!("update available: {remote}")),
        VersionStatus::Ahead(remote) => ("info", format!("server release {remote} is older")),
        VersionStatus::Unknown(tag) => ("warn", format!("server version is unknown ({tag})")),
    }
}

/// Flag, then environment, then settings file, then the built-in default.
/// Settings are only read when neither the flag nor the environment decides.
pub(crate) fn resolve_server_url<LoadSettings>(
    flag: Option<&str>,
    env_value: Option<String>,
    load_settings: LoadSettings,
) -> Result<String>
where
    LoadSettings: FnOnce() -> snail_core::Result<Settings>,
{
    let explicit = [flag.map(str::to_string), env_value]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty());
    if let Some(url) = explicit {
        return Ok(url);
    }

    let settings = load_settings()?;
    let from_settings = settings.server_url.trim();
    if from_settings.is_empty() {
        Ok(DEFAULT_SERVER_URL.to_string())
    } else {
        Ok(from_settings.to_string())
    }
}

pub(crate) fn validate_server_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let parsed =
        reqwest::Url::parse(trimmed).with_context(|| format!("invalid server URL: {trimmed}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "invalid server URL: {trimmed} (expected http or https)"
        ));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

pub(crate) fn resolve_profile(os: Option<&str>) -> Result<PlatformProfile, PatchError> {
    match os {
        Some(identifier) => PlatformProfile::from_identifier(identifier),
        None => PlatformProfile::host(),
    }
}

pub(crate) fn resolve_installation(args: &TargetArgs) -> Result<InstallationTarget> {
    let profile = resolve_profile(args.os.as_deref())?;
    if let Some(path) = &args.slack_location {
        return Ok(InstallationTarget::new(profile, path));
    }

    let home = user_home_dir();
    let candidates = installation_candidates(profile.platform(), home.as_deref());
    match detect_installation(&profile, &candidates) {
        Some(path) => {
            info!(path = %path.display(), "detected Slack installation");
            Ok(InstallationTarget::new(profile, path))
        }
        None => Err(anyhow!(
            "could not find a Slack installation (looked in {}); pass --slack-location",
            candidates
                .iter()
                .map(|candidate| candidate.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}

pub(crate) fn format_backup_lines(entries: &[BackupEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let modified: DateTime<Local> = entry.modified.into();
            format!(
                "{}  {}",
                modified.format("%Y-%m-%d %H:%M:%S"),
                entry.path.display()
            )
        })
        .collect()
}

pub(crate) fn format_config_lines(
    settings_path: &Path,
    settings: &Settings,
    env_value: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![
        format!("settings: {}", settings_path.display()),
        format!("ServerURL: {}", settings.server_url),
    ];
    if let Some(value) = env_value.map(str::trim).filter(|value| !value.is_empty()) {
        lines.push(format!("{SERVER_URL_ENV} (overrides settings): {value}"));
    }
    lines
}
