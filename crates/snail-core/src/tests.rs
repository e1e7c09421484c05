use std::fs;
use std::path::{Path, PathBuf};

use super::*;

fn all_platforms() -> [Platform; 3] {
    [Platform::MacOs, Platform::Windows, Platform::Linux]
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().expect("fixture path must have parent"))
        .expect("must create fixture parent");
    fs::write(path, b"asar").expect("must write fixture");
}

#[test]
fn platform_parse_accepts_supported_identifiers() {
    assert_eq!(Platform::parse("darwin").expect("darwin"), Platform::MacOs);
    assert_eq!(Platform::parse("macos").expect("macos"), Platform::MacOs);
    assert_eq!(Platform::parse("Windows").expect("windows"), Platform::Windows);
    assert_eq!(Platform::parse(" linux ").expect("linux"), Platform::Linux);
}

#[test]
fn platform_parse_rejects_other_identifiers() {
    for input in ["freebsd", "android", ""] {
        let err = Platform::parse(input).expect_err("unsupported platform must fail");
        assert!(
            matches!(err, PatchError::UnsupportedPlatform { ref platform } if platform == input),
            "unexpected error: {err}"
        );
    }
}

#[test]
fn profile_from_identifier_fails_for_unsupported_platform() {
    let err = PlatformProfile::from_identifier("plan9").expect_err("must fail");
    assert_eq!(err.kind(), "unsupported-platform");
    assert_eq!(err.to_string(), "unsupported operating system: plan9");
}

#[test]
fn archive_path_macos_uses_bundle_layout() {
    let profile = PlatformProfile::new(Platform::MacOs);
    assert_eq!(
        profile.archive_path(Path::new("/Applications/Slack.app")),
        PathBuf::from("/Applications/Slack.app/Contents/Resources/app.asar")
    );
}

#[test]
fn archive_path_windows_resolves_next_to_executable() {
    let profile = PlatformProfile::new(Platform::Windows);
    assert_eq!(
        profile.archive_path(Path::new("/opt/Slack/slack.exe")),
        PathBuf::from("/opt/Slack/resources/app.asar")
    );
}

#[test]
fn archive_path_linux_uses_resources_dir() {
    let profile = PlatformProfile::new(Platform::Linux);
    assert_eq!(
        profile.archive_path(Path::new("/usr/lib/slack")),
        PathBuf::from("/usr/lib/slack/resources/app.asar")
    );
}

#[test]
fn only_macos_requires_code_signing() {
    for platform in all_platforms() {
        assert_eq!(
            PlatformProfile::new(platform).requires_code_signing(),
            platform == Platform::MacOs
        );
    }
}

#[test]
fn only_windows_quotes_path_args() {
    for platform in all_platforms() {
        assert_eq!(
            PlatformProfile::new(platform).quotes_path_args(),
            platform == Platform::Windows
        );
    }
}

#[test]
fn runtime_names_carry_windows_extensions() {
    let windows = PlatformProfile::new(Platform::Windows);
    assert_eq!(windows.runtime_probe_name(JsRuntime::Bun), "bun.exe");
    assert_eq!(windows.runtime_probe_name(JsRuntime::Npm), "npm.cmd");
    assert_eq!(windows.package_exec_program(JsRuntime::Npm), "npx.cmd");

    let linux = PlatformProfile::new(Platform::Linux);
    assert_eq!(linux.runtime_probe_name(JsRuntime::Bun), "bun");
    assert_eq!(linux.package_exec_program(JsRuntime::Bun), "bunx");
}

#[test]
fn quarantine_command_per_platform() {
    assert_eq!(
        PlatformProfile::new(Platform::MacOs).quarantine_command(),
        QuarantineCommand::Xattr
    );
    assert_eq!(
        PlatformProfile::new(Platform::Windows).quarantine_command(),
        QuarantineCommand::UnblockFile
    );
    assert_eq!(
        PlatformProfile::new(Platform::Linux).quarantine_command(),
        QuarantineCommand::None
    );
}

#[test]
fn verify_installation_true_when_archive_exists() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let profile = PlatformProfile::new(Platform::Linux);
    touch(&profile.archive_path(dir.path()));

    assert!(verify_installation(&profile, dir.path()));
}

#[test]
fn verify_installation_false_when_archive_missing() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    for platform in all_platforms() {
        let profile = PlatformProfile::new(platform);
        assert!(!verify_installation(&profile, &dir.path().join("Slack.app")));
    }
}

#[test]
fn verify_installation_false_when_stat_fails_for_other_reasons() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let not_a_dir = dir.path().join("slack");
    fs::write(&not_a_dir, b"plain file").expect("must write fixture");

    let profile = PlatformProfile::new(Platform::Linux);
    assert!(!verify_installation(&profile, &not_a_dir));
}

#[test]
fn locate_archive_reports_invalid_target() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let target = InstallationTarget::new(PlatformProfile::new(Platform::MacOs), dir.path());

    let err = target.locate_archive().expect_err("missing archive must fail");
    assert_eq!(err.kind(), "invalid-target");
}

#[test]
fn locate_archive_rejects_directory_archive() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let target = InstallationTarget::new(PlatformProfile::new(Platform::Linux), dir.path());
    fs::create_dir_all(target.archive_path()).expect("must create archive directory");

    assert!(target.is_installed(), "plain stat still sees the install");
    let err = target
        .locate_archive()
        .expect_err("directory archive must be rejected");
    assert_eq!(err.kind(), "invalid-target");
}

#[test]
fn locate_archive_returns_existing_path() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let install = dir.path().join("Slack.app");
    let target = InstallationTarget::new(PlatformProfile::new(Platform::MacOs), &install);
    touch(&target.archive_path());

    assert_eq!(
        target.locate_archive().expect("archive must resolve"),
        install.join("Contents/Resources/app.asar")
    );
    assert!(target.is_installed());
}

#[test]
fn installation_candidates_include_home_locations() {
    let home = Path::new("/home/snail");
    let linux = installation_candidates(Platform::Linux, Some(home));
    assert_eq!(linux.first(), Some(&PathBuf::from("/usr/lib/slack")));
    assert_eq!(linux.last(), Some(&home.join(".slack")));

    let mac = installation_candidates(Platform::MacOs, None);
    assert_eq!(mac, vec![PathBuf::from("/Applications/Slack.app")]);
}

#[test]
fn detect_installation_returns_first_verified_candidate() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let profile = PlatformProfile::new(Platform::Linux);
    let missing = dir.path().join("missing");
    let second = dir.path().join("second");
    let third = dir.path().join("third");
    touch(&profile.archive_path(&second));
    touch(&profile.archive_path(&third));

    let found = detect_installation(&profile, &[missing, second.clone(), third]);
    assert_eq!(found, Some(second));
}

#[test]
fn layout_paths_follow_snail_root() {
    let layout = SnailLayout::new("/home/snail/.snail");
    assert_eq!(
        layout.backups_dir(),
        PathBuf::from("/home/snail/.snail/backups")
    );
    assert_eq!(
        layout.settings_path(),
        PathBuf::from("/home/snail/.snail/installer/settings.json")
    );
}

#[test]
fn load_settings_defaults_when_file_missing() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let settings =
        load_settings(&dir.path().join("settings.json")).expect("missing file must default");
    assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
}

#[test]
fn load_settings_reads_server_url_key() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"ServerURL":"http://localhost:8080"}"#).expect("must write settings");

    let settings = load_settings(&path).expect("settings must load");
    assert_eq!(settings.server_url, "http://localhost:8080");
}

#[test]
fn load_settings_replaces_empty_server_url_with_default() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"ServerURL":""}"#).expect("must write settings");

    let settings = load_settings(&path).expect("settings must load");
    assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
}

#[test]
fn load_settings_rejects_malformed_json() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let path = dir.path().join("settings.json");
    fs::write(&path, "{not json").expect("must write settings");

    let err = load_settings(&path).expect_err("malformed settings must fail");
    assert_eq!(err.kind(), "io");
    assert!(err.to_string().contains("failed to parse settings file"));
}

#[test]
fn save_settings_creates_parent_dirs_and_persists() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let layout = SnailLayout::new(dir.path().join(".snail"));
    let settings = Settings {
        server_url: "https://mirror.example.test".to_string(),
    };

    save_settings(&layout.settings_path(), &settings).expect("settings must save");

    let raw = fs::read_to_string(layout.settings_path()).expect("must read settings");
    assert!(raw.contains("\"ServerURL\": \"https://mirror.example.test\""));
    assert_eq!(
        load_settings(&layout.settings_path()).expect("settings must reload"),
        settings
    );
}
