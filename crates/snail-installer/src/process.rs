use std::path::Path;
use std::process::Command;

use snail_core::{PatchError, PlatformProfile, Result};
use tracing::debug;

pub fn run_command(command: &mut Command, context_message: &str) -> Result<()> {
    let rendered = describe_command(command);
    debug!(command = %rendered, "running external tool");
    let output = command.output().map_err(|err| {
        PatchError::io(
            format!("{context_message}: command failed to start: {rendered}"),
            err,
        )
    })?;
    if output.status.success() {
        return Ok(());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = [stdout.trim(), stderr.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    Err(PatchError::ExternalTool {
        context: context_message.to_string(),
        command: rendered,
        status: output.status.to_string(),
        output: combined,
    })
}

pub fn describe_command(command: &Command) -> String {
    let mut rendered = command.get_program().to_string_lossy().into_owned();
    for arg in command.get_args() {
        rendered.push(' ');
        rendered.push_str(&arg.to_string_lossy());
    }
    rendered
}

/// Appends a path argument, quoting it where the profile's shell would split on spaces.
pub(crate) fn push_path_arg(command: &mut Command, profile: &PlatformProfile, path: &Path) {
    if !profile.quotes_path_args() || !path.to_string_lossy().contains(char::is_whitespace) {
        command.arg(path);
        return;
    }

    let quoted = format!("\"{}\"", path.display());
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.raw_arg(quoted);
    }
    #[cfg(not(windows))]
    {
        command.arg(quoted);
    }
}

pub(crate) fn escape_ps_single_quote(path: &Path) -> String {
    path.display().to_string().replace('\'', "''")
}
