use std::io::IsTerminal;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{ProgressBar, ProgressStyle};
use snail_installer::{EntryPatch, PatchReport, PatchStage};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct StageProgress {
    style: OutputStyle,
    spinner: Option<ProgressBar>,
    started_at: Instant,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        if let Some(line) = render_section_header(self.style, title) {
            println!();
            println!("{}", colorize(section_style(), &line));
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    pub(crate) fn start_stages(self) -> StageProgress {
        let spinner = if self.style == OutputStyle::Rich {
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg} {elapsed}") {
                spinner.set_style(style.tick_chars(".oO@* "));
            }
            spinner.enable_steady_tick(Duration::from_millis(80));
            Some(spinner)
        } else {
            None
        };

        StageProgress {
            style: self.style,
            spinner,
            started_at: Instant::now(),
        }
    }
}

impl StageProgress {
    pub(crate) fn enter(&mut self, stage: PatchStage) {
        match &self.spinner {
            Some(spinner) => spinner.set_message(stage.description()),
            None => println!("{}", render_stage_line(self.style, stage)),
        }
    }

    pub(crate) fn finish_success(mut self) {
        let Some(spinner) = self.spinner.take() else {
            return;
        };
        spinner.finish_and_clear();
        println!(
            "{} patched in {}",
            colorize(progress_label_style(), "patch"),
            format_elapsed(self.started_at.elapsed())
        );
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

pub(crate) fn output_style_for(is_terminal: bool, no_color: bool) -> OutputStyle {
    if is_terminal && !no_color {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    output_style_for(
        std::io::stdout().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    )
}

pub(crate) fn current_error_style() -> OutputStyle {
    output_style_for(
        std::io::stderr().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    )
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "error" => "[ERROR]",
        "step" => "[..]",
        _ => "[INFO]",
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

/// Failures always carry the `[ERROR]` badge, colored only on a terminal.
pub(crate) fn render_error_line(style: OutputStyle, message: &str) -> String {
    match style {
        OutputStyle::Plain => format!("[ERROR] {message}"),
        OutputStyle::Rich => format!("{} {message}", colorize(error_style(), "[ERROR]")),
    }
}

pub(crate) fn render_stage_line(style: OutputStyle, stage: PatchStage) -> String {
    match style {
        OutputStyle::Plain => format!("{}: {}", stage.as_str(), stage.description()),
        OutputStyle::Rich => render_status_line(style, "step", stage.description()),
    }
}

pub(crate) fn format_patch_report_lines(report: &PatchReport, style: OutputStyle) -> Vec<String> {
    let entry = match &report.entry_patch {
        EntryPatch::RootLoader(path) => format!("entry module: {} (loader)", path.display()),
        EntryPatch::InlinedBundle(path) => format!("entry module: {} (inlined)", path.display()),
    };
    let short_sha = report.backup.sha256.get(..12).unwrap_or(&report.backup.sha256);

    let mut lines = vec![
        render_status_line(
            style,
            "ok",
            &format!("patched {}", report.archive_path.display()),
        ),
        render_status_line(
            style,
            "info",
            &format!(
                "backup: {} (sha256 {short_sha})",
                report.backup.path.display()
            ),
        ),
        render_status_line(
            style,
            "info",
            &format!("runtime: {}", report.runtime.as_str()),
        ),
        render_status_line(style, "info", &entry),
    ];
    lines.extend(
        report
            .warnings
            .iter()
            .map(|warning| render_status_line(style, "warn", warning)),
    );
    lines.push(render_status_line(
        style,
        "ok",
        "restart Slack to load Snail",
    ));
    lines
}

fn render_section_header(style: OutputStyle, title: &str) -> Option<String> {
    match style {
        OutputStyle::Plain => None,
        OutputStyle::Rich => Some(format!("== {title} ==")),
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn progress_label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn error_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightRed.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
