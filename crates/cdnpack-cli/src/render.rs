use std::io::IsTerminal;
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use cdnpack_core::{InstalledEntry, SearchHit, UpdateCandidate};
use cdnpack_installer::SelectedFile;
use indicatif::{HumanCount, ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn resolve_output_style(stdout_is_tty: bool) -> OutputStyle {
    if stdout_is_tty {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    resolve_output_style(std::io::stdout().is_terminal())
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct TerminalProgress {
    style: OutputStyle,
    label: String,
    total: u64,
    current: u64,
    progress_bar: Option<ProgressBar>,
    started_at: Instant,
}

impl TerminalRenderer {
    pub(crate) fn current() -> Self {
        Self {
            style: current_output_style(),
        }
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        let line = render_status_line(self.style, status, message);
        match (self.style, status_badge(status)) {
            (OutputStyle::Rich, Some(badge)) => {
                let rest = line.strip_prefix(badge).unwrap_or(&line);
                println!("{}{rest}", colorize(badge_style(status), badge));
            }
            _ => println!("{line}"),
        }
    }

    pub(crate) fn start_progress(self, label: &str, total: u64) -> TerminalProgress {
        let progress_bar = if self.style == OutputStyle::Rich && total > 0 {
            let progress_bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<12} [{bar:20.cyan/blue}] {pos:>3}/{len:3} {elapsed_precise}",
            ) {
                progress_bar.set_style(style.tick_chars(".oO@* ").progress_chars("=>-"));
            }
            progress_bar.set_message(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        TerminalProgress {
            style: self.style,
            label: label.to_string(),
            total,
            current: 0,
            progress_bar,
            started_at: Instant::now(),
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

impl TerminalProgress {
    pub(crate) fn set(&mut self, current: u64, file: &str) {
        self.current = current.min(self.total);

        let Some(progress_bar) = &self.progress_bar else {
            return;
        };
        progress_bar.set_position(self.current);
        progress_bar.set_message(file.to_string());
    }

    pub(crate) fn finish_success(mut self) {
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };

        progress_bar.finish_and_clear();
        if let Some(line) = render_progress_line(
            self.style,
            &self.label,
            self.current,
            self.total,
            Some(self.started_at.elapsed()),
        ) {
            eprintln!("{line}");
        }
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

fn status_badge(status: &str) -> Option<&'static str> {
    match status {
        "ok" => Some("[OK]"),
        "warn" => Some("[WARN]"),
        "error" => Some("[ERR]"),
        "info" => Some("[INFO]"),
        _ => None,
    }
}

fn badge_style(status: &str) -> Style {
    let color = match status {
        "ok" => AnsiColor::BrightGreen,
        "warn" => AnsiColor::BrightYellow,
        "error" => AnsiColor::BrightRed,
        _ => AnsiColor::BrightBlue,
    };
    Style::new()
        .fg_color(Some(color.into()))
        .effects(Effects::BOLD)
}

/// Plain output stays unadorned; rich output gets an ASCII status badge.
pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match (style, status_badge(status)) {
        (OutputStyle::Rich, Some(badge)) => format!("{badge} {message}"),
        _ => message.to_string(),
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

fn progress_label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn progress_bar_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightBlue.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

fn render_progress_line(
    style: OutputStyle,
    label: &str,
    current: u64,
    total: u64,
    elapsed: Option<Duration>,
) -> Option<String> {
    if style == OutputStyle::Plain {
        return None;
    }

    let width = 18_usize;
    let safe_total = total.max(1);
    let bounded_current = current.min(safe_total);
    let filled = ((bounded_current as usize) * width) / (safe_total as usize);
    let bar = format!(
        "{}{}",
        "=".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    let percent = (bounded_current * 100) / safe_total;
    let counts = format!("{}/{}", HumanCount(current), HumanCount(total));
    let suffix = elapsed
        .map(|value| format!(" complete in {}", format_elapsed(value)))
        .unwrap_or_default();

    Some(format!(
        "{} [{}] {:>3}% {}{}",
        colorize(progress_label_style(), label),
        colorize(progress_bar_style(), &bar),
        percent,
        counts,
        suffix
    ))
}

pub(crate) fn format_search_lines(hits: &[SearchHit], style: OutputStyle) -> Vec<String> {
    hits.iter()
        .map(|hit| {
            let mut line = match &hit.latest_version {
                Some(version) => format!("{}@{version}", hit.name),
                None => hit.name.clone(),
            };
            if let Some(description) = hit.description.as_deref().filter(|d| !d.is_empty()) {
                line.push_str(" - ");
                line.push_str(description);
            }
            if hit.is_installed {
                line = render_status_line(style, "ok", &format!("{line} (installed)"));
            }
            line
        })
        .collect()
}

pub(crate) fn format_installed_lines(installed: &[InstalledEntry]) -> Vec<String> {
    installed
        .iter()
        .map(|entry| format!("{}@{}", entry.name, entry.version))
        .collect()
}

pub(crate) fn format_update_lines(updates: &[UpdateCandidate], style: OutputStyle) -> Vec<String> {
    updates
        .iter()
        .map(|update| {
            render_status_line(
                style,
                "warn",
                &format!(
                    "{} {} -> {}",
                    update.name, update.current_version, update.latest_version
                ),
            )
        })
        .collect()
}

pub(crate) fn format_file_lines(files: &[SelectedFile]) -> Vec<String> {
    files
        .iter()
        .map(|file| format!("{}\t{}", file.kind, file.path))
        .collect()
}
