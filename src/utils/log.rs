use chrono::Local;
use colored::{ColoredString, Colorize};
use crossterm::{execute, terminal::{size, Clear, ClearType}};
use std::io::{Write, stdout};
use std::time::{Duration, Instant};

/// Build-run context threaded through every stage: leveled console output
/// plus the counters the final summary and exit code are derived from.
pub struct Reporter {
    pub discovered: usize,
    pub compiled: usize,
    pub minified: usize,
    pub errors: usize,
    pub warnings: usize,
    started: Instant,
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            discovered: 0,
            compiled: 0,
            minified: 0,
            errors: 0,
            warnings: 0,
            started: Instant::now(),
        }
    }

    fn emit(&self, prefix: ColoredString, message: &str, should_newline: bool) {
        let mut stdout = stdout().lock();
        let (width, _) = size().unwrap_or((80, 25));

        execute!(stdout,
            Clear(ClearType::UntilNewLine)
        ).ok();

        let log_msg = truncate_to_width(format!("{prefix} {message}"), width);

        if should_newline {
            writeln!(stdout, "{log_msg}").ok();
        } else {
            write!(stdout, "{log_msg}\r").ok();
        }

        stdout.flush().ok();
    }

    pub fn header(&self, title: &str) {
        let mut stdout = stdout().lock();
        let divider = "=".repeat(48);
        writeln!(stdout, "{}", divider.bright_cyan()).ok();
        writeln!(stdout, "  {}", title.bright_cyan().bold()).ok();
        writeln!(stdout, "{}", divider.bright_cyan()).ok();
        stdout.flush().ok();
    }

    pub fn section(&self, title: &str) {
        let mut stdout = stdout().lock();
        writeln!(stdout, "\n{} {}", "==>".bright_cyan().bold(), title.bold()).ok();
        stdout.flush().ok();
    }

    pub fn info(&self, message: &str) {
        self.emit("[info]".bright_blue().bold(), message, true);
    }

    pub fn success(&self, message: &str) {
        self.emit("[done]".bright_green().bold(), message, true);
    }

    pub fn warning(&mut self, message: &str) {
        self.warnings += 1;
        self.emit("[warn]".bright_yellow().bold(), message, true);
    }

    pub fn error(&mut self, message: &str) {
        self.errors += 1;
        self.emit("[error]".bright_red().bold(), message, true);
    }

    /// Error-styled line for a build abort. Forces a non-zero exit but never
    /// double-counts an error the failing stage already recorded.
    pub fn fatal(&mut self, message: &str) {
        if self.errors == 0 {
            self.errors = 1;
        }
        self.emit("[error]".bright_red().bold(), message, true);
    }

    /// Transient per-item line, overwritten by the next emission.
    pub fn step(&self, module: &str, message: &str) {
        self.emit(format!("[{module}]").bright_yellow().bold(), message, false);
    }

    /// Transient `[current/total]` progress line.
    pub fn progress(&self, current: usize, total: usize, message: &str) {
        self.emit(format!("[{current}/{total}]").bright_yellow().bold(), message, false);
    }

    /// Timestamped per-item completion line.
    pub fn status(&self, module: &str, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        self.emit(
            format!("[{module}]").bright_yellow().bold(),
            &format!("{timestamp} {message}"),
            true,
        );
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn summary(&self) {
        self.section("summary");
        self.info(&format!("posts compiled: {}/{}", self.compiled, self.discovered));
        self.info(&format!("files minified: {}", self.minified));
        self.info(&format!("warnings: {}", self.warnings));
        self.info(&format!("elapsed: {:.2}s", self.elapsed().as_secs_f64()));

        if self.errors > 0 {
            self.emit(
                "[error]".bright_red().bold(),
                &format!("build failed with {} error(s)", self.errors),
                true,
            );
        } else {
            self.success("build finished without errors");
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.errors > 0 { 1 } else { 0 }
    }
}

fn truncate_to_width(message: String, width: u16) -> String {
    let width = usize::from(width.max(1));
    if message.len() > width {
        message.chars().take(width - 1).collect()
    } else {
        message
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_drive_exit_code() {
        let mut report = Reporter::new();
        assert_eq!(report.exit_code(), 0);

        report.warning("missing optional asset");
        assert_eq!(report.warnings, 1);
        assert_eq!(report.exit_code(), 0);

        report.error("compile failed");
        report.error("copy failed");
        assert_eq!(report.errors, 2);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn truncation_survives_a_zero_width_terminal() {
        assert_eq!(truncate_to_width("abcdef".into(), 0), "");
        assert_eq!(truncate_to_width("abcdef".into(), 4), "abc");
        assert_eq!(truncate_to_width("abc".into(), 80), "abc");
    }

    #[test]
    fn fatal_never_double_counts() {
        let mut report = Reporter::new();
        report.error("stage already recorded this");
        report.fatal("build aborted");
        assert_eq!(report.errors, 1);

        let mut untouched = Reporter::new();
        untouched.fatal("failed before any stage ran");
        assert_eq!(untouched.errors, 1);
        assert_eq!(untouched.exit_code(), 1);
    }
}
