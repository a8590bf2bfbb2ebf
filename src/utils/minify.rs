use crate::config::SiteConfig;
use crate::utils::command::{CommandError, run_tool};
use crate::utils::compile::{collect_files, has_extension};
use crate::utils::log::Reporter;
use minify_html::{Cfg, minify};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Capability seam over the external js minifier, so tests can substitute a
/// fake without spawning processes.
pub trait JsMinifier {
    fn minify(&self, file: &Path) -> Result<(), CommandError>;
}

pub struct TerserMinifier {
    command: String,
    timeout: Option<Duration>,
}

impl TerserMinifier {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            command: config.tools.terser_command.clone(),
            timeout: config.tool_timeout(),
        }
    }
}

impl JsMinifier for TerserMinifier {
    fn minify(&self, file: &Path) -> Result<(), CommandError> {
        // in-place rewrite
        run_tool(
            &self.command,
            [file.as_os_str(), OsStr::new("-o"), file.as_os_str()],
            self.timeout,
        )
        .map(|_| ())
    }
}

pub fn minify_html_text(content: &[u8]) -> Vec<u8> {
    minify(content, &Cfg::new())
}

/// Rewrite every html file under the output root with its minified form.
/// Best-effort: a failed file is counted and the pass continues.
pub fn minify_html_files(config: &SiteConfig, report: &mut Reporter) {
    report.section("minifying html");

    let files = match enumerate_output(config, report, "html") {
        Some(files) => files,
        None => return,
    };

    let total = files.len();
    let mut processed = 0;
    for (index, file) in files.iter().enumerate() {
        report.progress(index + 1, total, &file.display().to_string());

        let rewritten = fs::read(file).and_then(|content| fs::write(file, minify_html_text(&content)));
        match rewritten {
            Ok(()) => {
                report.minified += 1;
                processed += 1;
            }
            Err(err) => report.error(&format!("failed to minify {}: {err}", file.display())),
        }
    }

    report.success(&format!("{processed}/{total} html files minified"));
}

/// Rewrite every js file under the output root through the external
/// minifier. Best-effort, same policy as the html pass: one broken script is
/// counted and logged but never sinks the remaining files.
pub fn minify_js_files(minifier: &dyn JsMinifier, config: &SiteConfig, report: &mut Reporter) {
    report.section("minifying js");

    let files = match enumerate_output(config, report, "js") {
        Some(files) => files,
        None => return,
    };

    let total = files.len();
    let mut processed = 0;
    for (index, file) in files.iter().enumerate() {
        report.progress(index + 1, total, &file.display().to_string());

        match minifier.minify(file) {
            Ok(()) => {
                report.minified += 1;
                processed += 1;
                report.status("minify", &file.display().to_string());
            }
            Err(err) => report.error(&format!("failed to minify {}: {err}", file.display())),
        }
    }

    report.success(&format!("{processed}/{total} js files minified"));
}

fn enumerate_output(
    config: &SiteConfig,
    report: &mut Reporter,
    extension: &str,
) -> Option<Vec<PathBuf>> {
    match collect_files(&config.output_path(), &|path| has_extension(path, extension)) {
        Ok(files) => Some(files),
        Err(err) => {
            report.error(&format!("failed to enumerate the output tree: {err:#}"));
            None
        }
    }
}
