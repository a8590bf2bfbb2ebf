use crate::utils::command::run_tool;
use crate::utils::log::Reporter;
use std::time::Duration;
use which::which;

/// Check that every required external tool resolves on `PATH`.
///
/// Missing tools are reported through the `Reporter` only; the caller decides
/// whether to abort the build based on the returned flag.
pub fn check_tools(tools: &[&str], timeout: Option<Duration>, report: &mut Reporter) -> bool {
    report.section("checking dependencies");

    let mut missing = Vec::new();
    for (index, tool) in tools.iter().enumerate() {
        report.progress(index + 1, tools.len(), &format!("checking `{tool}`"));

        match which(tool) {
            Ok(path) => report.success(&format!("found `{tool}`: {}", path.display())),
            Err(_) => {
                report.error(&format!("`{tool}` not found on PATH"));
                missing.push(*tool);
            }
        }
    }

    if !missing.is_empty() {
        report.info("please install the missing tools:");
        for tool in &missing {
            report.info(&format!("  - {tool}"));
        }
        return false;
    }

    for tool in tools {
        match tool_version(tool, timeout) {
            Some(version) => report.info(&format!("{tool} {version}")),
            None => report.warning(&format!("could not query the version of `{tool}`")),
        }
    }

    true
}

/// First line of `<tool> --version`, for diagnostics only.
fn tool_version(tool: &str, timeout: Option<Duration>) -> Option<String> {
    let output = run_tool(tool, ["--version"], timeout).ok()?;
    let version = output.stdout.lines().next()?.trim();
    (!version.is_empty()).then(|| version.to_string())
}
