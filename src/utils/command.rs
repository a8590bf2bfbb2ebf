use std::ffi::OsStr;
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source] source: io::Error,
    },

    #[error("`{command}` timed out after {timeout_secs}s")]
    TimedOut {
        command: String,
        timeout_secs: u64,
    },

    #[error("`{command}` exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| format!("status {c}")))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to capture output of `{command}`: {source}")]
    Capture {
        command: String,
        #[source] source: io::Error,
    },
}

#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run an external tool to completion, capturing stdout/stderr fully.
///
/// When a timeout is given, the child is killed on expiry and a distinct
/// `TimedOut` error is returned.
pub fn run_tool<I, S>(
    program: &str,
    args: I,
    timeout: Option<Duration>,
) -> Result<ToolOutput, CommandError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CommandError::Spawn { command: program.into(), source })?;

    // Drain both pipes off-thread so a chatty child cannot fill a pipe
    // buffer and deadlock against `try_wait`.
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let (code, success) = wait_for_exit(&mut child, program, timeout)?;

    let stdout = join_reader(stdout_reader);
    let stderr = join_reader(stderr_reader);

    if !success {
        return Err(CommandError::Failed {
            command: program.into(),
            code,
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

fn spawn_reader<R>(source: Option<R>) -> JoinHandle<String>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut source) = source {
            source.read_to_end(&mut buffer).ok();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn join_reader(handle: JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

fn wait_for_exit(
    child: &mut Child,
    command: &str,
    timeout: Option<Duration>,
) -> Result<(Option<i32>, bool), CommandError> {
    let capture_error = |source| CommandError::Capture { command: command.into(), source };

    let Some(timeout) = timeout else {
        let status = child.wait().map_err(capture_error)?;
        return Ok((status.code(), status.success()));
    };

    let started = Instant::now();
    loop {
        match child.try_wait().map_err(capture_error)? {
            Some(status) => return Ok((status.code(), status.success())),
            None if started.elapsed() >= timeout => {
                child.kill().ok();
                child.wait().ok();
                return Err(CommandError::TimedOut {
                    command: command.into(),
                    timeout_secs: timeout.as_secs(),
                });
            }
            None => thread::sleep(Duration::from_millis(25)),
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_on_success() {
        let output = run_tool("sh", ["-c", "echo hello"], None).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn surfaces_stderr_on_failure() {
        let err = run_tool("sh", ["-c", "echo oops >&2; exit 3"], None).unwrap_err();
        match err {
            CommandError::Failed { code, stderr, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = run_tool("definitely-not-a-real-tool", ["--version"], None).unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[test]
    fn kills_the_child_on_timeout() {
        let err = run_tool("sh", ["-c", "sleep 5"], Some(Duration::from_millis(100))).unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
    }
}
