//! Subprocess seam.
//!
//! [`CommandRunner`] is the only way the transcription subsystem starts
//! external programs, so the tool manager and the converter can be tested with
//! a scripted runner.  [`SystemRunner`] is the production implementation:
//! every child gets an extended `PATH`, a wall-clock timeout and a bounded
//! stdout buffer, and is killed if the caller stops waiting for it.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Directories searched ahead of the inherited `PATH`.
///
/// GUI-launched processes on macOS start with a minimal `PATH`; Homebrew and
/// `pipx` put their binaries in these places.
pub fn extended_path() -> String {
    let home = dirs::home_dir()
        .map(|h| h.display().to_string())
        .unwrap_or_default();
    let mut path = format!("/opt/homebrew/bin:/usr/local/bin:{home}/.local/bin:/usr/bin:/bin");
    if let Ok(inherited) = std::env::var("PATH") {
        if !inherited.is_empty() {
            path.push(':');
            path.push_str(&inherited);
        }
    }
    path
}

// ---------------------------------------------------------------------------
// RunError / CommandOutput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error("{program}: command not found")]
    NotFound { program: String },

    #[error("failed to run {program}: {message}")]
    Io { program: String, message: String },

    #[error("{program} timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} wrote more than {limit} bytes to stdout")]
    OutputTooLarge { program: String, limit: usize },
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Successful exit with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed exit with the given stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Last non-empty stderr line, or the exit code when stderr is empty.
    pub fn failure_summary(&self) -> String {
        self.stderr
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| match self.code {
                Some(code) => format!("exit status {code}"),
                None => "terminated by signal".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// CommandRunner trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion.
    ///
    /// A non-zero exit is an `Ok` with `success == false`; only launch
    /// failures, timeouts and oversized stdout are errors.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
        max_output: usize,
    ) -> Result<CommandOutput, RunError>;
}

// Compile-time assertion: Box<dyn CommandRunner> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn CommandRunner>) {}
};

// ---------------------------------------------------------------------------
// SystemRunner
// ---------------------------------------------------------------------------

/// Runs real processes with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

async fn read_bounded<R: AsyncRead + Unpin>(reader: R, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .take(limit.saturating_add(1) as u64)
        .read_to_end(&mut buf)
        .await?;
    Ok(buf)
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
        max_output: usize,
    ) -> Result<CommandOutput, RunError> {
        let io_err = |e: std::io::Error| RunError::Io {
            program: program.to_string(),
            message: e.to_string(),
        };

        log::debug!("runner: {program} {}", args.join(" "));

        let mut child = tokio::process::Command::new(program)
            .args(args)
            .env("PATH", extended_path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RunError::NotFound {
                    program: program.to_string(),
                },
                _ => io_err(e),
            })?;

        // stderr drains on its own task so a chatty child never blocks on it.
        let stderr_task = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(read_bounded(pipe, max_output)));
        let stdout_pipe = child.stdout.take();

        let finished = tokio::time::timeout(timeout, async {
            let stdout = match stdout_pipe {
                Some(pipe) => read_bounded(pipe, max_output).await.map_err(io_err)?,
                None => Vec::new(),
            };
            if stdout.len() > max_output {
                return Err(RunError::OutputTooLarge {
                    program: program.to_string(),
                    limit: max_output,
                });
            }
            let status = child.wait().await.map_err(io_err)?;
            Ok((stdout, status))
        })
        .await;

        // Any early return below drops `child`, which kills it.
        let (stdout, status) = match finished {
            Err(_) => {
                log::warn!("runner: {program} timed out after {} ms", timeout.as_millis());
                return Err(RunError::TimedOut {
                    program: program.to_string(),
                    timeout,
                });
            }
            Ok(result) => result?,
        };

        let stderr = match stderr_task {
            Some(task) => task.await.ok().and_then(Result::ok).unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(CommandOutput {
            success: status.success(),
            code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// ScriptedRunner (test only)
// ---------------------------------------------------------------------------

/// Answers every call from a closure and records the command lines it saw.
#[cfg(test)]
pub(crate) struct ScriptedRunner {
    handler: Box<dyn Fn(&str, &[String]) -> Result<CommandOutput, RunError> + Send + Sync>,
    calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedRunner {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &[String]) -> Result<CommandOutput, RunError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// `"program arg1 arg2"` for every call, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn not_found(program: &str) -> RunError {
        RunError::NotFound {
            program: program.to_string(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _timeout: Duration,
        _max_output: usize,
    ) -> Result<CommandOutput, RunError> {
        let line = std::iter::once(program.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line);
        (self.handler)(program, args)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extended_path_puts_homebrew_first() {
        let path = extended_path();
        assert!(path.starts_with("/opt/homebrew/bin:/usr/local/bin:"));
        assert!(path.contains("/.local/bin"));
    }

    #[test]
    fn failure_summary_prefers_last_stderr_line() {
        let out = CommandOutput::failed(2, "warming up\nError: bad file\n\n");
        assert_eq!(out.failure_summary(), "Error: bad file");
        assert_eq!(CommandOutput::failed(3, "").failure_summary(), "exit status 3");
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_status() {
        let out = SystemRunner
            .run(
                "sh",
                &args(&["-c", "echo hello; echo oops >&2; exit 3"]),
                Duration::from_secs(10),
                1024,
            )
            .await
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let err = SystemRunner
            .run(
                "definitely-not-a-real-binary-4821",
                &[],
                Duration::from_secs(5),
                1024,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::NotFound { .. }));
    }

    #[tokio::test]
    async fn slow_program_times_out() {
        let err = SystemRunner
            .run("sleep", &args(&["5"]), Duration::from_millis(100), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn oversized_stdout_is_rejected() {
        let err = SystemRunner
            .run(
                "sh",
                &args(&["-c", "yes | head -c 10000"]),
                Duration::from_secs(10),
                100,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RunError::OutputTooLarge {
                program: "sh".into(),
                limit: 100
            }
        );
    }
}
