//! Bootstrapping the transcription tool.
//!
//! Installation is an ordered list of [`InstallStrategy`] objects.  The tool
//! manager runs the [`Preconditions`] check first, then tries each strategy
//! and accepts the first one after which the tool answers `--version`.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::config::TranscriptionConfig;
use crate::transcription::runner::CommandRunner;
use crate::transcription::tool::TranscriptionError;

/// Shown when every strategy has failed.
pub const MANUAL_INSTALL_HINT: &str = "pipx install voxmlx --python python3.11";

const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const PROBE_OUTPUT: usize = 64 * 1024;

/// Interpreters probed for the version precondition, in order.
const PYTHON_COMMANDS: &[&str] = &["python3.11", "python3", "python"];

// ---------------------------------------------------------------------------
// InstallStrategy
// ---------------------------------------------------------------------------

#[async_trait]
pub trait InstallStrategy: Send + Sync {
    /// Short description used in failure summaries.
    fn describe(&self) -> String;

    /// Attempt the install.  `Err` carries a one-line reason.
    async fn install(&self, runner: &dyn CommandRunner) -> Result<(), String>;
}

// Compile-time assertion: Box<dyn InstallStrategy> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn InstallStrategy>) {}
};

/// Install by running one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStrategy {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandStrategy {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout: INSTALL_TIMEOUT,
        }
    }
}

#[async_trait]
impl InstallStrategy for CommandStrategy {
    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn install(&self, runner: &dyn CommandRunner) -> Result<(), String> {
        log::info!("installer: running `{}`", self.describe());
        let out = runner
            .run(&self.program, &self.args, self.timeout, PROBE_OUTPUT)
            .await
            .map_err(|e| e.to_string())?;
        if out.success {
            Ok(())
        } else {
            Err(out.failure_summary())
        }
    }
}

/// Package manager first, then a user-scoped and a system-scoped pip install.
pub fn default_strategies() -> Vec<Box<dyn InstallStrategy>> {
    vec![
        Box::new(CommandStrategy::new(
            "pipx",
            &["install", "voxmlx", "--python", "python3.11"],
        )),
        Box::new(CommandStrategy::new("pip3", &["install", "--user", "voxmlx"])),
        Box::new(CommandStrategy::new("pip", &["install", "voxmlx"])),
    ]
}

// ---------------------------------------------------------------------------
// Preconditions
// ---------------------------------------------------------------------------

fn python_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Python (\d+)\.(\d+)").expect("valid python version regex"))
}

/// `(major, minor)` from `python --version` output.
pub fn parse_python_version(output: &str) -> Option<(u32, u32)> {
    let caps = python_version_re().captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

/// Host requirements checked before any install attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preconditions {
    /// Architecture of this host, `std::env::consts::ARCH` in production.
    pub host_arch: String,
}

impl Default for Preconditions {
    fn default() -> Self {
        Self {
            host_arch: std::env::consts::ARCH.to_string(),
        }
    }
}

impl Preconditions {
    /// Fail with `PreconditionFailed` naming the first unmet requirement.
    pub async fn check(
        &self,
        runner: &dyn CommandRunner,
        config: &TranscriptionConfig,
    ) -> Result<(), TranscriptionError> {
        let required = config.required_arch.trim();
        if !required.is_empty() && required != self.host_arch {
            return Err(TranscriptionError::PreconditionFailed(format!(
                "voxmlx requires {required} hardware (this host is {})",
                self.host_arch
            )));
        }

        let (want_major, want_minor) = config.min_python;
        for cmd in PYTHON_COMMANDS {
            let Ok(out) = runner
                .run(cmd, &["--version".to_string()], PROBE_TIMEOUT, PROBE_OUTPUT)
                .await
            else {
                continue;
            };
            // Python 2 prints its version to stderr.
            let found = parse_python_version(&out.stdout)
                .or_else(|| parse_python_version(&out.stderr));
            if let Some(version) = found {
                if out.success && version >= (want_major, want_minor) {
                    log::debug!("installer: {cmd} is {}.{}", version.0, version.1);
                    return Ok(());
                }
            }
        }

        Err(TranscriptionError::PreconditionFailed(format!(
            "Python {want_major}.{want_minor}+ is required. Please install Python from python.org"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::runner::{CommandOutput, ScriptedRunner};

    fn arm() -> Preconditions {
        Preconditions {
            host_arch: "aarch64".into(),
        }
    }

    #[test]
    fn python_version_parsing() {
        assert_eq!(parse_python_version("Python 3.11.4"), Some((3, 11)));
        assert_eq!(parse_python_version("Python 2.7.18\n"), Some((2, 7)));
        assert_eq!(parse_python_version("command not found"), None);
    }

    #[test]
    fn default_order_is_pipx_then_pip3_then_pip() {
        let described: Vec<_> = default_strategies().iter().map(|s| s.describe()).collect();
        assert_eq!(
            described,
            vec![
                "pipx install voxmlx --python python3.11",
                "pip3 install --user voxmlx",
                "pip install voxmlx",
            ]
        );
    }

    #[tokio::test]
    async fn wrong_architecture_short_circuits() {
        let runner = ScriptedRunner::new(|_, _| Ok(CommandOutput::ok("Python 3.12.1")));
        let pre = Preconditions {
            host_arch: "x86_64".into(),
        };

        let err = pre
            .check(&runner, &TranscriptionConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TranscriptionError::PreconditionFailed(ref m) if m.contains("aarch64")));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_required_arch_skips_arch_check() {
        let runner = ScriptedRunner::new(|_, _| Ok(CommandOutput::ok("Python 3.12.1")));
        let pre = Preconditions {
            host_arch: "x86_64".into(),
        };
        let config = TranscriptionConfig {
            required_arch: String::new(),
            ..TranscriptionConfig::default()
        };
        assert!(pre.check(&runner, &config).await.is_ok());
    }

    #[tokio::test]
    async fn falls_through_interpreters_until_one_is_new_enough() {
        let runner = ScriptedRunner::new(|program, _| match program {
            "python3.11" => Err(ScriptedRunner::not_found(program)),
            "python3" => Ok(CommandOutput::ok("Python 3.9.6")),
            _ => Ok(CommandOutput::ok("Python 2.7.18")),
        });

        arm().check(&runner, &TranscriptionConfig::default()).await.unwrap();
        assert_eq!(
            runner.calls(),
            vec!["python3.11 --version", "python3 --version"]
        );
    }

    #[tokio::test]
    async fn old_python_everywhere_fails() {
        let runner = ScriptedRunner::new(|_, _| {
            Ok(CommandOutput {
                success: true,
                code: Some(0),
                stdout: String::new(),
                stderr: "Python 2.7.18".into(),
            })
        });

        let err = arm()
            .check(&runner, &TranscriptionConfig::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Python 3.8+ is required. Please install Python from python.org"
        );
        assert_eq!(runner.calls().len(), PYTHON_COMMANDS.len());
    }

    #[tokio::test]
    async fn minor_version_is_compared_with_major() {
        // 4.0 satisfies a 3.8 minimum even though 0 < 8.
        let runner = ScriptedRunner::new(|_, _| Ok(CommandOutput::ok("Python 4.0.0")));
        assert!(arm()
            .check(&runner, &TranscriptionConfig::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn command_strategy_reports_stderr_tail() {
        let runner = ScriptedRunner::new(|_, _| Ok(CommandOutput::failed(1, "ERROR: no wheel")));
        let strategy = CommandStrategy::new("pip", &["install", "voxmlx"]);
        assert_eq!(
            strategy.install(&runner).await,
            Err("ERROR: no wheel".to_string())
        );
        assert_eq!(runner.calls(), vec!["pip install voxmlx"]);
    }
}
