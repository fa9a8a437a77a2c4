//! Shared external-tool invocation: resolve the executable, run it with
//! captured output and a bounded timeout, and classify failures.
//!
//! Every concrete handler goes through this module instead of spawning
//! processes itself, so the timeout and diagnostic-capture discipline is
//! inherited rather than re-derived per backend.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{AppError, Result};

/// Timeout for lightweight connectivity probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for full backup/restore tool runs.
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(3600);

/// Locates an external executable on PATH.
pub fn resolve_tool(name: &str, hint: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| AppError::ToolNotFound {
        tool: name.to_string(),
        hint: hint.to_string(),
    })
}

/// Captured stdout of a successful tool run; failure diagnostics travel in
/// `ToolError` instead.
#[derive(Debug)]
pub struct CapturedOutput {
    pub stdout: String,
}

/// Failure modes of a tool run, classified into the error taxonomy by the
/// caller depending on which operation phase the tool served.
#[derive(Debug)]
pub enum ToolError {
    Timeout { tool: String, seconds: u64 },
    Spawn { tool: String, source: std::io::Error },
    Exit { tool: String, status: String, stderr: String },
}

impl ToolError {
    fn diagnostic(&self) -> String {
        match self {
            ToolError::Timeout { tool, seconds } => {
                format!("{tool} timed out after {seconds}s")
            }
            ToolError::Spawn { tool, source } => {
                format!("failed to run {tool}: {source}")
            }
            ToolError::Exit { tool, status, stderr } => {
                if stderr.trim().is_empty() {
                    format!("{tool} exited with {status}")
                } else {
                    format!("{tool} exited with {status}: {}", stderr.trim())
                }
            }
        }
    }

    fn classify(self, f: impl FnOnce(String) -> AppError) -> AppError {
        match self {
            ToolError::Timeout { tool, seconds } => AppError::Timeout { tool, seconds },
            other => f(other.diagnostic()),
        }
    }

    pub fn into_connection(self) -> AppError {
        self.classify(AppError::Connection)
    }

    pub fn into_backup(self) -> AppError {
        self.classify(AppError::Backup)
    }

    pub fn into_restore(self) -> AppError {
        self.classify(AppError::Restore)
    }
}

/// One external-tool run. Arguments and environment are set explicitly;
/// secrets must only ever travel through `env`, never `arg`.
pub struct ToolInvocation {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
    stdin_file: Option<PathBuf>,
    timeout: Duration,
}

impl ToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            stdin_file: None,
            timeout: OPERATION_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Feeds the given file to the child's stdin (`tool < file`).
    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin_file = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Runs the tool to completion, enforcing the timeout. A timed-out child
    /// is killed rather than orphaned (`kill_on_drop`).
    pub async fn run(self) -> std::result::Result<CapturedOutput, ToolError> {
        let tool = self.tool_name();
        debug!(tool = %tool, "invoking external tool");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        match &self.stdin_file {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|source| ToolError::Spawn {
                    tool: tool.clone(),
                    source,
                })?;
                cmd.stdin(Stdio::from(file));
            }
            None => {
                cmd.stdin(Stdio::null());
            }
        }

        let child = cmd.spawn().map_err(|source| ToolError::Spawn {
            tool: tool.clone(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(ToolError::Spawn { tool, source }),
            Err(_) => {
                return Err(ToolError::Timeout {
                    tool,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ToolError::Exit {
                tool,
                status: output.status.to_string(),
                stderr,
            });
        }

        if !stderr.trim().is_empty() {
            debug!(tool = %tool, stderr = %stderr.trim(), "tool wrote to stderr");
        }
        debug!(tool = %tool, "external tool completed");
        Ok(CapturedOutput { stdout })
    }
}

/// Convenience for probes and checks against a resolved tool path.
pub fn invoke(program: &Path) -> ToolInvocation {
    ToolInvocation::new(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tool_missing_executable() {
        let err = resolve_tool("definitely-not-a-real-tool-9000", "Install it.").unwrap_err();
        match err {
            AppError::ToolNotFound { tool, .. } => {
                assert_eq!(tool, "definitely-not-a-real-tool-9000");
            }
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_captures_stdout() {
        let out = ToolInvocation::new("echo").arg("hello").run().await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn run_surfaces_exit_status_and_stderr() {
        let err = ToolInvocation::new("sh")
            .args(["-c", "echo oops >&2; exit 3"])
            .run()
            .await
            .unwrap_err();
        match err {
            ToolError::Exit { ref stderr, .. } => assert!(stderr.contains("oops")),
            other => panic!("expected Exit, got {other:?}"),
        }
        assert!(err.into_backup().to_string().contains("oops"));
    }

    #[tokio::test]
    async fn run_enforces_timeout() {
        let start = std::time::Instant::now();
        let err = ToolInvocation::new("sleep")
            .arg("30")
            .timeout(Duration::from_millis(200))
            .run()
            .await
            .unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(matches!(err.into_restore(), AppError::Timeout { .. }));
    }

    #[tokio::test]
    async fn stdin_file_is_piped_to_child() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, "from stdin\n").unwrap();

        let out = ToolInvocation::new("cat").stdin_file(&input).run().await.unwrap();
        assert_eq!(out.stdout, "from stdin\n");
    }
}
