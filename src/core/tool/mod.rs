//! # Tool Module
//!
//! Launches external utilities (`exiftool`, `ffprobe`).
//!
//! A launch walks an ordered list of [`LaunchStrategy`] values. Only a
//! permission denial at spawn time moves on to the next strategy; a tool
//! that starts and then fails is reported to the caller, which owns any
//! retry with different arguments.

use crate::error::ToolError;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// How a tool process is started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// Spawn the executable directly
    Direct,
    /// Hand a quoted command line to the platform shell
    Shell,
}

/// Captured output of a successful run
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A named external executable
#[derive(Debug, Clone)]
pub struct ToolRunner {
    name: String,
    program: PathBuf,
    strategies: Vec<LaunchStrategy>,
}

impl ToolRunner {
    /// Runner trying a direct spawn first, then the shell
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            strategies: vec![LaunchStrategy::Direct, LaunchStrategy::Shell],
        }
    }

    pub fn with_strategies(mut self, strategies: Vec<LaunchStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run with `args`, succeeding only on a zero exit status
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<ToolOutput, ToolError> {
        let mut last_error = ToolError::Unavailable {
            tool: self.name.clone(),
            reason: "no launch strategy configured".to_string(),
        };

        for strategy in &self.strategies {
            let mut command = self.command(*strategy, args);
            match command.output() {
                Ok(output) => {
                    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    if !output.status.success() {
                        return Err(ToolError::Failed {
                            tool: self.name.clone(),
                            status: output.status.code().unwrap_or(-1),
                            stderr,
                        });
                    }
                    return Ok(ToolOutput { stdout, stderr });
                }
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    debug!("{} launch via {:?} denied, trying next", self.name, strategy);
                    last_error = ToolError::PermissionDenied {
                        tool: self.name.clone(),
                    };
                }
                Err(e) => {
                    return Err(ToolError::Unavailable {
                        tool: self.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(last_error)
    }

    /// First line of the tool's version output
    pub fn version(&self, flag: &str) -> Result<String, ToolError> {
        let output = self.run(&[flag])?;
        Ok(output.stdout.lines().next().unwrap_or("").trim().to_string())
    }

    fn command<S: AsRef<OsStr>>(&self, strategy: LaunchStrategy, args: &[S]) -> Command {
        match strategy {
            LaunchStrategy::Direct => {
                let mut command = Command::new(&self.program);
                command.args(args);
                command
            }
            LaunchStrategy::Shell => {
                let mut line = quote(self.program.as_os_str());
                for arg in args {
                    line.push(' ');
                    line.push_str(&quote(arg.as_ref()));
                }
                shell_command(line)
            }
        }
    }
}

#[cfg(windows)]
fn shell_command(line: String) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

#[cfg(not(windows))]
fn shell_command(line: String) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

/// Quote one token for the platform shell
fn quote(token: &OsStr) -> String {
    let token = token.to_string_lossy();
    if cfg!(windows) {
        if token.contains(&[' ', '\\', ':', '&'][..]) {
            format!("\"{}\"", token)
        } else {
            token.into_owned()
        }
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_unavailable() {
        let runner = ToolRunner::new("exiftool", "/nonexistent/bin/exiftool-12345")
            .with_strategies(vec![LaunchStrategy::Direct]);
        let err = runner.run(&["-ver"]).unwrap_err();
        assert!(matches!(err, ToolError::Unavailable { .. }));
    }

    #[test]
    fn empty_strategy_list_is_unavailable() {
        let runner = ToolRunner::new("ffprobe", "ffprobe").with_strategies(Vec::new());
        assert!(matches!(
            runner.run(&["-version"]),
            Err(ToolError::Unavailable { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure_with_status() {
        let runner = ToolRunner::new("sh", "sh").with_strategies(vec![LaunchStrategy::Direct]);
        let err = runner.run(&["-c", "echo oops >&2; exit 3"]).unwrap_err();
        match err {
            ToolError::Failed { status, stderr, .. } => {
                assert_eq!(status, 3);
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn shell_strategy_preserves_arguments_with_spaces() {
        let runner = ToolRunner::new("echo", "echo").with_strategies(vec![LaunchStrategy::Shell]);
        let output = runner.run(&["it's a file.jpg"]).unwrap();
        assert_eq!(output.stdout.trim(), "it's a file.jpg");
    }

    #[cfg(unix)]
    #[test]
    fn unix_quoting_escapes_single_quotes() {
        assert_eq!(quote(OsStr::new("a'b")), r"'a'\''b'");
    }

    /// A file without execute permission; spawning it directly is denied
    #[cfg(unix)]
    fn non_executable_script(dir: &std::path::Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("tool.sh");
        std::fs::write(&path, "#!/bin/sh\necho ran\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn direct_launch_of_non_executable_is_permission_denied() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = ToolRunner::new("tool", non_executable_script(dir.path()))
            .with_strategies(vec![LaunchStrategy::Direct]);
        assert!(runner.run(&["-ver"]).unwrap_err().is_permission_denied());
    }

    #[cfg(unix)]
    #[test]
    fn permission_denied_moves_on_to_shell_strategy() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = ToolRunner::new("tool", non_executable_script(dir.path()));

        // The shell is reached and reports its own exec failure
        match runner.run(&["-ver"]).unwrap_err() {
            ToolError::Failed { status, .. } => assert_eq!(status, 126),
            other => panic!("unexpected: {other}"),
        }
    }
}
