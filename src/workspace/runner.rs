//! Allow-listed command execution in the working directory.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

use super::files::WorkspaceSnapshot;
use crate::api::types::FileRecord;
use crate::config::Config;

const MAX_OUTPUT: usize = 10_000;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No command given")]
    Empty,

    #[error("Command '{0}' is not allowed")]
    NotAllowed(String),

    #[error("Code execution timed out ({} seconds)", .0.as_secs())]
    TimedOut(Duration),

    #[error("Failed to execute command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Command failed with return code {code}: {output}")]
    Failed { code: i32, output: String },
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Combined stdout and stderr, trimmed
    pub output: String,
    /// Files created or modified while the command ran
    pub changed_files: Vec<FileRecord>,
}

/// Runs one program at a time, without a shell, inside the working directory.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    working_directory: PathBuf,
    allowed: Vec<String>,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(working_directory: PathBuf, allowed: Vec<String>, timeout: Duration) -> Self {
        Self {
            working_directory,
            allowed,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.working_directory.clone(),
            config.allowed_commands.clone(),
            config.command_timeout(),
        )
    }

    /// Split `line` on whitespace and run it.
    pub async fn run(&self, line: &str) -> Result<CommandOutput, CommandError> {
        let mut parts = line.split_whitespace();
        let program = parts.next().ok_or(CommandError::Empty)?;
        if !self.allowed.iter().any(|c| c == program) {
            return Err(CommandError::NotAllowed(program.to_string()));
        }
        let args: Vec<&str> = parts.collect();

        tracing::info!("Executing command: {}", line);

        let before = WorkspaceSnapshot::capture(&self.working_directory);

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(program)
                .args(&args)
                .current_dir(&self.working_directory)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| CommandError::TimedOut(self.timeout))??;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let mut combined = combined.trim().to_string();
        if combined.len() > MAX_OUTPUT {
            let mut end = MAX_OUTPUT;
            while !combined.is_char_boundary(end) {
                end -= 1;
            }
            combined.truncate(end);
            combined.push_str("\n... [output truncated]");
        }

        if !output.status.success() {
            return Err(CommandError::Failed {
                code: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }

        let after = WorkspaceSnapshot::capture(&self.working_directory);
        let output = if combined.is_empty() {
            "No output generated.".to_string()
        } else {
            combined
        };

        Ok(CommandOutput {
            output,
            changed_files: after.changes_since(&before),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn runner(dir: &std::path::Path, timeout: Duration) -> CommandRunner {
        CommandRunner::new(
            dir.to_path_buf(),
            ["echo", "touch", "ls", "sleep", "true"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout,
        )
    }

    #[tokio::test]
    async fn runs_allowed_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = runner(dir.path(), Duration::from_secs(5))
            .run("echo hello   world")
            .await
            .unwrap();
        assert_eq!(out.output, "hello world");
        assert!(out.changed_files.is_empty());
    }

    #[tokio::test]
    async fn silent_command_reports_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = runner(dir.path(), Duration::from_secs(5))
            .run("true")
            .await
            .unwrap();
        assert_eq!(out.output, "No output generated.");
    }

    #[tokio::test]
    async fn created_files_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let out = runner(dir.path(), Duration::from_secs(5))
            .run("touch report.txt notes.py")
            .await
            .unwrap();
        let names: Vec<_> = out.changed_files.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["notes.py", "report.txt"]);
    }

    #[tokio::test]
    async fn disallowed_program_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(dir.path(), Duration::from_secs(5))
            .run("bash -c 'rm -rf /'")
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotAllowed(ref p) if p == "bash"));
    }

    #[tokio::test]
    async fn empty_line_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(dir.path(), Duration::from_secs(5))
            .run("   ")
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Empty));
    }

    #[tokio::test]
    async fn nonzero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(dir.path(), Duration::from_secs(5))
            .run("ls definitely-not-here")
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Failed { code, .. } if code != 0));
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(dir.path(), Duration::from_millis(100))
            .run("sleep 5")
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::TimedOut(_)));
    }
}
