use super::command::UvCommand;
use crate::config::UvConfig;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use uvls_core::{Result, UvlsError};

/// Runs `command` in `cwd` and returns its stdout.
///
/// # Errors
///
/// - `UvlsError::InvalidCommand` if the command fails validation
/// - `UvlsError::Io` if the executable cannot be started
/// - `UvlsError::CommandFailed` with the process's stderr on a non-zero exit
pub async fn run(command: &UvCommand, config: &UvConfig, cwd: &Path) -> Result<String> {
    let program = command.program(config);
    let args = command.args()?;
    let command_line = command.command_line(config)?;

    tracing::info!("running `{}` in {}", command_line, cwd.display());

    let output = Command::new(program)
        .args(&args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .inspect_err(|e| tracing::error!("failed to start {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::warn!("`{}` exited with {}", command_line, output.status);
        return Err(UvlsError::CommandFailed {
            command: command_line,
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn config(executable: &str) -> UvConfig {
        UvConfig {
            executable: executable.into(),
            uvx_executable: executable.into(),
        }
    }

    #[tokio::test]
    async fn test_returns_stdout() {
        let dir = tempfile::tempdir().unwrap();

        let stdout = run(&UvCommand::Lock, &config("echo"), dir.path())
            .await
            .unwrap();
        assert_eq!(stdout, "lock\n");
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "here").unwrap();

        let command = UvCommand::ToolRun {
            tool: "marker.txt".into(),
            args: vec![],
        };
        let stdout = run(&command, &config("cat"), dir.path()).await.unwrap();
        assert_eq!(stdout, "here");
    }

    #[tokio::test]
    async fn test_failure_keeps_stderr_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let command = UvCommand::ToolRun {
            tool: "missing.txt".into(),
            args: vec![],
        };

        let err = run(&command, &config("cat"), dir.path())
            .await
            .unwrap_err();
        match err {
            UvlsError::CommandFailed { command, stderr } => {
                assert_eq!(command, "cat missing.txt");
                assert!(stderr.contains("missing.txt"));
                assert_eq!(
                    UvlsError::CommandFailed {
                        command,
                        stderr: stderr.clone()
                    }
                    .to_string(),
                    stderr
                );
            }
            other => panic!("expected CommandFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let dir = tempfile::tempdir().unwrap();

        let err = run(
            &UvCommand::Lock,
            &config("uvls-test-no-such-binary"),
            dir.path(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UvlsError::Io(_)));
    }

    #[tokio::test]
    async fn test_invalid_command_is_not_started() {
        let dir = tempfile::tempdir().unwrap();

        let err = run(
            &UvCommand::Init { name: String::new() },
            &config("uvls-test-no-such-binary"),
            dir.path(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, UvlsError::InvalidCommand(_)));
    }
}
