use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::ProviderError;

/// Runs one CLI invocation and returns its stdout.
///
/// Implementations must map a non-zero exit status to
/// [`ProviderError::CommandFailed`] carrying stderr.
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    async fn run(&self, args: &[String]) -> Result<String, ProviderError>;
}

/// Spawns a real process for every call.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for ProcessRunner {
    /// `az`, or the path in `AZBOOT_AZ_PATH` when set.
    fn default() -> Self {
        Self::new(std::env::var("AZBOOT_AZ_PATH").unwrap_or_else(|_| "az".into()))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> Result<String, ProviderError> {
        let command = render_command(&self.program, args);
        debug!(%command, "running");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProviderError::CliNotFound(self.program.clone())
                } else {
                    ProviderError::Internal(format!("spawn {}: {}", self.program, e))
                }
            })?;

        if !output.status.success() {
            return Err(ProviderError::CommandFailed {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| ProviderError::Parse {
            command,
            message: format!("stdout is not UTF-8: {}", e),
        })
    }
}

/// Shell-ish rendering for logs and error messages. Not meant to be re-parsed.
pub(crate) fn render_command(program: &str, args: &[String]) -> String {
    let mut out = program.to_string();
    for a in args {
        out.push(' ');
        if a.is_empty() || a.contains(char::is_whitespace) || a.contains('"') {
            out.push('\'');
            out.push_str(a);
            out.push('\'');
        } else {
            out.push_str(a);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn render_quotes_arguments_with_spaces() {
        let rendered = render_command("az", &args(&["ad", "app", "list", "--display-name", "my app"]));
        assert_eq!(rendered, "az ad app list --display-name 'my app'");
    }

    #[tokio::test]
    async fn missing_program_is_cli_not_found() {
        let runner = ProcessRunner::new("azboot-definitely-not-a-real-binary");
        let err = runner.run(&args(&["version"])).await.unwrap_err();
        assert!(matches!(err, ProviderError::CliNotFound(_)), "got: {}", err);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_command_failed() {
        let runner = ProcessRunner::new("false");
        let err = runner.run(&args(&["account", "show"])).await.unwrap_err();
        match err {
            ProviderError::CommandFailed { command, code, .. } => {
                assert_eq!(code, 1);
                assert!(command.starts_with("false account show"), "got: {}", command);
            }
            other => panic!("unexpected: {}", other),
        }
    }
}
