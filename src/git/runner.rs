//! Git subprocess spawning.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::GitError;

/// Read access to the local repository clone.
///
/// This abstraction allows mocking the git subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// List every tag name in the repository, one per line of `git tag`.
    async fn tags(&self) -> Result<Vec<String>, GitError>;

    /// List commit subjects, newest first.
    ///
    /// A non-empty `since` restricts the walk to `since..HEAD`; an empty
    /// string covers the full history.
    async fn log(&self, since: &str) -> Result<Vec<String>, GitError>;
}

/// Runner that shells out to the configured git binary.
pub struct CommandLineGit {
    git_command: String,
    git_tag_command: String,
}

impl CommandLineGit {
    pub fn new(cfg: &Config) -> Self {
        Self {
            git_command: cfg.git_command.clone(),
            git_tag_command: cfg.git_tag_command.clone(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let command = format!("{} {}", self.git_command, args.join(" "));
        debug!(command = %command, "Running git subprocess");

        let output = Command::new(&self.git_command)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| GitError::SpawnFailed {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(GitError::NonZeroExit {
                command,
                code,
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl GitRunner for CommandLineGit {
    async fn tags(&self) -> Result<Vec<String>, GitError> {
        let stdout = self.run(&[&self.git_tag_command]).await?;
        Ok(split_lines(&stdout))
    }

    async fn log(&self, since: &str) -> Result<Vec<String>, GitError> {
        let range = format!("{since}..HEAD");
        let mut args = vec!["log"];
        if !since.is_empty() {
            args.push(range.as_str());
        }
        args.push("--pretty=format:%s");

        let stdout = self.run(&args).await?;
        Ok(split_lines(&stdout))
    }
}

// The last line of `git tag` output is newline-terminated, so the result
// carries a trailing empty entry. Callers skip entries that do not parse,
// which covers it.
fn split_lines(stdout: &str) -> Vec<String> {
    stdout.split('\n').map(str::to_string).collect()
}
