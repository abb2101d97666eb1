//! Conventional commit extraction from raw log lines.

use regex_lite::Regex;
use tracing::debug;

use crate::config::Config;
use crate::error::{CommitError, ConfigError};

/// A structured commit parsed from a single log line.
///
/// `commit_type` carries the trailing `!` when the commit is marked breaking,
/// so `feat!` and `feat` are distinct types for section lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub commit_type: String,
    pub title: String,
    pub link: Option<String>,
}

/// Parses raw commit subjects with the configured extraction regex.
///
/// The default grammar accepts `type(scope)!: [LINK] subject`, where the
/// scope, breaking marker and link are optional, and tolerates the
/// `Merged PR <n>: ` prefix that squash merges prepend.
pub struct CommitParser {
    extract_regex: Regex,
}

impl CommitParser {
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        let extract_regex =
            Regex::new(&cfg.extract_commit_regex).map_err(ConfigError::InvalidRegex)?;

        Ok(Self { extract_regex })
    }

    /// Extract a single commit from a raw log line.
    ///
    /// The configured regex must expose five capture groups (type, scope,
    /// breaking marker, link, title); anything it does not match is
    /// [`CommitError::Unparseable`]. The scope group is matched but not
    /// carried into the result.
    pub fn extract(&self, raw_log: &str) -> Result<Commit, CommitError> {
        let caps = self
            .extract_regex
            .captures(raw_log)
            .ok_or_else(|| CommitError::Unparseable(raw_log.to_string()))?;

        if caps.len() <= 5 {
            return Err(CommitError::Unparseable(raw_log.to_string()));
        }

        let commit_type = format!(
            "{}{}",
            caps.get(1).map_or("", |m| m.as_str()),
            caps.get(3).map_or("", |m| m.as_str()),
        );
        let link = caps
            .get(4)
            .map(|m| m.as_str())
            .filter(|link| !link.is_empty())
            .map(str::to_string);
        let title = caps.get(5).map_or("", |m| m.as_str()).to_string();

        Ok(Commit {
            commit_type,
            title,
            link,
        })
    }

    /// Extract commits from a batch of raw log lines.
    ///
    /// Lines that do not follow the grammar (merge commits, dependabot noise,
    /// trailing empty lines from a log split) are skipped, never fatal.
    pub fn extract_all(&self, raw_log_entries: &[String]) -> Vec<Commit> {
        let mut result = Vec::new();

        for raw_log in raw_log_entries {
            match self.extract(raw_log) {
                Ok(commit) => result.push(commit),
                Err(CommitError::Unparseable(_)) => {
                    debug!(entry = %raw_log, "Skipping log entry that is not a conventional commit");
                }
            }
        }

        result
    }
}
