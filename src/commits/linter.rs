//! Pull request title linting against the configured commit policy.

use crate::config::{Config, PrLint};
use crate::error::{ConfigError, LintViolation};

use super::parser::CommitParser;

/// Validates PR titles against the `prLint` policy.
///
/// Reuses the commit grammar, so a title that would not drive versioning
/// correctly is rejected before it can be merged.
pub struct CommitLinter {
    parser: CommitParser,
    policy: PrLint,
}

impl CommitLinter {
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            parser: CommitParser::new(cfg)?,
            policy: cfg.pr_lint.clone(),
        })
    }

    /// Check a PR title. Returns the violation carrying the operator-facing
    /// guidance message when the title does not pass.
    pub fn lint(&self, input: &str) -> Result<(), LintViolation> {
        let starts_with_allowed_type = self
            .policy
            .allowed_types
            .iter()
            .any(|commit_type| input.starts_with(commit_type.as_str()));

        if !starts_with_allowed_type {
            return Err(self.not_conventional());
        }

        let commit = self.parser.extract(input).map_err(|_| self.not_conventional())?;

        if !self.policy.allowed_types.contains(&commit.commit_type) {
            return Err(self.not_conventional());
        }

        if self.policy.types_requiring_jira.contains(&commit.commit_type) && commit.link.is_none() {
            return Err(self.missing_work_item());
        }

        Ok(())
    }

    fn not_conventional(&self) -> LintViolation {
        LintViolation::NotConventional(bracket_list(&self.policy.allowed_types))
    }

    fn missing_work_item(&self) -> LintViolation {
        LintViolation::MissingWorkItem(bracket_list(&self.policy.types_requiring_jira))
    }
}

fn bracket_list(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}
