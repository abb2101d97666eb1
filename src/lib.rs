//! semflow - release automation driven by conventional commits.
//!
//! # Overview
//!
//! semflow reads the commit history of a branch, derives the next semantic
//! version, and drives a two-phase release over the VCS host's API: a
//! *prepare* run stages the changelog and version file updates on a release
//! branch behind a pull request, and a *perform* run tags the merged release
//! commit. Which phase applies is inferred from the last commit message, so
//! the tool can simply run on every push to the release-managed branch.

pub mod changelog;
pub mod commits;
pub mod config;
pub mod error;
pub mod git;
pub mod strategy;
pub mod update;
pub mod vcs;
pub mod version;

// Re-export commonly used types
pub use changelog::ChangelogBuilder;
pub use commits::{Commit, CommitLinter, CommitParser};
pub use config::Config;
pub use error::{
    CommitError, ConfigError, GitError, LintViolation, ReleaseError, UpdateError, VcsError,
    VersionError,
};
pub use strategy::{PerformRelease, PrepareRelease, ReleaseContext, StrategyOutcome};
pub use vcs::{HostOptions, StagedChange, VcsHost};
pub use version::VersionResolver;
