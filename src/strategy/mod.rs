//! Release strategies and the context they run against.
//!
//! A run tries [`PerformRelease`] first and falls through to
//! [`PrepareRelease`] when there is nothing to perform. Strategies keep no
//! state between invocations; everything is inferred fresh from the tags,
//! the commit log and the last commit message on the base branch.

pub mod perform;
pub mod prepare;

pub use perform::PerformRelease;
pub use prepare::PrepareRelease;

use crate::changelog::ChangelogBuilder;
use crate::commits::CommitParser;
use crate::config::Config;
use crate::error::ConfigError;
use crate::git::GitRunner;
use crate::vcs::VcsHost;
use crate::version::VersionResolver;

/// How a strategy run ended when no error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// The strategy ran its full course.
    Done,
    /// The repository state did not call for this strategy.
    NotApplicable,
}

/// Everything a strategy needs for one run.
///
/// The git and host collaborators are trait objects so tests can swap in
/// scripted fakes.
pub struct ReleaseContext {
    pub cfg: Config,
    pub parser: CommitParser,
    pub resolver: VersionResolver,
    pub builder: ChangelogBuilder,
    pub git: Box<dyn GitRunner>,
    pub host: Box<dyn VcsHost>,
}

impl ReleaseContext {
    /// Assemble the context from loaded configuration and collaborators.
    pub fn new(
        cfg: Config,
        git: Box<dyn GitRunner>,
        host: Box<dyn VcsHost>,
    ) -> Result<Self, ConfigError> {
        let sections = cfg.pivot_sections()?;
        let parser = CommitParser::new(&cfg)?;
        let resolver = VersionResolver::new(&cfg, sections.clone())?;
        let builder = ChangelogBuilder::new(&cfg, sections);

        Ok(Self {
            cfg,
            parser,
            resolver,
            builder,
            git,
            host,
        })
    }
}
