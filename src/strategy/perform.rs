//! Perform a release: tag the merged release commit and roll Maven modules
//! forward to their next snapshot version.

use std::fs;

use semver::Version;
use tracing::{debug, info};

use crate::config::UpdateKind;
use crate::error::{ReleaseError, VersionError};
use crate::update;
use crate::vcs::StagedChange;
use crate::version;

use super::{ReleaseContext, StrategyOutcome};

/// File recording the version released by the last perform run. Written for
/// follow-up tooling in the pipeline, never read back here.
pub const VERSION_MARKER_FILE: &str = ".semflow-version.txt";

const SNAPSHOT_QUALIFIER: &str = "SNAPSHOT";

/// Turns a merged release commit into an annotated tag.
pub struct PerformRelease<'a> {
    ctx: &'a ReleaseContext,
    base_branch: String,
}

impl<'a> PerformRelease<'a> {
    pub fn new(ctx: &'a ReleaseContext, base_branch: &str) -> Self {
        Self {
            ctx,
            base_branch: base_branch.to_string(),
        }
    }

    pub async fn execute(&self) -> Result<StrategyOutcome, ReleaseError> {
        let (sha, message) = self
            .ctx
            .host
            .last_commit(&self.base_branch)
            .await
            .map_err(|source| ReleaseError::LastCommit {
                branch: self.base_branch.clone(),
                source,
            })?;

        if !message.contains(&self.ctx.cfg.release_commit_prefix) {
            info!(
                branch = %self.base_branch,
                "The last commit is not a release commit, nothing to perform"
            );
            return Ok(StrategyOutcome::NotApplicable);
        }

        let commit = self
            .ctx
            .parser
            .extract(&message)
            .map_err(ReleaseError::ReleaseMessage)?;
        let released = released_version(&commit.title).map_err(ReleaseError::ReleaseVersion)?;

        info!(version = %released, sha = %sha, "Performing the release");

        self.ctx
            .host
            .create_annotated_tag(&sha, &released.to_string())
            .await
            .map_err(|source| ReleaseError::CreateTag {
                tag: released.to_string(),
                source,
            })?;

        self.roll_to_snapshot(&sha, &released).await?;
        self.write_version_marker(&released)?;

        Ok(StrategyOutcome::Done)
    }

    /// Move every Maven module to the next snapshot version in one commit on
    /// the base branch. Without Maven modules there is nothing to roll and
    /// no commit is made.
    async fn roll_to_snapshot(
        &self,
        release_sha: &str,
        released: &Version,
    ) -> Result<(), ReleaseError> {
        let snapshot_version = format!("{}-{}", version::inc_patch(released), SNAPSHOT_QUALIFIER);

        let mut changes: Vec<StagedChange> = Vec::new();
        for spec in &self.ctx.cfg.updates {
            if spec.kind != UpdateKind::Maven {
                continue;
            }

            let change = update::execute(&snapshot_version, spec).map_err(|source| {
                ReleaseError::Update {
                    path: spec.file_path.clone(),
                    source,
                }
            })?;
            changes.push(change);
        }

        if changes.is_empty() {
            return Ok(());
        }

        debug!(version = %snapshot_version, "Rolling Maven modules to the next snapshot");

        let message = format!("{}{}", self.ctx.cfg.snapshot_commit_prefix, snapshot_version);

        self.ctx
            .host
            .push_commit(&self.base_branch, release_sha, &message, &changes)
            .await
            .map_err(ReleaseError::PushCommit)
    }

    fn write_version_marker(&self, released: &Version) -> Result<(), ReleaseError> {
        fs::write(VERSION_MARKER_FILE, released.to_string()).map_err(|source| {
            ReleaseError::VersionMarker {
                path: VERSION_MARKER_FILE.to_string(),
                source,
            }
        })
    }
}

/// Parse the version a release commit title announces.
///
/// Squash merges append a PR reference to the title, so only the first
/// whitespace-delimited token has to be a strict semantic version.
fn released_version(title: &str) -> Result<Version, VersionError> {
    let token = title.split_whitespace().next().unwrap_or_default();

    Version::parse(token).map_err(|source| VersionError::ParseFailed(token.to_string(), source))
}
