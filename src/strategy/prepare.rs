//! Prepare a release: stage the version bump on a release branch and keep a
//! pull request for it open against the base branch.

use std::fs;

use chrono::Local;
use semver::Version;
use tracing::{debug, info};

use crate::commits::Commit;
use crate::error::{ReleaseError, VcsError};
use crate::update;
use crate::vcs::{PR_DESCRIPTION_LIMIT, StagedChange, ZERO_SHA};

use super::{ReleaseContext, StrategyOutcome};

/// What the walk over git history decided to release.
struct ReleasePlan {
    next_version: Version,
    commits: Vec<Commit>,
}

/// Stages everything the next release changes and syncs the release PR.
///
/// Running this twice for the same history converges on the same branch
/// state and the same pull request instead of creating duplicates.
pub struct PrepareRelease<'a> {
    ctx: &'a ReleaseContext,
    base_branch: String,
    release_branch: String,
}

impl<'a> PrepareRelease<'a> {
    pub fn new(ctx: &'a ReleaseContext, base_branch: &str) -> Self {
        Self {
            ctx,
            base_branch: base_branch.to_string(),
            release_branch: format!("{}{}", ctx.cfg.release_branch_prefix, base_branch),
        }
    }

    pub async fn execute(&self) -> Result<StrategyOutcome, ReleaseError> {
        let Some(plan) = self.walk_git_history().await? else {
            info!("Nothing worth releasing has happened since the last version");
            return Ok(StrategyOutcome::NotApplicable);
        };

        info!(version = %plan.next_version, "Preparing a release");

        let (fragment, changes) = self.stage_changes(&plan)?;
        let release_sha = self.sync_release_branch().await?;

        self.ctx
            .host
            .push_commit(
                &self.release_branch,
                &release_sha,
                &self.release_message(&plan.next_version),
                &changes,
            )
            .await
            .map_err(ReleaseError::PushCommit)?;

        self.sync_pull_request(&plan, &fragment).await?;

        Ok(StrategyOutcome::Done)
    }

    /// Derive the next version from the tags and the commits since the last
    /// release. `None` means the history does not justify a new version.
    async fn walk_git_history(&self) -> Result<Option<ReleasePlan>, ReleaseError> {
        let tags = self.ctx.git.tags().await.map_err(ReleaseError::FetchTags)?;
        let current = self.ctx.resolver.current(&tags);
        let since = current
            .as_ref()
            .map(|version| version.to_string())
            .unwrap_or_default();

        let entries = self.ctx.git.log(&since).await.map_err(ReleaseError::FetchLog)?;
        let commits = self.ctx.parser.extract_all(&entries);
        let next_version = self.ctx.resolver.next(current.as_ref(), &commits);

        if current.as_ref() == Some(&next_version) {
            return Ok(None);
        }

        Ok(Some(ReleasePlan {
            next_version,
            commits,
        }))
    }

    /// Render the changelog fragment and apply every configured updater.
    ///
    /// The changelog file has to exist already; the fragment is prepended to
    /// its current content. Returns the fragment (later reused as the PR
    /// body) with the staged file changes.
    fn stage_changes(&self, plan: &ReleasePlan) -> Result<(String, Vec<StagedChange>), ReleaseError> {
        let today = Local::now().date_naive();
        let fragment = self
            .ctx
            .builder
            .generate(&plan.next_version, &plan.commits, today);

        let changelog_path = &self.ctx.cfg.changelog_path;
        let existing =
            fs::read_to_string(changelog_path).map_err(|source| ReleaseError::ChangelogRead {
                path: changelog_path.clone(),
                source,
            })?;

        let mut changes = vec![StagedChange {
            path: changelog_path.clone(),
            content: format!("{fragment}{existing}"),
        }];

        let next_version = plan.next_version.to_string();
        for spec in &self.ctx.cfg.updates {
            let change =
                update::execute(&next_version, spec).map_err(|source| ReleaseError::Update {
                    path: spec.file_path.clone(),
                    source,
                })?;
            changes.push(change);
        }

        Ok((fragment, changes))
    }

    /// Point the release branch at the tip of the base branch.
    ///
    /// A base branch without commits means the repository is in a state this
    /// tool was never meant to see and is fatal. A missing release branch is
    /// normal; the all-zero sha makes the ref update create it.
    async fn sync_release_branch(&self) -> Result<String, ReleaseError> {
        let base_sha = self
            .ctx
            .host
            .last_ref(&self.base_branch)
            .await
            .map_err(|source| ReleaseError::BranchSync {
                branch: self.base_branch.clone(),
                source,
            })?
            .ok_or_else(|| ReleaseError::BranchSync {
                branch: self.base_branch.clone(),
                source: VcsError::EmptyBranch(self.base_branch.clone()),
            })?;

        let old_sha = self
            .ctx
            .host
            .last_ref(&self.release_branch)
            .await
            .map_err(|source| ReleaseError::BranchSync {
                branch: self.release_branch.clone(),
                source,
            })?
            .unwrap_or_else(|| ZERO_SHA.to_string());

        debug!(
            branch = %self.release_branch,
            from = %old_sha,
            to = %base_sha,
            "Moving the release branch to the base tip"
        );

        self.ctx
            .host
            .update_ref(&self.release_branch, &base_sha, &old_sha)
            .await
            .map_err(|source| ReleaseError::BranchSync {
                branch: self.release_branch.clone(),
                source,
            })
    }

    /// Create the release PR, or refresh its title and body if it is open.
    async fn sync_pull_request(
        &self,
        plan: &ReleasePlan,
        fragment: &str,
    ) -> Result<(), ReleaseError> {
        let existing = self
            .ctx
            .host
            .find_pr(&self.base_branch, &self.release_branch)
            .await
            .map_err(ReleaseError::PullRequest)?;

        let title = self.release_message(&plan.next_version);
        let description = clip(fragment, PR_DESCRIPTION_LIMIT);

        match existing {
            None => {
                let id = self
                    .ctx
                    .host
                    .create_pr(&self.base_branch, &self.release_branch, &title, description)
                    .await
                    .map_err(ReleaseError::PullRequest)?;
                info!(pr = id, "Opened the release pull request");
            }
            Some(id) => {
                self.ctx
                    .host
                    .update_pr(id, &title, description)
                    .await
                    .map_err(ReleaseError::PullRequest)?;
                info!(pr = id, "Updated the release pull request");
            }
        }

        Ok(())
    }

    fn release_message(&self, version: &Version) -> String {
        format!("{}{}", self.ctx.cfg.release_commit_prefix, version)
    }
}

// Truncate to the limit without splitting a UTF-8 sequence.
fn clip(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}
