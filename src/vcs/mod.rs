//! VCS host backends speaking the hosts' REST APIs.

pub mod azure;
pub mod github;

pub use azure::AzureDevOps;
pub use github::GitHub;

use async_trait::async_trait;

use crate::error::VcsError;

/// Maximum number of bytes a pull request description may carry.
pub const PR_DESCRIPTION_LIMIT: usize = 4000;

/// The object id git uses for a ref that does not exist yet.
pub const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

/// A file snapshot staged into a release commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedChange {
    pub path: String,
    pub content: String,
}

/// Connection parameters shared by every backend.
///
/// GitHub addresses repositories as `{project}/{repo}` and leaves `org`
/// empty; Azure DevOps needs all three of `org`, `project` and `repo`.
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    pub token: String,
    pub org: String,
    pub project: String,
    pub repo: String,
    pub branch: String,
}

/// Operations a release needs from the VCS host.
///
/// This abstraction allows mocking the host in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VcsHost: Send + Sync {
    /// Tip sha of `branch`, or `None` when the branch does not exist.
    async fn last_ref(&self, branch: &str) -> Result<Option<String>, VcsError>;

    /// Point `branch` at `new_sha` and return the resulting tip.
    ///
    /// `old_sha` is the tip the caller last observed, [`ZERO_SHA`] for a
    /// branch being created. Backends that compare-and-swap reject the
    /// update when the branch moved in the meantime.
    async fn update_ref(
        &self,
        branch: &str,
        new_sha: &str,
        old_sha: &str,
    ) -> Result<String, VcsError>;

    /// Create one commit on `branch` on top of `last_sha` carrying `changes`.
    async fn push_commit(
        &self,
        branch: &str,
        last_sha: &str,
        message: &str,
        changes: &[StagedChange],
    ) -> Result<(), VcsError>;

    /// Find the open pull request from `from` into `to`, if any.
    async fn find_pr(&self, to: &str, from: &str) -> Result<Option<u64>, VcsError>;

    /// Open a pull request and return its number.
    async fn create_pr(
        &self,
        to: &str,
        from: &str,
        title: &str,
        description: &str,
    ) -> Result<u64, VcsError>;

    /// Replace the title and description of pull request `id`.
    async fn update_pr(&self, id: u64, title: &str, description: &str) -> Result<u64, VcsError>;

    /// Sha and message of the tip commit of `branch`.
    async fn last_commit(&self, branch: &str) -> Result<(String, String), VcsError>;

    /// Attach an annotated tag named `name` to the commit `sha`.
    async fn create_annotated_tag(&self, sha: &str, name: &str) -> Result<(), VcsError>;

    /// Title of pull request `id`.
    async fn pr_title(&self, id: u64) -> Result<String, VcsError>;
}
