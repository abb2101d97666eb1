//! GitHub backend via octocrab.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use octocrab::Octocrab;
use octocrab::params::State;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::VcsError;

use super::{HostOptions, StagedChange, VcsHost};

/// GitHub REST backend. Addresses the repository as `{project}/{repo}`.
pub struct GitHub {
    octocrab: Octocrab,
    owner: String,
    repo: String,
}

impl GitHub {
    pub fn new(opts: &HostOptions) -> Result<Self, VcsError> {
        let octocrab = Octocrab::builder()
            .personal_token(opts.token.clone())
            .build()
            .map_err(|e| VcsError::GitHubApi(Box::new(e)))?;

        Ok(Self::with_client(octocrab, opts))
    }

    /// Build against a pre-configured client.
    ///
    /// This allows dependency injection for testing with mock servers.
    pub fn with_client(octocrab: Octocrab, opts: &HostOptions) -> Self {
        Self {
            octocrab,
            owner: opts.project.clone(),
            repo: opts.repo.clone(),
        }
    }

    fn route(&self, tail: &str) -> String {
        format!("/repos/{}/{}/{}", self.owner, self.repo, tail)
    }

    async fn get_json(&self, route: &str) -> Result<Value, octocrab::Error> {
        self.octocrab.get(route, None::<&()>).await
    }
}

/// A missing ref surfaces as a GitHub API error carrying status 404.
fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

fn api_error(err: octocrab::Error) -> VcsError {
    VcsError::GitHubApi(Box::new(err))
}

fn string_at(value: &Value, pointer: &str) -> Result<String, VcsError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| VcsError::MalformedResponse(format!("no string at {pointer}")))
}

#[async_trait]
impl VcsHost for GitHub {
    async fn last_ref(&self, branch: &str) -> Result<Option<String>, VcsError> {
        let route = self.route(&format!("git/ref/heads/{branch}"));

        match self.get_json(&route).await {
            Ok(value) => Ok(Some(string_at(&value, "/object/sha")?)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(api_error(e)),
        }
    }

    async fn update_ref(
        &self,
        branch: &str,
        new_sha: &str,
        old_sha: &str,
    ) -> Result<String, VcsError> {
        // GitHub has no compare-and-swap on ref updates; the expected old
        // object only decides between creating and force-moving the ref.
        let _ = old_sha;

        let exists = match self.get_json(&self.route(&format!("git/ref/heads/{branch}"))).await {
            Ok(_) => true,
            Err(e) if is_not_found(&e) => false,
            Err(e) => return Err(api_error(e)),
        };

        if exists {
            debug!(branch = %branch, sha = %new_sha, "Force-moving existing branch");
            let _: Value = self
                .octocrab
                .patch(
                    self.route(&format!("git/refs/heads/{branch}")),
                    Some(&json!({ "sha": new_sha, "force": true })),
                )
                .await
                .map_err(api_error)?;
        } else {
            debug!(branch = %branch, sha = %new_sha, "Creating branch");
            let _: Value = self
                .octocrab
                .post(
                    self.route("git/refs"),
                    Some(&json!({ "ref": format!("refs/heads/{branch}"), "sha": new_sha })),
                )
                .await
                .map_err(api_error)?;
        }

        Ok(new_sha.to_string())
    }

    async fn push_commit(
        &self,
        branch: &str,
        last_sha: &str,
        message: &str,
        changes: &[StagedChange],
    ) -> Result<(), VcsError> {
        let base_commit = self
            .get_json(&self.route(&format!("git/commits/{last_sha}")))
            .await
            .map_err(api_error)?;
        let base_tree = string_at(&base_commit, "/tree/sha")?;

        let entries: Vec<Value> = changes
            .iter()
            .map(|change| {
                json!({
                    "path": change.path,
                    "mode": "100644",
                    "type": "blob",
                    "content": change.content,
                })
            })
            .collect();

        let tree: Value = self
            .octocrab
            .post(
                self.route("git/trees"),
                Some(&json!({ "base_tree": base_tree, "tree": entries })),
            )
            .await
            .map_err(api_error)?;
        let tree_sha = string_at(&tree, "/sha")?;

        let commit: Value = self
            .octocrab
            .post(
                self.route("git/commits"),
                Some(&json!({
                    "message": message,
                    "tree": tree_sha,
                    "parents": [last_sha],
                })),
            )
            .await
            .map_err(api_error)?;
        let commit_sha = string_at(&commit, "/sha")?;

        debug!(branch = %branch, sha = %commit_sha, "Pushing release commit");
        let _: Value = self
            .octocrab
            .patch(
                self.route(&format!("git/refs/heads/{branch}")),
                Some(&json!({ "sha": commit_sha, "force": true })),
            )
            .await
            .map_err(api_error)?;

        Ok(())
    }

    async fn find_pr(&self, to: &str, from: &str) -> Result<Option<u64>, VcsError> {
        let page = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .list()
            .state(State::Open)
            .head(format!("*:{from}"))
            .base(to)
            .send()
            .await
            .map_err(api_error)?;

        Ok(page.items.first().map(|pr| pr.number))
    }

    async fn create_pr(
        &self,
        to: &str,
        from: &str,
        title: &str,
        description: &str,
    ) -> Result<u64, VcsError> {
        let pr = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .create(title, from, to)
            .body(description)
            .send()
            .await
            .map_err(api_error)?;

        Ok(pr.number)
    }

    async fn update_pr(&self, id: u64, title: &str, description: &str) -> Result<u64, VcsError> {
        let pr: Value = self
            .octocrab
            .patch(
                self.route(&format!("pulls/{id}")),
                Some(&json!({ "title": title, "body": description })),
            )
            .await
            .map_err(api_error)?;

        pr.pointer("/number")
            .and_then(Value::as_u64)
            .ok_or_else(|| VcsError::MalformedResponse("no number on updated pull request".into()))
    }

    async fn last_commit(&self, branch: &str) -> Result<(String, String), VcsError> {
        let commit = self
            .get_json(&self.route(&format!("commits/refs/heads/{branch}")))
            .await
            .map_err(api_error)?;

        let sha = string_at(&commit, "/sha")?;
        let message = string_at(&commit, "/commit/message")?;
        Ok((sha, message))
    }

    async fn create_annotated_tag(&self, sha: &str, name: &str) -> Result<(), VcsError> {
        let tagged = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let _: Value = self
            .octocrab
            .post(
                self.route("git/tags"),
                Some(&json!({
                    "tag": name,
                    "message": name,
                    "object": sha,
                    "type": "commit",
                    "tagger": {
                        "name": "semflow",
                        "email": "no-reply@semflow.dev",
                        "date": tagged,
                    },
                })),
            )
            .await
            .map_err(api_error)?;

        let _: Value = self
            .octocrab
            .post(
                self.route("git/refs"),
                Some(&json!({ "ref": format!("refs/tags/{name}"), "sha": sha })),
            )
            .await
            .map_err(api_error)?;

        Ok(())
    }

    async fn pr_title(&self, id: u64) -> Result<String, VcsError> {
        let pr = self
            .octocrab
            .pulls(&self.owner, &self.repo)
            .get(id)
            .await
            .map_err(api_error)?;

        Ok(pr.title.unwrap_or_default())
    }
}
