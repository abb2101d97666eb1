//! Azure DevOps backend over its REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::error::VcsError;

use super::{HostOptions, StagedChange, VcsHost};

const API_VERSION: &str = "7.1";

/// Azure DevOps REST backend rooted at
/// `dev.azure.com/{org}/{project}/_apis/git/repositories/{repo}`.
pub struct AzureDevOps {
    client: Client,
    token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ValueList<T> {
    value: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GitRef {
    object_id: String,
}

#[derive(Debug, Deserialize)]
struct RefUpdateResult {
    success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GitCommit {
    commit_id: String,
    comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestRef {
    pull_request_id: u64,
}

#[derive(Debug, Deserialize)]
struct PullRequestDetails {
    title: String,
}

impl AzureDevOps {
    pub fn new(opts: &HostOptions) -> Result<Self, VcsError> {
        let base_url = format!(
            "https://dev.azure.com/{}/{}/_apis/git/repositories/{}",
            opts.org, opts.project, opts.repo
        );

        Self::with_base_url(base_url, opts)
    }

    /// Build against an explicit API root.
    ///
    /// This allows dependency injection for testing with mock servers.
    pub fn with_base_url(base_url: String, opts: &HostOptions) -> Result<Self, VcsError> {
        let client = Client::builder()
            .user_agent("semflow")
            .build()
            .map_err(|e| VcsError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            token: opts.token.clone(),
            base_url,
        })
    }

    fn url(&self, tail: &str) -> String {
        let sep = if tail.contains('?') { '&' } else { '?' };
        format!("{}/{tail}{sep}api-version={API_VERSION}", self.base_url)
    }

    /// Send a request with PAT auth and decode the JSON body.
    ///
    /// Azure DevOps personal access tokens go through basic auth with an
    /// empty username.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<T, VcsError> {
        let response = request
            .basic_auth("", Some(&self.token))
            .send()
            .await
            .map_err(|source| VcsError::RequestFailed {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VcsError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|source| VcsError::RequestFailed {
            url: url.to_string(),
            source,
        })
    }
}

// Item paths in a push payload are rooted at the repository.
fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[async_trait]
impl VcsHost for AzureDevOps {
    async fn last_ref(&self, branch: &str) -> Result<Option<String>, VcsError> {
        let url = self.url(&format!("refs?filter=heads/{branch}&$top=1"));
        let refs: ValueList<GitRef> = self.send(self.client.get(&url), &url).await?;

        Ok(refs.value.into_iter().next().map(|r| r.object_id))
    }

    async fn update_ref(
        &self,
        branch: &str,
        new_sha: &str,
        old_sha: &str,
    ) -> Result<String, VcsError> {
        let url = self.url("refs");
        let body = json!([{
            "name": format!("refs/heads/{branch}"),
            "newObjectId": new_sha,
            "oldObjectId": old_sha,
        }]);

        debug!(branch = %branch, sha = %new_sha, "Updating branch ref");
        let results: ValueList<RefUpdateResult> =
            self.send(self.client.post(&url).json(&body), &url).await?;

        let accepted = results
            .value
            .first()
            .ok_or_else(|| VcsError::MalformedResponse("empty ref update result".into()))?;

        if !accepted.success {
            return Err(VcsError::RefUpdateRejected {
                branch: branch.to_string(),
                old_sha: old_sha.to_string(),
            });
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
        let edits: Vec<serde_json::Value> = changes
            .iter()
            .map(|change| {
                json!({
                    "changeType": "edit",
                    "item": { "path": rooted(&change.path) },
                    "newContent": {
                        "content": change.content,
                        "contentType": "rawtext",
                    },
                })
            })
            .collect();

        let url = self.url("pushes");
        let body = json!({
            "refUpdates": [{
                "name": format!("refs/heads/{branch}"),
                "oldObjectId": last_sha,
            }],
            "commits": [{
                "comment": message,
                "changes": edits,
            }],
        });

        debug!(branch = %branch, files = changes.len(), "Pushing release commit");
        let _: serde_json::Value = self.send(self.client.post(&url).json(&body), &url).await?;

        Ok(())
    }

    async fn find_pr(&self, to: &str, from: &str) -> Result<Option<u64>, VcsError> {
        let url = self.url(&format!(
            "pullrequests?searchCriteria.sourceRefName=refs/heads/{from}&searchCriteria.targetRefName=refs/heads/{to}&searchCriteria.status=active&$top=1"
        ));
        let prs: ValueList<PullRequestRef> = self.send(self.client.get(&url), &url).await?;

        Ok(prs.value.into_iter().next().map(|pr| pr.pull_request_id))
    }

    async fn create_pr(
        &self,
        to: &str,
        from: &str,
        title: &str,
        description: &str,
    ) -> Result<u64, VcsError> {
        let url = self.url("pullrequests");
        let body = json!({
            "sourceRefName": format!("refs/heads/{from}"),
            "targetRefName": format!("refs/heads/{to}"),
            "title": title,
            "description": description,
        });

        let pr: PullRequestRef = self.send(self.client.post(&url).json(&body), &url).await?;
        Ok(pr.pull_request_id)
    }

    async fn update_pr(&self, id: u64, title: &str, description: &str) -> Result<u64, VcsError> {
        let url = self.url(&format!("pullrequests/{id}"));
        let body = json!({ "title": title, "description": description });

        let pr: PullRequestRef = self.send(self.client.patch(&url).json(&body), &url).await?;
        Ok(pr.pull_request_id)
    }

    async fn last_commit(&self, branch: &str) -> Result<(String, String), VcsError> {
        let url = self.url(&format!(
            "commits?searchCriteria.$top=1&searchCriteria.itemVersion.version={branch}"
        ));
        let commits: ValueList<GitCommit> = self.send(self.client.get(&url), &url).await?;

        let tip = commits
            .value
            .into_iter()
            .next()
            .ok_or_else(|| VcsError::EmptyBranch(branch.to_string()))?;

        Ok((tip.commit_id, tip.comment))
    }

    async fn create_annotated_tag(&self, sha: &str, name: &str) -> Result<(), VcsError> {
        let url = self.url("annotatedtags");
        let body = json!({
            "name": name,
            "message": name,
            "taggedObject": { "objectId": sha },
        });

        debug!(tag = %name, sha = %sha, "Creating annotated tag");
        let _: serde_json::Value = self.send(self.client.post(&url).json(&body), &url).await?;

        Ok(())
    }

    async fn pr_title(&self, id: u64) -> Result<String, VcsError> {
        let url = self.url(&format!("pullrequests/{id}"));
        let pr: PullRequestDetails = self.send(self.client.get(&url), &url).await?;

        Ok(pr.title)
    }
}
