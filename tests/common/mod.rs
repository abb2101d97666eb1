//! Scripted collaborator fakes shared by the integration tests.
//!
//! Not every test file uses every helper here.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use semflow::error::{GitError, VcsError};
use semflow::git::GitRunner;
use semflow::vcs::{StagedChange, VcsHost};

/// One captured `push_commit` call.
#[derive(Debug, Clone)]
pub struct RecordedPush {
    pub branch: String,
    pub last_sha: String,
    pub message: String,
    pub changes: Vec<StagedChange>,
}

/// One captured `update_ref` call.
#[derive(Debug, Clone)]
pub struct RecordedRefUpdate {
    pub branch: String,
    pub new_sha: String,
    pub old_sha: String,
}

/// One captured `create_pr` or `update_pr` call.
#[derive(Debug, Clone)]
pub struct RecordedPr {
    pub title: String,
    pub description: String,
}

fn out_of_stubs(what: &str) -> VcsError {
    VcsError::MalformedResponse(format!("stub has no more {what}"))
}

/// A [`VcsHost`] that replays scripted responses and records every write.
///
/// Branch tips are queued in the order the strategy reads them; an empty
/// string stands for a branch that does not exist yet. Clones share state,
/// so a test can keep one handle for assertions after moving the other into
/// the release context.
#[derive(Clone, Default)]
pub struct StubHost {
    pub refs: Arc<Mutex<Vec<String>>>,
    pub open_pr: Arc<Mutex<Option<u64>>>,
    pub tip_commit: Arc<Mutex<Option<(String, String)>>>,
    pub ref_updates: Arc<Mutex<Vec<RecordedRefUpdate>>>,
    pub pushes: Arc<Mutex<Vec<RecordedPush>>>,
    pub annotated_tags: Arc<Mutex<Vec<(String, String)>>>,
    pub created: Arc<Mutex<Vec<RecordedPr>>>,
    pub updated: Arc<Mutex<Vec<RecordedPr>>>,
}

impl StubHost {
    pub fn queue_ref(&self, sha: &str) {
        self.refs.lock().unwrap().push(sha.to_string());
    }

    pub fn set_open_pr(&self, id: u64) {
        *self.open_pr.lock().unwrap() = Some(id);
    }

    pub fn set_tip_commit(&self, sha: &str, message: &str) {
        *self.tip_commit.lock().unwrap() = Some((sha.to_string(), message.to_string()));
    }
}

#[async_trait]
impl VcsHost for StubHost {
    async fn last_ref(&self, _branch: &str) -> Result<Option<String>, VcsError> {
        let mut refs = self.refs.lock().unwrap();
        if refs.is_empty() {
            return Err(out_of_stubs("branch tips"));
        }

        let sha = refs.remove(0);
        Ok((!sha.is_empty()).then_some(sha))
    }

    async fn update_ref(
        &self,
        branch: &str,
        new_sha: &str,
        old_sha: &str,
    ) -> Result<String, VcsError> {
        self.ref_updates.lock().unwrap().push(RecordedRefUpdate {
            branch: branch.to_string(),
            new_sha: new_sha.to_string(),
            old_sha: old_sha.to_string(),
        });

        Ok(new_sha.to_string())
    }

    async fn push_commit(
        &self,
        branch: &str,
        last_sha: &str,
        message: &str,
        changes: &[StagedChange],
    ) -> Result<(), VcsError> {
        self.pushes.lock().unwrap().push(RecordedPush {
            branch: branch.to_string(),
            last_sha: last_sha.to_string(),
            message: message.to_string(),
            changes: changes.to_vec(),
        });

        Ok(())
    }

    async fn find_pr(&self, _to: &str, _from: &str) -> Result<Option<u64>, VcsError> {
        Ok(*self.open_pr.lock().unwrap())
    }

    async fn create_pr(
        &self,
        _to: &str,
        _from: &str,
        title: &str,
        description: &str,
    ) -> Result<u64, VcsError> {
        self.created.lock().unwrap().push(RecordedPr {
            title: title.to_string(),
            description: description.to_string(),
        });

        Ok(1)
    }

    async fn update_pr(&self, _id: u64, title: &str, description: &str) -> Result<u64, VcsError> {
        self.updated.lock().unwrap().push(RecordedPr {
            title: title.to_string(),
            description: description.to_string(),
        });

        Ok(1)
    }

    async fn last_commit(&self, _branch: &str) -> Result<(String, String), VcsError> {
        self.tip_commit
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| out_of_stubs("tip commits"))
    }

    async fn create_annotated_tag(&self, sha: &str, name: &str) -> Result<(), VcsError> {
        self.annotated_tags
            .lock()
            .unwrap()
            .push((sha.to_string(), name.to_string()));

        Ok(())
    }

    async fn pr_title(&self, _id: u64) -> Result<String, VcsError> {
        Err(out_of_stubs("pull request titles"))
    }
}

fn out_of_git_stubs(what: &str) -> GitError {
    GitError::NonZeroExit {
        command: format!("stub {what}"),
        code: 1,
        stderr: "queue is empty".to_string(),
    }
}

/// A [`GitRunner`] replaying queued tag and log listings.
#[derive(Clone, Default)]
pub struct StubGit {
    pub tags: Arc<Mutex<Vec<Vec<String>>>>,
    pub logs: Arc<Mutex<Vec<Vec<String>>>>,
}

impl StubGit {
    pub fn queue_tags(&self, tags: &[&str]) {
        self.tags
            .lock()
            .unwrap()
            .push(tags.iter().map(|tag| tag.to_string()).collect());
    }

    pub fn queue_log(&self, entries: Vec<String>) {
        self.logs.lock().unwrap().push(entries);
    }
}

#[async_trait]
impl GitRunner for StubGit {
    async fn tags(&self) -> Result<Vec<String>, GitError> {
        let mut tags = self.tags.lock().unwrap();
        if tags.is_empty() {
            return Err(out_of_git_stubs("tags"));
        }

        Ok(tags.remove(0))
    }

    async fn log(&self, _since: &str) -> Result<Vec<String>, GitError> {
        let mut logs = self.logs.lock().unwrap();
        if logs.is_empty() {
            return Err(out_of_git_stubs("log"));
        }

        Ok(logs.remove(0))
    }
}

/// Conventional feature commits with unique subjects, long enough that a
/// changelog over them blows past any PR description limit.
pub fn feature_logs(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("feat: change number {i} keeps every subject line unique"))
        .collect()
}
