//! Error types for semflow modules using thiserror.

use thiserror::Error;

/// Errors from configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Commit type '{0}' is claimed by more than one changelog section")]
    DuplicateType(String),

    #[error("Invalid commit extraction regex: {0}")]
    InvalidRegex(#[source] regex_lite::Error),

    #[error("Invalid starting version '{version}': {source}")]
    InvalidStartingVersion {
        version: String,
        #[source]
        source: semver::Error,
    },
}

/// Errors from commit message extraction.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Message does not follow the conventional commit format: '{0}'")]
    Unparseable(String),
}

/// Errors from version resolution.
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Failed to parse version '{0}': {1}")]
    ParseFailed(String, #[source] semver::Error),
}

/// Errors from git subprocess invocations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
}

/// Errors from VCS host API operations.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Failed to build API client: {0}")]
    ClientBuild(String),

    #[error("Request to {url} failed: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned status {status}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("GitHub API call failed: {0}")]
    GitHubApi(#[source] Box<octocrab::Error>),

    #[error("Ref update for '{branch}' was rejected (expected old object {old_sha})")]
    RefUpdateRejected { branch: String, old_sha: String },

    #[error("Branch '{0}' has no commits")]
    EmptyBranch(String),

    #[error("Host returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors from version file updaters.
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No element matches '{path}' in '{file}'")]
    ElementNotFound { file: String, path: String },

    #[error("No key matches '{path}' in '{file}'")]
    PathNotFound { file: String, path: String },

    #[error("'{path}' is not a line index for '{file}': {source}")]
    InvalidLineIndex {
        file: String,
        path: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("Line index {index} is out of range for '{file}' ({lines} lines)")]
    LineOutOfRange {
        file: String,
        index: usize,
        lines: usize,
    },

    #[error("'{file}' is not valid JSON: {source}")]
    InvalidJson {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to rewrite XML in '{file}': {source}")]
    XmlRewrite {
        file: String,
        #[source]
        source: quick_xml::Error,
    },
}

/// Errors from release strategy execution, carrying the failing step.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Failed to fetch tags: {0}")]
    FetchTags(#[source] GitError),

    #[error("Failed to fetch commit log: {0}")]
    FetchLog(#[source] GitError),

    #[error("Failed to read last commit on '{branch}': {source}")]
    LastCommit {
        branch: String,
        #[source]
        source: VcsError,
    },

    #[error("Release commit does not carry a usable version: {0}")]
    ReleaseVersion(#[source] VersionError),

    #[error("Release commit message could not be parsed: {0}")]
    ReleaseMessage(#[source] CommitError),

    #[error("Failed to read changelog '{path}'. Make sure the file exists: {source}")]
    ChangelogRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to apply version update to '{path}': {source}")]
    Update {
        path: String,
        #[source]
        source: UpdateError,
    },

    #[error("Failed to sync release branch '{branch}': {source}")]
    BranchSync {
        branch: String,
        #[source]
        source: VcsError,
    },

    #[error("Failed to push release commit: {0}")]
    PushCommit(#[source] VcsError),

    #[error("Failed to create or update pull request: {0}")]
    PullRequest(#[source] VcsError),

    #[error("Failed to create annotated tag '{tag}': {source}")]
    CreateTag {
        tag: String,
        #[source]
        source: VcsError,
    },

    #[error("Failed to write version marker '{path}': {source}")]
    VersionMarker {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A pull request title rejected by the lint policy.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LintViolation {
    #[error(
        "Follow conventional commits! `type(scope): [JIRA-XXX] message` - scope and Jira item are optional. Allowed types are: {0}"
    )]
    NotConventional(String),

    #[error(
        "You have to specify a Jira in []. e.g. `feat: [JIRA-135] new endpoint`. Types that require a Jira reference: {0}"
    )]
    MissingWorkItem(String),
}
