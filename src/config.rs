//! Configuration loading for semflow.
//!
//! Configuration lives in `.semflow.json` next to the repository root. Every
//! field is optional; a partial file overrides only the keys it names and
//! everything else keeps its default.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".semflow.json";

/// How a changelog section influences the next version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BumpLevel {
    Major,
    Minor,
    Patch,
    #[default]
    None,
}

/// Supported version file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateKind {
    Maven,
    Yaml,
    PackageJson,
    Toml,
}

/// One changelog section: its heading, version impact, and the commit types
/// it owns. The order of sections in the config is the order in the rendered
/// changelog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangelogSection {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub increment: BumpLevel,
    #[serde(default)]
    pub includes: Vec<String>,
}

/// One version file to patch when preparing a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpec {
    #[serde(default)]
    pub file_path: String,
    pub kind: UpdateKind,
    #[serde(default)]
    pub pom_path: String,
    #[serde(default)]
    pub yaml_path: String,
    #[serde(default)]
    pub toml_path: String,
}

/// Pull request title lint policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrLint {
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
    #[serde(default = "default_types_requiring_jira")]
    pub types_requiring_jira: Vec<String>,
}

impl Default for PrLint {
    fn default() -> Self {
        Self {
            allowed_types: default_allowed_types(),
            types_requiring_jira: default_types_requiring_jira(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_git_command")]
    pub git_command: String,
    #[serde(default = "default_git_tag_command")]
    pub git_tag_command: String,
    #[serde(default = "default_starting_version")]
    pub starting_version: String,
    #[serde(default = "default_extract_commit_regex")]
    pub extract_commit_regex: String,
    #[serde(default = "default_link_prefix")]
    pub link_prefix: String,
    #[serde(default = "default_release_commit_prefix")]
    pub release_commit_prefix: String,
    #[serde(default = "default_snapshot_commit_prefix")]
    pub snapshot_commit_prefix: String,
    #[serde(default = "default_changelog_path")]
    pub changelog_path: String,
    #[serde(default = "default_release_branch_prefix")]
    pub release_branch_prefix: String,
    #[serde(default = "default_changelog_sections")]
    pub changelog_sections: Vec<ChangelogSection>,
    #[serde(default = "default_updates")]
    pub updates: Vec<UpdateSpec>,
    #[serde(default)]
    pub pr_lint: PrLint,
}

fn default_git_command() -> String {
    "git".to_string()
}

fn default_git_tag_command() -> String {
    "tag".to_string()
}

fn default_starting_version() -> String {
    "1.0.0".to_string()
}

// Expression breakdown:
//   ^(?:Merged PR(?: \d+)?:\s*)?  - optional squash-merge prefix
//   (\w+)                         - the commit type as a whole word
//   (?:\(([^)]+)\))?              - optionally, the scope inside ()
//   (!?)                          - optional breaking change marker
//   \s*:\s*                       - colon after the type or type(scope)
//   (?:\[(.*?)\]\s*)?             - a work item reference inside []
//   (.+)$                         - the rest of the line as a subject
fn default_extract_commit_regex() -> String {
    r"^(?:Merged PR(?: \d+)?:\s*)?(\w+)(?:\(([^)]+)\))?(!?)\s*:\s*(?:\[(.*?)\]\s*)?(.+)$".to_string()
}

fn default_link_prefix() -> String {
    "http://example.com/".to_string()
}

fn default_release_commit_prefix() -> String {
    "chore(release): ".to_string()
}

fn default_snapshot_commit_prefix() -> String {
    "chore(snapshot): ".to_string()
}

fn default_changelog_path() -> String {
    "CHANGELOG.md".to_string()
}

fn default_release_branch_prefix() -> String {
    "semflow--".to_string()
}

fn default_changelog_sections() -> Vec<ChangelogSection> {
    vec![
        ChangelogSection {
            section: "Breaking Changes".to_string(),
            hidden: false,
            increment: BumpLevel::Major,
            includes: vec!["feat!".to_string(), "fix!".to_string()],
        },
        ChangelogSection {
            section: "Features".to_string(),
            hidden: false,
            increment: BumpLevel::Minor,
            includes: vec!["feat".to_string()],
        },
        ChangelogSection {
            section: "Fixes".to_string(),
            hidden: false,
            increment: BumpLevel::Patch,
            includes: vec!["fix".to_string()],
        },
    ]
}

fn default_updates() -> Vec<UpdateSpec> {
    vec![UpdateSpec {
        file_path: "pom.xml".to_string(),
        kind: UpdateKind::Maven,
        pom_path: "//project/properties/revision".to_string(),
        yaml_path: String::new(),
        toml_path: String::new(),
    }]
}

fn default_allowed_types() -> Vec<String> {
    [
        "feat", "feat!", "fix", "docs", "style", "refactor", "perf", "test", "build", "ci",
        "chore", "revert",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_types_requiring_jira() -> Vec<String> {
    ["feat", "feat!", "fix"].iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            git_command: default_git_command(),
            git_tag_command: default_git_tag_command(),
            starting_version: default_starting_version(),
            extract_commit_regex: default_extract_commit_regex(),
            link_prefix: default_link_prefix(),
            release_commit_prefix: default_release_commit_prefix(),
            snapshot_commit_prefix: default_snapshot_commit_prefix(),
            changelog_path: default_changelog_path(),
            release_branch_prefix: default_release_branch_prefix(),
            changelog_sections: default_changelog_sections(),
            updates: default_updates(),
            pr_lint: PrLint::default(),
        }
    }
}

impl Config {
    /// Load configuration from [`CONFIG_FILE_NAME`] in the working directory.
    ///
    /// A missing file yields the defaults. A present file is merged over the
    /// defaults key by key.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// Pivot the configured sections into a commit type lookup.
    ///
    /// Fails when two sections claim the same commit type, since the type
    /// could not be rendered under a single heading.
    pub fn pivot_sections(&self) -> Result<HashMap<String, ChangelogSection>, ConfigError> {
        let mut result = HashMap::new();

        for section in &self.changelog_sections {
            for commit_type in &section.includes {
                if result.contains_key(commit_type) {
                    return Err(ConfigError::DuplicateType(commit_type.clone()));
                }
                result.insert(commit_type.clone(), section.clone());
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();

        assert_eq!(cfg.git_command, "git");
        assert_eq!(cfg.git_tag_command, "tag");
        assert_eq!(cfg.starting_version, "1.0.0");
        assert_eq!(cfg.changelog_path, "CHANGELOG.md");
        assert_eq!(cfg.release_branch_prefix, "semflow--");
        assert_eq!(cfg.changelog_sections.len(), 3);
        assert_eq!(cfg.changelog_sections[0].section, "Breaking Changes");
        assert_eq!(cfg.changelog_sections[0].increment, BumpLevel::Major);
        assert_eq!(cfg.updates.len(), 1);
        assert_eq!(cfg.updates[0].kind, UpdateKind::Maven);
        assert_eq!(cfg.pr_lint.allowed_types.len(), 12);
    }

    #[test]
    fn test_partial_config_overrides_only_named_fields() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{
                "linkPrefix": "https://myjira.example.com/browse/",
                "releaseBranchPrefix": "release--"
            }"#,
        )
        .expect("failed to write config");

        let cfg = Config::load_from(&path).expect("failed to load config");

        assert_eq!(cfg.link_prefix, "https://myjira.example.com/browse/");
        assert_eq!(cfg.release_branch_prefix, "release--");
        // untouched fields keep their defaults
        assert_eq!(cfg.git_command, "git");
        assert_eq!(cfg.starting_version, "1.0.0");
        assert_eq!(cfg.changelog_sections.len(), 3);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);

        let cfg = Config::load_from(&path).expect("failed to load config");

        assert_eq!(cfg.release_commit_prefix, "chore(release): ");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{not json").expect("failed to write config");

        let result = Config::load_from(&path);

        assert!(matches!(result, Err(ConfigError::ParseFailed { .. })));
    }

    #[test]
    fn test_pivot_sections() {
        let cfg = Config::default();

        let pivot = cfg.pivot_sections().expect("failed to pivot sections");

        assert_eq!(pivot.len(), 4);
        assert_eq!(pivot["feat"].section, "Features");
        assert_eq!(pivot["feat"].increment, BumpLevel::Minor);
        assert_eq!(pivot["feat!"].section, "Breaking Changes");
        assert_eq!(pivot["fix!"].section, "Breaking Changes");
        assert_eq!(pivot["fix"].increment, BumpLevel::Patch);
    }

    #[test]
    fn test_pivot_rejects_duplicate_type() {
        let mut cfg = Config::default();
        cfg.changelog_sections.push(ChangelogSection {
            section: "More Features".to_string(),
            hidden: false,
            increment: BumpLevel::Minor,
            includes: vec!["feat".to_string()],
        });

        let result = cfg.pivot_sections();

        match result {
            Err(ConfigError::DuplicateType(t)) => assert_eq!(t, "feat"),
            other => panic!("Expected DuplicateType error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_kind_round_trip() {
        let spec: UpdateSpec = serde_json::from_str(
            r#"{"filePath": "api.yaml", "kind": "YAML", "yamlPath": ".info.version"}"#,
        )
        .expect("failed to parse update spec");

        assert_eq!(spec.kind, UpdateKind::Yaml);
        assert_eq!(spec.yaml_path, ".info.version");
        assert!(spec.pom_path.is_empty());
    }

    #[test]
    fn test_unknown_update_kind_is_an_error() {
        let result: Result<UpdateSpec, _> =
            serde_json::from_str(r#"{"filePath": "x", "kind": "GRADLE"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn test_increment_defaults_to_none() {
        let section: ChangelogSection =
            serde_json::from_str(r#"{"section": "Docs", "includes": ["docs"]}"#)
                .expect("failed to parse section");

        assert_eq!(section.increment, BumpLevel::None);
    }
}
