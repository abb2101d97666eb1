//! Current and next version calculation.

use std::collections::HashMap;

use semver::Version;
use tracing::{debug, info};

use crate::commits::Commit;
use crate::config::{BumpLevel, ChangelogSection, Config};
use crate::error::ConfigError;

/// Resolves the current released version from tag history and the next
/// version from parsed commits.
pub struct VersionResolver {
    starting_version: Version,
    commit_type_to_section: HashMap<String, ChangelogSection>,
}

impl VersionResolver {
    pub fn new(
        cfg: &Config,
        commit_type_to_section: HashMap<String, ChangelogSection>,
    ) -> Result<Self, ConfigError> {
        let starting_version = Version::parse(&cfg.starting_version).map_err(|source| {
            ConfigError::InvalidStartingVersion {
                version: cfg.starting_version.clone(),
                source,
            }
        })?;

        Ok(Self {
            starting_version,
            commit_type_to_section,
        })
    }

    /// Determine the last released version from a list of tag names.
    ///
    /// Tags that are not strict semantic versions (a `v` prefix, missing
    /// components) are discarded. `None` means no release exists yet.
    pub fn current(&self, tags: &[String]) -> Option<Version> {
        let mut versions: Vec<Version> = Vec::with_capacity(tags.len());

        for tag in tags {
            match Version::parse(tag) {
                Ok(version) => versions.push(version),
                Err(_) => {
                    debug!(tag = %tag, "Discarding tag that is not a strict semantic version");
                }
            }
        }

        if versions.is_empty() {
            info!(
                "No strict semantic version tags found. The next run will produce the first release."
            );
            return None;
        }

        versions.into_iter().max()
    }

    /// Compute the next version from the current one and the commits since.
    ///
    /// With no current version the configured starting version is returned
    /// as-is. Otherwise the strongest increment among the commits' sections
    /// wins; a major bump short-circuits the scan. Commit types without a
    /// section never move the version.
    pub fn next(&self, current: Option<&Version>, parsed_commits: &[Commit]) -> Version {
        let Some(current) = current else {
            return self.starting_version.clone();
        };

        let mut increase_minor = false;
        let mut increase_patch = false;

        for commit in parsed_commits {
            let Some(section) = self.commit_type_to_section.get(&commit.commit_type) else {
                continue;
            };

            match section.increment {
                BumpLevel::Major => return inc_major(current),
                BumpLevel::Minor => increase_minor = true,
                BumpLevel::Patch => increase_patch = true,
                BumpLevel::None => {}
            }
        }

        if increase_minor {
            inc_minor(current)
        } else if increase_patch {
            inc_patch(current)
        } else {
            current.clone()
        }
    }
}

fn inc_major(version: &Version) -> Version {
    Version::new(version.major + 1, 0, 0)
}

fn inc_minor(version: &Version) -> Version {
    Version::new(version.major, version.minor + 1, 0)
}

// A pre-release is finalized instead of patch-bumped.
pub(crate) fn inc_patch(version: &Version) -> Version {
    if version.pre.is_empty() {
        Version::new(version.major, version.minor, version.patch + 1)
    } else {
        bare(version)
    }
}

fn bare(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}
