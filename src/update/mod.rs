//! Version file updaters.
//!
//! Each updater rewrites the version inside one file format while leaving
//! the rest of the file byte for byte untouched, so release commits stay
//! reviewable.

mod maven;
mod package_json;
mod toml;
mod yaml;

use tracing::debug;

use crate::config::{UpdateKind, UpdateSpec};
use crate::error::UpdateError;
use crate::vcs::StagedChange;

/// Apply one configured update and return the rewritten file as a staged
/// change for the release commit.
pub fn execute(next_version: &str, spec: &UpdateSpec) -> Result<StagedChange, UpdateError> {
    let content =
        std::fs::read_to_string(&spec.file_path).map_err(|source| UpdateError::ReadFailed {
            path: spec.file_path.clone(),
            source,
        })?;

    debug!(file = %spec.file_path, version = %next_version, "Applying version update");

    let updated = match spec.kind {
        UpdateKind::Maven => maven::run(spec, &content, next_version)?,
        UpdateKind::Yaml => yaml::run(spec, &content, next_version)?,
        UpdateKind::PackageJson => package_json::run(spec, &content, next_version)?,
        UpdateKind::Toml => toml::run(spec, &content, next_version)?,
    };

    Ok(StagedChange {
        path: spec.file_path.clone(),
        content: updated,
    })
}
