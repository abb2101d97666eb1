//! TOML updater.
//!
//! The path for this kind is a zero based line index. The addressed line
//! is replaced wholesale with `version = "<next>"`, which sidesteps TOML
//! table resolution for files where the version line is stable.

use crate::config::UpdateSpec;
use crate::error::UpdateError;

pub(crate) fn run(
    spec: &UpdateSpec,
    content: &str,
    new_version: &str,
) -> Result<String, UpdateError> {
    let index: usize =
        spec.toml_path
            .trim()
            .parse()
            .map_err(|source| UpdateError::InvalidLineIndex {
                file: spec.file_path.clone(),
                path: spec.toml_path.clone(),
                source,
            })?;

    let replacement = format!("version = \"{new_version}\"");
    let mut lines: Vec<&str> = content.split('\n').collect();

    if index >= lines.len() {
        return Err(UpdateError::LineOutOfRange {
            file: spec.file_path.clone(),
            index,
            lines: lines.len(),
        });
    }

    lines[index] = &replacement;
    Ok(lines.join("\n"))
}
