//! Render a grouped changelog fragment for one version.

use std::collections::HashMap;

use chrono::NaiveDate;
use semver::Version;

use crate::commits::Commit;
use crate::config::{ChangelogSection, Config};

/// Builds the markdown fragment that is prepended to the changelog and used
/// as the release PR body.
///
/// Sections appear in configuration order, commits keep their log order
/// within a section, and commit types without a section are left out.
pub struct ChangelogBuilder {
    link_prefix: String,
    sections: Vec<ChangelogSection>,
    commit_type_to_section: HashMap<String, ChangelogSection>,
}

impl ChangelogBuilder {
    pub fn new(cfg: &Config, commit_type_to_section: HashMap<String, ChangelogSection>) -> Self {
        Self {
            link_prefix: cfg.link_prefix.clone(),
            sections: cfg.changelog_sections.clone(),
            commit_type_to_section,
        }
    }

    /// Generate the fragment for `next_version` from the commits since the
    /// last release. Sections that collect no commits are omitted entirely.
    pub fn generate(
        &self,
        next_version: &Version,
        extracted_commits: &[Commit],
        date: NaiveDate,
    ) -> String {
        let mut section_items: Vec<Vec<&Commit>> = vec![Vec::new(); self.sections.len()];

        // With duplicate section headings the last one wins, like any
        // name-keyed lookup would.
        let mut name_to_index: HashMap<&str, usize> = HashMap::new();
        for (idx, section) in self.sections.iter().enumerate() {
            name_to_index.insert(section.section.as_str(), idx);
        }

        for commit in extracted_commits {
            let Some(section) = self.commit_type_to_section.get(&commit.commit_type) else {
                // this commit type is not tracked in the changelog
                continue;
            };
            if let Some(&idx) = name_to_index.get(section.section.as_str()) {
                section_items[idx].push(commit);
            }
        }

        let mut output = String::new();
        output.push_str(&format!(
            "\n## {} ({})\n",
            next_version,
            date.format("%Y-%m-%d")
        ));

        for (section, items) in self.sections.iter().zip(&section_items) {
            if items.is_empty() {
                continue;
            }

            output.push_str(&format!("\n### {}\n", section.section));

            for commit in items {
                match &commit.link {
                    Some(link) => output.push_str(&format!(
                        "* [{}]({}{}) {}\n",
                        link, self.link_prefix, link, commit.title
                    )),
                    None => output.push_str(&format!("* {}\n", commit.title)),
                }
            }
        }

        output
    }
}
