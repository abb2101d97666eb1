//! Changelog fragment generation.

pub mod builder;

pub use builder::ChangelogBuilder;
