//! Local repository access through the git CLI.

pub mod runner;

pub use runner::{CommandLineGit, GitRunner};
