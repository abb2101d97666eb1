//! Conventional commit extraction and PR title linting.

pub mod linter;
pub mod parser;

pub use linter::CommitLinter;
pub use parser::{Commit, CommitParser};
