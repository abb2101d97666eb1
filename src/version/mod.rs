//! Version resolution from tags and parsed commits.

pub mod resolve;

pub(crate) use resolve::inc_patch;
pub use resolve::VersionResolver;
