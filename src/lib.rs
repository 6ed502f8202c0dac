//! lazycommit - A CLI tool that writes commit messages for staged changes.
//!
//! # Overview
//!
//! lazycommit collects the pending diff from Git or Jujutsu (leaving out lock
//! files and files marked `linguist-generated` in `.gitattributes`), bounds it
//! to a token budget, and pipes it to the `llm` CLI with a commit-message
//! prompt. The model's answer streams to stdout.

pub mod commit;
pub mod config;
pub mod error;
pub mod llm;
pub mod process;
pub mod tokens;
pub mod vcs;

// Re-export commonly used types
pub use commit::generate_commit_message;
pub use config::Settings;
pub use error::{
    CollectionError, ConfigError, GenerateError, SubprocessError, TemplateError, TokenizationError,
};
pub use process::{ProcessOutput, ProcessRunner, SystemRunner};
pub use tokens::{DiffTruncator, TruncationResult};
pub use vcs::{DiffRequest, ExcludePatterns, VcsKind};
