//! Error types for lazycommit modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::vcs::VcsKind;

/// Errors from loading configuration. Never fatal: defaults are used instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDirectory,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error loading config from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {key}: expected a positive integer")]
    InvalidValue { key: String, value: String },
}

/// Errors from building the system prompt.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unclosed template action starting at byte {offset}")]
    Unclosed { offset: usize },

    #[error("Unsupported template action '{{{{{0}}}}}': only {{{{.Branch}}}} and {{{{.UserContext}}}} are available")]
    UnsupportedAction(String),

    #[error("Unknown template field '.{0}': expected Branch or UserContext")]
    UnknownField(String),
}

/// Errors from collecting the diff to describe.
#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("Neither Git nor Jujutsu repository detected.")]
    NoRepository,

    #[error("Failed to parse {path}: {source}")]
    Attributes {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to get diff from {vcs}: {source}")]
    Command {
        vcs: VcsKind,
        #[source]
        source: SubprocessError,
    },
}

/// Errors from the tokenizer. Never fatal: the raw diff is used instead.
#[derive(Error, Debug)]
pub enum TokenizationError {
    #[error("Failed to get tokenizer: {0}")]
    Init(String),

    #[error("Failed to decode truncated tokens: {0}")]
    Decode(String),
}

/// Errors from spawning and waiting on external commands.
#[derive(Error, Debug)]
pub enum SubprocessError {
    #[error("'{program}' command is not installed. Please install it and try again.")]
    NotInstalled { program: String },

    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to communicate with {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}{}",
             code.map_or("unknown status".to_string(), |c| format!("code {c}")),
             if stderr.trim().is_empty() { String::new() } else { format!(": {}", stderr.trim()) })]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },
}

/// Errors that abort commit message generation.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Failed to render prompt template: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to get diff: {0}")]
    Collection(#[from] CollectionError),

    #[error("No changes to describe (nothing is staged)")]
    NoChanges,

    #[error("LLM invocation failed: {0}")]
    Llm(#[from] SubprocessError),
}
