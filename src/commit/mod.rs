//! AI-generated commit messages via the `llm` CLI.

pub mod message;
pub mod prompt;

pub use message::{bound_diff, generate_commit_message};
pub use prompt::{DEFAULT_TEMPLATE, PromptData, load_template, render, render_prompt};
