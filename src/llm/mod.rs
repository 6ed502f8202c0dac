//! LLM CLI integration.

pub mod subprocess;

pub use subprocess::{LLM_PROGRAM, LlmCommand, check_llm_installed, get_timeout};
