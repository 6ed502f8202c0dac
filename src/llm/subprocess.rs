//! `llm` CLI invocation.

use std::env;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::SubprocessError;
use crate::process::ProcessRunner;

/// Name of the LLM command-line binary.
pub const LLM_PROGRAM: &str = "llm";

/// Default timeout for the LLM subprocess (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
pub const TIMEOUT_ENV_VAR: &str = "LAZYCOMMIT_LLM_TIMEOUT";

/// Get the configured timeout duration.
///
/// Reads from LAZYCOMMIT_LLM_TIMEOUT if set, otherwise uses the default of
/// 300 seconds. Logs a warning for values that are not a positive integer.
pub fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Check if the `llm` CLI is installed and on PATH.
///
/// Uses the `which` crate for cross-platform executable detection.
pub fn check_llm_installed() -> Result<(), SubprocessError> {
    which::which(LLM_PROGRAM)
        .map(|_| ())
        .map_err(|_| SubprocessError::NotInstalled {
            program: LLM_PROGRAM.to_string(),
        })
}

/// A single `llm` call: system prompt plus optional model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmCommand {
    system_prompt: String,
    model: Option<String>,
}

impl LlmCommand {
    pub fn new(system_prompt: impl Into<String>, model: Option<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            model,
        }
    }

    /// `[-m <model>] -s <system prompt>`.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4);
        if let Some(model) = &self.model {
            args.push("-m".to_string());
            args.push(model.clone());
        }
        args.push("-s".to_string());
        args.push(self.system_prompt.clone());
        args
    }

    /// Send `diff` on stdin and let the response stream to stdout.
    pub async fn run<R: ProcessRunner + ?Sized>(&self, runner: &R, diff: &str) -> Result<(), SubprocessError> {
        match &self.model {
            Some(model) => info!("Using model: {}", model),
            None => info!("Using default llm model"),
        }

        runner
            .pipe_through(LLM_PROGRAM, &self.args(), diff, get_timeout())
            .await
    }
}
