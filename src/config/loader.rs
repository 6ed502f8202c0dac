//! Config file discovery, parsing and environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ConfigError;

/// Built-in token budget for the diff.
pub const DEFAULT_MAX_DIFF_TOKENS: usize = 12_500;

/// Environment variable overriding `max_diff_tokens`.
pub const MAX_TOKENS_ENV_VAR: &str = "LAZYCOMMIT_MAX_TOKENS";

/// Environment variable overriding `prompt_path`.
pub const TEMPLATE_ENV_VAR: &str = "LAZYCOMMIT_TEMPLATE";

/// Environment variable overriding `model_name`.
pub const MODEL_ENV_VAR: &str = "LAZYCOMMIT_MODEL";

const APP_DIR: &str = "lazycommit";
const CONFIG_FILE: &str = "config.toml";
const HOME_CONFIG_FILE: &str = ".lazycommit.toml";

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Token budget for the diff sent to the LLM.
    pub max_diff_tokens: usize,
    /// Prompt template file; the embedded template is used when `None`.
    pub template_path: Option<PathBuf>,
    /// Model passed to `llm -m`; llm's default model when `None`.
    pub model: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_diff_tokens: DEFAULT_MAX_DIFF_TOKENS,
            template_path: None,
            model: None,
        }
    }
}

/// On-disk config file layout.
#[derive(Debug, Default, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileConfig {
    pub max_diff_tokens: Option<usize>,
    pub prompt_path: Option<String>,
    pub model_name: Option<String>,
}

impl Settings {
    /// Layer a config file over these settings. Empty strings count as unset.
    pub fn apply_file(&mut self, file: FileConfig) {
        match file.max_diff_tokens {
            Some(0) => warn!("Ignoring max_diff_tokens = 0 in config file"),
            Some(tokens) => self.max_diff_tokens = tokens,
            None => {}
        }
        if let Some(path) = non_empty(file.prompt_path) {
            self.template_path = Some(PathBuf::from(path));
        }
        if let Some(model) = non_empty(file.model_name) {
            self.model = Some(model);
        }
    }

    /// Layer `LAZYCOMMIT_*` environment variables over these settings.
    ///
    /// An unparseable token budget is reported and skipped; the other
    /// overrides still apply.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        let mut invalid = None;

        if let Some(raw) = env_value(MAX_TOKENS_ENV_VAR) {
            match parse_token_budget(&raw) {
                Some(tokens) => {
                    self.max_diff_tokens = tokens;
                    info!("Using max tokens from environment: {}", tokens);
                }
                None => {
                    invalid = Some(ConfigError::InvalidValue {
                        key: MAX_TOKENS_ENV_VAR.to_string(),
                        value: raw,
                    });
                }
            }
        }

        if let Some(path) = env_value(TEMPLATE_ENV_VAR) {
            info!("Using template path from environment: {}", path);
            self.template_path = Some(PathBuf::from(path));
        }

        if let Some(model) = env_value(MODEL_ENV_VAR) {
            info!("Using model from environment: {}", model);
            self.model = Some(model);
        }

        invalid.map_or(Ok(()), Err)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_token_budget(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&tokens| tokens > 0)
}

/// Config file locations in order of precedence.
///
/// `$XDG_CONFIG_HOME/lazycommit/config.toml` (defaulting to
/// `~/.config/lazycommit/config.toml`), then `~/.lazycommit.toml`.
pub fn config_paths() -> Result<Vec<PathBuf>, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    let xdg = env_value("XDG_CONFIG_HOME").map(PathBuf::from);
    Ok(config_paths_in(&home, xdg.as_deref()))
}

/// [`config_paths`] for an explicit home and XDG config directory.
pub fn config_paths_in(home: &Path, xdg_config_home: Option<&Path>) -> Vec<PathBuf> {
    let xdg = xdg_config_home
        .map(Path::to_path_buf)
        .unwrap_or_else(|| home.join(".config"));
    vec![
        xdg.join(APP_DIR).join(CONFIG_FILE),
        home.join(HOME_CONFIG_FILE),
    ]
}

/// Load the first existing config file among `paths`.
///
/// Returns `Ok(None)` when none exists.
pub fn load_config_file(paths: &[PathBuf]) -> Result<Option<(PathBuf, FileConfig)>, ConfigError> {
    let Some(path) = paths.iter().find(|p| p.is_file()) else {
        return Ok(None);
    };

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    Ok(Some((path.clone(), config)))
}

/// Resolve settings from defaults, the first config file in `paths`, and
/// the environment, in increasing order of precedence.
///
/// Never fails: problems are logged and the affected layer is skipped.
pub fn resolve_settings(paths: &[PathBuf]) -> Settings {
    let mut settings = Settings::default();

    match load_config_file(paths) {
        Ok(Some((path, file))) => {
            info!("Loaded configuration from {}", path.display());
            settings.apply_file(file);
        }
        Ok(None) => info!("No configuration file found, using defaults"),
        Err(e) => warn!("{}. Using defaults.", e),
    }

    if let Err(e) = settings.apply_env() {
        warn!("{}. Ignoring it.", e);
    }

    settings
}

/// Resolve settings from the standard config locations and the environment.
pub fn load_settings() -> Settings {
    match config_paths() {
        Ok(paths) => resolve_settings(&paths),
        Err(e) => {
            warn!("Error loading configuration: {}. Using defaults.", e);
            resolve_settings(&[])
        }
    }
}
