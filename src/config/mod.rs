//! Configuration: defaults, config file and environment overrides.

pub mod loader;

pub use loader::{
    DEFAULT_MAX_DIFF_TOKENS, FileConfig, MAX_TOKENS_ENV_VAR, MODEL_ENV_VAR, Settings,
    TEMPLATE_ENV_VAR, config_paths, config_paths_in, load_config_file, load_settings,
    resolve_settings,
};
