mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = ["./supsync.toml", "~/.config/supsync/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.sync.workers == 0 {
        anyhow::bail!("sync.workers must be at least 1");
    }

    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be at least 1");
    }

    if config.backend.program.as_os_str().is_empty() {
        anyhow::bail!("backend.program cannot be empty");
    }

    if supsync_common::paths::normalize_extension(&config.backend.reference_extension).is_empty()
    {
        anyhow::bail!("backend.reference_extension cannot be empty");
    }

    for ext in &config.reference.extensions {
        if supsync_common::paths::normalize_extension(ext).is_empty() {
            anyhow::bail!("reference.extensions contains an empty extension");
        }
    }

    Ok(())
}
