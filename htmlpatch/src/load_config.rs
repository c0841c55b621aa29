/// `load_config` module: loads the YAML run configuration into the core
/// [`PatchConfig`] and layers environment overrides on top.
///
/// This is the only place where user-supplied YAML is parsed. Any failure
/// results in an `anyhow::Error` with a clear diagnostic, surfaced at the CLI
/// boundary.
///
/// # Environment
/// - `HTMLPATCH_CACHE_TOKEN`: fixed cache-busting token, overriding
///   `cache.token` from the file.
use anyhow::Result;
use htmlpatch_core::config::PatchConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const CACHE_TOKEN_ENV: &str = "HTMLPATCH_CACHE_TOKEN";

/// Loads a YAML config file and injects environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PatchConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: PatchConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    inject_env(&mut config);
    Ok(config)
}

/// The file at `path` when given, defaults otherwise; env overrides apply
/// either way.
pub fn resolve_config(path: Option<&Path>) -> Result<PatchConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No config file given, using defaults");
            let mut config = PatchConfig::default();
            inject_env(&mut config);
            Ok(config)
        }
    }
}

fn inject_env(config: &mut PatchConfig) {
    if let Ok(token) = std::env::var(CACHE_TOKEN_ENV) {
        let token = token.trim();
        if !token.is_empty() {
            info!(env = CACHE_TOKEN_ENV, "Cache token taken from environment");
            config.cache.token = Some(token.to_string());
        }
    }
}
