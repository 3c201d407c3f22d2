//! Backend configuration from `livrebox.toml` and environment variables.

use store::LivreboxConfig;
use thiserror::Error;

pub const URL_VAR: &str = "LIVREBOX_SUPABASE_URL";
pub const ANON_KEY_VAR: &str = "LIVREBOX_SUPABASE_ANON_KEY";
pub const SEARCH_LANGUAGE_VAR: &str = "LIVREBOX_SEARCH_LANGUAGE";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid livrebox.toml: {0}")]
    Invalid(String),
}

/// Everything the REST gateway needs to reach the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// Project URL without a trailing slash.
    pub url: String,
    pub anon_key: String,
    pub avatars_bucket: String,
}

impl BackendConfig {
    /// Validate a loaded [`LivreboxConfig`].
    pub fn from_config(config: &LivreboxConfig) -> Result<Self, ConfigError> {
        let url = config.backend.url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(ConfigError::Missing(URL_VAR));
        }
        let anon_key = config.backend.anon_key.trim();
        if anon_key.is_empty() {
            return Err(ConfigError::Missing(ANON_KEY_VAR));
        }
        Ok(Self {
            url: url.to_string(),
            anon_key: anon_key.to_string(),
            avatars_bucket: config.storage.avatars_bucket.clone(),
        })
    }
}

/// The client configuration: `livrebox.toml` when present, overlaid with the
/// `LIVREBOX_*` environment variables.
pub fn load_config() -> Result<LivreboxConfig, ConfigError> {
    let mut config = read_file()?;
    apply_overrides(&mut config, env_var);
    Ok(config)
}

/// Overlay environment values on top of file values.
pub fn apply_overrides(config: &mut LivreboxConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(URL_VAR) {
        config.backend.url = url;
    }
    if let Some(key) = lookup(ANON_KEY_VAR) {
        config.backend.anon_key = key;
    }
    if let Some(language) = lookup(SEARCH_LANGUAGE_VAR) {
        config.search.language = language;
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_file() -> Result<LivreboxConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let path = std::env::var("LIVREBOX_CONFIG")
        .unwrap_or_else(|_| LivreboxConfig::filename().to_string());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            tracing::debug!(path = %path, "reading client configuration");
            LivreboxConfig::from_toml(&text).map_err(|e| ConfigError::Invalid(e.to_string()))
        }
        Err(_) => Ok(LivreboxConfig::default()),
    }
}

// The browser bundle has no file system, values are baked in at build time.
#[cfg(target_arch = "wasm32")]
fn read_file() -> Result<LivreboxConfig, ConfigError> {
    Ok(LivreboxConfig::default())
}

#[cfg(not(target_arch = "wasm32"))]
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(target_arch = "wasm32")]
fn env_var(name: &str) -> Option<String> {
    let value = match name {
        URL_VAR => option_env!("LIVREBOX_SUPABASE_URL"),
        ANON_KEY_VAR => option_env!("LIVREBOX_SUPABASE_ANON_KEY"),
        SEARCH_LANGUAGE_VAR => option_env!("LIVREBOX_SEARCH_LANGUAGE"),
        _ => None,
    };
    value.map(str::to_string).filter(|v| !v.trim().is_empty())
}
