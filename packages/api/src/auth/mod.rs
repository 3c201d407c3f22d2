//! Configuration and session payloads for the platform's auth endpoints.

mod config;
mod session;

pub use config::{apply_overrides, load_config, BackendConfig, ConfigError};
pub use session::{Credentials, RefreshRequest, SignUpResponse, TokenResponse, SESSION_STORAGE_KEY};
