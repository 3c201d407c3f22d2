//! # API crate: network clients for Livrebox
//!
//! Everything that leaves the device goes through this crate. The screens depend
//! only on the [`store::Gateway`] contract and on [`BookSearch`]; this crate
//! provides the production implementations of both.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Backend configuration (`livrebox.toml` plus `LIVREBOX_*` variables) and auth payloads |
//! | [`supabase`] | [`SupabaseGateway`]: auth, rows and storage over the platform's REST services |
//! | [`search`] | [`GoogleBooks`]: volume search normalized into [`store::CandidateBook`] |

pub mod auth;
pub mod search;
pub mod supabase;

pub use auth::{load_config, BackendConfig, ConfigError, SESSION_STORAGE_KEY};
pub use search::{BookSearch, GoogleBooks, SearchError, SearchOptions};
pub use supabase::SupabaseGateway;

pub use store::LivreboxConfig;
