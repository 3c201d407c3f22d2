//! # Client configuration: `livrebox.toml`
//!
//! Tells the client where the hosted platform lives and how to query the book
//! search. Every section is optional; a missing or empty file is the same as the
//! defaults below.
//!
//! ```toml
//! [backend]
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "public-anon-key"
//!
//! [storage]
//! avatars_bucket = "avatars"
//!
//! [search]
//! endpoint = "https://www.googleapis.com/books/v1/volumes"
//! max_results = 10
//! language = "fr"      # "" searches every language
//! ```
//!
//! Environment overrides are applied on top by `api::BackendConfig`.

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `livrebox.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LivreboxConfig {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub search: SearchSection,
}

/// Platform endpoint and public key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendSection {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub anon_key: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_avatars_bucket")]
    pub avatars_bucket: String,
}

fn default_avatars_bucket() -> String {
    "avatars".to_string()
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            avatars_bucket: default_avatars_bucket(),
        }
    }
}

/// Book search settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// ISO 639-1 code passed as `langRestrict`, empty for no restriction.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/books/v1/volumes".to_string()
}

fn default_max_results() -> u32 {
    10
}

fn default_language() -> String {
    "fr".to_string()
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            max_results: default_max_results(),
            language: default_language(),
        }
    }
}

impl LivreboxConfig {
    /// Config pointing at a platform instance.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            backend: BackendSection {
                url: url.into(),
                anon_key: anon_key.into(),
            },
            ..Self::default()
        }
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "livrebox.toml"
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = LivreboxConfig::from_toml("").unwrap();
        assert_eq!(config, LivreboxConfig::default());
        assert_eq!(config.storage.avatars_bucket, "avatars");
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.search.language, "fr");
    }

    #[test]
    fn test_partial_sections() {
        let config = LivreboxConfig::from_toml(
            r#"
            [backend]
            url = "https://demo.supabase.co"
            anon_key = "anon"

            [search]
            max_results = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.url, "https://demo.supabase.co");
        assert_eq!(config.search.max_results, 20);
        assert_eq!(
            config.search.endpoint,
            "https://www.googleapis.com/books/v1/volumes"
        );
    }

    #[test]
    fn test_empty_language_searches_everything() {
        let config = LivreboxConfig::from_toml(
            r#"
            [search]
            language = ""
            "#,
        )
        .unwrap();
        assert_eq!(config.search.language, "");
        assert_eq!(config.storage, StorageSection::default());
    }
}
