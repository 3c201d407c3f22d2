//! # Book search
//!
//! Free-text search against the Google Books volumes endpoint. Results are
//! normalized into [`CandidateBook`]s; nothing is persisted until a member adds one.
//!
//! [`BookSearch::search`] never fails: transport and decode errors are logged and
//! produce an empty list, which the library screen shows as "no results". Callers
//! that need the error use [`GoogleBooks::try_search`].

use std::future::Future;

use serde::Deserialize;
use store::config::SearchSection;
use store::CandidateBook;
use thiserror::Error;

const UNTITLED: &str = "Sans titre";
const UNKNOWN_AUTHOR: &str = "Auteur inconnu";
/// Upper bound the volumes endpoint accepts for `maxResults`.
const MAX_RESULTS_LIMIT: u32 = 40;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(String),
    #[error("search service answered HTTP {0}")]
    Status(u16),
    #[error("unexpected search response: {0}")]
    Decode(String),
}

/// Tuning for one search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub max_results: u32,
    /// `langRestrict` value, `None` for every language.
    pub language: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SearchSection::default())
    }
}

impl From<&SearchSection> for SearchOptions {
    fn from(section: &SearchSection) -> Self {
        let language = section.language.trim();
        Self {
            max_results: section.max_results,
            language: (!language.is_empty()).then(|| language.to_string()),
        }
    }
}

/// Anything that turns a query into candidate books.
pub trait BookSearch: Clone {
    fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> impl Future<Output = Vec<CandidateBook>>;
}

/// Client for the Google Books volumes endpoint.
#[derive(Debug, Clone)]
pub struct GoogleBooks {
    http: reqwest::Client,
    endpoint: String,
}

impl Default for GoogleBooks {
    fn default() -> Self {
        Self::new(&SearchSection::default().endpoint)
    }
}

impl GoogleBooks {
    pub fn new(endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Query parameters sent for `query`.
    pub fn params(query: &str, options: &SearchOptions) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", query.trim().to_string()),
            (
                "maxResults",
                options.max_results.clamp(1, MAX_RESULTS_LIMIT).to_string(),
            ),
        ];
        if let Some(language) = &options.language {
            params.push(("langRestrict", language.clone()));
        }
        params
    }

    pub async fn try_search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<CandidateBook>, SearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .http
            .get(&self.endpoint)
            .query(&Self::params(query, options))
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        parse_volumes(&text)
    }
}

impl BookSearch for GoogleBooks {
    async fn search(&self, query: &str, options: &SearchOptions) -> Vec<CandidateBook> {
        match self.try_search(query, options).await {
            Ok(books) => books,
            Err(err) => {
                tracing::error!("book search for {query:?} failed: {err}");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct VolumeList {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    id: String,
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "imageLinks", default)]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(rename = "smallThumbnail", default)]
    small_thumbnail: Option<String>,
}

/// Parse a volumes response body. A body without `items` is an empty result.
pub fn parse_volumes(body: &str) -> Result<Vec<CandidateBook>, SearchError> {
    let list: VolumeList =
        serde_json::from_str(body).map_err(|e| SearchError::Decode(e.to_string()))?;
    Ok(list.items.into_iter().map(normalize).collect())
}

fn normalize(volume: Volume) -> CandidateBook {
    let info = volume.volume_info;
    let title = info
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    let authors = if info.authors.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        info.authors.join(", ")
    };
    let thumbnail_url = info
        .image_links
        .and_then(|links| links.thumbnail.or(links.small_thumbnail))
        .map(|url| secure_url(&url));

    CandidateBook {
        external_id: volume.id,
        title,
        authors,
        thumbnail_url,
        description: info.description,
    }
}

/// Covers are served over plain HTTP by default; browsers block them as mixed content.
fn secure_url(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_volumes() {
        let body = r#"{
            "kind": "books#volumes",
            "totalItems": 3,
            "items": [
                {"id": "v1", "volumeInfo": {
                    "title": "Good Omens",
                    "authors": ["Terry Pratchett", "Neil Gaiman"],
                    "description": "The world ends on a Saturday.",
                    "imageLinks": {"smallThumbnail": "http://books.google.com/s.jpg",
                                   "thumbnail": "http://books.google.com/t.jpg"}
                }},
                {"id": "v2", "volumeInfo": {
                    "imageLinks": {"smallThumbnail": "http://books.google.com/only-small.jpg"}
                }},
                {"id": "v3"}
            ]
        }"#;
        let books = parse_volumes(body).unwrap();
        assert_eq!(books.len(), 3);

        assert_eq!(books[0].external_id, "v1");
        assert_eq!(books[0].authors, "Terry Pratchett, Neil Gaiman");
        assert_eq!(
            books[0].thumbnail_url.as_deref(),
            Some("https://books.google.com/t.jpg")
        );

        assert_eq!(books[1].title, "Sans titre");
        assert_eq!(books[1].authors, "Auteur inconnu");
        assert_eq!(
            books[1].thumbnail_url.as_deref(),
            Some("https://books.google.com/only-small.jpg")
        );

        assert_eq!(books[2].thumbnail_url, None);
        assert_eq!(books[2].description, None);
    }

    #[test]
    fn test_no_items_is_empty() {
        let books = parse_volumes(r#"{"kind": "books#volumes", "totalItems": 0}"#).unwrap();
        assert!(books.is_empty());
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        assert!(matches!(
            parse_volumes("<html>"),
            Err(SearchError::Decode(_))
        ));
    }

    #[test]
    fn test_params() {
        let options = SearchOptions::default();
        assert_eq!(
            GoogleBooks::params(" dune ", &options),
            vec![
                ("q", "dune".to_string()),
                ("maxResults", "10".to_string()),
                ("langRestrict", "fr".to_string()),
            ]
        );

        let options = SearchOptions {
            max_results: 500,
            language: None,
        };
        assert_eq!(
            GoogleBooks::params("dune", &options),
            vec![("q", "dune".to_string()), ("maxResults", "40".to_string())]
        );
    }

    #[test]
    fn test_options_from_config() {
        let section = SearchSection {
            language: "  ".to_string(),
            ..SearchSection::default()
        };
        assert_eq!(SearchOptions::from(&section).language, None);
    }

    #[tokio::test]
    async fn test_blank_query_skips_request() {
        let client = GoogleBooks::new("http://127.0.0.1:9/unreachable");
        assert_eq!(
            client.try_search("   ", &SearchOptions::default()).await,
            Ok(Vec::new())
        );
    }
}
