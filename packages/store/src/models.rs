//! # Row models for the Livrebox tables
//!
//! Every table the application reads or writes is modelled as an explicit struct.
//! Columns the platform allows to be `NULL` are `Option<_>` and carry
//! `#[serde(default)]`, so a row fetched with a narrower `select=` projection still
//! deserializes.
//!
//! ## Types
//!
//! | Struct | Table | Notes |
//! |--------|-------|-------|
//! | [`Identity`] | auth | Issued by the platform at sign-up, read-only here. |
//! | [`Session`] | auth | Access token plus the signed-in [`Identity`]. |
//! | [`Profile`] | `profiles` | One-to-one with an identity, same `id`. |
//! | [`Book`] | `books` | Shared catalog entry, de-duplicated on `google_id`. |
//! | [`Post`] | `posts` | A member's library entry, with a snapshot of the book. |
//! | [`Follow`] | `follow` | Directed edge follower → followed. |
//! | [`CandidateBook`] | (none) | A search result that has not been persisted. |
//!
//! The `New*` structs are insert payloads: they omit the columns the platform
//! generates (`id`, `created_at`).

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The remote tables the gateway knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Profiles,
    Books,
    Posts,
    Follow,
}

impl Table {
    /// Table name as exposed by the REST endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Books => "books",
            Table::Posts => "posts",
            Table::Follow => "follow",
        }
    }

    /// Columns forming the primary key, used for upserts.
    pub fn primary_key(&self) -> &'static [&'static str] {
        match self {
            Table::Follow => &["follower_id", "followed_id"],
            _ => &["id"],
        }
    }

    /// Unique constraints, primary key first.
    pub fn unique_keys(&self) -> &'static [&'static [&'static str]] {
        match self {
            Table::Profiles => &[&["id"]],
            Table::Books => &[&["id"], &["google_id"]],
            Table::Posts => &[&["id"], &["user_id", "book_id"]],
            Table::Follow => &[&["follower_id", "followed_id"]],
        }
    }

    /// Whether the platform fills in `id` when an insert omits it.
    pub fn generates_id(&self) -> bool {
        matches!(self, Table::Books | Table::Posts)
    }

    /// Whether the table has a `created_at` column defaulting to now.
    pub fn has_created_at(&self) -> bool {
        matches!(self, Table::Posts | Table::Follow)
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed row of one of the remote tables.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const TABLE: Table;
}

/// The authenticated account as issued by the platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A signed-in session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) at which the access token expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: Identity,
}

impl Session {
    /// Whether the access token is past its expiry at `now`. A session without
    /// an expiry never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now.timestamp())
    }
}

/// Public identity of a member.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Record for Profile {
    const TABLE: Table = Table::Profiles;
}

impl Profile {
    /// Empty profile for an identity that has no row yet.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Username, or the generic member label.
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or("Utilisateur")
    }

    /// Upper-cased first letter of the username, `'?'` without one.
    pub fn initial(&self) -> char {
        self.username
            .as_deref()
            .and_then(|name| name.chars().next())
            .map(|c| c.to_uppercase().next().unwrap_or(c))
            .unwrap_or('?')
    }
}

/// A catalog entry shared by every member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Google Books volume id, used to de-duplicate across members.
    #[serde(default)]
    pub google_id: Option<String>,
}

impl Record for Book {
    const TABLE: Table = Table::Books;
}

/// Insert payload for [`Book`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub google_id: Option<String>,
}

impl From<&CandidateBook> for NewBook {
    fn from(candidate: &CandidateBook) -> Self {
        Self {
            title: candidate.title.clone(),
            author: candidate.authors.clone(),
            cover_url: candidate.thumbnail_url.clone(),
            description: candidate.description.clone(),
            google_id: Some(candidate.external_id.clone()),
        }
    }
}

/// Where a book sits in a member's library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadStatus {
    #[default]
    #[serde(rename = "lu")]
    Read,
    #[serde(rename = "a_lire")]
    WantToRead,
}

impl ReadStatus {
    /// Wire value stored in `posts.status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadStatus::Read => "lu",
            ReadStatus::WantToRead => "a_lire",
        }
    }

    /// Tab label shown in the library.
    pub fn label(&self) -> &'static str {
        match self {
            ReadStatus::Read => "Lus",
            ReadStatus::WantToRead => "À lire",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lu" => Some(ReadStatus::Read),
            "a_lire" => Some(ReadStatus::WantToRead),
            _ => None,
        }
    }
}

/// A member's library entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub book_id: Option<String>,
    pub book_title: String,
    #[serde(default)]
    pub book_author: Option<String>,
    #[serde(default)]
    pub book_cover_url: Option<String>,
    /// 0 to 5 in half-point steps.
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub status: ReadStatus,
    pub created_at: DateTime<Utc>,
}

impl Record for Post {
    const TABLE: Table = Table::Posts;
}

/// Insert payload for [`Post`]. The book fields are a snapshot and are never
/// re-synced with the [`Book`] row.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewPost {
    pub user_id: String,
    pub book_id: Option<String>,
    pub book_title: String,
    pub book_author: Option<String>,
    pub book_cover_url: Option<String>,
    pub rating: Option<f32>,
    pub comment: Option<String>,
    pub status: ReadStatus,
}

impl NewPost {
    /// Snapshot `book` into a fresh entry for `user_id`.
    pub fn for_book(user_id: impl Into<String>, book: &Book, status: ReadStatus) -> Self {
        Self {
            user_id: user_id.into(),
            book_id: Some(book.id.clone()),
            book_title: book.title.clone(),
            book_author: Some(book.author.clone()),
            book_cover_url: book.cover_url.clone(),
            rating: None,
            comment: None,
            status,
        }
    }
}

/// Directed follow edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: String,
    pub followed_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Follow {
    const TABLE: Table = Table::Follow;
}

impl Follow {
    pub fn new(follower_id: impl Into<String>, followed_id: impl Into<String>) -> Self {
        Self {
            follower_id: follower_id.into(),
            followed_id: followed_id.into(),
            created_at: None,
        }
    }
}

/// A book returned by the external search, not yet in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateBook {
    pub external_id: String,
    pub title: String,
    /// Authors joined with `", "`.
    pub authors: String,
    pub thumbnail_url: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_without_status_reads_as_read() {
        let post: Post = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "user_id": "u1",
            "book_title": "Dune",
            "created_at": "2024-01-02T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(post.status, ReadStatus::Read);
        assert!(post.rating.is_none());
        assert!(post.book_id.is_none());
    }

    #[test]
    fn test_status_wire_values() {
        assert_eq!(
            serde_json::to_value(ReadStatus::WantToRead).unwrap(),
            serde_json::json!("a_lire")
        );
        assert_eq!(ReadStatus::parse("lu"), Some(ReadStatus::Read));
        assert_eq!(ReadStatus::parse("read"), None);
    }

    #[test]
    fn test_profile_display_fallbacks() {
        let anon = Profile::empty("u1");
        assert_eq!(anon.display_name(), "Utilisateur");
        assert_eq!(anon.initial(), '?');

        let named = Profile {
            username: Some("élise".to_string()),
            ..Profile::empty("u2")
        };
        assert_eq!(named.display_name(), "élise");
        assert_eq!(named.initial(), 'É');
    }

    #[test]
    fn test_new_post_snapshots_book() {
        let book = Book {
            id: "b1".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            cover_url: Some("https://covers/dune.jpg".to_string()),
            description: None,
            google_id: Some("g-dune".to_string()),
        };
        let post = NewPost::for_book("u1", &book, ReadStatus::WantToRead);
        assert_eq!(post.book_id.as_deref(), Some("b1"));
        assert_eq!(post.book_title, "Dune");
        assert_eq!(post.book_author.as_deref(), Some("Frank Herbert"));
        assert_eq!(post.status, ReadStatus::WantToRead);
        assert!(post.rating.is_none());
    }

    #[test]
    fn test_session_expiry() {
        let mut session: Session = serde_json::from_value(serde_json::json!({
            "access_token": "jwt",
            "expires_at": 1_700_000_000,
            "user": {"id": "u1", "created_at": "2024-01-01T00:00:00Z"}
        }))
        .unwrap();
        let before = DateTime::from_timestamp(1_699_999_999, 0).unwrap();
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert!(!session.is_expired_at(before));
        assert!(session.is_expired_at(at));

        session.expires_at = None;
        assert!(!session.is_expired_at(at));
    }
}
