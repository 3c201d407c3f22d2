//! # Gateway: the contract every screen uses to reach the backend
//!
//! [`Gateway`] is the single seam between the application and the hosted platform.
//! Screens never talk HTTP themselves: they build a [`Query`], call one of the
//! methods below and turn any [`GatewayError`] into a message.
//!
//! | Group | Methods |
//! |-------|---------|
//! | Identity | [`sign_up`](Gateway::sign_up), [`sign_in`](Gateway::sign_in), [`sign_out`](Gateway::sign_out), [`session`](Gateway::session), [`current_user`](Gateway::current_user) |
//! | Rows | [`select`](Gateway::select), [`select_one`](Gateway::select_one), [`single`](Gateway::single), [`maybe_single`](Gateway::maybe_single), [`count`](Gateway::count), [`insert`](Gateway::insert), [`update`](Gateway::update), [`delete`](Gateway::delete), [`upsert`](Gateway::upsert) |
//! | Files | [`upload`](Gateway::upload) |
//!
//! Implementations are cheap to clone and share their session between clones.
//! Two exist: [`crate::MemoryGateway`] in this crate and the REST client in `api`.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Identity, Record, Session, Table};
use crate::query::Query;

/// Failure of a gateway call.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GatewayError {
    #[error("not signed in")]
    Unauthenticated,
    #[error("{0}")]
    Auth(String),
    #[error("no matching row in {table}")]
    NotFound { table: Table },
    #[error("{count} rows matched in {table} where at most one was expected")]
    MultipleRows { table: Table, count: usize },
    #[error("duplicate key value violates unique constraint on {table}: {message}")]
    Conflict { table: Table, message: String },
    #[error("{message}")]
    Rejected { code: Option<String>, message: String },
    #[error("storage: {0}")]
    Storage(String),
    #[error("network: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// A unique-constraint violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, GatewayError::Conflict { .. })
    }

    /// Whether the failure means there is no usable session.
    pub fn is_auth(&self) -> bool {
        matches!(self, GatewayError::Unauthenticated | GatewayError::Auth(_))
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Decode(err.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// How [`Gateway::select_one`] treats more than one match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// More than one match is an error.
    Strict,
    /// The first match wins ("maybe single").
    Lenient,
}

/// Options for [`Gateway::upload`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UploadOptions {
    /// Replace an existing object at the same path instead of failing.
    pub overwrite: bool,
    pub content_type: Option<String>,
}

impl UploadOptions {
    pub fn overwrite() -> Self {
        Self {
            overwrite: true,
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Async access to identity, rows and files on the hosted platform.
pub trait Gateway: Clone {
    /// Create an identity. Platforms that sign the new account in directly
    /// also leave a session behind.
    fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = GatewayResult<Identity>>;

    /// Exchange credentials for a session.
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = GatewayResult<Session>>;

    /// End the session. The local session is dropped even if the platform call fails.
    fn sign_out(&self) -> impl Future<Output = GatewayResult<()>>;

    /// The current session, if any.
    fn session(&self) -> impl Future<Output = GatewayResult<Option<Session>>>;

    /// The identity behind the current session, if any.
    fn current_user(&self) -> impl Future<Output = GatewayResult<Option<Identity>>>;

    /// Rows of `R::TABLE` matching `query`.
    fn select<R: Record>(&self, query: &Query) -> impl Future<Output = GatewayResult<Vec<R>>>;

    /// Number of rows of `R::TABLE` matching `query`.
    fn count<R: Record>(&self, query: &Query) -> impl Future<Output = GatewayResult<usize>>;

    /// Insert rows and return them as stored, generated columns included.
    fn insert<R: Record, N: Serialize>(
        &self,
        rows: &[N],
    ) -> impl Future<Output = GatewayResult<Vec<R>>>;

    /// Merge `patch` into every row matching `query`.
    fn update<R: Record>(
        &self,
        query: &Query,
        patch: &Value,
    ) -> impl Future<Output = GatewayResult<()>>;

    /// Delete every row matching `query`.
    fn delete<R: Record>(&self, query: &Query) -> impl Future<Output = GatewayResult<()>>;

    /// Insert `row`, or merge it into the row with the same primary key.
    fn upsert<R: Record, N: Serialize>(&self, row: &N) -> impl Future<Output = GatewayResult<()>>;

    /// Store `bytes` at `path` in `bucket` and return the public URL.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> impl Future<Output = GatewayResult<String>>;

    /// At most one row, see [`Cardinality`].
    fn select_one<R: Record>(
        &self,
        query: &Query,
        cardinality: Cardinality,
    ) -> impl Future<Output = GatewayResult<Option<R>>> {
        async move {
            let mut rows = self.select::<R>(query).await?;
            match (cardinality, rows.len()) {
                (_, 0) => Ok(None),
                (Cardinality::Strict, count) if count > 1 => Err(GatewayError::MultipleRows {
                    table: R::TABLE,
                    count,
                }),
                _ => Ok(Some(rows.swap_remove(0))),
            }
        }
    }

    /// Exactly one row; zero matches is [`GatewayError::NotFound`].
    fn single<R: Record>(&self, query: &Query) -> impl Future<Output = GatewayResult<R>> {
        async move {
            self.select_one::<R>(query, Cardinality::Strict)
                .await?
                .ok_or(GatewayError::NotFound { table: R::TABLE })
        }
    }

    /// The first matching row, if any.
    fn maybe_single<R: Record>(
        &self,
        query: &Query,
    ) -> impl Future<Output = GatewayResult<Option<R>>> {
        self.select_one::<R>(query, Cardinality::Lenient)
    }

    /// The signed-in identity, or [`GatewayError::Unauthenticated`].
    fn require_user(&self) -> impl Future<Output = GatewayResult<Identity>> {
        async move {
            self.current_user()
                .await?
                .ok_or(GatewayError::Unauthenticated)
        }
    }
}
