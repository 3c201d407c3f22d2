//! # REST gateway for the hosted platform
//!
//! [`SupabaseGateway`] implements [`store::Gateway`] over the platform's three HTTP
//! services:
//!
//! | Service | Path | Used for |
//! |---------|------|----------|
//! | Auth | `/auth/v1/signup`, `/auth/v1/token`, `/auth/v1/user`, `/auth/v1/logout` | identities and sessions |
//! | REST | `/rest/v1/{table}` | row reads and writes, filters rendered by [`Query::to_params`] |
//! | Storage | `/storage/v1/object/{bucket}/{path}` | avatar uploads, public URLs |
//!
//! Every request carries the public `apikey` header. Row and storage calls are
//! authorized with the session's access token when one is held, the anon key
//! otherwise. Clones share the session.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use store::{
    Gateway, GatewayError, GatewayResult, Identity, Query, Record, Session, Table, UploadOptions,
};

use crate::auth::{BackendConfig, Credentials, RefreshRequest, SignUpResponse, TokenResponse};

mod errors;

use errors::{auth_error, rest_error, storage_error};
pub use errors::parse_content_range;

#[derive(Clone, Copy)]
enum Service {
    Auth,
    Rest(Table),
    Storage,
}

/// HTTP client for one platform project.
#[derive(Clone, Debug)]
pub struct SupabaseGateway {
    http: Client,
    config: Arc<BackendConfig>,
    session: Arc<RwLock<Option<Session>>>,
}

impl SupabaseGateway {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            http: Client::new(),
            config: Arc::new(config),
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Adopt a session persisted by a previous run.
    pub fn restore_session(&self, session: Option<Session>) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }

    /// Copy of the session currently held.
    pub fn session_snapshot(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Public URL of an object in a public bucket.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.config.url
        )
    }

    fn rest_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.config.url, table.name())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.config.url)
    }

    /// Trade a refresh token for a new session and keep it.
    async fn refresh(&self, refresh_token: &str) -> GatewayResult<Session> {
        tracing::debug!("refreshing expired session");
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.anon_key)
            .json(&RefreshRequest { refresh_token });
        let response = send(request, Service::Auth).await?;

        let session = Session::from(decode::<TokenResponse>(response).await?);
        self.restore_session(Some(session.clone()));
        Ok(session)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let token = self
            .session_snapshot()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {token}"))
    }
}

async fn send(builder: RequestBuilder, service: Service) -> GatewayResult<Response> {
    let response = builder
        .send()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(match service {
        Service::Auth => auth_error(code, &body),
        Service::Rest(table) => rest_error(table, code, &body),
        Service::Storage => storage_error(code, &body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
    let text = response
        .text()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

/// Filter parameters only; writes do not take a projection.
fn filter_params(query: &Query) -> Vec<(String, String)> {
    query
        .to_params()
        .into_iter()
        .filter(|(key, _)| key != "select")
        .collect()
}

impl Gateway for SupabaseGateway {
    async fn sign_up(&self, email: &str, password: &str) -> GatewayResult<Identity> {
        let request = self
            .request(Method::POST, &self.auth_url("signup"))
            .json(&Credentials { email, password });
        let response = send(request, Service::Auth).await?;

        match decode::<SignUpResponse>(response).await? {
            SignUpResponse::Session(token) => {
                let session = Session::from(token);
                let user = session.user.clone();
                self.restore_session(Some(session));
                Ok(user)
            }
            SignUpResponse::User(user) => {
                tracing::info!(user_id = %user.id, "sign-up pending email confirmation");
                Ok(user)
            }
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> GatewayResult<Session> {
        let request = self
            .request(Method::POST, &self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });
        let response = send(request, Service::Auth).await?;

        let session = Session::from(decode::<TokenResponse>(response).await?);
        self.restore_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        let Some(session) = self.session_snapshot() else {
            return Ok(());
        };
        let request = self
            .http
            .post(self.auth_url("logout"))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", session.access_token));
        self.restore_session(None);

        if let Err(err) = send(request, Service::Auth).await {
            tracing::warn!("remote sign-out failed: {err}");
            return Err(err);
        }
        Ok(())
    }

    async fn session(&self) -> GatewayResult<Option<Session>> {
        let Some(session) = self.session_snapshot() else {
            return Ok(None);
        };
        if !session.is_expired_at(Utc::now()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            tracing::debug!("stored session expired");
            self.restore_session(None);
            return Ok(None);
        };
        match self.refresh(refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(err) if err.is_auth() => {
                tracing::debug!("session refresh rejected: {err}");
                self.restore_session(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn current_user(&self) -> GatewayResult<Option<Identity>> {
        if self.session().await?.is_none() {
            return Ok(None);
        }
        let request = self.request(Method::GET, &self.auth_url("user"));
        match send(request, Service::Auth).await {
            Ok(response) => Ok(Some(decode(response).await?)),
            Err(err) if err.is_auth() => {
                tracing::debug!("stored session rejected: {err}");
                self.restore_session(None);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn select<R: Record>(&self, query: &Query) -> GatewayResult<Vec<R>> {
        tracing::debug!(table = %R::TABLE, "select");
        let request = self
            .request(Method::GET, &self.rest_url(R::TABLE))
            .query(&query.to_params());
        let response = send(request, Service::Rest(R::TABLE)).await?;
        decode(response).await
    }

    async fn count<R: Record>(&self, query: &Query) -> GatewayResult<usize> {
        let request = self
            .request(Method::HEAD, &self.rest_url(R::TABLE))
            .query(&query.to_params())
            .header("Prefer", "count=exact");
        let response = send(request, Service::Rest(R::TABLE)).await?;

        response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| GatewayError::Decode(format!("no row count for {}", R::TABLE)))
    }

    async fn insert<R: Record, N: Serialize>(&self, rows: &[N]) -> GatewayResult<Vec<R>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(table = %R::TABLE, rows = rows.len(), "insert");
        let request = self
            .request(Method::POST, &self.rest_url(R::TABLE))
            .query(&[("select", "*")])
            .header("Prefer", "return=representation")
            .json(rows);
        let response = send(request, Service::Rest(R::TABLE)).await?;
        decode(response).await
    }

    async fn update<R: Record>(&self, query: &Query, patch: &Value) -> GatewayResult<()> {
        tracing::debug!(table = %R::TABLE, "update");
        let request = self
            .request(Method::PATCH, &self.rest_url(R::TABLE))
            .query(&filter_params(query))
            .header("Prefer", "return=minimal")
            .json(patch);
        send(request, Service::Rest(R::TABLE)).await?;
        Ok(())
    }

    async fn delete<R: Record>(&self, query: &Query) -> GatewayResult<()> {
        tracing::debug!(table = %R::TABLE, "delete");
        let request = self
            .request(Method::DELETE, &self.rest_url(R::TABLE))
            .query(&filter_params(query));
        send(request, Service::Rest(R::TABLE)).await?;
        Ok(())
    }

    async fn upsert<R: Record, N: Serialize>(&self, row: &N) -> GatewayResult<()> {
        tracing::debug!(table = %R::TABLE, "upsert");
        let on_conflict = R::TABLE.primary_key().join(",");
        let request = self
            .request(Method::POST, &self.rest_url(R::TABLE))
            .query(&[("on_conflict", on_conflict.as_str())])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(row);
        send(request, Service::Rest(R::TABLE)).await?;
        Ok(())
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> GatewayResult<String> {
        if self.session_snapshot().is_none() {
            return Err(GatewayError::Unauthenticated);
        }
        tracing::debug!(bucket, path, size = bytes.len(), "upload");
        let url = format!("{}/storage/v1/object/{bucket}/{path}", self.config.url);
        let content_type = options
            .content_type
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let request = self
            .request(Method::POST, &url)
            .header("x-upsert", if options.overwrite { "true" } else { "false" })
            .header("Content-Type", content_type)
            .body(bytes);
        send(request, Service::Storage).await?;
        Ok(self.public_url(bucket, path))
    }
}
