//! Auth endpoint payloads.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use store::{Identity, Session};

/// Key under which the browser persists the current session.
pub const SESSION_STORAGE_KEY: &str = "livrebox.session";

/// Body of `/auth/v1/signup` and `/auth/v1/token`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `/auth/v1/token?grant_type=refresh_token`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Successful token grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Lifetime in seconds, used when `expires_at` is absent.
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: Identity,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token
                .expires_at
                .or_else(|| token.expires_in.map(|secs| Utc::now().timestamp() + secs)),
            user: token.user,
        }
    }
}

/// Sign-up answers with a session when accounts are confirmed automatically,
/// and with the bare user when an email confirmation is pending.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    User(Identity),
}
