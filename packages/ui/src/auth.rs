//! Authentication state, the session check behind protected routes and the logout button.

use chrono::{DateTime, Utc};
use dioxus::prelude::*;
use store::{Gateway, GatewayResult, Identity, Session};

use crate::platform;
use crate::services::use_gateway;

/// Who is signed in, as last confirmed by the session check.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<Identity>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// Get the current authentication state.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

/// Outcome of the session lookup done by the protected layout.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCheck {
    Pending,
    SignedIn(Session),
    SignedOut,
}

impl SessionCheck {
    /// A failed lookup counts as signed out.
    pub fn from_result(result: GatewayResult<Option<Session>>) -> Self {
        Self::from_result_at(result, Utc::now())
    }

    /// Like [`from_result`](Self::from_result), with an expired session
    /// judged against `now`.
    pub fn from_result_at(result: GatewayResult<Option<Session>>, now: DateTime<Utc>) -> Self {
        match result {
            Ok(Some(session)) if session.is_expired_at(now) => {
                tracing::debug!(user_id = %session.user.id, "session expired");
                SessionCheck::SignedOut
            }
            Ok(Some(session)) => SessionCheck::SignedIn(session),
            Ok(None) => SessionCheck::SignedOut,
            Err(err) => {
                tracing::warn!("session lookup failed: {err}");
                SessionCheck::SignedOut
            }
        }
    }

    pub fn user(&self) -> Option<&Identity> {
        match self {
            SessionCheck::SignedIn(session) => Some(&session.user),
            _ => None,
        }
    }

    /// Apply the outcome to the stored session and the auth context.
    /// Returns `false` when the member has to sign in again.
    pub fn apply(&self, auth_state: &mut Signal<AuthState>) -> bool {
        match self {
            SessionCheck::Pending => true,
            SessionCheck::SignedIn(session) => {
                platform::store_session(Some(session));
                auth_state.set(AuthState {
                    user: Some(session.user.clone()),
                    loading: false,
                });
                true
            }
            SessionCheck::SignedOut => {
                platform::store_session(None);
                auth_state.set(AuthState {
                    user: None,
                    loading: false,
                });
                false
            }
        }
    }
}

/// Button that signs out and then calls `on_logout`.
#[component]
pub fn LogoutButton(
    #[props(default = "Déconnexion".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
    on_logout: EventHandler<()>,
) -> Element {
    let mut auth_state = use_auth();
    let gateway = use_gateway();

    let onclick = move |_| {
        let gateway = gateway.clone();
        async move {
            // the local session is gone even when the platform call fails
            if let Err(e) = gateway.sign_out().await {
                tracing::warn!("sign-out: {e}");
            }
            SessionCheck::SignedOut.apply(&mut auth_state);
            on_logout.call(());
        }
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
