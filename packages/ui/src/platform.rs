//! Platform glue: timers, the blocking confirm prompt and session persistence.
//!
//! The browser build keeps the platform session in `localStorage` so a reload
//! stays signed in. Native builds keep it in memory only.

use std::time::Duration;

use store::Session;

/// How long flash messages stay on screen.
pub const FLASH_DURATION: Duration = Duration::from_secs(3);

pub async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}

/// Ask the member to confirm a destructive action.
#[cfg(target_arch = "wasm32")]
pub async fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|window| window.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Ask the member to confirm a destructive action.
#[cfg(not(target_arch = "wasm32"))]
pub async fn confirm(message: &str) -> bool {
    let Ok(literal) = serde_json::to_string(message) else {
        return false;
    };
    dioxus::document::eval(&format!("return window.confirm({literal});"))
        .join::<bool>()
        .await
        .unwrap_or(false)
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Session saved by a previous visit, if any.
pub fn load_session() -> Option<Session> {
    #[cfg(target_arch = "wasm32")]
    {
        let raw = local_storage()?
            .get_item(api::SESSION_STORAGE_KEY)
            .ok()
            .flatten()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("discarding unreadable stored session: {e}");
                None
            }
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        None
    }
}

/// Persist `session`, or forget the stored one with `None`.
pub fn store_session(session: Option<&Session>) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(storage) = local_storage() else {
            return;
        };
        let result = match session.map(serde_json::to_string) {
            Some(Ok(raw)) => storage.set_item(api::SESSION_STORAGE_KEY, &raw),
            Some(Err(e)) => {
                tracing::error!("cannot serialize session: {e}");
                return;
            }
            None => storage.remove_item(api::SESSION_STORAGE_KEY),
        };
        if result.is_err() {
            tracing::error!("localStorage rejected the session update");
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = session;
    }
}
