//! Shared clients provided to every screen through the Dioxus context.

use api::{BackendConfig, GoogleBooks, SearchOptions, SupabaseGateway};
use dioxus::prelude::*;
use store::LivreboxConfig;

use crate::auth::AuthState;
use crate::platform;

/// The gateway used by the running application.
pub type AppGateway = SupabaseGateway;

#[derive(Clone, Debug)]
pub struct Services {
    pub gateway: AppGateway,
    pub search: GoogleBooks,
    pub search_options: SearchOptions,
    pub avatars_bucket: String,
    /// Set when the backend is not configured; every call will fail.
    pub config_error: Option<String>,
}

impl Services {
    /// Build the clients from the environment and restore a stored session.
    pub fn load() -> Self {
        let (config, mut config_error) = match api::load_config() {
            Ok(config) => (config, None),
            Err(err) => (LivreboxConfig::default(), Some(err.to_string())),
        };

        let backend = match BackendConfig::from_config(&config) {
            Ok(backend) => backend,
            Err(err) => {
                if config_error.is_none() {
                    config_error = Some(err.to_string());
                }
                BackendConfig {
                    url: String::new(),
                    anon_key: String::new(),
                    avatars_bucket: config.storage.avatars_bucket.clone(),
                }
            }
        };
        if let Some(err) = &config_error {
            tracing::error!("backend configuration: {err}");
        }

        let gateway = SupabaseGateway::new(backend);
        gateway.restore_session(platform::load_session());

        Self {
            avatars_bucket: gateway.config().avatars_bucket.clone(),
            gateway,
            search: GoogleBooks::new(&config.search.endpoint),
            search_options: SearchOptions::from(&config.search),
            config_error,
        }
    }
}

pub fn use_services() -> Services {
    use_context::<Services>()
}

pub fn use_gateway() -> AppGateway {
    use_context::<Services>().gateway
}

/// Root provider: clients plus authentication state.
#[component]
pub fn AppProvider(children: Element) -> Element {
    let services = use_context_provider(Services::load);
    let auth_state = use_signal(AuthState::default);
    use_context_provider(|| auth_state);

    rsx! {
        if let Some(err) = services.config_error {
            div {
                class: "config-banner",
                style: "padding: 0.5rem 1rem; background: #fdecea; color: #8a1c1c; font-size: 0.875rem;",
                "Configuration du serveur incomplète : {err}"
            }
        }
        {children}
    }
}
