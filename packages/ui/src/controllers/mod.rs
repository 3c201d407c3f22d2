//! # Screen controllers
//!
//! One controller per route. A controller owns the screen's state and a cloned
//! gateway handle, and exposes async operations that read or write through the
//! gateway and then patch that state. Views keep a controller in a `Signal` and
//! re-render from it; controllers never touch the renderer, so every operation is
//! testable against [`store::MemoryGateway`].
//!
//! Every controller carries a [`ViewStatus`]. An operation marks itself in
//! `action_loading`, refuses to start while another one runs, and ends by setting
//! either `success` or a French `error` message.
//!
//! | Controller | Route |
//! |------------|-------|
//! | [`FeedController`] | `/` |
//! | [`LibraryController`] | `/livres` |
//! | [`BookDetailController`] | `/livres/:book_id` |
//! | [`FriendsController`] | `/amis` |
//! | [`ProfileController`] | `/profil` |
//! | [`MemberController`] | `/membre/:id` |
//! | [`LoginForm`], [`RegisterForm`] | `/login`, `/register` |

use dioxus::prelude::*;
use store::GatewayError;

use crate::platform;

mod account;
mod book_detail;
mod feed;
mod friends;
mod library;
mod member;
mod profile;

pub use account::{LoginForm, RegisterForm};
pub use book_detail::BookDetailController;
pub use feed::{latest_per_author, FeedController, FeedEntry};
pub use friends::FriendsController;
pub use library::LibraryController;
pub use member::MemberController;
pub use profile::{avatar_extension, ProfileController};

/// Loading, action and message flags shared by every screen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewStatus {
    pub loading: bool,
    /// Key of the operation in flight, e.g. `"follow:<id>"`.
    pub action_loading: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ViewStatus {
    /// Status of a screen that has not loaded yet.
    pub fn loading() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// Mark `key` in flight. Returns `false` when another operation already is.
    pub fn begin(&mut self, key: impl Into<String>) -> bool {
        if self.action_loading.is_some() {
            return false;
        }
        self.action_loading = Some(key.into());
        self.error = None;
        self.success = None;
        true
    }

    pub fn is_busy(&self) -> bool {
        self.action_loading.is_some()
    }

    /// Whether `key` is the operation in flight.
    pub fn is_running(&self, key: &str) -> bool {
        self.action_loading.as_deref() == Some(key)
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.action_loading = None;
        self.error = None;
        self.success = Some(message.into());
    }

    /// End the operation without a message.
    pub fn end(&mut self) {
        self.action_loading = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.action_loading = None;
        self.success = None;
        self.error = Some(message);
    }

    /// Record a failed load. `context` is shown, `err` is logged.
    pub fn fail_load(&mut self, context: &str, err: &GatewayError) {
        tracing::warn!("{context} ({err})");
        self.loading = false;
        self.error = Some(context.to_string());
    }

    pub fn clear_messages(&mut self) {
        self.error = None;
        self.success = None;
    }
}

/// French message for a failed gateway call.
pub fn describe(err: &GatewayError) -> String {
    match err {
        GatewayError::Unauthenticated => "Utilisateur non connecté.".to_string(),
        GatewayError::Auth(message) if message == "Invalid login credentials" => {
            "Email ou mot de passe incorrect.".to_string()
        }
        GatewayError::Auth(message) => message.clone(),
        GatewayError::NotFound { .. } => "Élément introuvable.".to_string(),
        GatewayError::Conflict { .. } => "Cet élément existe déjà.".to_string(),
        GatewayError::Storage(message) => format!("Erreur upload : {message}"),
        GatewayError::Transport(_) => "Impossible de joindre le serveur.".to_string(),
        other => format!("Une erreur s'est produite : {other}"),
    }
}

/// A controller with a [`ViewStatus`].
pub trait Screen: Clone + 'static {
    fn status(&self) -> &ViewStatus;
    fn status_mut(&mut self) -> &mut ViewStatus;

    /// Carry over form fields edited while an operation ran on a copy.
    /// `started` is the copy as it was when the operation began, `current`
    /// the shared controller the member kept typing into.
    fn keep_edits(&mut self, _started: &Self, _current: &Self) {}
}

/// Take `current` for a form field the finished operation left alone.
pub(crate) fn keep_edit(done: &mut String, started: &str, current: &str) {
    if done.as_str() == started {
        *done = current.to_string();
    }
}

/// Take a working copy of the controller for a long-running operation.
///
/// The shared controller shows `key` as in flight so the view disables the
/// control; the copy starts clean and runs the operation itself. Put the copy
/// back with [`settle`] (or `Signal::set` for screens without form fields) once
/// the operation returns. `None` while another operation is running.
pub fn checkout<C: Screen>(screen: &mut Signal<C>, key: &str) -> Option<C> {
    if screen.read().status().is_busy() {
        return None;
    }
    let copy = screen();
    screen.write().status_mut().action_loading = Some(key.to_string());
    Some(copy)
}

/// The finished copy merged with what the member typed meanwhile.
pub fn settled<C: Screen>(started: &C, current: &C, mut done: C) -> C {
    done.keep_edits(started, current);
    done
}

/// Put a finished working copy back, keeping edits made while it ran.
pub fn settle<C: Screen>(screen: &mut Signal<C>, started: &C, done: C) {
    let merged = settled(started, &*screen.peek(), done);
    screen.set(merged);
}

/// Clear `error` and `success` a few seconds after they appear.
pub fn use_flash_expiry<C: Screen>(mut screen: Signal<C>) {
    use_effect(move || {
        let flash = {
            let current = screen.read();
            let status = current.status();
            (status.error.clone(), status.success.clone())
        };
        if flash == (None, None) {
            return;
        }
        spawn(async move {
            platform::sleep(platform::FLASH_DURATION).await;
            let unchanged = {
                let current = screen.read();
                let status = current.status();
                (status.error.clone(), status.success.clone()) == flash
            };
            if unchanged {
                screen.write().status_mut().clear_messages();
            }
        });
    });
}

macro_rules! impl_screen {
    ($($ty:ident<$($param:ident),+>),+ $(,)?) => {
        $(
            impl<$($param: Clone + 'static),+> Screen for $ty<$($param),+> {
                fn status(&self) -> &ViewStatus {
                    &self.status
                }
                fn status_mut(&mut self) -> &mut ViewStatus {
                    &mut self.status
                }
            }
        )+
    };
}

impl_screen!(
    FeedController<G>,
    LibraryController<G, S>,
    BookDetailController<G>,
    FriendsController<G>,
    MemberController<G>,
);

#[cfg(test)]
pub(crate) mod fixtures {
    use api::{BookSearch, SearchOptions};
    use store::{CandidateBook, Gateway, MemoryGateway, Profile};

    /// Search stub returning a fixed list for any non-blank query.
    #[derive(Clone, Debug, Default)]
    pub struct StaticSearch {
        pub results: Vec<CandidateBook>,
    }

    impl BookSearch for StaticSearch {
        async fn search(&self, query: &str, _options: &SearchOptions) -> Vec<CandidateBook> {
            if query.trim().is_empty() {
                Vec::new()
            } else {
                self.results.clone()
            }
        }
    }

    pub fn candidate(external_id: &str, title: &str) -> CandidateBook {
        CandidateBook {
            external_id: external_id.to_string(),
            title: title.to_string(),
            authors: "Frank Herbert".to_string(),
            thumbnail_url: Some(format!("https://covers.example/{external_id}.jpg")),
            description: None,
        }
    }

    /// Register `username` with a profile and leave the gateway signed in as them.
    pub async fn member(gateway: &MemoryGateway, username: &str) -> String {
        let email = format!("{username}@example.com");
        let identity = gateway.sign_up(&email, "secret123").await.unwrap();
        let profile = Profile {
            username: Some(username.to_string()),
            ..Profile::empty(identity.id.clone())
        };
        gateway
            .insert::<Profile, _>(std::slice::from_ref(&profile))
            .await
            .unwrap();
        identity.id
    }
}
