use dioxus::prelude::*;

use store::Gateway;
use ui::{use_auth, use_gateway, AppProvider, LogoutButton, Navbar, SessionCheck};
use views::{BookDetail, Feed, Friends, Library, Login, MemberProfile, OwnProfile, Register};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/login")]
    Login {},
    #[route("/register")]
    Register {},
    #[layout(Protected)]
        #[route("/")]
        Feed {},
        #[route("/livres")]
        Library {},
        #[route("/livres/:book_id?:uid")]
        BookDetail { book_id: String, uid: String },
        #[route("/amis")]
        Friends {},
        #[route("/profil")]
        OwnProfile {},
        #[route("/membre/:id")]
        MemberProfile { id: String },
    #[end_layout]
    #[route("/:..segments")]
    NotFound { segments: Vec<String> },
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        // Global app resources
        document::Title { "Livrebox" }
        document::Link { rel: "stylesheet", href: MAIN_CSS }

        AppProvider {
            Router::<Route> {}
        }
    }
}

/// Layout of every signed-in page: checks the session on mount and on every
/// navigation, and sends visitors without a valid one to the login page.
#[component]
fn Protected() -> Element {
    let nav = use_navigator();
    let mut auth = use_auth();
    let gateway = use_gateway();

    // Track the route in a signal so the session check re-runs on navigation
    let route = use_route::<Route>();
    let mut visited = use_signal(|| route.clone());
    if *visited.peek() != route {
        visited.set(route);
    }

    let check = use_resource(move || {
        let _route = visited();
        let gateway = gateway.clone();
        async move { SessionCheck::from_result(gateway.session().await) }
    });

    use_effect(move || {
        if let Some(outcome) = &*check.read() {
            if !outcome.apply(&mut auth) {
                nav.replace(Route::Login {});
            }
        }
    });

    let state = auth.read();
    match (&state.user, state.loading) {
        (Some(_), _) => rsx! {
            Navbar {
                Link { to: Route::Feed {}, "Fil d'actualité" }
                Link { to: Route::Library {}, "Mes livres" }
                Link { to: Route::Friends {}, "Amis" }
                Link { to: Route::OwnProfile {}, "Profil" }
                LogoutButton {
                    class: "btn",
                    on_logout: move |_| {
                        nav.replace(Route::Login {});
                    },
                }
            }
            main {
                class: "page",
                Outlet::<Route> {}
            }
        },
        (None, true) => rsx! {
            p {
                style: "text-align: center; margin-top: 2.5rem;",
                "Chargement..."
            }
        },
        (None, false) => rsx! {},
    }
}

#[component]
fn NotFound(segments: Vec<String>) -> Element {
    let path = segments.join("/");
    rsx! {
        div {
            class: "page",
            h1 { "Page introuvable" }
            p { "Aucune page à l'adresse /{path}." }
            Link { to: Route::Feed {}, "Retour à l'accueil" }
        }
    }
}
