//! Login page with the email/password form.

use dioxus::prelude::*;
use ui::controllers::{checkout, settle, use_flash_expiry, LoginForm};
use ui::{use_auth, use_gateway, SessionCheck};

use crate::Route;

/// Login page component.
#[component]
pub fn Login() -> Element {
    let nav = use_navigator();
    let mut auth = use_auth();
    let gateway = use_gateway();
    let mut form = use_signal(|| LoginForm::new(gateway));
    use_flash_expiry(form);

    let handle_login = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            let Some(mut working) = checkout(&mut form, "login") else {
                return;
            };
            let started = working.clone();
            let session = working.submit().await;
            settle(&mut form, &started, working);

            if let Some(session) = session {
                SessionCheck::SignedIn(session).apply(&mut auth);
                nav.push(Route::Feed {});
            }
        });
    };

    let state = form.read();
    let busy = state.status.is_busy();

    rsx! {
        div {
            style: "display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; padding: 2rem;",

            h1 {
                style: "margin-bottom: 0.5rem; font-weight: 700; font-size: 1.75rem;",
                "Livrebox"
            }
            p {
                style: "margin-bottom: 2rem; color: #7a6e63;",
                "Connectez-vous pour retrouver votre bibliothèque."
            }

            form {
                style: "display: flex; flex-direction: column; gap: 0.75rem; width: 100%; max-width: 320px;",
                onsubmit: handle_login,

                input {
                    r#type: "email",
                    placeholder: "Email",
                    required: true,
                    value: "{state.email}",
                    oninput: move |evt| form.write().email = evt.value(),
                }
                input {
                    r#type: "password",
                    placeholder: "Mot de passe",
                    required: true,
                    value: "{state.password}",
                    oninput: move |evt| form.write().password = evt.value(),
                }

                if let Some(err) = &state.status.error {
                    p { class: "flash-error", "{err}" }
                }

                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: busy,
                    if busy { "Connexion..." } else { "Se connecter" }
                }
            }

            p {
                style: "margin-top: 1.5rem; font-size: 0.875rem;",
                "Pas encore de compte ? "
                Link { to: Route::Register {}, "Créer un compte" }
            }
        }
    }
}
