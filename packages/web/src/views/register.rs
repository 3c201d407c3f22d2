//! Registration page: account plus profile row.

use dioxus::prelude::*;
use ui::controllers::{checkout, settle, use_flash_expiry, RegisterForm};
use ui::use_gateway;

use crate::Route;

/// Register page component.
#[component]
pub fn Register() -> Element {
    let nav = use_navigator();
    let gateway = use_gateway();
    let mut form = use_signal(|| RegisterForm::new(gateway));
    use_flash_expiry(form);

    let handle_register = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            let Some(mut working) = checkout(&mut form, "register") else {
                return;
            };
            let started = working.clone();
            let created = working.submit().await;
            settle(&mut form, &started, working);
            if created {
                nav.push(Route::Login {});
            }
        });
    };

    let state = form.read();
    let busy = state.status.is_busy();

    rsx! {
        div {
            style: "display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; padding: 2rem;",

            h1 {
                style: "margin-bottom: 2rem; font-weight: 700; font-size: 1.75rem;",
                "Créer un compte"
            }

            form {
                style: "display: flex; flex-direction: column; gap: 0.75rem; width: 100%; max-width: 320px;",
                onsubmit: handle_register,

                input {
                    r#type: "text",
                    placeholder: "Nom d'utilisateur",
                    value: "{state.username}",
                    oninput: move |evt| form.write().username = evt.value(),
                }
                input {
                    r#type: "email",
                    placeholder: "Email",
                    value: "{state.email}",
                    oninput: move |evt| form.write().email = evt.value(),
                }
                input {
                    r#type: "password",
                    placeholder: "Mot de passe (6 caractères minimum)",
                    value: "{state.password}",
                    oninput: move |evt| form.write().password = evt.value(),
                }

                if let Some(err) = &state.status.error {
                    p { class: "flash-error", "{err}" }
                }
                if let Some(message) = &state.status.success {
                    p { class: "flash-success", "{message}" }
                }

                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: busy,
                    if busy { "Création..." } else { "S'inscrire" }
                }
            }

            p {
                style: "margin-top: 1.5rem; font-size: 0.875rem;",
                "Déjà inscrit ? "
                Link { to: Route::Login {}, "Se connecter" }
            }
        }
    }
}
