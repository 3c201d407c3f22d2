//! The viewer's editable profile: avatar, username and bio.

use dioxus::prelude::*;
use ui::controllers::{checkout, settle, use_flash_expiry, ProfileController};
use ui::use_services;

use super::widgets::{Avatar, Flash};

#[component]
pub fn OwnProfile() -> Element {
    let services = use_services();
    let mut profile =
        use_signal(|| ProfileController::new(services.gateway, services.avatars_bucket));
    use_flash_expiry(profile);

    let _loader = use_resource(move || async move {
        let mut working = profile.peek().clone();
        working.load().await;
        profile.set(working);
    });

    let handle_avatar = move |evt: FormEvent| async move {
        let Some(file) = evt.files().into_iter().next() else {
            return;
        };
        let name = file.name();
        let bytes = match file.read_bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                tracing::warn!("reading {name}: {err}");
                profile.write().status.fail("Impossible de lire le fichier.");
                return;
            }
        };
        if let Some(mut working) = checkout(&mut profile, "avatar") {
            let started = working.clone();
            working.upload_avatar(&name, bytes).await;
            settle(&mut profile, &started, working);
        }
    };

    let handle_save = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            if let Some(mut working) = checkout(&mut profile, "save") {
                let started = working.clone();
                working.save().await;
                settle(&mut profile, &started, working);
            }
        });
    };

    let state = profile.read();
    let busy = state.status.is_busy();

    if state.status.loading {
        return rsx! {
            p { "Chargement..." }
        };
    }

    rsx! {
        h1 {
            style: "font-size: 1.75rem; margin-bottom: 1.5rem;",
            "Mon profil"
        }

        Flash { status: state.status.clone() }

        div {
            class: "card",
            style: "display: flex; align-items: center; gap: 1.5rem; margin-bottom: 1.5rem;",
            Avatar { profile: state.profile.clone(), size: 6 }
            div {
                if let Some(email) = state.email() {
                    p { style: "margin: 0 0 0.25rem;", "{email}" }
                }
                p {
                    style: "margin: 0; color: #7a6e63; font-size: 0.875rem;",
                    "{state.post_count} livre(s) dans la bibliothèque"
                }
                label {
                    class: "btn",
                    style: "display: inline-block; margin-top: 0.75rem;",
                    if state.status.is_running("avatar") { "Envoi..." } else { "Changer la photo" }
                    input {
                        r#type: "file",
                        accept: "image/*",
                        style: "display: none;",
                        disabled: busy,
                        onchange: handle_avatar,
                    }
                }
            }
        }

        form {
            style: "display: flex; flex-direction: column; gap: 0.75rem; max-width: 32rem;",
            onsubmit: handle_save,

            label { r#for: "username", "Nom d'utilisateur" }
            input {
                id: "username",
                r#type: "text",
                value: "{state.username}",
                oninput: move |evt| profile.write().username = evt.value(),
            }

            label { r#for: "bio", "Bio" }
            textarea {
                id: "bio",
                rows: "4",
                value: "{state.bio}",
                oninput: move |evt| profile.write().bio = evt.value(),
            }

            button {
                class: "btn btn-primary",
                r#type: "submit",
                style: "align-self: flex-start;",
                disabled: busy,
                if state.status.is_running("save") { "Enregistrement..." } else { "Enregistrer" }
            }
        }
    }
}
