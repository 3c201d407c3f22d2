//! Member directory with follow and unfollow buttons.

use dioxus::prelude::*;
use ui::controllers::{checkout, settle, use_flash_expiry, FriendsController};
use ui::use_gateway;

use super::widgets::{Avatar, Flash};
use crate::Route;

#[component]
pub fn Friends() -> Element {
    let gateway = use_gateway();
    let mut friends = use_signal(|| FriendsController::new(gateway));
    use_flash_expiry(friends);

    let _loader = use_resource(move || async move {
        let mut working = friends.peek().clone();
        working.load().await;
        friends.set(working);
    });

    let toggle = move |member_id: String, following: bool| {
        spawn(async move {
            let key = if following {
                format!("unfollow:{member_id}")
            } else {
                format!("follow:{member_id}")
            };
            if let Some(mut working) = checkout(&mut friends, &key) {
                let started = working.clone();
                if following {
                    working.unfollow(&member_id).await;
                } else {
                    working.follow(&member_id).await;
                }
                settle(&mut friends, &started, working);
            }
        });
    };

    let state = friends.read();
    let busy = state.status.is_busy();

    rsx! {
        h1 {
            style: "font-size: 1.75rem; margin-bottom: 1.5rem;",
            "Lecteurs"
        }

        Flash { status: state.status.clone() }

        if state.status.loading {
            p { "Chargement..." }
        } else if state.members.is_empty() {
            p { style: "color: #7a6e63;", "Aucun autre membre pour le moment." }
        } else {
            ul {
                style: "list-style: none; padding: 0; display: flex; flex-direction: column; gap: 0.75rem;",
                for member in state.members.iter().cloned() {
                    li {
                        key: "{member.id}",
                        class: "card",
                        style: "display: flex; align-items: center; gap: 1rem;",
                        Avatar { profile: member.clone() }
                        div {
                            style: "flex: 1; min-width: 0;",
                            Link {
                                to: Route::MemberProfile { id: member.id.clone() },
                                strong { "{member.display_name()}" }
                            }
                            if let Some(bio) = member.bio.as_deref().filter(|b| !b.is_empty()) {
                                p { style: "color: #7a6e63; margin: 0.25rem 0 0; font-size: 0.875rem;", "{bio}" }
                            }
                        }
                        {
                            let following = state.is_following(&member.id);
                            let id = member.id.clone();
                            rsx! {
                                button {
                                    class: if following { "btn" } else { "btn btn-primary" },
                                    disabled: busy,
                                    onclick: move |_| toggle(id.clone(), following),
                                    if following { "Ne plus suivre" } else { "Suivre" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
