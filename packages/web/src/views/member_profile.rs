//! Another member's public page: profile and library, read-only.

use dioxus::prelude::*;
use store::ReadStatus;
use ui::controllers::MemberController;
use ui::{use_gateway, StarRating};

use super::widgets::{Avatar, Cover, Flash, ShelfTabs};
use crate::Route;

#[component]
pub fn MemberProfile(id: String) -> Element {
    let mut member_id = use_signal(|| id.clone());
    if *member_id.peek() != id {
        member_id.set(id.clone());
    }

    let gateway = use_gateway();
    let mut member = use_signal({
        let gateway = gateway.clone();
        move || MemberController::new(gateway, id)
    });
    let mut tab = use_signal(|| ReadStatus::Read);

    let _loader = use_resource(move || {
        let id = member_id();
        let gateway = gateway.clone();
        async move {
            let mut working = MemberController::new(gateway, id);
            working.load().await;
            member.set(working);
        }
    });

    let state = member.read();
    if state.status.loading {
        return rsx! {
            p { "Chargement..." }
        };
    }
    let Some(profile) = state.profile.clone() else {
        return rsx! {
            div {
                class: "card",
                h1 { style: "font-size: 1.5rem;", "Utilisateur introuvable" }
                Flash { status: state.status.clone() }
                Link { to: Route::Friends {}, "Retour aux lecteurs" }
            }
        };
    };
    let selected = tab();

    rsx! {
        div {
            style: "display: flex; align-items: center; gap: 1.5rem;",
            Avatar { profile: profile.clone(), size: 5 }
            div {
                h1 { style: "font-size: 1.75rem; margin: 0;", "{profile.display_name()}" }
                if let Some(bio) = profile.bio.as_deref().filter(|b| !b.is_empty()) {
                    p { style: "color: #7a6e63;", "{bio}" }
                }
            }
        }

        Flash { status: state.status.clone() }

        ShelfTabs {
            selected,
            read_count: state.count(ReadStatus::Read),
            to_read_count: state.count(ReadStatus::WantToRead),
            on_select: move |status| tab.set(status),
        }

        if state.count(selected) == 0 {
            p { style: "color: #7a6e63;", "Aucun livre dans cette étagère." }
        } else {
            div {
                style: "display: grid; grid-template-columns: repeat(auto-fill, minmax(16rem, 1fr)); gap: 1rem;",
                for post in state.shelf(selected).into_iter().cloned() {
                    div {
                        key: "{post.id}",
                        class: "card",
                        style: "display: flex; gap: 1rem;",
                        Cover { url: post.book_cover_url.clone(), title: post.book_title.clone() }
                        div {
                            style: "flex: 1; min-width: 0;",
                            if let Some(book_id) = post.book_id.clone() {
                                Link {
                                    to: Route::BookDetail { book_id, uid: post.user_id.clone() },
                                    strong { "{post.book_title}" }
                                }
                            } else {
                                strong { "{post.book_title}" }
                            }
                            if let Some(author) = &post.book_author {
                                p { style: "color: #7a6e63; margin: 0.25rem 0; font-size: 0.875rem;", "{author}" }
                            }
                            if let Some(rating) = post.rating {
                                StarRating { rating, read_only: true }
                            }
                        }
                    }
                }
            }
        }
    }
}
