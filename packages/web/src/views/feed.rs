//! Home feed: the latest entry of every followed member.

use dioxus::prelude::*;
use ui::controllers::{use_flash_expiry, FeedController};
use ui::format::{long_date, rating_label};
use ui::{use_gateway, StarRating};

use super::widgets::{Avatar, Cover, Flash};
use crate::Route;

#[component]
pub fn Feed() -> Element {
    let gateway = use_gateway();
    let mut feed = use_signal(|| FeedController::new(gateway));
    use_flash_expiry(feed);

    let _loader = use_resource(move || async move {
        let mut working = feed.peek().clone();
        working.load().await;
        feed.set(working);
    });

    let state = feed.read();

    rsx! {
        h1 {
            style: "font-size: 1.75rem; margin-bottom: 1.5rem;",
            "Fil d'actualité"
        }

        Flash { status: state.status.clone() }

        if state.status.loading {
            p { "Chargement..." }
        } else if state.entries.is_empty() {
            div {
                class: "card",
                p { "Aucune lecture à afficher pour le moment." }
                Link { to: Route::Friends {}, "Suivez d'autres lecteurs" }
            }
        } else {
            div {
                style: "display: flex; flex-direction: column; gap: 1rem;",
                for entry in state.entries.iter() {
                    div {
                        key: "{entry.post.id}",
                        class: "card",
                        style: "display: flex; gap: 1rem;",

                        Cover {
                            url: entry.post.book_cover_url.clone(),
                            title: entry.post.book_title.clone(),
                        }

                        div {
                            style: "flex: 1; min-width: 0;",
                            Link {
                                to: Route::MemberProfile { id: entry.author.id.clone() },
                                style: "display: flex; align-items: center; gap: 0.5rem; font-size: 0.875rem;",
                                Avatar { profile: entry.author.clone(), size: 2 }
                                "{entry.author.display_name()}"
                            }
                            if let Some(book_id) = &entry.post.book_id {
                                Link {
                                    to: Route::BookDetail {
                                        book_id: book_id.clone(),
                                        uid: entry.post.user_id.clone(),
                                    },
                                    h2 { style: "font-size: 1.125rem; margin: 0.5rem 0 0.25rem;", "{entry.post.book_title}" }
                                }
                            } else {
                                h2 { style: "font-size: 1.125rem; margin: 0.5rem 0 0.25rem;", "{entry.post.book_title}" }
                            }
                            if let Some(author) = &entry.post.book_author {
                                p { style: "color: #7a6e63; margin: 0;", "{author}" }
                            }
                            if let Some(rating) = entry.post.rating {
                                div {
                                    style: "display: flex; align-items: center; gap: 0.5rem;",
                                    StarRating { rating, read_only: true }
                                    span { style: "font-size: 0.875rem;", "{rating_label(rating)}" }
                                }
                            }
                            if let Some(comment) = entry.post.comment.as_deref().filter(|c| !c.is_empty()) {
                                p { style: "font-style: italic;", "« {comment} »" }
                            }
                            p {
                                style: "font-size: 0.75rem; color: #7a6e63;",
                                "{long_date(&entry.post.created_at)}"
                            }
                        }
                    }
                }
            }
        }
    }
}
