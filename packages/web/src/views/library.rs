//! The member's own library: two shelves and the book search.

use dioxus::prelude::*;
use store::{CandidateBook, ReadStatus};
use ui::controllers::{checkout, settle, use_flash_expiry, LibraryController};
use ui::{platform, use_services, StarRating};

use super::widgets::{Cover, Flash, ShelfTabs};
use crate::Route;

#[component]
pub fn Library() -> Element {
    let services = use_services();
    let mut library = use_signal(|| {
        LibraryController::new(services.gateway, services.search, services.search_options)
    });
    let mut tab = use_signal(|| ReadStatus::Read);
    let mut query = use_signal(String::new);
    use_flash_expiry(library);

    let _loader = use_resource(move || async move {
        let mut working = library.peek().clone();
        working.load().await;
        library.set(working);
    });

    let handle_search = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            let text = query();
            if let Some(mut working) = checkout(&mut library, "search") {
                let started = working.clone();
                working.search(&text).await;
                settle(&mut library, &started, working);
            }
        });
    };

    let add = move |candidate: CandidateBook, status: ReadStatus| {
        spawn(async move {
            let key = format!("add:{}", candidate.external_id);
            if let Some(mut working) = checkout(&mut library, &key) {
                let started = working.clone();
                working.add(&candidate, status).await;
                settle(&mut library, &started, working);
                query.set(String::new());
                tab.set(status);
            }
        });
    };

    let remove = move |post_id: String| {
        spawn(async move {
            let confirmed = platform::confirm("Retirer ce livre de votre bibliothèque ?").await;
            if !confirmed {
                return;
            }
            if let Some(mut working) = checkout(&mut library, &format!("remove:{post_id}")) {
                let started = working.clone();
                working.remove(&post_id, confirmed).await;
                settle(&mut library, &started, working);
            }
        });
    };

    let move_to = move |post_id: String, status: ReadStatus| {
        spawn(async move {
            if let Some(mut working) = checkout(&mut library, &format!("status:{post_id}")) {
                let started = working.clone();
                working.set_status(&post_id, status).await;
                settle(&mut library, &started, working);
            }
        });
    };

    let state = library.read();
    let busy = state.status.is_busy();
    let selected = tab();
    let other = match selected {
        ReadStatus::Read => ReadStatus::WantToRead,
        ReadStatus::WantToRead => ReadStatus::Read,
    };

    let empty_shelf = match selected {
        ReadStatus::Read => "Aucun livre lu pour le moment.",
        ReadStatus::WantToRead => "Aucun livre à lire pour le moment.",
    };

    rsx! {
        h1 {
            style: "font-size: 1.75rem; margin-bottom: 1.5rem;",
            "Mes livres"
        }

        form {
            style: "display: flex; gap: 0.5rem;",
            onsubmit: handle_search,
            input {
                r#type: "search",
                style: "flex: 1; padding: 0.5rem;",
                placeholder: "Titre, auteur, ISBN...",
                value: "{query}",
                oninput: move |evt| query.set(evt.value()),
            }
            button {
                class: "btn btn-primary",
                r#type: "submit",
                disabled: busy,
                if state.status.is_running("search") { "Recherche..." } else { "Rechercher" }
            }
        }

        Flash { status: state.status.clone() }

        if !state.candidates.is_empty() {
            div {
                style: "display: flex; flex-direction: column; gap: 0.75rem; margin-top: 1rem;",
                for candidate in state.candidates.iter().cloned() {
                    div {
                        key: "{candidate.external_id}",
                        class: "card",
                        style: "display: flex; gap: 1rem; align-items: center;",
                        Cover { url: candidate.thumbnail_url.clone(), title: candidate.title.clone() }
                        div {
                            style: "flex: 1; min-width: 0;",
                            strong { "{candidate.title}" }
                            p { style: "color: #7a6e63; margin: 0.25rem 0;", "{candidate.authors}" }
                        }
                        for status in [ReadStatus::Read, ReadStatus::WantToRead] {
                            button {
                                key: "{status.as_str()}",
                                class: "btn",
                                disabled: busy,
                                onclick: {
                                    let candidate = candidate.clone();
                                    move |_| add(candidate.clone(), status)
                                },
                                "+ {status.label()}"
                            }
                        }
                    }
                }
            }
        }

        ShelfTabs {
            selected,
            read_count: state.count(ReadStatus::Read),
            to_read_count: state.count(ReadStatus::WantToRead),
            on_select: move |status| tab.set(status),
        }

        if state.status.loading {
            p { "Chargement..." }
        } else if state.count(selected) == 0 {
            p {
                style: "color: #7a6e63;",
                "{empty_shelf}"
            }
        } else {
            div {
                style: "display: grid; grid-template-columns: repeat(auto-fill, minmax(18rem, 1fr)); gap: 1rem;",
                for post in state.shelf(selected).into_iter().cloned() {
                    div {
                        key: "{post.id}",
                        class: "card",
                        style: "display: flex; gap: 1rem;",
                        Cover { url: post.book_cover_url.clone(), title: post.book_title.clone() }
                        div {
                            style: "flex: 1; min-width: 0; display: flex; flex-direction: column; gap: 0.25rem;",
                            if let Some(book_id) = post.book_id.clone() {
                                Link {
                                    to: Route::BookDetail { book_id, uid: String::new() },
                                    strong { "{post.book_title}" }
                                }
                            } else {
                                strong { "{post.book_title}" }
                            }
                            if let Some(author) = &post.book_author {
                                span { style: "color: #7a6e63; font-size: 0.875rem;", "{author}" }
                            }
                            if let Some(rating) = post.rating {
                                StarRating { rating, read_only: true }
                            }
                            div {
                                style: "display: flex; gap: 0.5rem; margin-top: auto;",
                                button {
                                    class: "btn",
                                    disabled: busy,
                                    onclick: {
                                        let id = post.id.clone();
                                        move |_| move_to(id.clone(), other)
                                    },
                                    "→ {other.label()}"
                                }
                                button {
                                    class: "btn",
                                    disabled: busy,
                                    onclick: {
                                        let id = post.id.clone();
                                        move |_| remove(id.clone())
                                    },
                                    if state.status.is_running(&format!("remove:{}", post.id)) { "..." } else { "Retirer" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
