//! One book and one member's post about it. Editable when the post is the
//! viewer's own, read-only otherwise.

use dioxus::prelude::*;
use ui::controllers::{checkout, settle, use_flash_expiry, BookDetailController};
use ui::format::{long_date, rating_label};
use ui::{use_gateway, StarRating};

use super::widgets::{Cover, Flash};
use crate::Route;

#[component]
pub fn BookDetail(book_id: String, uid: String) -> Element {
    // Track the route params in a signal so use_resource re-runs when they change
    let mut target = use_signal(|| (book_id.clone(), uid.clone()));
    if *target.peek() != (book_id.clone(), uid.clone()) {
        target.set((book_id.clone(), uid.clone()));
    }

    let gateway = use_gateway();
    let mut detail = use_signal({
        let gateway = gateway.clone();
        move || BookDetailController::new(gateway, book_id, Some(uid))
    });
    let mut draft = use_signal(String::new);
    use_flash_expiry(detail);

    let _loader = use_resource(move || {
        let (book_id, uid) = target();
        let gateway = gateway.clone();
        async move {
            let mut working = BookDetailController::new(gateway, book_id, Some(uid));
            working.load().await;
            let comment = working
                .post
                .as_ref()
                .and_then(|post| post.comment.clone())
                .unwrap_or_default();
            draft.set(comment);
            detail.set(working);
        }
    });

    let rate = move |value: f32| {
        spawn(async move {
            if let Some(mut working) = checkout(&mut detail, "rating") {
                let started = working.clone();
                working.set_rating(value).await;
                settle(&mut detail, &started, working);
            }
        });
    };

    let save_review = move |evt: FormEvent| {
        evt.prevent_default();
        spawn(async move {
            let text = draft();
            if let Some(mut working) = checkout(&mut detail, "review") {
                let started = working.clone();
                working.set_review(&text).await;
                settle(&mut detail, &started, working);
            }
        });
    };

    let state = detail.read();
    let own = state.is_own();
    let busy = state.status.is_busy();

    let Some(book) = state.book.clone() else {
        return rsx! {
            if state.status.loading {
                p { "Chargement..." }
            } else {
                div {
                    class: "card",
                    h1 { style: "font-size: 1.5rem;", "Livre introuvable" }
                    Flash { status: state.status.clone() }
                    Link { to: Route::Library {}, "Retour à mes livres" }
                }
            }
        };
    };

    let rating = state.post.as_ref().and_then(|post| post.rating).unwrap_or(0.0);

    rsx! {
        Link {
            to: Route::Library {},
            style: "font-size: 0.875rem; color: #7a6e63;",
            "← Mes livres"
        }

        div {
            style: "display: flex; gap: 2rem; margin-top: 1.5rem;",

            if let Some(url) = &book.cover_url {
                img {
                    src: "{url}",
                    alt: "{book.title}",
                    style: "width: 10rem; height: 15rem; object-fit: cover; flex-shrink: 0;",
                }
            } else {
                Cover { url: None, title: book.title.clone() }
            }

            div {
                style: "flex: 1; min-width: 0;",
                h1 { style: "font-size: 1.75rem; margin: 0;", "{book.title}" }
                p { style: "color: #7a6e63; margin: 0.25rem 0 1rem;", "{book.author}" }
                if let Some(description) = &book.description {
                    p { style: "line-height: 1.6;", "{description}" }
                }
            }
        }

        section {
            class: "card",
            style: "margin-top: 2rem;",

            if own {
                h2 { style: "font-size: 1.25rem; margin-top: 0;", "Ma critique" }
            } else {
                h2 { style: "font-size: 1.25rem; margin-top: 0;", "Critique de {state.member_name()}" }
            }

            Flash { status: state.status.clone() }

            div {
                style: "display: flex; align-items: center; gap: 0.75rem;",
                StarRating {
                    rating,
                    read_only: !own || busy,
                    on_change: rate,
                }
                span { style: "font-size: 0.875rem;", "{rating_label(rating)}" }
            }

            if own {
                form {
                    style: "display: flex; flex-direction: column; gap: 0.5rem; margin-top: 1rem;",
                    onsubmit: save_review,
                    textarea {
                        rows: "6",
                        placeholder: "Qu'avez-vous pensé de ce livre ?",
                        value: "{draft}",
                        oninput: move |evt| draft.set(evt.value()),
                    }
                    button {
                        class: "btn btn-primary",
                        r#type: "submit",
                        style: "align-self: flex-end;",
                        disabled: busy,
                        if state.status.is_running("review") { "Enregistrement..." } else { "Enregistrer" }
                    }
                }
            } else {
                {match state.post.as_ref().and_then(|post| post.comment.as_deref()) {
                    Some(comment) if !comment.is_empty() => rsx! {
                        p { style: "font-style: italic; line-height: 1.6;", "« {comment} »" }
                    },
                    _ => rsx! {
                        p { style: "color: #7a6e63;", "Pas encore de critique." }
                    },
                }}
            }

            if let Some(post) = &state.post {
                p {
                    style: "font-size: 0.75rem; color: #7a6e63; margin-bottom: 0;",
                    "Ajouté le {long_date(&post.created_at)}"
                }
            }
        }
    }
}
