//! Small pieces shared by several pages.

use dioxus::prelude::*;
use store::{Profile, ReadStatus};
use ui::controllers::ViewStatus;

/// Error and success flashes of a screen.
#[component]
pub fn Flash(status: ViewStatus) -> Element {
    rsx! {
        if let Some(err) = status.error {
            p { class: "flash-error", "{err}" }
        }
        if let Some(message) = status.success {
            p { class: "flash-success", "{message}" }
        }
    }
}

#[component]
pub fn Cover(url: Option<String>, title: String) -> Element {
    match url {
        Some(url) => rsx! {
            img {
                src: "{url}",
                alt: "{title}",
                style: "width: 4rem; height: 6rem; object-fit: cover; flex-shrink: 0;",
            }
        },
        None => rsx! {
            div {
                style: "width: 4rem; height: 6rem; flex-shrink: 0; background: #e5ded3; display: flex; align-items: center; justify-content: center; font-size: 0.75rem; color: #7a6e63;",
                "Pas de couverture"
            }
        },
    }
}

/// Round avatar, or the username's initial without a picture.
#[component]
pub fn Avatar(profile: Profile, #[props(default = 3)] size: u32) -> Element {
    let dimension = format!("width: {size}rem; height: {size}rem; border-radius: 9999px; flex-shrink: 0;");
    match profile.avatar_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => rsx! {
            img {
                src: "{url}",
                alt: "{profile.display_name()}",
                style: "{dimension} object-fit: cover;",
            }
        },
        None => rsx! {
            div {
                style: "{dimension} background: #a0522d; color: #fff; display: flex; align-items: center; justify-content: center; font-weight: 700;",
                "{profile.initial()}"
            }
        },
    }
}

/// "Lus" / "À lire" tab strip with counts.
#[component]
pub fn ShelfTabs(
    selected: ReadStatus,
    read_count: usize,
    to_read_count: usize,
    on_select: EventHandler<ReadStatus>,
) -> Element {
    rsx! {
        div {
            class: "tabs",
            style: "display: flex; gap: 1rem; margin: 1.5rem 0; border-bottom: 1px solid #e5ded3;",
            for (status, count) in [(ReadStatus::Read, read_count), (ReadStatus::WantToRead, to_read_count)] {
                button {
                    key: "{status.as_str()}",
                    class: "btn",
                    style: "border: none; background: none;",
                    "aria-selected": if status == selected { "true" } else { "false" },
                    onclick: move |_| on_select.call(status),
                    "{status.label()} ({count})"
                }
            }
        }
    }
}
