use dioxus::prelude::*;

use crate::auth::use_auth;

#[component]
pub fn Navbar(children: Element) -> Element {
    let auth = use_auth();
    let signed_in_as = auth
        .read()
        .user
        .as_ref()
        .and_then(|user| user.email.clone());

    rsx! {
        nav {
            class: "navbar",
            style: "display: flex; align-items: center; gap: 1.5rem; padding: 0.75rem 2rem; border-bottom: 1px solid #e5ded3; font-family: Georgia, serif;",
            span {
                style: "font-weight: 700; font-size: 1.25rem; margin-right: auto;",
                "Livrebox"
            }
            {children}
            if let Some(email) = signed_in_as {
                span {
                    style: "font-size: 0.75rem; color: #7a6e63;",
                    "{email}"
                }
            }
        }
    }
}
