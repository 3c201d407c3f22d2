//! This crate contains all shared UI for the workspace: screen controllers,
//! widgets, the authentication context and platform helpers.

pub mod controllers;
pub mod format;
pub mod platform;

mod auth;
pub use auth::{use_auth, AuthState, LogoutButton, SessionCheck};

mod services;
pub use services::{use_gateway, use_services, AppGateway, AppProvider, Services};

mod navbar;
pub use navbar::Navbar;

mod star_rating;
pub use star_rating::{next_rating, normalize_rating, star_fill, StarFill, StarRating};
