pub mod admin;
pub mod api;
pub mod auth;
pub mod directory;
pub mod location;
