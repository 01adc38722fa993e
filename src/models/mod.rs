pub mod auth;
pub mod chat;
pub mod note;
pub mod ritual;
