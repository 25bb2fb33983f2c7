//! # Users Module
//!
//! User account management:
//! - get-or-create upsert backing the federated login flow
//! - CRUD, search, and statistics over the `users` table
//! - soft delete (rows keep their history, reads never see them)

pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;
pub mod validators;

#[cfg(test)]
mod tests;

pub use models::User;
pub use routes::user_routes;
pub use service::UserService;
