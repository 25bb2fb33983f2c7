//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Google OAuth login flow (redirect, callback, anti-forgery state)
//! - RS256 session token issuance and verification
//! - AuthedClaims extractor for protected routes

pub mod extractors;
pub mod google;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod service;
pub mod state_store;
pub mod token;


pub use extractors::AuthedClaims;
pub use routes::auth_routes;
pub use service::AuthService;
pub use token::TokenService;
