//! # Menu Module
//!
//! Serves the static main menu consumed by the frontend shell. The payload is
//! compiled in; there is no menu table.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::auth::AuthedClaims;
use crate::common::ApiError;

#[derive(Serialize, Debug, Clone)]
pub struct MenuItem {
    pub id: i64,
    pub title: &'static str,
    pub path: &'static str,
    pub icon: &'static str,
}

fn main_menu() -> Vec<MenuItem> {
    vec![
        MenuItem {
            id: 1,
            title: "Home",
            path: "/",
            icon: "home",
        },
        MenuItem {
            id: 2,
            title: "Users",
            path: "/users",
            icon: "people",
        },
        MenuItem {
            id: 3,
            title: "Profile",
            path: "/profile",
            icon: "person",
        },
        MenuItem {
            id: 4,
            title: "Settings",
            path: "/settings",
            icon: "settings",
        },
    ]
}

/// GET /api/collp/main-menu - Static menu payload, bearer-protected
pub async fn get_main_menu(_claims: AuthedClaims) -> Result<Json<Vec<MenuItem>>, ApiError> {
    Ok(Json(main_menu()))
}

/// Creates and returns the menu router
pub fn menu_routes() -> Router {
    Router::new().route("/api/collp/main-menu", get(get_main_menu))
}
