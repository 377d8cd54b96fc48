mod auth;
mod permissions;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Session
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        // Permission views
        .route(
            "/users/{user_id}/permissions",
            get(permissions::get_user_permissions),
        )
        .route(
            "/companies/{company_id}/users",
            get(permissions::list_company_users),
        )
}
