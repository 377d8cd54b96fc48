use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireSuperadmin;
use crate::server::AppState;
use crate::server::dto::CreateUserRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::{validate_email, validate_name, validate_password};
use crate::types::User;

pub async fn create_user(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_name(&req.full_name, "User")?;

    if state.store.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email: req.email,
        password_hash: state.passwords.hash(&req.password)?,
        full_name: req.full_name,
        position: req.position,
        is_superadmin: req.is_superadmin,
        is_verified: req.is_verified,
        created_at: Utc::now(),
    };
    state.store.create_user(&user)?;

    tracing::info!(user_id = %user.id, is_superadmin = user.is_superadmin, "user created");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

pub async fn get_user(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let user = state.store.get_user(&id)?.or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}
