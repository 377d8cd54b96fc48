use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::{RequireUser, TokenKind};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, MeResponse, RefreshRequest, TokenResponse};
use crate::server::response::{ApiError, ApiResponse};
use crate::types::User;

fn token_response(state: &AppState, user: &User) -> Result<TokenResponse, ApiError> {
    let pair = state.jwt.issue_pair(user)?;
    let permissions = state.roles.permissions(user, None)?;

    Ok(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer",
        user_id: user.id.clone(),
        is_superadmin: user.is_superadmin,
        permissions,
    })
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = state
        .store
        .get_user_by_email(&req.email)?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    if !state.passwords.verify(&req.password, &user.password_hash)? {
        tracing::warn!(email = %req.email, "failed login");
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    if !user.is_verified && !user.is_superadmin {
        return Err(ApiError::forbidden("Account is not verified"));
    }

    let body = token_response(&state, &user)?;
    tracing::info!(user_id = %user.id, "login");

    Ok::<_, ApiError>(Json(ApiResponse::success(body)))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> impl IntoResponse {
    let claims = state.jwt.verify(&req.refresh_token, TokenKind::Refresh)?;

    let user = state
        .store
        .get_user(&claims.uid)?
        .ok_or_else(|| ApiError::from(Error::InvalidToken))?;

    let body = token_response(&state, &user)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(body)))
}

pub async fn me(RequireUser(user): RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let relations = state.store.list_user_company_relations(&user.id)?;
    let permissions = state.roles.permissions(&user, None)?;

    let mut company_ids: Vec<String> = relations.iter().map(|r| r.company_id.clone()).collect();
    company_ids.sort();
    company_ids.dedup();

    Ok::<_, ApiError>(Json(ApiResponse::success(MeResponse {
        user,
        company_ids,
        relations,
        permissions,
    })))
}
