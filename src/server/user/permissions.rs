use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CompanyUserResponse, UserPermissionsQuery};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};

const VIEW_USER: &str = "view_user";
const GET_ALL_USERS: &str = "get_all_users";

/// The subject's distribution, or one application's slice of it.
/// Callers may always read their own; others need `view_user` in `company`.
pub async fn get_user_permissions(
    RequireUser(caller): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<UserPermissionsQuery>,
) -> impl IntoResponse {
    let ctx = state
        .roles
        .context(&caller, query.company.as_deref(), None)?;
    ctx.require_permission_or_self_view(VIEW_USER, &user_id)?;

    let subject = state
        .store
        .get_user(&user_id)?
        .or_not_found("User not found")?;

    let view = state
        .roles
        .permissions(&subject, query.application_id.as_deref())?;

    Ok::<_, ApiError>(Json(ApiResponse::success(view)))
}

pub async fn list_company_users(
    RequireUser(caller): RequireUser,
    State(state): State<Arc<AppState>>,
    Path(company_id): Path<String>,
) -> impl IntoResponse {
    let ctx = state.roles.context(&caller, Some(company_id.as_str()), None)?;
    ctx.require_permission(GET_ALL_USERS)?;

    state
        .store
        .get_company(&company_id)?
        .or_not_found("Company not found")?;

    let users: Vec<CompanyUserResponse> = state
        .store
        .list_company_users(&company_id)?
        .into_iter()
        .map(CompanyUserResponse::from)
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(users)))
}
