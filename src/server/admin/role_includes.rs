use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireSuperadmin;
use crate::server::AppState;
use crate::server::dto::{CreateRoleIncludeRequest, RoleIncludeFilter, UpdateRoleIncludeRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};

pub async fn create_role_include(
    RequireSuperadmin(admin): RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoleIncludeRequest>,
) -> impl IntoResponse {
    let rel = state
        .roles
        .add_include(&req.parent_role_id, &req.child_role_id, &admin.id)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(rel))))
}

pub async fn list_role_includes(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RoleIncludeFilter>,
) -> impl IntoResponse {
    let rels = state.store.list_role_includes(
        filter.parent_role_id.as_deref(),
        filter.child_role_id.as_deref(),
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(rels)))
}

pub async fn get_role_include(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let rel = state
        .store
        .get_role_include(&id)?
        .or_not_found("Role inclusion not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(rel)))
}

pub async fn update_role_include(
    RequireSuperadmin(admin): RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleIncludeRequest>,
) -> impl IntoResponse {
    let rel = state.roles.update_include(
        &id,
        req.parent_role_id.as_deref(),
        req.child_role_id.as_deref(),
        &admin.id,
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(rel)))
}

pub async fn delete_role_include(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.roles.delete_include(&id)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
