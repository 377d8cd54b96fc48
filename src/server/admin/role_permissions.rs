use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireSuperadmin;
use crate::server::AppState;
use crate::server::dto::{CreateRolePermissionRequest, RolePermissionFilter};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::types::RolePermission;

pub async fn create_role_permission(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRolePermissionRequest>,
) -> impl IntoResponse {
    state
        .store
        .get_role(&req.role_id)?
        .or_not_found("Role not found")?;
    state
        .store
        .get_permission(&req.permission_id)?
        .or_not_found("Permission not found")?;
    if let Some(restriction_id) = &req.restriction_id {
        state
            .store
            .get_restriction(restriction_id)?
            .or_not_found("Restriction not found")?;
    }

    let grant = RolePermission {
        id: Uuid::new_v4().to_string(),
        role_id: req.role_id,
        permission_id: req.permission_id,
        restriction_id: req.restriction_id,
        created_at: Utc::now(),
    };
    state.store.create_role_permission(&grant)?;
    state.roles.cache().invalidate_all();

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(grant))))
}

pub async fn list_role_permissions(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RolePermissionFilter>,
) -> impl IntoResponse {
    let grants = state
        .store
        .list_role_permissions(filter.role_id.as_deref())?;

    Ok::<_, ApiError>(Json(ApiResponse::success(grants)))
}

pub async fn delete_role_permission(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !state.store.delete_role_permission(&id)? {
        return Err(ApiError::not_found("Role permission not found"));
    }
    state.roles.cache().invalidate_all();

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
