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
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{CreateRoleRequest, ListRolesParams, UpdateRoleRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, paginate,
};
use crate::server::validation::validate_role_name;
use crate::types::Role;

pub async fn create_role(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoleRequest>,
) -> impl IntoResponse {
    validate_role_name(&req.name)?;

    state
        .store
        .get_application(&req.application_id)?
        .or_not_found("Application not found")?;

    let role = Role {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        system_name: None,
        comment: req.comment,
        application_id: req.application_id,
        created_at: Utc::now(),
    };
    state.store.create_role(&role)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(role))))
}

pub async fn list_roles(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRolesParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let roles = state.store.list_roles(
        params.application_id.as_deref(),
        cursor,
        DEFAULT_PAGE_SIZE + 1,
    )?;

    let (roles, next_cursor, has_more) =
        paginate(roles, DEFAULT_PAGE_SIZE as usize, |r| r.name.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(roles, next_cursor, has_more)))
}

pub async fn get_role(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let role = state.store.get_role(&id)?.or_not_found("Role not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(role)))
}

pub async fn update_role(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> impl IntoResponse {
    let mut role = state.store.get_role(&id)?.or_not_found("Role not found")?;

    if role.is_system() {
        return Err(ApiError::from(Error::SystemRole));
    }

    if let Some(name) = req.name {
        validate_role_name(&name)?;
        role.name = name;
    }
    if let Some(application_id) = req.application_id {
        state
            .store
            .get_application(&application_id)?
            .or_not_found("Application not found")?;
        role.application_id = application_id;
    }
    if let Some(comment) = req.comment {
        role.comment = Some(comment);
    }

    state.store.update_role(&role)?;
    // A role moving between applications moves its permissions between buckets.
    state.roles.cache().invalidate_all();

    Ok::<_, ApiError>(Json(ApiResponse::success(role)))
}

pub async fn delete_role(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let role = state.store.get_role(&id)?.or_not_found("Role not found")?;

    if role.is_system() {
        return Err(ApiError::from(Error::SystemRole));
    }

    state.store.delete_role(&role.id)?;
    state.roles.cache().invalidate_all();

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
