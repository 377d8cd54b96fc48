use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireSuperadmin;
use crate::server::AppState;
use crate::server::dto::{
    CreateApplicationRequest, CreateRestrictionRequest, UpsertApplicationRequest,
    UpsertPermissionRequest,
};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::{validate_identifier, validate_name};
use crate::types::{Application, Permission, Restriction};

pub async fn create_application(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateApplicationRequest>,
) -> impl IntoResponse {
    validate_identifier(&req.id, "Application")?;
    validate_name(&req.name, "Application")?;

    if state.store.get_application(&req.id)?.is_some() {
        return Err(ApiError::conflict("Application already exists"));
    }

    let app = Application {
        id: req.id,
        name: req.name,
        description: req.description,
        is_active: req.is_active,
    };
    state.store.upsert_application(&app)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(app))))
}

pub async fn list_applications(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let apps = state.store.list_applications()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(apps)))
}

pub async fn upsert_application(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpsertApplicationRequest>,
) -> impl IntoResponse {
    validate_identifier(&id, "Application")?;
    validate_name(&req.name, "Application")?;

    let app = Application {
        id,
        name: req.name,
        description: req.description,
        is_active: req.is_active,
    };
    state.store.upsert_application(&app)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(app)))
}

pub async fn list_permissions(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let permissions = state.store.list_permissions()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(permissions)))
}

pub async fn upsert_permission(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpsertPermissionRequest>,
) -> impl IntoResponse {
    validate_identifier(&id, "Permission")?;
    validate_name(&req.name, "Permission")?;

    let permission = Permission {
        id,
        name: req.name,
        comment: req.comment,
    };
    state.store.upsert_permission(&permission)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(permission)))
}

pub async fn create_restriction(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRestrictionRequest>,
) -> impl IntoResponse {
    validate_identifier(&req.id, "Restriction")?;
    validate_name(&req.name, "Restriction")?;

    let restriction = Restriction {
        id: req.id,
        name: req.name,
        comment: req.comment,
    };
    state.store.create_restriction(&restriction)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(restriction))))
}

pub async fn list_restrictions(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let restrictions = state.store.list_restrictions()?;
    Ok::<_, ApiError>(Json(ApiResponse::success(restrictions)))
}
