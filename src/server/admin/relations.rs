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
use crate::server::dto::{CreateUserCompanyRelationRequest, UserCompanyRelationFilter};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::types::UserCompanyRelation;

/// Assigns a seed role. The relation's application is the role's own.
pub async fn create_relation(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserCompanyRelationRequest>,
) -> impl IntoResponse {
    state
        .store
        .get_user(&req.user_id)?
        .or_not_found("User not found")?;
    state
        .store
        .get_company(&req.company_id)?
        .or_not_found("Company not found")?;
    let role = state
        .store
        .get_role(&req.role_id)?
        .or_not_found("Role not found")?;

    let rel = UserCompanyRelation {
        id: Uuid::new_v4().to_string(),
        user_id: req.user_id,
        company_id: req.company_id,
        role_id: role.id,
        application_id: role.application_id,
        created_at: Utc::now(),
    };
    state.store.create_user_company_relation(&rel)?;
    state.roles.cache().invalidate_user(&rel.user_id);

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(rel))))
}

pub async fn list_relations(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<UserCompanyRelationFilter>,
) -> impl IntoResponse {
    let rels = state.store.list_user_company_relations(&filter.user_id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(rels)))
}

pub async fn delete_relation(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let rel = state
        .store
        .get_user_company_relation(&id)?
        .or_not_found("User company relation not found")?;

    state.store.delete_user_company_relation(&rel.id)?;
    state.roles.cache().invalidate_user(&rel.user_id);

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
