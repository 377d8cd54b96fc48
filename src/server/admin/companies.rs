use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireSuperadmin;
use crate::server::AppState;
use crate::server::dto::{CreateCompanyRequest, PaginationParams};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, paginate,
};
use crate::server::validation::validate_name;
use crate::types::Company;

pub async fn create_company(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCompanyRequest>,
) -> impl IntoResponse {
    validate_name(&req.name, "Company")?;

    let company = Company {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description,
        created_at: Utc::now(),
    };
    state.store.create_company(&company)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(company))))
}

pub async fn list_companies(
    _admin: RequireSuperadmin,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let companies = state
        .store
        .list_companies(cursor, DEFAULT_PAGE_SIZE + 1)?;

    let (companies, next_cursor, has_more) =
        paginate(companies, DEFAULT_PAGE_SIZE as usize, |c| c.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(companies, next_cursor, has_more)))
}
