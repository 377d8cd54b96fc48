use serde::{Deserialize, Serialize};

use crate::types::{PermissionView, User, UserCompanyRelation};

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub cursor: Option<String>,
}

fn default_true() -> bool {
    true
}

// Applications and catalog

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpsertApplicationRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpsertPermissionRequest {
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRestrictionRequest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

// Roles

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    pub application_id: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub application_id: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRolesParams {
    pub application_id: Option<String>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRolePermissionRequest {
    pub role_id: String,
    pub permission_id: String,
    #[serde(default)]
    pub restriction_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RolePermissionFilter {
    pub role_id: Option<String>,
}

// Role inclusion edges

#[derive(Debug, Deserialize)]
pub struct CreateRoleIncludeRequest {
    pub parent_role_id: String,
    pub child_role_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRoleIncludeRequest {
    pub parent_role_id: Option<String>,
    pub child_role_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleIncludeFilter {
    pub parent_role_id: Option<String>,
    pub child_role_id: Option<String>,
}

// Tenants and users

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub is_superadmin: bool,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserCompanyRelationRequest {
    pub user_id: String,
    pub company_id: String,
    pub role_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UserCompanyRelationFilter {
    pub user_id: String,
}

// Authentication

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub user_id: String,
    pub is_superadmin: bool,
    /// `null` for superadmins.
    pub permissions: PermissionView,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub company_ids: Vec<String>,
    pub relations: Vec<UserCompanyRelation>,
    pub permissions: PermissionView,
}

// Permission queries

#[derive(Debug, Default, Deserialize)]
pub struct UserPermissionsQuery {
    pub application_id: Option<String>,
    /// Company whose context authorizes a non-self lookup.
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompanyUserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

impl From<User> for CompanyUserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            position: user.position,
        }
    }
}
