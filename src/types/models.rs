use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An independent product surface, e.g. `crm_app`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
}

/// A catalog entry. Keyed by a stable string id such as `edit_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restriction {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    /// Bootstrap marker such as `admin`. Not unique; roles carrying one are protected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// The application whose bucket this role's permissions are filed under.
    pub application_id: String,
    pub created_at: DateTime<Utc>,
}

impl Role {
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.system_name.is_some()
    }
}

/// A grant of one permission to one role, optionally qualified by a restriction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: String,
    pub role_id: String,
    pub permission_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restriction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Directed edge: the parent role includes every permission of the child role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleInclude {
    pub id: String,
    pub parent_role_id: String,
    pub child_role_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub is_superadmin: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Seed assignment: within `company_id`, the user holds `role_id`, which lives under `application_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCompanyRelation {
    pub id: String,
    pub user_id: String,
    pub company_id: String,
    pub role_id: String,
    pub application_id: String,
    pub created_at: DateTime<Utc>,
}
