mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// The `*_for_roles` / `*_by_ids` / `list_child_edges` methods take a whole id set
/// and must answer it in one round trip; graph traversal depends on that.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Application operations
    fn upsert_application(&self, app: &Application) -> Result<()>;
    fn get_application(&self, id: &str) -> Result<Option<Application>>;
    fn list_applications(&self) -> Result<Vec<Application>>;

    // Permission catalog operations
    fn upsert_permission(&self, permission: &Permission) -> Result<()>;
    fn get_permission(&self, id: &str) -> Result<Option<Permission>>;
    fn list_permissions(&self) -> Result<Vec<Permission>>;

    // Restriction operations
    fn create_restriction(&self, restriction: &Restriction) -> Result<()>;
    fn get_restriction(&self, id: &str) -> Result<Option<Restriction>>;
    fn list_restrictions(&self) -> Result<Vec<Restriction>>;

    // Role operations
    fn create_role(&self, role: &Role) -> Result<()>;
    fn get_role(&self, id: &str) -> Result<Option<Role>>;
    fn get_role_by_system_name(
        &self,
        application_id: &str,
        system_name: &str,
    ) -> Result<Option<Role>>;
    fn list_roles(
        &self,
        application_id: Option<&str>,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Role>>;
    fn update_role(&self, role: &Role) -> Result<()>;
    fn delete_role(&self, id: &str) -> Result<bool>;
    fn get_roles_by_ids(&self, ids: &[String]) -> Result<Vec<Role>>;

    // Role-permission grant operations
    fn create_role_permission(&self, grant: &RolePermission) -> Result<()>;
    fn get_role_permission(&self, id: &str) -> Result<Option<RolePermission>>;
    fn list_role_permissions(&self, role_id: Option<&str>) -> Result<Vec<RolePermission>>;
    fn delete_role_permission(&self, id: &str) -> Result<bool>;
    fn list_grants_for_roles(&self, role_ids: &[String]) -> Result<Vec<RolePermission>>;

    // Role inclusion edge operations
    fn create_role_include(&self, rel: &RoleInclude) -> Result<()>;
    fn get_role_include(&self, id: &str) -> Result<Option<RoleInclude>>;
    fn find_role_include(
        &self,
        parent_role_id: &str,
        child_role_id: &str,
        exclude_id: Option<&str>,
    ) -> Result<Option<RoleInclude>>;
    fn list_role_includes(
        &self,
        parent_role_id: Option<&str>,
        child_role_id: Option<&str>,
    ) -> Result<Vec<RoleInclude>>;
    fn update_role_include(&self, rel: &RoleInclude) -> Result<()>;
    fn delete_role_include(&self, id: &str) -> Result<bool>;
    /// Returns `(parent, child)` for every edge whose parent is in `parent_ids`.
    fn list_child_edges(&self, parent_ids: &[String]) -> Result<Vec<(String, String)>>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>>;

    // Company operations
    fn create_company(&self, company: &Company) -> Result<()>;
    fn get_company(&self, id: &str) -> Result<Option<Company>>;
    fn list_companies(&self, cursor: &str, limit: i32) -> Result<Vec<Company>>;

    // User-company relation operations
    fn create_user_company_relation(&self, rel: &UserCompanyRelation) -> Result<()>;
    fn get_user_company_relation(&self, id: &str) -> Result<Option<UserCompanyRelation>>;
    fn list_user_company_relations(&self, user_id: &str) -> Result<Vec<UserCompanyRelation>>;
    fn list_company_users(&self, company_id: &str) -> Result<Vec<User>>;
    fn delete_user_company_relation(&self, id: &str) -> Result<bool>;

    fn close(&self) -> Result<()>;
}
