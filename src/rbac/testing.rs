use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::Utc;
use tempfile::TempDir;

use crate::error::Result;
use crate::store::{SqliteStore, Store};
use crate::types::*;

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// A throwaway database with helpers for building role graphs by id.
pub struct Fixture {
    _temp: TempDir,
    store: SqliteStore,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        Self { _temp: temp, store }
    }

    pub fn store(&self) -> &dyn Store {
        &self.store
    }

    pub fn into_parts(self) -> (TempDir, SqliteStore) {
        (self._temp, self.store)
    }

    pub fn app(&self, id: &str) {
        self.store
            .upsert_application(&Application {
                id: id.to_string(),
                name: id.to_string(),
                description: None,
                is_active: true,
            })
            .unwrap();
    }

    /// Creates a role whose id and name are both `id`.
    pub fn role(&self, id: &str, application_id: &str) {
        self.app(application_id);
        self.store
            .create_role(&Role {
                id: id.to_string(),
                name: id.to_string(),
                system_name: None,
                comment: None,
                application_id: application_id.to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
    }

    pub fn include(&self, parent: &str, child: &str) -> String {
        let id = format!("{parent}->{child}");
        let now = Utc::now();
        self.store
            .create_role_include(&RoleInclude {
                id: id.clone(),
                parent_role_id: parent.to_string(),
                child_role_id: child.to_string(),
                created_by: None,
                modified_by: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        id
    }

    pub fn grant(&self, role_id: &str, permission_id: &str) {
        self.store
            .upsert_permission(&Permission {
                id: permission_id.to_string(),
                name: permission_id.to_string(),
                comment: None,
            })
            .unwrap();
        self.store
            .create_role_permission(&RolePermission {
                id: format!("{role_id}:{permission_id}"),
                role_id: role_id.to_string(),
                permission_id: permission_id.to_string(),
                restriction_id: None,
                created_at: Utc::now(),
            })
            .unwrap();
    }

    pub fn user(&self, id: &str, is_superadmin: bool) -> User {
        let user = User {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            password_hash: String::new(),
            full_name: id.to_string(),
            position: None,
            is_superadmin,
            is_verified: true,
            created_at: Utc::now(),
        };
        self.store.create_user(&user).unwrap();
        user
    }

    /// Assigns `role_id` to `user_id` in `company_id`, creating the company on first use.
    pub fn relate(&self, user_id: &str, company_id: &str, role_id: &str) {
        if self.store.get_company(company_id).unwrap().is_none() {
            self.store
                .create_company(&Company {
                    id: company_id.to_string(),
                    name: company_id.to_string(),
                    description: None,
                    created_at: Utc::now(),
                })
                .unwrap();
        }
        let role = self.store.get_role(role_id).unwrap().unwrap();
        self.store
            .create_user_company_relation(&UserCompanyRelation {
                id: format!("{user_id}:{company_id}:{role_id}"),
                user_id: user_id.to_string(),
                company_id: company_id.to_string(),
                role_id: role_id.to_string(),
                application_id: role.application_id,
                created_at: Utc::now(),
            })
            .unwrap();
    }
}

type Hook = Box<dyn FnOnce() + Send>;

/// Delegates to a [`SqliteStore`], running a one-shot callback right after
/// the next `list_grants_for_roles` call returns.
pub struct HookedStore {
    inner: SqliteStore,
    after_grants: Mutex<Option<Hook>>,
}

impl HookedStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            after_grants: Mutex::new(None),
        }
    }

    pub fn after_grants(&self, hook: impl FnOnce() + Send + 'static) {
        *self.after_grants.lock().unwrap() = Some(Box::new(hook));
    }
}

impl Store for HookedStore {
    fn initialize(&self) -> Result<()> {
        self.inner.initialize()
    }

    fn upsert_application(&self, app: &Application) -> Result<()> {
        self.inner.upsert_application(app)
    }

    fn get_application(&self, id: &str) -> Result<Option<Application>> {
        self.inner.get_application(id)
    }

    fn list_applications(&self) -> Result<Vec<Application>> {
        self.inner.list_applications()
    }

    fn upsert_permission(&self, permission: &Permission) -> Result<()> {
        self.inner.upsert_permission(permission)
    }

    fn get_permission(&self, id: &str) -> Result<Option<Permission>> {
        self.inner.get_permission(id)
    }

    fn list_permissions(&self) -> Result<Vec<Permission>> {
        self.inner.list_permissions()
    }

    fn create_restriction(&self, restriction: &Restriction) -> Result<()> {
        self.inner.create_restriction(restriction)
    }

    fn get_restriction(&self, id: &str) -> Result<Option<Restriction>> {
        self.inner.get_restriction(id)
    }

    fn list_restrictions(&self) -> Result<Vec<Restriction>> {
        self.inner.list_restrictions()
    }

    fn create_role(&self, role: &Role) -> Result<()> {
        self.inner.create_role(role)
    }

    fn get_role(&self, id: &str) -> Result<Option<Role>> {
        self.inner.get_role(id)
    }

    fn get_role_by_system_name(
        &self,
        application_id: &str,
        system_name: &str,
    ) -> Result<Option<Role>> {
        self.inner.get_role_by_system_name(application_id, system_name)
    }

    fn list_roles(
        &self,
        application_id: Option<&str>,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Role>> {
        self.inner.list_roles(application_id, cursor, limit)
    }

    fn update_role(&self, role: &Role) -> Result<()> {
        self.inner.update_role(role)
    }

    fn delete_role(&self, id: &str) -> Result<bool> {
        self.inner.delete_role(id)
    }

    fn get_roles_by_ids(&self, ids: &[String]) -> Result<Vec<Role>> {
        self.inner.get_roles_by_ids(ids)
    }

    fn create_role_permission(&self, grant: &RolePermission) -> Result<()> {
        self.inner.create_role_permission(grant)
    }

    fn get_role_permission(&self, id: &str) -> Result<Option<RolePermission>> {
        self.inner.get_role_permission(id)
    }

    fn list_role_permissions(&self, role_id: Option<&str>) -> Result<Vec<RolePermission>> {
        self.inner.list_role_permissions(role_id)
    }

    fn delete_role_permission(&self, id: &str) -> Result<bool> {
        self.inner.delete_role_permission(id)
    }

    fn list_grants_for_roles(&self, role_ids: &[String]) -> Result<Vec<RolePermission>> {
        let grants = self.inner.list_grants_for_roles(role_ids)?;
        let hook = self.after_grants.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        Ok(grants)
    }

    fn create_role_include(&self, rel: &RoleInclude) -> Result<()> {
        self.inner.create_role_include(rel)
    }

    fn get_role_include(&self, id: &str) -> Result<Option<RoleInclude>> {
        self.inner.get_role_include(id)
    }

    fn find_role_include(
        &self,
        parent_role_id: &str,
        child_role_id: &str,
        exclude_id: Option<&str>,
    ) -> Result<Option<RoleInclude>> {
        self.inner
            .find_role_include(parent_role_id, child_role_id, exclude_id)
    }

    fn list_role_includes(
        &self,
        parent_role_id: Option<&str>,
        child_role_id: Option<&str>,
    ) -> Result<Vec<RoleInclude>> {
        self.inner.list_role_includes(parent_role_id, child_role_id)
    }

    fn update_role_include(&self, rel: &RoleInclude) -> Result<()> {
        self.inner.update_role_include(rel)
    }

    fn delete_role_include(&self, id: &str) -> Result<bool> {
        self.inner.delete_role_include(id)
    }

    fn list_child_edges(&self, parent_ids: &[String]) -> Result<Vec<(String, String)>> {
        self.inner.list_child_edges(parent_ids)
    }

    fn create_user(&self, user: &User) -> Result<()> {
        self.inner.create_user(user)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.inner.get_user(id)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.inner.get_user_by_email(email)
    }

    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>> {
        self.inner.list_users(cursor, limit)
    }

    fn create_company(&self, company: &Company) -> Result<()> {
        self.inner.create_company(company)
    }

    fn get_company(&self, id: &str) -> Result<Option<Company>> {
        self.inner.get_company(id)
    }

    fn list_companies(&self, cursor: &str, limit: i32) -> Result<Vec<Company>> {
        self.inner.list_companies(cursor, limit)
    }

    fn create_user_company_relation(&self, rel: &UserCompanyRelation) -> Result<()> {
        self.inner.create_user_company_relation(rel)
    }

    fn get_user_company_relation(&self, id: &str) -> Result<Option<UserCompanyRelation>> {
        self.inner.get_user_company_relation(id)
    }

    fn list_user_company_relations(&self, user_id: &str) -> Result<Vec<UserCompanyRelation>> {
        self.inner.list_user_company_relations(user_id)
    }

    fn list_company_users(&self, company_id: &str) -> Result<Vec<User>> {
        self.inner.list_company_users(company_id)
    }

    fn delete_user_company_relation(&self, id: &str) -> Result<bool> {
        self.inner.delete_user_company_relation(id)
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}
