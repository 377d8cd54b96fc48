//! Idempotent bootstrap of applications, the permission catalog and the
//! protected system roles.
//!
//! Each row is written on its own. A failing row is logged and skipped so
//! that two processes seeding at once, or a half-seeded database, never stop
//! startup.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::PasswordManager;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Application, Permission, Role, RolePermission, User};

/// Application every system role belongs to.
pub const AUTH_APP: &str = "auth_app";

pub const APPLICATIONS: &[(&str, &str)] = &[
    (AUTH_APP, "Authentication"),
    ("crm_app", "CRM"),
    ("observer_app", "Observer"),
    ("reference_app", "Reference data"),
    ("contract_app", "Contracts"),
    ("price_app", "Pricing"),
    ("parcel_app", "Parcels"),
];

/// `(singular, plural, label, scope)`; each entry expands to the five
/// `add_/edit_/delete_/view_/get_all_` permissions.
const CRUD_RESOURCES: &[(&str, &str, &str, &str)] = &[
    ("user", "users", "user", "all"),
    ("company", "companies", "company", "all"),
    (
        "user_company_relation",
        "user_company_relations",
        "user company relation",
        "all",
    ),
    ("api_token", "api_tokens", "API token", "all"),
    (
        "legal_entity_company_relation",
        "legal_entity_company_relations",
        "legal entity company relation",
        "reference_app, crm_app",
    ),
    ("legal_entity", "legal_entities", "legal entity", "reference_app, crm_app"),
    ("contract", "contracts", "contract", "contract_app, crm_app"),
    ("contract_file", "contract_files", "contract file", "contract_app"),
    ("template", "templates", "template", "crm_app"),
    ("bank_account", "bank_accounts", "bank account", "crm_app"),
    ("service", "services", "service", "crm_app"),
    ("bill", "bills", "bill", "crm_app"),
    ("bill_detail", "bill_details", "bill line", "crm_app"),
    ("act", "acts", "act", "crm_app"),
    ("act_detail", "act_details", "act line", "crm_app"),
    ("prompt", "prompts", "prompt", "observer_app"),
    ("schedule", "schedules", "schedule", "observer_app"),
    ("storage", "storages", "storage", "reference_app"),
    ("cash_register", "cash_registers", "cash register", "reference_app"),
    ("city", "cities", "city", "reference_app"),
    ("price", "prices", "price", "price_app"),
    ("parcel", "parcels", "parcel", "parcel_app"),
];

/// Permissions that do not follow the CRUD pattern.
const EXTRA_PERMISSIONS: &[(&str, &str, &str)] = &[
    ("download_template", "Download template", "crm_app"),
    ("generate_template", "Generate document from template", "crm_app"),
    ("download_contract", "Download contract", "contract_app, crm_app"),
    ("get_all_contract_types", "List contract types", "contract_app"),
    ("get_sellers", "List seller legal entities", "reference_app, crm_app"),
    ("get_buyers", "List buyer legal entities", "reference_app, crm_app"),
    ("get_by_company", "List legal entities by company", "reference_app, crm_app"),
    (
        "get_legal_entity_by_inn_kpp",
        "Find legal entity by tax ids",
        "reference_app, crm_app",
    ),
    ("set_webhook", "Set webhook", "observer_app"),
    ("delete_webhook", "Delete webhook", "observer_app"),
    ("view_webhook_info", "View webhook info", "observer_app"),
    ("add_bot", "Add bot", "observer_app"),
    ("delete_bot", "Delete bot", "observer_app"),
    ("view_bot", "View bot", "observer_app"),
    ("get_all_bots", "List bots", "observer_app"),
    ("get_all_chats", "List chats", "observer_app"),
    ("get_all_accounts", "List messenger accounts", "observer_app"),
    ("toggle_schedule", "Enable or disable schedule", "observer_app"),
    ("create_analysis", "Create analysis", "observer_app"),
    ("view_analysis", "View analysis", "observer_app"),
    ("get_all_analyses", "List analyses", "observer_app"),
];

/// Permissions granted to the `user` system role on creation.
const USER_ROLE_PERMISSIONS: &[&str] = &["view_user", "view_company"];

/// Counts of rows written by one seeding pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub applications: usize,
    pub permissions: usize,
    pub roles_created: usize,
    pub grants_added: usize,
    pub failures: usize,
}

/// The full permission catalog, in declaration order.
#[must_use]
pub fn permission_catalog() -> Vec<Permission> {
    let mut catalog = Vec::new();

    for (singular, plural, label, scope) in CRUD_RESOURCES {
        let entries = [
            (format!("add_{singular}"), format!("Add {label}")),
            (format!("edit_{singular}"), format!("Edit {label}")),
            (format!("delete_{singular}"), format!("Delete {label}")),
            (format!("view_{singular}"), format!("View {label}")),
            (format!("get_all_{plural}"), format!("List all {label} records")),
        ];
        catalog.extend(entries.into_iter().map(|(id, name)| Permission {
            id,
            name,
            comment: Some(scope.to_string()),
        }));
    }

    catalog.extend(EXTRA_PERMISSIONS.iter().map(|(id, name, scope)| Permission {
        id: id.to_string(),
        name: name.to_string(),
        comment: Some(scope.to_string()),
    }));

    catalog
}

/// Runs every seeding step. Never fails; problems are counted and logged.
pub fn seed_all(store: &dyn Store) -> SeedReport {
    let mut report = SeedReport::default();

    for (id, name) in APPLICATIONS {
        let app = Application {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            is_active: true,
        };
        match store.upsert_application(&app) {
            Ok(()) => report.applications += 1,
            Err(e) => {
                tracing::warn!(application = id, "failed to seed application: {e}");
                report.failures += 1;
            }
        }
    }

    let catalog = permission_catalog();
    for permission in &catalog {
        match store.upsert_permission(permission) {
            Ok(()) => report.permissions += 1,
            Err(e) => {
                tracing::warn!(permission = %permission.id, "failed to seed permission: {e}");
                report.failures += 1;
            }
        }
    }

    let admin_grants: Vec<&str> = catalog
        .iter()
        .filter(|p| p.comment.as_deref() == Some("all"))
        .map(|p| p.id.as_str())
        .collect();

    for (system_name, display_name, grants) in [
        ("admin", "Administrator", admin_grants.as_slice()),
        ("user", "User", USER_ROLE_PERMISSIONS),
    ] {
        match ensure_system_role(store, system_name, display_name, grants) {
            Ok(outcome) => {
                if outcome.created {
                    report.roles_created += 1;
                }
                report.grants_added += outcome.grants_added;
                report.failures += outcome.grant_failures;
            }
            Err(e) => {
                tracing::warn!(system_name, "failed to seed system role: {e}");
                report.failures += 1;
            }
        }
    }

    tracing::info!(
        applications = report.applications,
        permissions = report.permissions,
        roles_created = report.roles_created,
        grants_added = report.grants_added,
        failures = report.failures,
        "seeding finished"
    );
    report
}

#[derive(Debug, Default)]
struct SystemRoleOutcome {
    created: bool,
    grants_added: usize,
    grant_failures: usize,
}

/// Creates the system role unless one already exists, then adds whichever of
/// `grants` it is missing. Grant failures are logged and counted.
fn ensure_system_role(
    store: &dyn Store,
    system_name: &str,
    display_name: &str,
    grants: &[&str],
) -> Result<SystemRoleOutcome> {
    let mut outcome = SystemRoleOutcome::default();

    let role = match store.get_role_by_system_name(AUTH_APP, system_name)? {
        Some(role) => role,
        None => {
            let role = Role {
                id: Uuid::new_v4().to_string(),
                name: display_name.to_string(),
                system_name: Some(system_name.to_string()),
                comment: Some(format!("System role `{system_name}`")),
                application_id: AUTH_APP.to_string(),
                created_at: Utc::now(),
            };
            store.create_role(&role)?;
            outcome.created = true;
            role
        }
    };

    let existing: HashSet<String> = store
        .list_role_permissions(Some(role.id.as_str()))?
        .into_iter()
        .map(|grant| grant.permission_id)
        .collect();

    for permission_id in grants.iter().filter(|p| !existing.contains(**p)) {
        let grant = RolePermission {
            id: Uuid::new_v4().to_string(),
            role_id: role.id.clone(),
            permission_id: permission_id.to_string(),
            restriction_id: None,
            created_at: Utc::now(),
        };
        match store.create_role_permission(&grant) {
            Ok(()) => outcome.grants_added += 1,
            Err(e) => {
                tracing::warn!(role = %role.name, permission_id, "failed to grant permission: {e}");
                outcome.grant_failures += 1;
            }
        }
    }

    Ok(outcome)
}

/// Creates a verified superadmin account.
pub fn create_superadmin(
    store: &dyn Store,
    passwords: &PasswordManager,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<User> {
    if store.get_user_by_email(email)?.is_some() {
        return Err(Error::Conflict(format!("user {email} already exists")));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: passwords.hash(password)?,
        full_name: full_name.to_string(),
        position: None,
        is_superadmin: true,
        is_verified: true,
        created_at: Utc::now(),
    };
    store.create_user(&user)?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    #[test]
    fn test_catalog_ids_are_unique() {
        let catalog = permission_catalog();
        let ids: HashSet<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
        assert!(ids.contains("edit_user"));
        assert!(ids.contains("get_all_users"));
        assert!(ids.contains("add_price"));
        assert!(ids.contains("get_all_cities"));
    }

    #[test]
    fn test_seed_twice_is_idempotent() {
        let (_temp, store) = test_store();

        let first = seed_all(&store);
        assert_eq!(first.failures, 0);
        assert_eq!(first.roles_created, 2);

        let second = seed_all(&store);
        assert_eq!(second.failures, 0);
        assert_eq!(second.roles_created, 0);

        assert_eq!(store.list_permissions().unwrap().len(), permission_catalog().len());
        assert_eq!(store.list_applications().unwrap().len(), APPLICATIONS.len());

        let admin = store
            .get_role_by_system_name(AUTH_APP, "admin")
            .unwrap()
            .unwrap();
        assert!(admin.is_system());
        let grants = store.list_role_permissions(Some(admin.id.as_str())).unwrap();
        assert!(grants.iter().any(|g| g.permission_id == "view_user"));
    }

    #[test]
    fn test_reseed_overwrites_name_and_comment() {
        let (_temp, store) = test_store();
        store
            .upsert_permission(&Permission {
                id: "edit_user".to_string(),
                name: "stale".to_string(),
                comment: None,
            })
            .unwrap();

        seed_all(&store);

        let perm = store.get_permission("edit_user").unwrap().unwrap();
        assert_eq!(perm.name, "Edit user");
        assert_eq!(perm.comment.as_deref(), Some("all"));
    }

    #[test]
    fn test_system_role_name_clash_is_not_fatal() {
        let (_temp, store) = test_store();
        seed_all(&store);
        let admin = store
            .get_role_by_system_name(AUTH_APP, "admin")
            .unwrap()
            .unwrap();
        // Drop the marker so the next pass tries to recreate a role named "Administrator".
        store
            .connection()
            .execute(
                "UPDATE roles SET system_name = NULL WHERE id = ?1",
                rusqlite::params![admin.id],
            )
            .unwrap();

        let report = seed_all(&store);
        assert_eq!(report.failures, 1);
        assert_eq!(report.permissions, permission_catalog().len());
    }

    #[test]
    fn test_create_superadmin() {
        let (_temp, store) = test_store();
        let passwords = PasswordManager::new();

        let user =
            create_superadmin(&store, &passwords, "root@example.com", "hunter2hunter2", "Root")
                .unwrap();
        assert!(user.is_superadmin && user.is_verified);
        assert!(passwords.verify("hunter2hunter2", &user.password_hash).unwrap());

        let again = create_superadmin(&store, &passwords, "root@example.com", "x", "Root");
        assert!(matches!(again, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_reseed_restores_missing_system_grants() {
        let (_temp, store) = test_store();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER block_view_company BEFORE INSERT ON role_permissions
                 WHEN NEW.permission_id = 'view_company'
                 BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
            )
            .unwrap();

        let first = seed_all(&store);
        assert_eq!(first.roles_created, 2);
        // Both the admin and the user role grant view_company.
        assert_eq!(first.failures, 2);

        let user_role = store
            .get_role_by_system_name(AUTH_APP, "user")
            .unwrap()
            .unwrap();
        let granted = |role_id: &str| -> Vec<String> {
            store
                .list_role_permissions(Some(role_id))
                .unwrap()
                .into_iter()
                .map(|g| g.permission_id)
                .collect()
        };
        assert_eq!(granted(&user_role.id), vec!["view_user".to_string()]);

        store
            .connection()
            .execute_batch("DROP TRIGGER block_view_company;")
            .unwrap();

        let second = seed_all(&store);
        assert_eq!(second.failures, 0);
        assert_eq!(second.roles_created, 0);
        assert_eq!(second.grants_added, 2);
        assert_eq!(
            granted(&user_role.id),
            vec!["view_company".to_string(), "view_user".to_string()]
        );

        let third = seed_all(&store);
        assert_eq!(third.grants_added, 0);
    }
}
