//! Permission resolution: role graph traversal, aggregation into a
//! per-application/per-company distribution, and request-time checks.

pub mod aggregate;
pub mod cache;
pub mod context;
pub mod graph;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

pub use aggregate::{get_company_permissions_by_application, get_company_permissions_for_user};
pub use cache::PermissionCache;
pub use context::AuthContext;
pub use graph::{Closure, EdgeCandidate};

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{PermissionView, RoleInclude, User};

/// Owns role-inclusion writes and the distribution cache.
///
/// Edge validation and the following insert or update run under one lock so
/// two concurrent requests cannot both pass the cycle check. The storage
/// UNIQUE constraint still rejects a duplicate that slips past.
pub struct RoleGraph {
    store: Arc<dyn Store>,
    cache: PermissionCache,
    write_lock: Mutex<()>,
}

impl RoleGraph {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            cache: PermissionCache::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// The user's distribution, optionally sliced to one application.
    pub fn permissions(&self, user: &User, application_id: Option<&str>) -> Result<PermissionView> {
        if let Some(view) = self.cache.get(&user.id, application_id) {
            return Ok(view);
        }

        let generation = self.cache.generation();

        let view = match application_id {
            Some(app) => get_company_permissions_by_application(self.store.as_ref(), user, app)?,
            None => get_company_permissions_for_user(self.store.as_ref(), user)?,
        };

        self.cache.insert(&user.id, application_id, view.clone(), generation);
        Ok(view)
    }

    /// Authorization context for `user` acting inside `company_id`.
    pub fn context(
        &self,
        user: &User,
        company_id: Option<&str>,
        application_id: Option<&str>,
    ) -> Result<AuthContext> {
        let view = self.permissions(user, None)?;
        let has_relations = user.is_superadmin
            || !self.store.list_user_company_relations(&user.id)?.is_empty();
        Ok(AuthContext::new(
            &user.id,
            &view,
            has_relations,
            company_id,
            application_id,
        ))
    }

    pub fn add_include(
        &self,
        parent_role_id: &str,
        child_role_id: &str,
        acting_user_id: &str,
    ) -> Result<RoleInclude> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        graph::validate_edge(
            self.store.as_ref(),
            EdgeCandidate {
                parent: parent_role_id,
                child: child_role_id,
                replacing: None,
            },
        )?;

        let now = Utc::now();
        let rel = RoleInclude {
            id: Uuid::new_v4().to_string(),
            parent_role_id: parent_role_id.to_string(),
            child_role_id: child_role_id.to_string(),
            created_by: Some(acting_user_id.to_string()),
            modified_by: Some(acting_user_id.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.store.create_role_include(&rel)?;
        self.cache.invalidate_all();

        tracing::info!(
            id = %rel.id,
            parent = parent_role_id,
            child = child_role_id,
            "role inclusion added"
        );
        Ok(rel)
    }

    /// Moves one or both endpoints of an existing edge. Omitted endpoints keep
    /// their current value.
    pub fn update_include(
        &self,
        id: &str,
        parent_role_id: Option<&str>,
        child_role_id: Option<&str>,
        acting_user_id: &str,
    ) -> Result<RoleInclude> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut rel = self
            .store
            .get_role_include(id)?
            .ok_or_else(|| Error::not_found("role inclusion"))?;

        let parent = parent_role_id.unwrap_or(rel.parent_role_id.as_str()).to_string();
        let child = child_role_id.unwrap_or(rel.child_role_id.as_str()).to_string();

        graph::validate_edge(
            self.store.as_ref(),
            EdgeCandidate {
                parent: &parent,
                child: &child,
                replacing: Some((
                    rel.id.as_str(),
                    rel.parent_role_id.as_str(),
                    rel.child_role_id.as_str(),
                )),
            },
        )?;

        rel.parent_role_id = parent;
        rel.child_role_id = child;
        rel.modified_by = Some(acting_user_id.to_string());
        rel.updated_at = Utc::now();
        self.store.update_role_include(&rel)?;
        self.cache.invalidate_all();

        Ok(rel)
    }

    pub fn delete_include(&self, id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if !self.store.delete_role_include(id)? {
            return Err(Error::not_found("role inclusion"));
        }
        self.cache.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::Role;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<SqliteStore>, RoleGraph) {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(temp.path().join("test.db")).unwrap());
        store.initialize().unwrap();
        let graph = RoleGraph::new(store.clone());
        (temp, store, graph)
    }

    fn seed_roles(store: &SqliteStore, roles: &[(&str, &str)]) {
        for (id, app) in roles {
            store
                .upsert_application(&crate::types::Application {
                    id: app.to_string(),
                    name: app.to_string(),
                    description: None,
                    is_active: true,
                })
                .unwrap();
            store
                .create_role(&Role {
                    id: id.to_string(),
                    name: id.to_string(),
                    system_name: None,
                    comment: None,
                    application_id: app.to_string(),
                    created_at: Utc::now(),
                })
                .unwrap();
        }
    }

    #[test]
    fn test_reverse_edge_rejected_and_graph_unchanged() {
        let (_temp, store, graph) = setup();
        seed_roles(&store, &[("editor", "auth_app"), ("pricer", "price_app")]);

        let rel = graph.add_include("editor", "pricer", "root").unwrap();
        assert_eq!(rel.created_by.as_deref(), Some("root"));

        let err = graph.add_include("pricer", "editor", "root").unwrap_err();
        assert!(matches!(err, Error::CycleViolation));

        let edges = store.list_role_includes(None, None).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].parent_role_id, "editor");
    }

    #[test]
    fn test_accepted_insertions_never_form_a_cycle() {
        let (_temp, store, graph) = setup();
        let names = ["r0", "r1", "r2", "r3", "r4"];
        let roles: Vec<(&str, &str)> = names.iter().map(|n| (*n, "auth_app")).collect();
        seed_roles(&store, &roles);

        // Try every ordered pair; whatever gets accepted must stay acyclic.
        for parent in names {
            for child in names {
                let _ = graph.add_include(parent, child, "root");
            }
        }

        for role in names {
            let closure = graph::resolve(store.as_ref(), [role.to_string()]).unwrap();
            for child in closure.adjacency.get(role).into_iter().flatten() {
                let back = graph::is_reachable(store.as_ref(), child, role, None).unwrap();
                assert!(!back, "{child} reaches back to {role}");
            }
        }
    }

    #[test]
    fn test_update_include_checks_and_stamps() {
        let (_temp, store, graph) = setup();
        seed_roles(
            &store,
            &[("a", "auth_app"), ("b", "auth_app"), ("c", "auth_app")],
        );
        let ab = graph.add_include("a", "b", "root").unwrap();
        graph.add_include("b", "c", "root").unwrap();

        let err = graph.update_include(&ab.id, Some("c"), Some("b"), "admin2");
        assert!(matches!(err, Err(Error::CycleViolation)));

        let err = graph.update_include(&ab.id, None, Some("a"), "admin2");
        assert!(matches!(err, Err(Error::SelfInclusion)));

        let moved = graph.update_include(&ab.id, None, Some("c"), "admin2").unwrap();
        assert_eq!(moved.child_role_id, "c");
        assert_eq!(moved.modified_by.as_deref(), Some("admin2"));
        assert_eq!(moved.created_by.as_deref(), Some("root"));

        let err = graph.update_include("missing", None, None, "admin2");
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_edge_writes_invalidate_cache() {
        let (_temp, store, graph) = setup();
        seed_roles(&store, &[("editor", "auth_app"), ("pricer", "price_app")]);
        graph.cache().insert("u1", None, PermissionView::Unrestricted, graph.cache().generation());

        let rel = graph.add_include("editor", "pricer", "root").unwrap();
        assert!(graph.cache().is_empty());

        graph.cache().insert("u1", None, PermissionView::Unrestricted, graph.cache().generation());
        graph.delete_include(&rel.id).unwrap();
        assert!(graph.cache().is_empty());

        assert!(matches!(
            graph.delete_include(&rel.id),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_view_computed_across_a_write_is_not_cached() {
        use crate::rbac::testing::{Fixture, HookedStore};

        let fx = Fixture::new();
        fx.role("editor", "auth_app");
        fx.role("pricer", "price_app");
        fx.grant("pricer", "add_price");
        let user = fx.user("u1", false);
        fx.relate("u1", "k1", "editor");
        let (_temp, inner) = fx.into_parts();

        let store = Arc::new(HookedStore::new(inner));
        let graph = Arc::new(RoleGraph::new(store.clone()));

        let writer = Arc::clone(&graph);
        store.after_grants(move || {
            writer.add_include("editor", "pricer", "root").unwrap();
        });

        // Computed from the graph as it was before the include landed.
        let during = graph.permissions(&user, None).unwrap();
        assert!(during.distribution().unwrap().is_empty());
        assert!(graph.cache().get("u1", None).is_none());

        let after = graph.permissions(&user, None).unwrap();
        let dist = after.distribution().unwrap();
        assert_eq!(
            dist["price_app"]["k1"],
            vec![crate::types::RoleGrant {
                role: "pricer".to_string(),
                permissions: vec!["add_price".to_string()],
            }]
        );
    }
}
