//! Builds a user's permission distribution from their seed relations.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::graph;
use crate::error::Result;
use crate::store::Store;
use crate::types::{Distribution, PermissionView, Role, RoleGrant, User};

/// `(application_id, company_id, role_name, role_id)`. Ordering by name keeps
/// the emitted role entries stable.
type BucketKey = (String, String, String, String);

/// The full distribution for `user`: application -> company -> role entries.
///
/// Permissions of an included role land under that role's own application,
/// always for the company of the seed relation that reached it.
pub fn get_company_permissions_for_user(store: &dyn Store, user: &User) -> Result<PermissionView> {
    if user.is_superadmin {
        return Ok(PermissionView::Unrestricted);
    }

    let relations = store.list_user_company_relations(&user.id)?;
    if relations.is_empty() {
        return Ok(PermissionView::Restricted(Distribution::new()));
    }

    let seeds: BTreeSet<String> = relations.iter().map(|r| r.role_id.clone()).collect();
    let closure = graph::resolve(store, seeds.iter().cloned())?;

    let all_roles: Vec<String> = closure.reachable.iter().cloned().collect();

    let mut grants: HashMap<String, BTreeSet<String>> = HashMap::new();
    for grant in store.list_grants_for_roles(&all_roles)? {
        grants
            .entry(grant.role_id)
            .or_default()
            .insert(grant.permission_id);
    }

    let roles: HashMap<String, Role> = store
        .get_roles_by_ids(&all_roles)?
        .into_iter()
        .map(|role| (role.id.clone(), role))
        .collect();

    let per_seed: HashMap<&str, BTreeSet<String>> = seeds
        .iter()
        .map(|seed| (seed.as_str(), closure.for_seed(seed)))
        .collect();

    let mut buckets: BTreeMap<BucketKey, BTreeSet<String>> = BTreeMap::new();
    for relation in &relations {
        let Some(reached) = per_seed.get(relation.role_id.as_str()) else {
            continue;
        };

        for role_id in reached {
            let Some(permissions) = grants.get(role_id) else {
                continue;
            };
            let Some(role) = roles.get(role_id) else {
                tracing::debug!(role_id = %role_id, "role vanished while aggregating permissions");
                continue;
            };

            let key = (
                role.application_id.clone(),
                relation.company_id.clone(),
                role.name.clone(),
                role.id.clone(),
            );
            buckets
                .entry(key)
                .or_default()
                .extend(permissions.iter().cloned());
        }
    }

    let mut dist = Distribution::new();
    for ((application_id, company_id, role_name, _), permissions) in buckets {
        dist.entry(application_id)
            .or_default()
            .entry(company_id)
            .or_default()
            .push(RoleGrant {
                role: role_name,
                permissions: permissions.into_iter().collect(),
            });
    }

    Ok(PermissionView::Restricted(dist))
}

/// The `application_id` slice of the full distribution.
///
/// Seeds from every application take part, so a relation held in one
/// application can surface permissions in another.
pub fn get_company_permissions_by_application(
    store: &dyn Store,
    user: &User,
    application_id: &str,
) -> Result<PermissionView> {
    Ok(get_company_permissions_for_user(store, user)?.for_application(application_id))
}
