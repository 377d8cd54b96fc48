mod catalog;
mod companies;
mod relations;
mod role_includes;
mod role_permissions;
mod roles;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Application routes
        .route("/applications", post(catalog::create_application))
        .route("/applications", get(catalog::list_applications))
        .route("/applications/{id}", put(catalog::upsert_application))
        // Permission catalog routes
        .route("/permissions", get(catalog::list_permissions))
        .route("/permissions/{id}", put(catalog::upsert_permission))
        // Restriction routes
        .route("/restrictions", post(catalog::create_restriction))
        .route("/restrictions", get(catalog::list_restrictions))
        // Role routes
        .route("/roles", post(roles::create_role))
        .route("/roles", get(roles::list_roles))
        .route("/roles/{id}", get(roles::get_role))
        .route("/roles/{id}", patch(roles::update_role))
        .route("/roles/{id}", delete(roles::delete_role))
        // Role permission grant routes
        .route(
            "/role-permissions",
            post(role_permissions::create_role_permission),
        )
        .route(
            "/role-permissions",
            get(role_permissions::list_role_permissions),
        )
        .route(
            "/role-permissions/{id}",
            delete(role_permissions::delete_role_permission),
        )
        // Role inclusion routes
        .route("/role-includes", post(role_includes::create_role_include))
        .route("/role-includes", get(role_includes::list_role_includes))
        .route("/role-includes/{id}", get(role_includes::get_role_include))
        .route(
            "/role-includes/{id}",
            patch(role_includes::update_role_include),
        )
        .route(
            "/role-includes/{id}",
            delete(role_includes::delete_role_include),
        )
        // Company routes
        .route("/companies", post(companies::create_company))
        .route("/companies", get(companies::list_companies))
        // User routes
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        // User company relation routes
        .route(
            "/user-company-relations",
            post(relations::create_relation),
        )
        .route("/user-company-relations", get(relations::list_relations))
        .route(
            "/user-company-relations/{id}",
            delete(relations::delete_relation),
        )
}
