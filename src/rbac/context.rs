//! Request-time authorization decisions.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::PermissionView;

/// What a caller may do inside one company.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub company_id: Option<String>,
    pub is_superadmin: bool,
    /// False when the user holds no company relation anywhere.
    pub has_relations: bool,
    /// Union of every role entry for `company_id`. Empty without a company.
    pub permissions: BTreeSet<String>,
}

impl AuthContext {
    /// Flattens `view` for `company_id`, optionally limited to one application's bucket.
    pub fn new(
        user_id: &str,
        view: &PermissionView,
        has_relations: bool,
        company_id: Option<&str>,
        application_id: Option<&str>,
    ) -> Self {
        let permissions = company_id
            .and_then(|company| view.company_permissions(company, application_id))
            .unwrap_or_default();

        Self {
            user_id: user_id.to_string(),
            company_id: company_id.map(str::to_string),
            is_superadmin: view.is_unrestricted(),
            has_relations,
            permissions,
        }
    }

    /// Superadmins always pass. A user with no relations at all also passes
    /// without any permission check.
    #[must_use]
    pub fn allows(&self, permission: &str) -> bool {
        if self.is_superadmin {
            return true;
        }
        if !self.has_relations {
            tracing::info!(
                user_id = %self.user_id,
                permission,
                "user has no company relations, granting without permission check"
            );
            return true;
        }
        self.permissions.contains(permission)
    }

    pub fn require_permission(&self, permission: &str) -> Result<()> {
        if self.allows(permission) {
            return Ok(());
        }
        tracing::warn!(
            user_id = %self.user_id,
            company_id = ?self.company_id,
            permission,
            "permission denied"
        );
        Err(Error::Forbidden)
    }

    /// Like [`require_permission`](Self::require_permission), but a user may
    /// always read a resource about themselves.
    pub fn require_permission_or_self_view(&self, permission: &str, subject_id: &str) -> Result<()> {
        if self.user_id == subject_id {
            tracing::debug!(user_id = %self.user_id, "self view granted");
            return Ok(());
        }
        self.require_permission(permission)
    }
}
