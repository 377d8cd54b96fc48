use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One role's contribution to a bucket: the role's display name and the
/// sorted, deduplicated permission ids it grants there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: String,
    pub permissions: Vec<String>,
}

/// `application_id -> company_id -> [RoleGrant]`
pub type Distribution = BTreeMap<String, BTreeMap<String, Vec<RoleGrant>>>;

/// The effective permissions of a user.
///
/// `Unrestricted` is the superadmin wildcard. It serializes as `null`, while a
/// user with no relations at all is `Restricted` with an empty map and
/// serializes as `{}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionView {
    Unrestricted,
    Restricted(Distribution),
}

impl PermissionView {
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    #[must_use]
    pub fn distribution(&self) -> Option<&Distribution> {
        match self {
            Self::Unrestricted => None,
            Self::Restricted(dist) => Some(dist),
        }
    }

    /// Keeps only the slice for `application_id`, still keyed by company.
    #[must_use]
    pub fn for_application(&self, application_id: &str) -> PermissionView {
        match self {
            Self::Unrestricted => Self::Unrestricted,
            Self::Restricted(dist) => Self::Restricted(
                dist.get_key_value(application_id)
                    .map(|(app, companies)| (app.clone(), companies.clone()))
                    .into_iter()
                    .collect(),
            ),
        }
    }

    /// Flattens every role entry for `company_id` into one set of permission ids.
    /// With an application given only that bucket counts, otherwise all applications do.
    /// Returns `None` for `Unrestricted`.
    #[must_use]
    pub fn company_permissions(
        &self,
        company_id: &str,
        application_id: Option<&str>,
    ) -> Option<BTreeSet<String>> {
        let dist = self.distribution()?;
        let mut flat = BTreeSet::new();
        for (app, companies) in dist {
            if application_id.is_some_and(|wanted| wanted != app) {
                continue;
            }
            for grant in companies.get(company_id).into_iter().flatten() {
                flat.extend(grant.permissions.iter().cloned());
            }
        }
        Some(flat)
    }
}

impl Serialize for PermissionView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unrestricted => serializer.serialize_none(),
            Self::Restricted(dist) => serializer.serialize_some(dist),
        }
    }
}

impl<'de> Deserialize<'de> for PermissionView {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<Distribution>::deserialize(deserializer)? {
            Some(dist) => Self::Restricted(dist),
            None => Self::Unrestricted,
        })
    }
}
