//! Role inclusion graph traversal.
//!
//! Edges point from a parent role to the child role it includes. Traversal
//! fetches one frontier at a time through [`Store::list_child_edges`], so a
//! walk costs one round trip per level rather than one per edge.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::store::Store;

/// Child sets keyed by parent role id, as discovered during a traversal.
pub type Adjacency = HashMap<String, BTreeSet<String>>;

/// Result of expanding a set of seed roles.
#[derive(Debug, Default, Clone)]
pub struct Closure {
    /// Every role reachable from any seed, seeds included.
    pub reachable: BTreeSet<String>,
    pub adjacency: Adjacency,
}

impl Closure {
    /// Roles reachable from `seed` alone, `seed` included.
    ///
    /// Walks the in-memory adjacency only. A seed that was not part of the
    /// traversal yields just itself.
    #[must_use]
    pub fn for_seed(&self, seed: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![seed.to_string()];

        while let Some(role) = stack.pop() {
            if !seen.insert(role.clone()) {
                continue;
            }
            if let Some(children) = self.adjacency.get(&role) {
                stack.extend(children.iter().filter(|c| !seen.contains(*c)).cloned());
            }
        }

        seen
    }
}

/// Breadth-first expansion of `seeds` across the inclusion graph.
pub fn resolve<I>(store: &dyn Store, seeds: I) -> Result<Closure>
where
    I: IntoIterator<Item = String>,
{
    let mut closure = Closure::default();
    let mut frontier: Vec<String> = Vec::new();

    for seed in seeds {
        if closure.reachable.insert(seed.clone()) {
            frontier.push(seed);
        }
    }

    while !frontier.is_empty() {
        let edges = store.list_child_edges(&frontier)?;
        frontier = Vec::new();

        for (parent, child) in edges {
            closure
                .adjacency
                .entry(parent)
                .or_default()
                .insert(child.clone());
            if closure.reachable.insert(child.clone()) {
                frontier.push(child);
            }
        }
    }

    Ok(closure)
}

/// Returns true when `target` can be reached from `start` by following edges.
///
/// `ignore` names one edge to leave out of the walk, used when an existing
/// edge is being rewritten and its old endpoints must not count.
pub fn is_reachable(
    store: &dyn Store,
    start: &str,
    target: &str,
    ignore: Option<(&str, &str)>,
) -> Result<bool> {
    if start == target {
        return Ok(true);
    }

    let mut visited: HashSet<String> = HashSet::from([start.to_string()]);
    let mut frontier = vec![start.to_string()];

    while !frontier.is_empty() {
        let edges = store.list_child_edges(&frontier)?;
        frontier = Vec::new();

        for (parent, child) in edges {
            if ignore.is_some_and(|(p, c)| p == parent && c == child) {
                continue;
            }
            if child == target {
                return Ok(true);
            }
            if visited.insert(child.clone()) {
                frontier.push(child);
            }
        }
    }

    Ok(false)
}

/// A proposed `parent -> child` edge, optionally replacing an existing one.
#[derive(Debug, Clone, Copy)]
pub struct EdgeCandidate<'a> {
    pub parent: &'a str,
    pub child: &'a str,
    /// The edge being edited: its id and its current endpoints.
    pub replacing: Option<(&'a str, &'a str, &'a str)>,
}

/// Checks a proposed edge against the graph in this order: both roles exist,
/// no self-inclusion, no cycle, no duplicate.
pub fn validate_edge(store: &dyn Store, edge: EdgeCandidate<'_>) -> Result<()> {
    if store.get_role(edge.parent)?.is_none() {
        return Err(Error::not_found("parent role"));
    }
    if store.get_role(edge.child)?.is_none() {
        return Err(Error::not_found("child role"));
    }

    if edge.parent == edge.child {
        tracing::debug!(role = edge.parent, "rejected self inclusion");
        return Err(Error::SelfInclusion);
    }

    let ignore = edge.replacing.map(|(_, p, c)| (p, c));
    if is_reachable(store, edge.child, edge.parent, ignore)? {
        tracing::debug!(
            parent = edge.parent,
            child = edge.child,
            "rejected inclusion that closes a cycle"
        );
        return Err(Error::CycleViolation);
    }

    let exclude_id = edge.replacing.map(|(id, _, _)| id);
    if store
        .find_role_include(edge.parent, edge.child, exclude_id)?
        .is_some()
    {
        return Err(Error::DuplicateEdge);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::testing::{Fixture, ids, set};

    #[test]
    fn test_chain_closures() {
        let fx = Fixture::new();
        fx.role("a", "auth_app");
        fx.role("b", "auth_app");
        fx.role("c", "auth_app");
        fx.include("a", "b");
        fx.include("b", "c");

        let closure = resolve(fx.store(), ids(&["a"])).unwrap();
        assert_eq!(closure.reachable, set(&["a", "b", "c"]));

        assert_eq!(closure.for_seed("a"), set(&["a", "b", "c"]));
        assert_eq!(closure.for_seed("b"), set(&["b", "c"]));
        assert_eq!(closure.for_seed("c"), set(&["c"]));
    }

    #[test]
    fn test_overlapping_seeds_get_distinct_closures() {
        let fx = Fixture::new();
        for r in ["a", "b", "shared", "only_b"] {
            fx.role(r, "auth_app");
        }
        fx.include("a", "shared");
        fx.include("b", "shared");
        fx.include("b", "only_b");

        let closure = resolve(fx.store(), ids(&["a", "b"])).unwrap();
        assert_eq!(closure.reachable.len(), 4);
        assert_eq!(closure.for_seed("a"), set(&["a", "shared"]));
        assert_eq!(
            closure.for_seed("b"),
            set(&["b", "only_b", "shared"])
        );
    }

    #[test]
    fn test_diamond_visits_each_role_once() {
        let fx = Fixture::new();
        for r in ["top", "left", "right", "bottom"] {
            fx.role(r, "auth_app");
        }
        fx.include("top", "left");
        fx.include("top", "right");
        fx.include("left", "bottom");
        fx.include("right", "bottom");

        let closure = resolve(fx.store(), ids(&["top"])).unwrap();
        assert_eq!(closure.reachable.len(), 4);
        assert_eq!(closure.adjacency["top"].len(), 2);
    }

    #[test]
    fn test_self_inclusion_rejected() {
        let fx = Fixture::new();
        fx.role("a", "auth_app");

        let err = validate_edge(
            fx.store(),
            EdgeCandidate {
                parent: "a",
                child: "a",
                replacing: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::SelfInclusion));
    }

    #[test]
    fn test_missing_role_is_not_found() {
        let fx = Fixture::new();
        fx.role("a", "auth_app");

        let err = validate_edge(
            fx.store(),
            EdgeCandidate {
                parent: "a",
                child: "ghost",
                replacing: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_closing_a_cycle_rejected() {
        let fx = Fixture::new();
        for r in ["a", "b", "c"] {
            fx.role(r, "auth_app");
        }
        fx.include("a", "b");
        fx.include("b", "c");

        let err = validate_edge(
            fx.store(),
            EdgeCandidate {
                parent: "c",
                child: "a",
                replacing: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::CycleViolation));
    }

    #[test]
    fn test_duplicate_rejected_except_for_edited_edge() {
        let fx = Fixture::new();
        for r in ["a", "b", "c"] {
            fx.role(r, "auth_app");
        }
        let ab = fx.include("a", "b");
        fx.include("a", "c");

        let err = validate_edge(
            fx.store(),
            EdgeCandidate {
                parent: "a",
                child: "b",
                replacing: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateEdge));

        // Re-saving an edge with unchanged endpoints is fine.
        validate_edge(
            fx.store(),
            EdgeCandidate {
                parent: "a",
                child: "b",
                replacing: Some((ab.as_str(), "a", "b")),
            },
        )
        .unwrap();

        // Moving a->b onto a->c collides with the other edge.
        let err = validate_edge(
            fx.store(),
            EdgeCandidate {
                parent: "a",
                child: "c",
                replacing: Some((ab.as_str(), "a", "b")),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateEdge));
    }

    #[test]
    fn test_reversing_an_edge_ignores_its_old_direction() {
        let fx = Fixture::new();
        fx.role("a", "auth_app");
        fx.role("b", "auth_app");
        let ab = fx.include("a", "b");

        validate_edge(
            fx.store(),
            EdgeCandidate {
                parent: "b",
                child: "a",
                replacing: Some((ab.as_str(), "a", "b")),
            },
        )
        .unwrap();
    }
}
