//! VOC subclass hierarchy
//!
//! Subclasses form a forest through nullable `parent_id` links. The forest is
//! held as a flat arena keyed by subclass id, so walking towards the root is a
//! chain of map lookups and never dereferences live object links.
//!
//! The store does not enforce acyclicity, so every walk carries a visited set
//! and a depth bound and fails instead of looping on malformed data.

use crate::errors::{AppError, Result};
use std::collections::{HashMap, HashSet};

/// Primary key of a VOC subclass row
pub type SubclassId = i32;

/// Flat arena of subclass nodes: id -> parent id
#[derive(Debug, Clone)]
pub struct SubclassForest {
    parents: HashMap<SubclassId, Option<SubclassId>>,
}

impl SubclassForest {
    /// Build a forest from `(id, parent_id)` pairs
    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = (SubclassId, Option<SubclassId>)>,
    {
        Self {
            parents: links.into_iter().collect(),
        }
    }

    /// Whether the node exists
    pub fn contains(&self, id: SubclassId) -> bool {
        self.parents.contains_key(&id)
    }

    /// Direct parent of a node.
    ///
    /// `Ok(None)` marks a root; an unknown id is a dangling reference.
    pub fn parent_of(&self, id: SubclassId) -> Result<Option<SubclassId>> {
        self.parents
            .get(&id)
            .copied()
            .ok_or_else(|| AppError::DanglingReference {
                entity: "VOC subclass".to_string(),
                id,
                missing: id,
            })
    }
}

/// Resolves the reflexive-transitive ancestors of subclasses.
///
/// # Example
///
/// ```
/// use vocatlas_common::hierarchy::{AncestorResolver, SubclassForest};
///
/// let forest = SubclassForest::from_links([(1, None), (2, Some(1)), (3, Some(2))]);
/// let resolver = AncestorResolver::new(&forest, 64);
///
/// assert_eq!(resolver.ancestry(3).unwrap(), vec![3, 2, 1]);
/// assert!(resolver.ancestors(3).unwrap().contains(&1));
/// ```
pub struct AncestorResolver<'a> {
    forest: &'a SubclassForest,
    max_depth: usize,
}

impl<'a> AncestorResolver<'a> {
    /// Create a resolver that follows at most `max_depth` parent links
    pub fn new(forest: &'a SubclassForest, max_depth: usize) -> Self {
        Self { forest, max_depth }
    }

    /// Ancestor chain of a subclass, nearest first.
    ///
    /// Starts with `id` itself and ends with its root. Fails with
    /// `DanglingReference` if `id` or any parent is missing from the forest,
    /// `CyclicHierarchy` if a node repeats, and `HierarchyTooDeep` once more
    /// than `max_depth` parent links have been followed.
    pub fn ancestry(&self, id: SubclassId) -> Result<Vec<SubclassId>> {
        if !self.forest.contains(id) {
            return Err(AppError::DanglingReference {
                entity: "VOC subclass".to_string(),
                id,
                missing: id,
            });
        }

        let mut chain = vec![id];
        let mut visited = HashSet::from([id]);
        let mut current = id;

        while let Some(parent) = self.forest.parent_of(current)? {
            if !self.forest.contains(parent) {
                return Err(AppError::DanglingReference {
                    entity: "VOC subclass".to_string(),
                    id: current,
                    missing: parent,
                });
            }

            if !visited.insert(parent) {
                tracing::error!(subclass_id = id, repeated = parent, "Cycle in subclass hierarchy");
                return Err(AppError::CyclicHierarchy { id: parent });
            }

            if chain.len() > self.max_depth {
                return Err(AppError::HierarchyTooDeep {
                    id,
                    max_depth: self.max_depth,
                });
            }

            chain.push(parent);
            current = parent;
        }

        Ok(chain)
    }

    /// Ancestor set of a subclass, including the subclass itself
    pub fn ancestors(&self, id: SubclassId) -> Result<HashSet<SubclassId>> {
        Ok(self.ancestry(id)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_forest() -> SubclassForest {
        // root(1) <- child(2) <- grandchild(3) <- leaf(4), plus a second tree 10 <- 11
        SubclassForest::from_links([
            (1, None),
            (2, Some(1)),
            (3, Some(2)),
            (4, Some(3)),
            (10, None),
            (11, Some(10)),
        ])
    }

    #[test]
    fn test_reflexive() {
        let forest = chain_forest();
        let resolver = AncestorResolver::new(&forest, 64);

        for id in [1, 2, 3, 4, 10, 11] {
            assert!(resolver.ancestors(id).unwrap().contains(&id));
        }
    }

    #[test]
    fn test_root_is_its_own_only_ancestor() {
        let forest = chain_forest();
        let resolver = AncestorResolver::new(&forest, 64);

        assert_eq!(resolver.ancestry(1).unwrap(), vec![1]);
    }

    #[test]
    fn test_four_level_chain() {
        let forest = chain_forest();
        let resolver = AncestorResolver::new(&forest, 64);

        assert_eq!(resolver.ancestry(4).unwrap(), vec![4, 3, 2, 1]);
        assert_eq!(resolver.ancestors(4).unwrap(), HashSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn test_transitive() {
        let forest = chain_forest();
        let resolver = AncestorResolver::new(&forest, 64);

        for a in [1, 2, 3, 4, 10, 11] {
            let anc_a = resolver.ancestors(a).unwrap();
            for &b in &anc_a {
                for c in resolver.ancestors(b).unwrap() {
                    assert!(anc_a.contains(&c), "{} should be an ancestor of {}", c, a);
                }
            }
        }
    }

    #[test]
    fn test_separate_trees_do_not_mix() {
        let forest = chain_forest();
        let resolver = AncestorResolver::new(&forest, 64);

        assert!(!resolver.ancestors(11).unwrap().contains(&1));
        assert!(!resolver.ancestors(4).unwrap().contains(&10));
        assert!(resolver.ancestors(11).unwrap().contains(&10));
    }

    #[test]
    fn test_descendant_is_not_an_ancestor() {
        let forest = chain_forest();
        let resolver = AncestorResolver::new(&forest, 64);

        assert!(!resolver.ancestors(2).unwrap().contains(&4));
    }

    #[test]
    fn test_two_node_cycle_fails() {
        let forest = SubclassForest::from_links([(1, Some(2)), (2, Some(1))]);
        let resolver = AncestorResolver::new(&forest, 64);

        assert!(matches!(resolver.ancestry(1), Err(AppError::CyclicHierarchy { id: 1 })));
        assert!(matches!(resolver.ancestry(2), Err(AppError::CyclicHierarchy { id: 2 })));
    }

    #[test]
    fn test_self_parent_fails() {
        let forest = SubclassForest::from_links([(5, Some(5))]);
        let resolver = AncestorResolver::new(&forest, 64);

        assert!(matches!(resolver.ancestry(5), Err(AppError::CyclicHierarchy { id: 5 })));
    }

    #[test]
    fn test_cycle_above_start_fails() {
        // 1 hangs below a 2 <-> 3 loop
        let forest = SubclassForest::from_links([(1, Some(2)), (2, Some(3)), (3, Some(2))]);
        let resolver = AncestorResolver::new(&forest, 64);

        assert!(matches!(resolver.ancestry(1), Err(AppError::CyclicHierarchy { id: 2 })));
    }

    #[test]
    fn test_depth_bound() {
        let forest = chain_forest();

        let tight = AncestorResolver::new(&forest, 2);
        assert!(matches!(
            tight.ancestry(4),
            Err(AppError::HierarchyTooDeep { id: 4, max_depth: 2 })
        ));

        let exact = AncestorResolver::new(&forest, 3);
        assert_eq!(exact.ancestry(4).unwrap(), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_unknown_start_is_dangling() {
        let forest = chain_forest();
        let resolver = AncestorResolver::new(&forest, 64);

        assert!(matches!(
            resolver.ancestry(99),
            Err(AppError::DanglingReference { missing: 99, .. })
        ));
    }

    #[test]
    fn test_unknown_parent_is_dangling() {
        let forest = SubclassForest::from_links([(1, Some(42))]);
        let resolver = AncestorResolver::new(&forest, 64);

        assert!(matches!(
            resolver.ancestry(1),
            Err(AppError::DanglingReference { id: 1, missing: 42, .. })
        ));
    }
}
