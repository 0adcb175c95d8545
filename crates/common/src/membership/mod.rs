//! Subclass membership filters
//!
//! "Belongs to subclass X" is reflexive-transitive: an entity tagged with a
//! subclass belongs to that subclass and every ancestor of it. Datasets are
//! tagged both directly and through the subclass of each VOC they measure;
//! both kinds of tag count the same.
//!
//! Each filter loads the subclass forest once, scans its primary entity and
//! resolves ancestors in memory. Ancestor sets are memoized per call only.

use crate::db::models::{Dataset, Voc, VocSubclass};
use crate::errors::{AppError, Result};
use crate::hierarchy::{AncestorResolver, SubclassForest, SubclassId};
use crate::metrics;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Instant;

/// Read access to the catalog needed by the membership filters
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Subclass by its unique name
    async fn subclass_by_name(&self, name: &str) -> Result<Option<VocSubclass>>;

    /// Every subclass row
    async fn subclasses(&self) -> Result<Vec<VocSubclass>>;

    /// VOC by primary key
    async fn voc_by_id(&self, id: i32) -> Result<Option<Voc>>;

    /// Every VOC, ordered by id
    async fn vocs(&self) -> Result<Vec<Voc>>;

    /// Every dataset, ordered by id
    async fn datasets(&self) -> Result<Vec<Dataset>>;

    /// `(dataset_id, voc_subclass_id)` for every direct dataset tag
    async fn dataset_subclass_tags(&self) -> Result<Vec<(i32, SubclassId)>>;

    /// `(dataset_id, voc_subclass_id)` for every VOC linked to a dataset;
    /// `None` when the VOC has no subclass
    async fn dataset_voc_subclass_tags(&self) -> Result<Vec<(i32, Option<SubclassId>)>>;
}

/// Membership queries over a catalog store
pub struct MembershipFilters<'s, S: CatalogStore + ?Sized> {
    store: &'s S,
    max_depth: usize,
}

/// Subclass rows loaded for one filter call
struct Taxonomy {
    forest: SubclassForest,
    records: HashMap<SubclassId, VocSubclass>,
}

impl<'s, S: CatalogStore + ?Sized> MembershipFilters<'s, S> {
    /// Create filters that bound hierarchy walks at `max_depth` parent links
    pub fn new(store: &'s S, max_depth: usize) -> Self {
        Self { store, max_depth }
    }

    async fn load_taxonomy(&self) -> Result<Taxonomy> {
        let rows = self.store.subclasses().await?;
        let forest = SubclassForest::from_links(rows.iter().map(|s| (s.id, s.parent_id)));
        let records = rows.into_iter().map(|s| (s.id, s)).collect();

        Ok(Taxonomy { forest, records })
    }

    async fn subclass_id_by_name(&self, name: &str) -> Result<SubclassId> {
        self.store
            .subclass_by_name(name)
            .await?
            .map(|s| s.id)
            .ok_or_else(|| AppError::SubclassNotFound { name: name.to_string() })
    }

    /// Ancestor set of a subclass, including the subclass itself
    pub async fn resolve_ancestors(&self, subclass_id: SubclassId) -> Result<BTreeSet<SubclassId>> {
        let taxonomy = self.load_taxonomy().await?;

        if !taxonomy.forest.contains(subclass_id) {
            return Err(AppError::not_found("VOC subclass", subclass_id));
        }

        let resolver = AncestorResolver::new(&taxonomy.forest, self.max_depth);
        Ok(resolver.ancestry(subclass_id)?.into_iter().collect())
    }

    /// Datasets tagged, directly or through a measured VOC, with the named
    /// subclass or any of its descendants
    pub async fn datasets_matching_subclass(&self, subclass_name: &str) -> Result<Vec<Dataset>> {
        let start = Instant::now();
        let target = self.subclass_id_by_name(subclass_name).await?;
        let taxonomy = self.load_taxonomy().await?;
        let mut memo = AncestorMemo::new(AncestorResolver::new(&taxonomy.forest, self.max_depth));

        let mut tags: HashMap<i32, Vec<SubclassId>> = HashMap::new();
        for (dataset_id, subclass_id) in self.store.dataset_subclass_tags().await? {
            tags.entry(dataset_id).or_default().push(subclass_id);
        }
        for (dataset_id, subclass_id) in self.store.dataset_voc_subclass_tags().await? {
            if let Some(subclass_id) = subclass_id {
                tags.entry(dataset_id).or_default().push(subclass_id);
            }
        }

        let mut matching = Vec::new();
        for dataset in self.store.datasets().await? {
            let Some(subclass_ids) = tags.get(&dataset.id) else {
                continue;
            };

            let mut contained = HashSet::new();
            for &subclass_id in subclass_ids {
                contained.extend(memo.ancestors("dataset", dataset.id, subclass_id)?.iter().copied());
            }

            if contained.contains(&target) {
                matching.push(dataset);
            }
        }

        metrics::record_filter("datasets_by_subclass", start.elapsed().as_secs_f64(), matching.len());

        if matching.is_empty() {
            return Err(AppError::NoMatches {
                message: format!("No datasets found that refer to VOC subclass '{}'", subclass_name),
            });
        }

        Ok(matching)
    }

    /// VOCs whose subclass is the named subclass or one of its descendants
    pub async fn vocs_matching_subclass(&self, subclass_name: &str) -> Result<Vec<Voc>> {
        let start = Instant::now();
        let target = self.subclass_id_by_name(subclass_name).await?;
        let taxonomy = self.load_taxonomy().await?;
        let mut memo = AncestorMemo::new(AncestorResolver::new(&taxonomy.forest, self.max_depth));

        let mut matching = Vec::new();
        for voc in self.store.vocs().await? {
            let Some(subclass_id) = voc.voc_subclass_id else {
                continue;
            };

            if memo.ancestors("VOC", voc.id, subclass_id)?.contains(&target) {
                matching.push(voc);
            }
        }

        metrics::record_filter("vocs_by_subclass", start.elapsed().as_secs_f64(), matching.len());

        if matching.is_empty() {
            return Err(AppError::NoMatches {
                message: format!("No VOCs available for VOC subclass '{}'", subclass_name),
            });
        }

        Ok(matching)
    }

    /// The subclass of a VOC followed by all of its ancestors, nearest first
    pub async fn subclasses_for_voc(&self, voc_id: i32) -> Result<Vec<VocSubclass>> {
        let start = Instant::now();
        let voc = self
            .store
            .voc_by_id(voc_id)
            .await?
            .ok_or(AppError::VocNotFound { id: voc_id })?;

        let no_matches = || AppError::NoMatches {
            message: format!("No VOC subclasses found for VOC {}", voc_id),
        };

        let Some(subclass_id) = voc.voc_subclass_id else {
            metrics::record_filter("subclasses_by_voc", start.elapsed().as_secs_f64(), 0);
            return Err(no_matches());
        };

        let mut taxonomy = self.load_taxonomy().await?;
        if !taxonomy.forest.contains(subclass_id) {
            return Err(AppError::DanglingReference {
                entity: "VOC".to_string(),
                id: voc.id,
                missing: subclass_id,
            });
        }

        let chain = AncestorResolver::new(&taxonomy.forest, self.max_depth).ancestry(subclass_id)?;
        let subclasses: Vec<VocSubclass> = chain
            .into_iter()
            .filter_map(|id| taxonomy.records.remove(&id))
            .collect();

        metrics::record_filter("subclasses_by_voc", start.elapsed().as_secs_f64(), subclasses.len());

        if subclasses.is_empty() {
            return Err(no_matches());
        }

        Ok(subclasses)
    }
}

/// Ancestor sets cached per subclass for the duration of one filter call
struct AncestorMemo<'a> {
    resolver: AncestorResolver<'a>,
    cache: HashMap<SubclassId, HashSet<SubclassId>>,
}

impl<'a> AncestorMemo<'a> {
    fn new(resolver: AncestorResolver<'a>) -> Self {
        Self { resolver, cache: HashMap::new() }
    }

    /// Ancestors of a subclass tagged on `entity` `owner_id`.
    ///
    /// A tag naming a subclass that does not exist is an integrity violation
    /// of the owning row, reported as such.
    fn ancestors(&mut self, entity: &str, owner_id: i32, subclass_id: SubclassId) -> Result<&HashSet<SubclassId>> {
        if !self.cache.contains_key(&subclass_id) {
            let set = match self.resolver.ancestors(subclass_id) {
                Err(AppError::DanglingReference { missing, .. }) if missing == subclass_id => {
                    return Err(AppError::DanglingReference {
                        entity: entity.to_string(),
                        id: owner_id,
                        missing,
                    });
                }
                other => other?,
            };
            self.cache.insert(subclass_id, set);
        }

        Ok(&self.cache[&subclass_id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory catalog used in place of the database
    #[derive(Default)]
    struct FixtureStore {
        subclasses: Vec<VocSubclass>,
        vocs: Vec<Voc>,
        datasets: Vec<Dataset>,
        dataset_subclasses: Vec<(i32, SubclassId)>,
        dataset_vocs: Vec<(i32, i32)>,
    }

    impl FixtureStore {
        fn subclass(mut self, id: i32, name: &str, parent_id: Option<i32>) -> Self {
            self.subclasses.push(VocSubclass { id, name: name.to_string(), parent_id });
            self
        }

        fn voc(mut self, id: i32, name: &str, voc_subclass_id: Option<i32>) -> Self {
            self.vocs.push(Voc { id, name: name.to_string(), voc_subclass_id });
            self
        }

        fn dataset(mut self, id: i32) -> Self {
            self.datasets.push(Dataset {
                id,
                site_id: None,
                sampling_period_begin: None,
                sampling_period_end: None,
                time_resolution_unit: None,
                time_resolution_interval: None,
                data_type: None,
                link_to_dataset: None,
            });
            self
        }

        fn tag_dataset(mut self, dataset_id: i32, subclass_id: i32) -> Self {
            self.dataset_subclasses.push((dataset_id, subclass_id));
            self
        }

        fn measure(mut self, dataset_id: i32, voc_id: i32) -> Self {
            self.dataset_vocs.push((dataset_id, voc_id));
            self
        }
    }

    #[async_trait]
    impl CatalogStore for FixtureStore {
        async fn subclass_by_name(&self, name: &str) -> Result<Option<VocSubclass>> {
            Ok(self.subclasses.iter().find(|s| s.name == name).cloned())
        }

        async fn subclasses(&self) -> Result<Vec<VocSubclass>> {
            Ok(self.subclasses.clone())
        }

        async fn voc_by_id(&self, id: i32) -> Result<Option<Voc>> {
            Ok(self.vocs.iter().find(|v| v.id == id).cloned())
        }

        async fn vocs(&self) -> Result<Vec<Voc>> {
            Ok(self.vocs.clone())
        }

        async fn datasets(&self) -> Result<Vec<Dataset>> {
            Ok(self.datasets.clone())
        }

        async fn dataset_subclass_tags(&self) -> Result<Vec<(i32, SubclassId)>> {
            Ok(self.dataset_subclasses.clone())
        }

        async fn dataset_voc_subclass_tags(&self) -> Result<Vec<(i32, Option<SubclassId>)>> {
            Ok(self
                .dataset_vocs
                .iter()
                .filter_map(|&(dataset_id, voc_id)| {
                    let voc = self.vocs.iter().find(|v| v.id == voc_id)?;
                    Some((dataset_id, voc.voc_subclass_id))
                })
                .collect())
        }
    }

    /// Root(1) <- Mid(2) <- Leaf(3), plus an unrelated Other(4)
    fn scenario() -> FixtureStore {
        FixtureStore::default()
            .subclass(1, "Root", None)
            .subclass(2, "Mid", Some(1))
            .subclass(3, "Leaf", Some(2))
            .subclass(4, "Other", None)
            .voc(1, "V1", Some(3))
            .dataset(1)
            .measure(1, 1)
    }

    fn ids<T>(items: &[T], id: impl Fn(&T) -> i32) -> Vec<i32> {
        items.iter().map(id).collect()
    }

    #[tokio::test]
    async fn test_dataset_found_through_voc_for_every_ancestor() {
        let store = scenario();
        let filters = MembershipFilters::new(&store, 64);

        for name in ["Root", "Mid", "Leaf"] {
            let datasets = filters.datasets_matching_subclass(name).await.unwrap();
            assert_eq!(ids(&datasets, |d| d.id), vec![1], "subclass {}", name);
        }
    }

    #[tokio::test]
    async fn test_unlinked_subclass_has_no_matches() {
        let store = scenario();
        let filters = MembershipFilters::new(&store, 64);

        let err = filters.datasets_matching_subclass("Other").await.unwrap_err();
        assert!(matches!(err, AppError::NoMatches { .. }));
    }

    #[tokio::test]
    async fn test_unknown_subclass_name() {
        let store = scenario();
        let filters = MembershipFilters::new(&store, 64);

        let err = filters.datasets_matching_subclass("Nope").await.unwrap_err();
        assert!(matches!(err, AppError::SubclassNotFound { ref name } if name == "Nope"));

        let err = filters.vocs_matching_subclass("Nope").await.unwrap_err();
        assert!(matches!(err, AppError::SubclassNotFound { .. }));
    }

    #[tokio::test]
    async fn test_direct_and_indirect_tags_both_match() {
        // D1 tagged with Mid directly; D2 only measures a VOC tagged with Leaf
        let store = FixtureStore::default()
            .subclass(1, "Root", None)
            .subclass(2, "Mid", Some(1))
            .subclass(3, "Leaf", Some(2))
            .voc(7, "Toluene", Some(3))
            .dataset(1)
            .dataset(2)
            .dataset(3)
            .tag_dataset(1, 2)
            .measure(2, 7);
        let filters = MembershipFilters::new(&store, 64);

        let datasets = filters.datasets_matching_subclass("Mid").await.unwrap();
        assert_eq!(ids(&datasets, |d| d.id), vec![1, 2]);

        let datasets = filters.datasets_matching_subclass("Leaf").await.unwrap();
        assert_eq!(ids(&datasets, |d| d.id), vec![2]);
    }

    #[tokio::test]
    async fn test_dataset_listed_once_when_matched_by_several_paths() {
        let store = scenario().tag_dataset(1, 2).tag_dataset(1, 3);
        let filters = MembershipFilters::new(&store, 64);

        let datasets = filters.datasets_matching_subclass("Root").await.unwrap();
        assert_eq!(ids(&datasets, |d| d.id), vec![1]);
    }

    #[tokio::test]
    async fn test_vocs_without_subclass_are_skipped() {
        let store = scenario().voc(2, "Unclassified", None).voc(3, "Benzene", Some(2));
        let filters = MembershipFilters::new(&store, 64);

        let vocs = filters.vocs_matching_subclass("Root").await.unwrap();
        assert_eq!(ids(&vocs, |v| v.id), vec![1, 3]);

        let vocs = filters.vocs_matching_subclass("Leaf").await.unwrap();
        assert_eq!(ids(&vocs, |v| v.id), vec![1]);
    }

    #[tokio::test]
    async fn test_vocs_empty_result() {
        let store = scenario();
        let filters = MembershipFilters::new(&store, 64);

        let err = filters.vocs_matching_subclass("Other").await.unwrap_err();
        assert!(matches!(err, AppError::NoMatches { .. }));
    }

    #[tokio::test]
    async fn test_subclasses_for_voc_nearest_first() {
        let store = scenario();
        let filters = MembershipFilters::new(&store, 64);

        let subclasses = filters.subclasses_for_voc(1).await.unwrap();
        let names: Vec<&str> = subclasses.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Leaf", "Mid", "Root"]);
    }

    #[tokio::test]
    async fn test_unknown_voc_differs_from_voc_without_subclass() {
        let store = scenario().voc(2, "Unclassified", None);
        let filters = MembershipFilters::new(&store, 64);

        let err = filters.subclasses_for_voc(99).await.unwrap_err();
        assert!(matches!(err, AppError::VocNotFound { id: 99 }));

        let err = filters.subclasses_for_voc(2).await.unwrap_err();
        assert!(matches!(err, AppError::NoMatches { .. }));
    }

    #[tokio::test]
    async fn test_resolve_ancestors() {
        let store = scenario();
        let filters = MembershipFilters::new(&store, 64);

        let ancestors = filters.resolve_ancestors(3).await.unwrap();
        assert_eq!(ancestors, BTreeSet::from([1, 2, 3]));

        let err = filters.resolve_ancestors(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cycle_surfaces_as_error() {
        let store = FixtureStore::default()
            .subclass(1, "A", Some(2))
            .subclass(2, "B", Some(1))
            .voc(1, "V", Some(1));
        let filters = MembershipFilters::new(&store, 64);

        let err = filters.vocs_matching_subclass("A").await.unwrap_err();
        assert!(matches!(err, AppError::CyclicHierarchy { .. }));

        let err = filters.resolve_ancestors(2).await.unwrap_err();
        assert!(matches!(err, AppError::CyclicHierarchy { .. }));
    }

    #[tokio::test]
    async fn test_dangling_tag_reports_owner() {
        let store = scenario().tag_dataset(1, 77);
        let filters = MembershipFilters::new(&store, 64);

        let err = filters.datasets_matching_subclass("Root").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::DanglingReference { ref entity, id: 1, missing: 77 } if entity == "dataset"
        ));
    }

    #[tokio::test]
    async fn test_depth_bound_applies_to_filters() {
        let store = scenario();
        let filters = MembershipFilters::new(&store, 1);

        let err = filters.vocs_matching_subclass("Root").await.unwrap_err();
        assert!(matches!(err, AppError::HierarchyTooDeep { id: 3, max_depth: 1 }));
    }
}
