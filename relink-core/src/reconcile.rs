//! Link reconciliation — the write path of the service.
//!
//! Given a source product, a candidate SKU list and a link type, classify
//! every candidate into exactly one bucket (accepted / rejected / duplicate /
//! already-linked) and hand the accepted batch to the link store, which
//! replaces all existing links of that type for the source.
//!
//! Classification rules:
//! - A SKU appearing more than once in the raw input is excluded from
//!   individual evaluation entirely (all occurrences) and reported once in
//!   the duplicate bucket.
//! - Already-linked SKUs are skipped before any product lookup happens.
//! - Accepted positions are `position + i`, with `i` the candidate's index
//!   in the strictly-unique-values sequence. Skipped entries keep their
//!   index slot; positions are never renumbered.
//! - Zero accepted candidates means no persistence call and an unsuccessful
//!   outcome, even when the buckets themselves were computed fine.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::{LinkStore, ProductLookup};
use crate::error::RelinkError;
use crate::models::{LinkType, Product, ProductLink};

pub const MSG_LINKS_UPDATED: &str = "Product links updated successfully.";
pub const MSG_NO_VALID_LINKS: &str = "No valid product links to add.";

const REASON_NOT_FOUND: &str = "Product does not exist";
const REASON_DISABLED: &str = "Product is disabled";

/// An accepted candidate, reported back with the linked product's name and
/// the position the new link was stored under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedLink {
    pub sku: String,
    pub name: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedSku {
    pub sku: String,
    pub reason: String,
}

/// Result of reconciling one link type for one source product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeOutcome {
    pub link_type: LinkType,
    pub success: bool,
    pub message: String,
    pub successful: Vec<AcceptedLink>,
    pub rejected: Vec<RejectedSku>,
    pub duplicate: Vec<String>,
    pub already_linked: Vec<String>,
}

impl TypeOutcome {
    fn no_input(link_type: LinkType) -> Self {
        Self {
            link_type,
            success: false,
            message: format!("No product SKUs provided for {} links.", link_type),
            successful: Vec::new(),
            rejected: Vec::new(),
            duplicate: Vec::new(),
            already_linked: Vec::new(),
        }
    }
}

/// Result of reconciling all three link types in one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllOutcome {
    pub success: bool,
    pub message: String,
    pub similar: TypeOutcome,
    pub repair: TypeOutcome,
    pub functional: TypeOutcome,
}

/// Split candidates into the strictly-unique evaluation sequence and the
/// duplicate bucket. Both preserve first-occurrence order; a value with
/// multiplicity > 1 lands in the duplicate bucket once and is dropped from
/// the evaluation sequence wholesale.
pub fn split_candidates(candidates: &[String]) -> (Vec<String>, Vec<String>) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for sku in candidates {
        *counts.entry(sku.as_str()).or_default() += 1;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = Vec::new();
    for sku in candidates {
        if !seen.insert(sku.as_str()) {
            continue;
        }
        if counts[sku.as_str()] > 1 {
            duplicates.push(sku.clone());
        } else {
            unique.push(sku.clone());
        }
    }
    (unique, duplicates)
}

/// Resolve a source product and require it to be enabled.
pub async fn get_enabled_product(
    products: &dyn ProductLookup,
    sku: &str,
) -> Result<Product, RelinkError> {
    let product = products.get(sku).await?;
    if !product.is_enabled() {
        return Err(RelinkError::ProductDisabled(sku.to_string()));
    }
    Ok(product)
}

/// Reconcile one link type for one source product.
///
/// The source SKU is assumed validated by the caller. Target lookups that
/// fail with anything other than not-found propagate and abort the request.
pub async fn reconcile(
    products: &dyn ProductLookup,
    links: &dyn LinkStore,
    source_sku: &str,
    candidates: &[String],
    link_type: LinkType,
    position: i32,
) -> Result<TypeOutcome, RelinkError> {
    if candidates.is_empty() {
        return Ok(TypeOutcome::no_input(link_type));
    }

    let existing: HashSet<String> = links
        .linked_skus(source_sku, link_type)
        .await?
        .into_iter()
        .collect();

    let (unique, duplicate) = split_candidates(candidates);

    let mut batch: Vec<ProductLink> = Vec::new();
    let mut successful: Vec<AcceptedLink> = Vec::new();
    let mut rejected: Vec<RejectedSku> = Vec::new();
    let mut already_linked: Vec<String> = Vec::new();

    for (i, sku) in unique.iter().enumerate() {
        if existing.contains(sku) {
            already_linked.push(sku.clone());
            continue;
        }

        match products.get(sku).await {
            Ok(product) if !product.is_enabled() => {
                rejected.push(RejectedSku {
                    sku: sku.clone(),
                    reason: REASON_DISABLED.to_string(),
                });
            }
            Ok(product) => {
                let pos = position + i as i32;
                batch.push(ProductLink {
                    sku: source_sku.to_string(),
                    linked_sku: sku.clone(),
                    link_type,
                    position: pos,
                });
                successful.push(AcceptedLink {
                    sku: sku.clone(),
                    name: product.name,
                    position: pos,
                });
            }
            Err(RelinkError::ProductNotFound(_)) => {
                rejected.push(RejectedSku {
                    sku: sku.clone(),
                    reason: REASON_NOT_FOUND.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    if batch.is_empty() {
        tracing::debug!(
            source = source_sku,
            link_type = %link_type,
            rejected = rejected.len(),
            duplicate = duplicate.len(),
            already_linked = already_linked.len(),
            "no valid links to add"
        );
        return Ok(TypeOutcome {
            link_type,
            success: false,
            message: MSG_NO_VALID_LINKS.to_string(),
            successful: Vec::new(),
            rejected,
            duplicate,
            already_linked,
        });
    }

    links.replace_links(source_sku, &batch).await?;
    tracing::info!(
        source = source_sku,
        link_type = %link_type,
        accepted = batch.len(),
        "replaced product links"
    );

    Ok(TypeOutcome {
        link_type,
        success: true,
        message: MSG_LINKS_UPDATED.to_string(),
        successful,
        rejected,
        duplicate,
        already_linked,
    })
}

/// Reconcile all three link types for one source product in a single
/// request. The three runs are independent: one type failing to accept
/// anything never blocks the others, and overall success is the OR of the
/// per-type flags. The per-type replace calls are not covered by a shared
/// transaction.
pub async fn reconcile_all(
    products: &dyn ProductLookup,
    links: &dyn LinkStore,
    source_sku: &str,
    similar_skus: &[String],
    repair_skus: &[String],
    functional_skus: &[String],
    position: i32,
) -> Result<AllOutcome, RelinkError> {
    let similar = reconcile(
        products,
        links,
        source_sku,
        similar_skus,
        LinkType::Similar,
        position,
    )
    .await?;
    let repair = reconcile(
        products,
        links,
        source_sku,
        repair_skus,
        LinkType::Repair,
        position,
    )
    .await?;
    let functional = reconcile(
        products,
        links,
        source_sku,
        functional_skus,
        LinkType::Functional,
        position,
    )
    .await?;

    let success = similar.success || repair.success || functional.success;
    let message = if success {
        MSG_LINKS_UPDATED.to_string()
    } else {
        MSG_NO_VALID_LINKS.to_string()
    };

    Ok(AllOutcome {
        success,
        message,
        similar,
        repair,
        functional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::models::product::{status, visibility};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts lookups so tests can assert which candidates reached the
    /// repository.
    struct CountingLookup {
        catalog: Arc<MemoryCatalog>,
        calls: AtomicUsize,
    }

    impl CountingLookup {
        fn new(catalog: Arc<MemoryCatalog>) -> Self {
            Self {
                catalog,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProductLookup for CountingLookup {
        async fn get(&self, sku: &str) -> Result<Product, RelinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.catalog.get(sku).await
        }
    }

    /// Counts replace calls so tests can assert persistence short-circuits.
    struct CountingStore {
        catalog: Arc<MemoryCatalog>,
        replace_calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(catalog: Arc<MemoryCatalog>) -> Self {
            Self {
                catalog,
                replace_calls: AtomicUsize::new(0),
            }
        }

        fn replace_calls(&self) -> usize {
            self.replace_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LinkStore for CountingStore {
        async fn linked_skus(
            &self,
            sku: &str,
            link_type: LinkType,
        ) -> Result<Vec<String>, RelinkError> {
            self.catalog.linked_skus(sku, link_type).await
        }

        async fn linked_products(
            &self,
            sku: &str,
            link_type: LinkType,
        ) -> Result<Vec<Product>, RelinkError> {
            self.catalog.linked_products(sku, link_type).await
        }

        async fn replace_links(
            &self,
            sku: &str,
            links: &[ProductLink],
        ) -> Result<(), RelinkError> {
            self.replace_calls.fetch_add(1, Ordering::SeqCst);
            self.catalog.replace_links(sku, links).await
        }
    }

    /// Lookup that fails with a non-not-found error for every SKU.
    struct OfflineLookup;

    #[async_trait]
    impl ProductLookup for OfflineLookup {
        async fn get(&self, _sku: &str) -> Result<Product, RelinkError> {
            Err(RelinkError::Other("catalog offline".to_string()))
        }
    }

    fn skus(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn seeded() -> Arc<MemoryCatalog> {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.insert_enabled("A", "Source product");
        catalog.insert_enabled("B", "Product B");
        catalog.insert_enabled("C", "Product C");
        catalog.insert_enabled("D", "Product D");
        catalog.insert_product("OFF", "Disabled product", status::DISABLED, visibility::BOTH);
        catalog
    }

    #[test]
    fn test_split_candidates_wholesale_dedup() {
        let (unique, duplicates) = split_candidates(&skus(&["B", "X", "C", "X", "B", "D"]));
        // Repeated values are dropped from evaluation entirely, not kept-first.
        assert_eq!(unique, skus(&["C", "D"]));
        assert_eq!(duplicates, skus(&["B", "X"]));
    }

    #[test]
    fn test_split_candidates_all_unique() {
        let (unique, duplicates) = split_candidates(&skus(&["B", "C"]));
        assert_eq!(unique, skus(&["B", "C"]));
        assert!(duplicates.is_empty());
    }

    #[test]
    fn test_split_candidates_empty() {
        let (unique, duplicates) = split_candidates(&[]);
        assert!(unique.is_empty());
        assert!(duplicates.is_empty());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_failed_noop() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        let outcome = reconcile(&lookup, &store, "A", &[], LinkType::Similar, 0)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.successful.is_empty());
        assert!(outcome.rejected.is_empty());
        assert!(outcome.duplicate.is_empty());
        assert!(outcome.already_linked.is_empty());
        assert_eq!(outcome.message, "No product SKUs provided for similar links.");
        assert_eq!(lookup.calls(), 0);
        assert_eq!(store.replace_calls(), 0);
    }

    #[tokio::test]
    async fn test_accept_and_reject_coexist() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog.clone());

        let outcome = reconcile(
            &lookup,
            &store,
            "A",
            &skus(&["B", "GHOST"]),
            LinkType::Similar,
            0,
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.message, MSG_LINKS_UPDATED);
        assert_eq!(outcome.successful.len(), 1);
        assert_eq!(outcome.successful[0].sku, "B");
        assert_eq!(outcome.successful[0].name, "Product B");
        assert_eq!(outcome.successful[0].position, 0);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].sku, "GHOST");
        assert_eq!(outcome.rejected[0].reason, "Product does not exist");

        let stored = catalog.stored_links("A", LinkType::Similar);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].linked_sku, "B");
        assert_eq!(stored[0].position, 0);
    }

    #[tokio::test]
    async fn test_disabled_target_rejected() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        let outcome = reconcile(
            &lookup,
            &store,
            "A",
            &skus(&["OFF"]),
            LinkType::Repair,
            0,
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, "Product is disabled");
        assert_eq!(store.replace_calls(), 0);
    }

    #[tokio::test]
    async fn test_pure_duplicates_fail_without_any_calls() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        let outcome = reconcile(
            &lookup,
            &store,
            "A",
            &skus(&["B", "B"]),
            LinkType::Similar,
            0,
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.message, MSG_NO_VALID_LINKS);
        assert_eq!(outcome.duplicate, skus(&["B"]));
        assert!(outcome.successful.is_empty());
        assert!(outcome.rejected.is_empty());
        // Duplicates are classified without touching the repository or store.
        assert_eq!(lookup.calls(), 0);
        assert_eq!(store.replace_calls(), 0);
    }

    #[tokio::test]
    async fn test_already_linked_skips_lookup_and_persistence() {
        let catalog = seeded();
        catalog
            .replace_links(
                "A",
                &[ProductLink {
                    sku: "A".into(),
                    linked_sku: "B".into(),
                    link_type: LinkType::Similar,
                    position: 0,
                }],
            )
            .await
            .unwrap();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        let outcome = reconcile(
            &lookup,
            &store,
            "A",
            &skus(&["B"]),
            LinkType::Similar,
            5,
        )
        .await
        .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.already_linked, skus(&["B"]));
        assert!(outcome.successful.is_empty());
        assert_eq!(lookup.calls(), 0);
        assert_eq!(store.replace_calls(), 0);
    }

    #[tokio::test]
    async fn test_positions_count_unique_sequence_only() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        // X repeats, so the unique evaluation sequence is [B, C, D].
        let outcome = reconcile(
            &lookup,
            &store,
            "A",
            &skus(&["B", "X", "C", "X", "D"]),
            LinkType::Similar,
            10,
        )
        .await
        .unwrap();

        assert!(outcome.success);
        let positions: Vec<(String, i32)> = outcome
            .successful
            .iter()
            .map(|l| (l.sku.clone(), l.position))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("B".to_string(), 10),
                ("C".to_string(), 11),
                ("D".to_string(), 12)
            ]
        );
        assert_eq!(outcome.duplicate, skus(&["X"]));
    }

    #[tokio::test]
    async fn test_positions_not_renumbered_around_skips() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        // GHOST occupies index 1 of the unique sequence; C keeps index 2.
        let outcome = reconcile(
            &lookup,
            &store,
            "A",
            &skus(&["B", "GHOST", "C"]),
            LinkType::Similar,
            0,
        )
        .await
        .unwrap();

        let positions: Vec<i32> = outcome.successful.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_buckets_partition_the_input() {
        let catalog = seeded();
        catalog
            .replace_links(
                "A",
                &[ProductLink {
                    sku: "A".into(),
                    linked_sku: "C".into(),
                    link_type: LinkType::Similar,
                    position: 0,
                }],
            )
            .await
            .unwrap();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        let candidates = skus(&["B", "X", "C", "X", "GHOST", "OFF"]);
        let outcome = reconcile(&lookup, &store, "A", &candidates, LinkType::Similar, 0)
            .await
            .unwrap();

        let mut classified: Vec<String> = Vec::new();
        classified.extend(outcome.successful.iter().map(|l| l.sku.clone()));
        classified.extend(outcome.rejected.iter().map(|r| r.sku.clone()));
        classified.extend(outcome.duplicate.iter().cloned());
        classified.extend(outcome.already_linked.iter().cloned());
        classified.sort();

        let mut expected: Vec<String> = candidates.clone();
        expected.sort();
        expected.dedup();

        // Every distinct input value lands in exactly one bucket.
        assert_eq!(classified, expected);
    }

    #[tokio::test]
    async fn test_repeat_call_is_idempotent() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);
        let candidates = skus(&["B", "C"]);

        let first = reconcile(&lookup, &store, "A", &candidates, LinkType::Similar, 0)
            .await
            .unwrap();
        assert!(first.success);
        assert_eq!(store.replace_calls(), 1);

        let second = reconcile(&lookup, &store, "A", &candidates, LinkType::Similar, 0)
            .await
            .unwrap();
        assert!(!second.success);
        assert_eq!(second.already_linked, candidates);
        assert!(second.successful.is_empty());
        // No second persistence call.
        assert_eq!(store.replace_calls(), 1);
    }

    #[tokio::test]
    async fn test_replace_drops_links_missing_from_batch() {
        let catalog = seeded();
        catalog
            .replace_links(
                "A",
                &[ProductLink {
                    sku: "A".into(),
                    linked_sku: "D".into(),
                    link_type: LinkType::Similar,
                    position: 0,
                }],
            )
            .await
            .unwrap();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog.clone());

        let outcome = reconcile(
            &lookup,
            &store,
            "A",
            &skus(&["B"]),
            LinkType::Similar,
            0,
        )
        .await
        .unwrap();

        assert!(outcome.success);
        let stored: Vec<String> = catalog
            .stored_links("A", LinkType::Similar)
            .into_iter()
            .map(|l| l.linked_sku)
            .collect();
        // D was not in the accepted batch, so the replace dropped it.
        assert_eq!(stored, vec!["B".to_string()]);
    }

    #[tokio::test]
    async fn test_upstream_lookup_failure_aborts() {
        let catalog = seeded();
        let store = CountingStore::new(catalog);

        let err = reconcile(
            &OfflineLookup,
            &store,
            "A",
            &skus(&["B"]),
            LinkType::Similar,
            0,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RelinkError::Other(_)));
        assert_eq!(store.replace_calls(), 0);
    }

    #[tokio::test]
    async fn test_get_enabled_product() {
        let catalog = seeded();

        let product = get_enabled_product(catalog.as_ref(), "A").await.unwrap();
        assert_eq!(product.sku, "A");

        let err = get_enabled_product(catalog.as_ref(), "OFF").await.unwrap_err();
        assert!(matches!(err, RelinkError::ProductDisabled(sku) if sku == "OFF"));

        let err = get_enabled_product(catalog.as_ref(), "GHOST")
            .await
            .unwrap_err();
        assert!(matches!(err, RelinkError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_all_types_overall_success_is_or() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        let outcome = reconcile_all(
            &lookup,
            &store,
            "A",
            &[],
            &skus(&["B", "C"]),
            &[],
            0,
        )
        .await
        .unwrap();

        // Repair succeeded, so the request succeeds despite the two
        // no-input failures.
        assert!(outcome.success);
        assert_eq!(outcome.message, MSG_LINKS_UPDATED);
        assert!(!outcome.similar.success);
        assert_eq!(
            outcome.similar.message,
            "No product SKUs provided for similar links."
        );
        assert!(outcome.repair.success);
        assert!(!outcome.functional.success);
        assert_eq!(
            outcome.functional.message,
            "No product SKUs provided for functional links."
        );
    }

    #[tokio::test]
    async fn test_all_types_persist_independently() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog.clone());

        let outcome = reconcile_all(
            &lookup,
            &store,
            "A",
            &skus(&["B"]),
            &skus(&["GHOST"]),
            &skus(&["C", "D"]),
            0,
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert!(outcome.similar.success);
        assert!(!outcome.repair.success);
        assert!(outcome.functional.success);
        // One replace per succeeding type, none for the failing one.
        assert_eq!(store.replace_calls(), 2);
        assert_eq!(
            catalog
                .stored_links("A", LinkType::Similar)
                .into_iter()
                .map(|l| l.linked_sku)
                .collect::<Vec<_>>(),
            vec!["B".to_string()]
        );
        assert!(catalog.stored_links("A", LinkType::Repair).is_empty());
        assert_eq!(catalog.stored_links("A", LinkType::Functional).len(), 2);
    }

    #[tokio::test]
    async fn test_all_types_with_all_empty_inputs_fails() {
        let catalog = seeded();
        let lookup = CountingLookup::new(catalog.clone());
        let store = CountingStore::new(catalog);

        let outcome = reconcile_all(&lookup, &store, "A", &[], &[], &[], 0)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.message, MSG_NO_VALID_LINKS);
        assert_eq!(store.replace_calls(), 0);
    }
}
