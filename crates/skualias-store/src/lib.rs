//!
//! Storage seam and apply phase for the SKU alias admin.
//!
//! Defines:
//! - the store traits the core consumes (`ProductStore`, `SynonymStore`),
//! - the paged listing driver (`fetch_all`),
//! - the TTL listing cache and the `Catalog` facade that owns it,
//! - the sequential batch apply loops (`apply_additions`, `apply_removals`,
//!   `add_alternatives`).
//!
//! Concrete remote storage lives behind the traits; [`MemoryStore`] is the
//! in-process reference implementation of the store semantics.
//!
//! All calls are synchronous, blocking round trips. Batches run one call at
//! a time: a per-code failure is recorded in the report and the batch
//! continues, so failure attribution stays unambiguous.

use skualias_model::{BatchReport, Product, SynonymRow};
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

pub mod memory;

pub use memory::MemoryStore;

/// Listing page size used by the collaborator's range queries.
pub const PAGE_SIZE: usize = 1000;

/// How long a cached listing stays valid.
pub const LISTING_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown product `{0}`")]
    UnknownProduct(String),
    /// The code is already bound somewhere; alias codes are globally unique.
    #[error("`{0}` is already bound to a product")]
    Conflict(String),
    /// The mutation matched no row (the remote call returned no data).
    #[error("no row affected for `{0}`")]
    NoRow(String),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Product listing and per-product alias mutations.
///
/// `fetch_page` is the raw paged query; consumers normally go through
/// [`fetch_all`] or a [`Catalog`] and see a complete, name-sorted result
/// set. Each mutation is one independent round trip for one code.
pub trait ProductStore {
    fn fetch_page(
        &self,
        filter: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError>;

    fn add_alias(&mut self, product_id: &str, code: &str) -> Result<(), StoreError>;

    fn remove_alias(&mut self, product_id: &str, code: &str) -> Result<(), StoreError>;
}

/// The name-keyed synonym table variant: `alternative_code` is a global
/// unique key, `principal_code` groups rows.
pub trait SynonymStore {
    /// Point lookup by alternative code.
    fn lookup(&self, alternative_code: &str) -> Result<Option<SynonymRow>, StoreError>;

    fn rows_for_principal(&self, principal_code: &str) -> Result<Vec<SynonymRow>, StoreError>;

    fn insert(&mut self, row: SynonymRow) -> Result<(), StoreError>;
}

/// Fetches the complete listing by walking fixed-size pages until a short
/// page, the way the remote collaborator expects to be drained.
pub fn fetch_all<S: ProductStore + ?Sized>(
    store: &S,
    filter: Option<&str>,
) -> Result<Vec<Product>, StoreError> {
    fetch_all_paged(store, filter, PAGE_SIZE)
}

pub fn fetch_all_paged<S: ProductStore + ?Sized>(
    store: &S,
    filter: Option<&str>,
    page_size: usize,
) -> Result<Vec<Product>, StoreError> {
    let mut rows = Vec::new();
    let mut offset = 0;
    loop {
        let page = store.fetch_page(filter, offset, page_size)?;
        let short = page.len() < page_size;
        rows.extend(page);
        if short {
            return Ok(rows);
        }
        offset += page_size;
    }
}

struct CacheEntry {
    fetched_at: Instant,
    rows: Vec<Product>,
}

/// Time-bounded cache of listing results, keyed by the search filter.
///
/// This is the only shared mutable state in the system; it is cleared
/// explicitly after a clean mutation batch and otherwise trusted only
/// within its TTL.
pub struct ListingCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl ListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    fn key(filter: Option<&str>) -> String {
        filter.unwrap_or("").to_string()
    }

    pub fn get(&self, filter: Option<&str>) -> Option<&[Product]> {
        let entry = self.entries.get(&Self::key(filter))?;
        if entry.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        Some(&entry.rows)
    }

    pub fn put(&mut self, filter: Option<&str>, rows: Vec<Product>) {
        self.entries.insert(
            Self::key(filter),
            CacheEntry {
                fetched_at: Instant::now(),
                rows,
            },
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Store plus listing cache, with the invalidation rule in one place:
/// a batch with at least one success and zero failures clears the cache so
/// the next search refetches; any failure leaves it intact so the operator
/// keeps the context of what succeeded and retries only the failed codes.
pub struct Catalog<S> {
    store: S,
    cache: ListingCache,
}

impl<S: ProductStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self::with_ttl(store, LISTING_TTL)
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self {
            store,
            cache: ListingCache::new(ttl),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Complete listing for a name-substring filter, served from the cache
    /// within its TTL.
    pub fn search(&mut self, filter: Option<&str>) -> Result<Vec<Product>, StoreError> {
        if let Some(rows) = self.cache.get(filter) {
            return Ok(rows.to_vec());
        }
        let rows = fetch_all(&self.store, filter)?;
        self.cache.put(filter, rows.clone());
        Ok(rows)
    }

    /// Finds one product by its (canonical) primary SKU.
    pub fn find_by_primary(&mut self, primary: &str) -> Result<Option<Product>, StoreError> {
        let rows = self.search(None)?;
        Ok(rows.into_iter().find(|p| p.primary_sku == primary))
    }

    pub fn add_aliases(&mut self, product_id: &str, plan: &BTreeSet<String>) -> BatchReport {
        let report = apply_additions(&mut self.store, product_id, plan);
        if report.clean() {
            self.cache.clear();
        }
        report
    }

    pub fn remove_aliases(&mut self, product_id: &str, plan: &BTreeSet<String>) -> BatchReport {
        let report = apply_removals(&mut self.store, product_id, plan);
        if report.clean() {
            self.cache.clear();
        }
        report
    }
}

/// Applies an addition plan one code at a time. A failed call is recorded
/// and does not abort the remaining codes.
pub fn apply_additions<S: ProductStore + ?Sized>(
    store: &mut S,
    product_id: &str,
    plan: &BTreeSet<String>,
) -> BatchReport {
    let mut report = BatchReport::default();
    for code in plan {
        match store.add_alias(product_id, code) {
            Ok(()) => report.success(code),
            Err(err) => report.fail(code, &err.to_string()),
        }
    }
    report
}

/// Applies a removal plan one code at a time, same failure policy as
/// [`apply_additions`].
pub fn apply_removals<S: ProductStore + ?Sized>(
    store: &mut S,
    product_id: &str,
    plan: &BTreeSet<String>,
) -> BatchReport {
    let mut report = BatchReport::default();
    for code in plan {
        match store.remove_alias(product_id, code) {
            Ok(()) => report.success(code),
            Err(err) => report.fail(code, &err.to_string()),
        }
    }
    report
}

/// Adds alternative codes for a principal in the synonym-table variant.
///
/// Rules:
/// - A principal with zero rows gets its self-referencing reference row
///   seeded first; if that row already exists the seed is a benign no-op.
/// - An alternative equal to its principal is skipped.
/// - An alternative already bound anywhere (point lookup before the insert)
///   is skipped, never reassigned.
///
/// A failed seed aborts with `Err`, since nothing can be inserted without
/// it; per-code errors after that are collected in the report.
pub fn add_alternatives<S: SynonymStore + ?Sized>(
    store: &mut S,
    principal: &str,
    display_name: Option<&str>,
    codes: &BTreeSet<String>,
) -> Result<BatchReport, StoreError> {
    if store.rows_for_principal(principal)?.is_empty() && store.lookup(principal)?.is_none() {
        store.insert(SynonymRow {
            alternative_code: principal.to_string(),
            principal_code: principal.to_string(),
            display_name: display_name.map(|n| n.to_string()),
        })?;
    }

    let mut report = BatchReport::default();
    for code in codes {
        if code == principal {
            report.skip(code, "equals its principal code");
            continue;
        }
        match store.lookup(code) {
            Ok(Some(row)) if row.principal_code == principal => {
                report.skip(code, "already present for this principal");
            }
            Ok(Some(row)) => {
                report.skip(
                    code,
                    &format!("already bound to `{}`", row.principal_code),
                );
            }
            Ok(None) => match store.insert(SynonymRow {
                alternative_code: code.to_string(),
                principal_code: principal.to_string(),
                display_name: display_name.map(|n| n.to_string()),
            }) {
                Ok(()) => report.success(code),
                Err(err) => report.fail(code, &err.to_string()),
            },
            Err(err) => report.fail(code, &err.to_string()),
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    fn product(id: &str, name: &str, primary: &str, aliases: &[&str]) -> Product {
        let mut all_skus = vec![primary.to_string()];
        all_skus.extend(aliases.iter().map(|a| a.to_string()));
        Product {
            product_id: id.to_string(),
            name: name.to_string(),
            primary_sku: primary.to_string(),
            all_skus,
        }
    }

    fn plan(codes: &[&str]) -> BTreeSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    /// Wraps a `MemoryStore`, counting listing round trips and forcing
    /// per-code failures for marked codes.
    struct FlakyStore {
        inner: MemoryStore,
        fetches: Cell<usize>,
        failing: HashSet<String>,
    }

    impl FlakyStore {
        fn new(products: Vec<Product>, failing: &[&str]) -> Self {
            Self {
                inner: MemoryStore::new(products),
                fetches: Cell::new(0),
                failing: failing.iter().map(|c| c.to_string()).collect(),
            }
        }
    }

    impl ProductStore for FlakyStore {
        fn fetch_page(
            &self,
            filter: Option<&str>,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<Product>, StoreError> {
            if offset == 0 {
                self.fetches.set(self.fetches.get() + 1);
            }
            self.inner.fetch_page(filter, offset, limit)
        }

        fn add_alias(&mut self, product_id: &str, code: &str) -> Result<(), StoreError> {
            if self.failing.contains(code) {
                return Err(StoreError::Storage("rpc returned no data".into()));
            }
            self.inner.add_alias(product_id, code)
        }

        fn remove_alias(&mut self, product_id: &str, code: &str) -> Result<(), StoreError> {
            if self.failing.contains(code) {
                return Err(StoreError::Storage("rpc returned no data".into()));
            }
            self.inner.remove_alias(product_id, code)
        }
    }

    #[test]
    fn fetch_all_stitches_pages_until_short_page() {
        let store = MemoryStore::new(vec![
            product("p1", "A", "S1", &[]),
            product("p2", "B", "S2", &[]),
            product("p3", "C", "S3", &[]),
            product("p4", "D", "S4", &[]),
            product("p5", "E", "S5", &[]),
        ]);
        let rows = fetch_all_paged(&store, None, 2).unwrap();
        assert_eq!(rows.len(), 5);
        let names: Vec<&str> = rows.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn fetch_all_handles_exact_page_boundary() {
        let store = MemoryStore::new(vec![
            product("p1", "A", "S1", &[]),
            product("p2", "B", "S2", &[]),
        ]);
        // Two rows with page size two: one full page, then an empty one.
        let rows = fetch_all_paged(&store, None, 2).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn catalog_serves_repeat_searches_from_cache() {
        let store = FlakyStore::new(vec![product("p1", "iPhone 11", "IP11", &[])], &[]);
        let mut catalog = Catalog::new(store);
        catalog.search(Some("iphone")).unwrap();
        catalog.search(Some("iphone")).unwrap();
        assert_eq!(catalog.store().fetches.get(), 1);
    }

    #[test]
    fn expired_cache_entries_refetch() {
        let store = FlakyStore::new(vec![product("p1", "iPhone 11", "IP11", &[])], &[]);
        let mut catalog = Catalog::with_ttl(store, Duration::from_secs(0));
        catalog.search(None).unwrap();
        catalog.search(None).unwrap();
        assert_eq!(catalog.store().fetches.get(), 2);
    }

    #[test]
    fn partial_failure_reports_per_code_and_keeps_cache() {
        let store = FlakyStore::new(vec![product("p1", "iPhone 11", "IP11", &[])], &["A2"]);
        let mut catalog = Catalog::new(store);
        catalog.search(None).unwrap();

        let report = catalog.add_aliases("p1", &plan(&["A1", "A2", "A3"]));
        assert_eq!(report.succeeded, vec!["A1", "A3"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].code, "A2");
        assert!(!report.clean());

        // Cache untouched: the operator retries A2 with unchanged context.
        catalog.search(None).unwrap();
        assert_eq!(catalog.store().fetches.get(), 1);
    }

    #[test]
    fn clean_batch_invalidates_cache() {
        let store = FlakyStore::new(vec![product("p1", "iPhone 11", "IP11", &["A1"])], &[]);
        let mut catalog = Catalog::new(store);
        catalog.search(None).unwrap();

        let report = catalog.remove_aliases("p1", &plan(&["A1"]));
        assert!(report.clean());

        let rows = catalog.search(None).unwrap();
        assert_eq!(catalog.store().fetches.get(), 2);
        assert!(rows[0].aliases().is_empty());
    }

    #[test]
    fn empty_plan_applies_nothing_and_keeps_cache() {
        let store = FlakyStore::new(vec![product("p1", "iPhone 11", "IP11", &[])], &[]);
        let mut catalog = Catalog::new(store);
        catalog.search(None).unwrap();
        let report = catalog.add_aliases("p1", &BTreeSet::new());
        assert!(!report.clean());
        catalog.search(None).unwrap();
        assert_eq!(catalog.store().fetches.get(), 1);
    }

    #[test]
    fn first_alternative_seeds_the_reference_row() {
        let mut store = MemoryStore::default();
        let report =
            add_alternatives(&mut store, "SM-G935", Some("G935 GOLD"), &plan(&["A1"])).unwrap();
        assert_eq!(report.succeeded, vec!["A1"]);

        let rows = store.rows_for_principal("SM-G935").unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .any(|r| r.alternative_code == "SM-G935" && r.principal_code == "SM-G935"));
    }

    #[test]
    fn reseeding_is_a_benign_no_op() {
        let mut store = MemoryStore::default();
        add_alternatives(&mut store, "SM-G935", None, &plan(&["A1"])).unwrap();
        add_alternatives(&mut store, "SM-G935", None, &plan(&["A2"])).unwrap();
        let refs: Vec<_> = store
            .rows_for_principal("SM-G935")
            .unwrap()
            .into_iter()
            .filter(|r| r.alternative_code == "SM-G935")
            .collect();
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn alternative_equal_to_principal_is_skipped() {
        let mut store = MemoryStore::default();
        let report =
            add_alternatives(&mut store, "SM-G935", None, &plan(&["SM-G935", "A1"])).unwrap();
        assert_eq!(report.succeeded, vec!["A1"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].code, "SM-G935");
    }

    #[test]
    fn globally_bound_alternative_is_skipped_not_reassigned() {
        let mut store = MemoryStore::default();
        add_alternatives(&mut store, "OTHER", None, &plan(&["A1"])).unwrap();

        let report = add_alternatives(&mut store, "SM-G935", None, &plan(&["A1", "A2"])).unwrap();
        assert_eq!(report.succeeded, vec!["A2"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].code, "A1");

        // Still bound to the original principal.
        let row = store.lookup("A1").unwrap().unwrap();
        assert_eq!(row.principal_code, "OTHER");
    }
}
