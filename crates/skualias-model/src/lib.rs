//!
//! Shared data types for the SKU alias admin.
//!
//! This crate is intentionally small and shared by:
//! - the reconciler (plan computation),
//! - the store seam (listing, mutations, synonym table),
//! - the CLI (reporting).
//!
//! Key types:
//! - `Product`: one listing row, primary SKU plus the full stored SKU set.
//! - `SynonymRow`: one row of the name-keyed synonym table variant.
//! - `BatchReport`: per-code outcome partition for one mutation batch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One product as returned by the listing query.
///
/// `all_skus` is the stored SKU set and includes the primary; use
/// [`Product::aliases`] for the operator-facing alias view.
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub primary_sku: String,
    #[serde(default)]
    pub all_skus: Vec<String>,
}

impl Product {
    /// Sorted alias view: every stored SKU except the primary, deduplicated.
    pub fn aliases(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .all_skus
            .iter()
            .filter(|s| **s != self.primary_sku)
            .cloned()
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One row of the synonym-table variant.
///
/// `alternative_code` is a global unique key: it resolves to exactly one
/// `principal_code` system-wide. The principal's own reference row has
/// `alternative_code == principal_code`.
pub struct SynonymRow {
    pub alternative_code: String,
    pub principal_code: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCode {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCode {
    pub code: String,
    pub detail: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
/// Outcome of one mutation batch, partitioned per code.
///
/// Batches have no transaction: each code succeeds, is skipped, or fails on
/// its own, and the operator retries from this partition.
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub skipped: Vec<SkippedCode>,
    pub failed: Vec<FailedCode>,
}

impl BatchReport {
    pub fn success(&mut self, code: &str) {
        self.succeeded.push(code.to_string());
    }

    pub fn skip(&mut self, code: &str, reason: &str) {
        self.skipped.push(SkippedCode {
            code: code.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn fail(&mut self, code: &str, detail: &str) {
        self.failed.push(FailedCode {
            code: code.to_string(),
            detail: detail.to_string(),
        });
    }

    /// True when the batch did real work and nothing went wrong; this is
    /// the condition under which the cached listing is invalidated.
    pub fn clean(&self) -> bool {
        !self.succeeded.is_empty() && self.failed.is_empty()
    }
}
