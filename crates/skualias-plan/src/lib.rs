//!
//! Alias reconciler: plans alias-set changes for one product.
//!
//! Responsibilities:
//! - Turn a freeform operator-entered block into the set of codes to add,
//!   diffed against the product's existing aliases and its primary SKU.
//! - Validate an explicit removal request before any store call is made.
//!
//! Assumptions:
//! - Planning is pure: no store access, no ambient selection state. The
//!   caller passes the current listing row in and applies the plan itself.
//! - Existing codes and the primary are canonicalized before diffing, so
//!   stored variants that differ only by formatting are never re-added.

use skualias_canon::{canonicalize, split_block};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemovalError {
    /// The primary SKU was in the request. The whole batch is rejected:
    /// protecting the primary is a hard invariant, not a per-code filter.
    #[error("the primary SKU cannot be removed")]
    PrimaryProtected,
    /// A remove action fired with nothing selected. Surfaced rather than
    /// treated as a no-op, since it signals a misused operator surface.
    #[error("no aliases selected for removal")]
    EmptySelection,
}

/// Computes the set of codes to add for one product.
///
/// Splits `raw_block` on commas, semicolons, and newlines, canonicalizes
/// each piece (dropping the ones that reduce to empty), deduplicates, and
/// subtracts the canonicalized existing set and primary. An empty result
/// means "nothing new", which is reportable but not an error.
///
/// The returned set is ordered, so apply loops and reports are
/// deterministic.
pub fn plan_additions<'a, I>(primary: &str, existing: I, raw_block: &str) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let primary = canonicalize(primary);
    let existing: BTreeSet<String> = existing
        .into_iter()
        .map(canonicalize)
        .filter(|code| !code.is_empty())
        .collect();

    let mut to_add = BTreeSet::new();
    for piece in split_block(raw_block) {
        let code = canonicalize(piece);
        if code.is_empty() || code == primary || existing.contains(&code) {
            continue;
        }
        to_add.insert(code);
    }
    to_add
}

/// Validates an explicit removal request.
///
/// The requested codes come from a selection over the stored alias set, so
/// they are already canonical; on success they pass through unchanged.
pub fn plan_removals(
    primary: &str,
    requested: &BTreeSet<String>,
) -> Result<BTreeSet<String>, RemovalError> {
    if requested.is_empty() {
        return Err(RemovalError::EmptySelection);
    }
    if requested.contains(primary) {
        return Err(RemovalError::PrimaryProtected);
    }
    Ok(requested.clone())
}
