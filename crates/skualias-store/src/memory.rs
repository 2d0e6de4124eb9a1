//! In-process reference implementation of the store traits.
//!
//! Encodes the semantics a remote backing store is expected to provide:
//! name-sorted, substring-filtered paging; global alias uniqueness on
//! insert; a "no row" failure when a removal matches nothing.

use crate::{ProductStore, StoreError, SynonymStore};
use skualias_model::{Product, SynonymRow};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    products: Vec<Product>,
    synonyms: Vec<SynonymRow>,
}

impl MemoryStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            synonyms: Vec::new(),
        }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn synonyms(&self) -> &[SynonymRow] {
        &self.synonyms
    }

    fn product_mut(&mut self, product_id: &str) -> Result<&mut Product, StoreError> {
        self.products
            .iter_mut()
            .find(|p| p.product_id == product_id)
            .ok_or_else(|| StoreError::UnknownProduct(product_id.to_string()))
    }

    fn sku_bound_anywhere(&self, code: &str) -> bool {
        self.products
            .iter()
            .any(|p| p.all_skus.iter().any(|s| s == code))
    }
}

impl ProductStore for MemoryStore {
    fn fetch_page(
        &self,
        filter: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError> {
        let needle = filter.map(|f| f.to_lowercase());
        let mut rows: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| match &needle {
                Some(n) => p.name.to_lowercase().contains(n),
                None => true,
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));

        let start = offset.min(rows.len());
        let end = offset.saturating_add(limit).min(rows.len());
        Ok(rows[start..end].iter().map(|p| (*p).clone()).collect())
    }

    fn add_alias(&mut self, product_id: &str, code: &str) -> Result<(), StoreError> {
        if self.sku_bound_anywhere(code) {
            return Err(StoreError::Conflict(code.to_string()));
        }
        let product = self.product_mut(product_id)?;
        product.all_skus.push(code.to_string());
        Ok(())
    }

    fn remove_alias(&mut self, product_id: &str, code: &str) -> Result<(), StoreError> {
        let product = self.product_mut(product_id)?;
        // The primary row is not deletable through this path; a removal
        // targeting it matches nothing, like the remote call.
        if code == product.primary_sku {
            return Err(StoreError::NoRow(code.to_string()));
        }
        match product.all_skus.iter().position(|s| s == code) {
            Some(idx) => {
                product.all_skus.remove(idx);
                Ok(())
            }
            None => Err(StoreError::NoRow(code.to_string())),
        }
    }
}

impl SynonymStore for MemoryStore {
    fn lookup(&self, alternative_code: &str) -> Result<Option<SynonymRow>, StoreError> {
        Ok(self
            .synonyms
            .iter()
            .find(|r| r.alternative_code == alternative_code)
            .cloned())
    }

    fn rows_for_principal(&self, principal_code: &str) -> Result<Vec<SynonymRow>, StoreError> {
        Ok(self
            .synonyms
            .iter()
            .filter(|r| r.principal_code == principal_code)
            .cloned()
            .collect())
    }

    fn insert(&mut self, row: SynonymRow) -> Result<(), StoreError> {
        if self.lookup(&row.alternative_code)?.is_some() {
            return Err(StoreError::Conflict(row.alternative_code));
        }
        self.synonyms.push(row);
        Ok(())
    }
}
