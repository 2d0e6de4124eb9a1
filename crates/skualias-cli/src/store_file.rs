//! JSON-file-backed product store.
//!
//! Write-through wrapper over [`MemoryStore`]: every successful mutation
//! persists the full snapshot, so a killed session never loses applied
//! codes. A missing file opens as an empty store.

use serde::{Deserialize, Serialize};
use skualias_model::Product;
use skualias_store::{MemoryStore, ProductStore, StoreError};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    products: Vec<Product>,
}

pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let inner = if path.exists() {
            let raw = fs::read_to_string(path)
                .map_err(|e| StoreError::Storage(format!("read {}: {e}", path.display())))?;
            let snapshot: Snapshot = serde_json::from_str(&raw)
                .map_err(|e| StoreError::Storage(format!("parse {}: {e}", path.display())))?;
            MemoryStore::new(snapshot.products)
        } else {
            MemoryStore::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let snapshot = Snapshot {
            products: self.inner.products().to_vec(),
        };
        let raw = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        fs::write(&self.path, raw)
            .map_err(|e| StoreError::Storage(format!("write {}: {e}", self.path.display())))
    }
}

impl ProductStore for JsonStore {
    fn fetch_page(
        &self,
        filter: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Product>, StoreError> {
        self.inner.fetch_page(filter, offset, limit)
    }

    fn add_alias(&mut self, product_id: &str, code: &str) -> Result<(), StoreError> {
        self.inner.add_alias(product_id, code)?;
        self.persist()
    }

    fn remove_alias(&mut self, product_id: &str, code: &str) -> Result<(), StoreError> {
        self.inner.remove_alias(product_id, code)?;
        self.persist()
    }
}
