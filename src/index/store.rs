//! File-backed dataset index. State lives in memory and is flushed to
//! `<dir>/index.json` after every write.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DatasetIndex, IndexError, IndexedDataset, LinkedDataset, ProductChange};
use crate::index::ProductDefinition;
use crate::io::writers::eo3::write_atomic;

const INDEX_FILE: &str = "index.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexState {
    products: BTreeMap<String, ProductDefinition>,
    /// Keyed by source location URI
    datasets: BTreeMap<String, IndexedDataset>,
}

#[derive(Debug)]
pub struct JsonFileIndex {
    path: PathBuf,
    state: IndexState,
}

impl JsonFileIndex {
    /// Open the index in `dir`, starting empty when no index file exists yet
    pub fn open(dir: &Path) -> Result<Self, IndexError> {
        let path = dir.join(INDEX_FILE);
        let state = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            IndexState::default()
        };
        debug!(
            "Opened index {:?}: {} product(s), {} dataset(s)",
            path,
            state.products.len(),
            state.datasets.len()
        );
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), IndexError> {
        let text = serde_json::to_string_pretty(&self.state)?;
        write_atomic(&self.path, text.as_bytes())
            .map_err(|e| IndexError::Storage(e.to_string()))
    }
}

impl DatasetIndex for JsonFileIndex {
    fn add_product(&mut self, product: &ProductDefinition) -> Result<ProductChange, IndexError> {
        let change = match self.state.products.get(&product.name) {
            Some(existing) if existing == product => return Ok(ProductChange::Unchanged),
            Some(_) => ProductChange::Replaced,
            None => ProductChange::Added,
        };
        let previous = self
            .state
            .products
            .insert(product.name.clone(), product.clone());
        if let Err(e) = self.flush() {
            match previous {
                Some(previous) => self.state.products.insert(product.name.clone(), previous),
                None => self.state.products.remove(&product.name),
            };
            return Err(e);
        }
        Ok(change)
    }

    fn get_product(&self, name: &str) -> Option<&ProductDefinition> {
        self.state.products.get(name)
    }

    fn update(&mut self, dataset: &LinkedDataset) -> Result<IndexedDataset, IndexError> {
        let key = dataset.identity_key();
        let record = self
            .state
            .datasets
            .get_mut(key)
            .ok_or_else(|| IndexError::NotFound(key.to_string()))?;
        let previous = record.clone();
        record.product = dataset.product.name.clone();
        record.document_uri = dataset.document_uri.clone();
        record.document = dataset.document.clone();
        record.updated_at = Utc::now();
        let updated = record.clone();
        if let Err(e) = self.flush() {
            self.state.datasets.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(updated)
    }

    fn add(&mut self, dataset: &LinkedDataset) -> Result<IndexedDataset, IndexError> {
        let key = dataset.identity_key();
        if self.state.datasets.contains_key(key) {
            return Err(IndexError::Duplicate(key.to_string()));
        }
        let now = Utc::now();
        let record = IndexedDataset {
            id: dataset.document.id,
            product: dataset.product.name.clone(),
            location: key.to_string(),
            document_uri: dataset.document_uri.clone(),
            document: dataset.document.clone(),
            indexed_at: now,
            updated_at: now,
        };
        self.state.datasets.insert(key.to_string(), record.clone());
        if let Err(e) = self.flush() {
            self.state.datasets.remove(key);
            return Err(e);
        }
        Ok(record)
    }

    fn find_datasets(&self, product: &str) -> Vec<IndexedDataset> {
        self.state
            .datasets
            .values()
            .filter(|d| d.product == product)
            .cloned()
            .collect()
    }

    fn dataset_count(&self) -> usize {
        self.state.datasets.len()
    }
}
