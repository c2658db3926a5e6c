//! Idempotent dataset registration.
//!
//! [`CatalogIndexer`] links EO3 documents to their registered
//! [`ProductDefinition`], then updates the matching record or inserts a new
//! one. Records are matched on the source raster's file URI, never on the
//! document id, which is regenerated on every build. After a batch, a
//! read-back [`Verification`] confirms the data is actually loadable.
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::records::{DatasetDocument, file_uri};
use crate::error::{Error, Result};
use crate::io::RasterIo;
use crate::io::writers::eo3::write_product_definition;

pub mod product;
pub mod store;

pub use product::{ProductDefinition, products_from_config};
pub use store::JsonFileIndex;

/// Errors raised by a dataset index backend
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("No dataset indexed for {0}")]
    NotFound(String),
    #[error("Dataset already indexed for {0}")]
    Duplicate(String),
    #[error("Index storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductChange {
    Added,
    Replaced,
    Unchanged,
}

/// A dataset document resolved against its product definition
#[derive(Debug, Clone)]
pub struct LinkedDataset {
    pub document: DatasetDocument,
    pub document_uri: String,
    pub product: ProductDefinition,
}

impl LinkedDataset {
    /// Stable identity used for update-or-insert matching
    pub fn identity_key(&self) -> &str {
        &self.document.location
    }
}

/// A record as held by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDataset {
    /// Assigned on first registration and kept across updates
    pub id: Uuid,
    pub product: String,
    pub location: String,
    pub document_uri: String,
    pub document: DatasetDocument,
    pub indexed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage seam for registered products and datasets
pub trait DatasetIndex {
    fn add_product(
        &mut self,
        product: &ProductDefinition,
    ) -> std::result::Result<ProductChange, IndexError>;

    fn get_product(&self, name: &str) -> Option<&ProductDefinition>;

    /// Replace the record matching the dataset's identity; [`IndexError::NotFound`] when absent
    fn update(
        &mut self,
        dataset: &LinkedDataset,
    ) -> std::result::Result<IndexedDataset, IndexError>;

    /// Insert a new record; [`IndexError::Duplicate`] when one already matches
    fn add(&mut self, dataset: &LinkedDataset) -> std::result::Result<IndexedDataset, IndexError>;

    fn find_datasets(&self, product: &str) -> Vec<IndexedDataset>;

    fn dataset_count(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Updated(Uuid),
    Added(Uuid),
}

/// Result of the post-batch read-back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Passed { dataset_id: Uuid, valid_pixels: usize },
    NoDatasets { product: String },
    EmptyPixels { dataset_id: Uuid },
    Failed { reason: String },
    Skipped,
}

impl Verification {
    pub fn passed(&self) -> bool {
        matches!(self, Verification::Passed { .. })
    }
}

impl std::fmt::Display for Verification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verification::Passed {
                dataset_id,
                valid_pixels,
            } => write!(f, "PASSED: dataset {} has {} valid pixel(s)", dataset_id, valid_pixels),
            Verification::NoDatasets { product } => {
                write!(f, "FAILED: no datasets found for product {}", product)
            }
            Verification::EmptyPixels { dataset_id } => {
                write!(f, "FAILED: dataset {} loads but has no valid pixels", dataset_id)
            }
            Verification::Failed { reason } => write!(f, "FAILED: {}", reason),
            Verification::Skipped => write!(f, "SKIPPED: nothing was indexed"),
        }
    }
}

pub struct CatalogIndexer<'a, I: DatasetIndex> {
    index: &'a mut I,
}

impl<'a, I: DatasetIndex> CatalogIndexer<'a, I> {
    pub fn new(index: &'a mut I) -> Self {
        Self { index }
    }

    /// Persist each definition as YAML and register it with the index
    pub fn register_products(
        &mut self,
        products: &[ProductDefinition],
        product_dir: &Path,
    ) -> Result<()> {
        for product in products {
            write_product_definition(product_dir, product)?;
            match self.index.add_product(product)? {
                ProductChange::Added => info!("Registered product {}", product.name),
                ProductChange::Replaced => {
                    warn!(
                        "Product {} differed from the registered definition; replaced",
                        product.name
                    )
                }
                ProductChange::Unchanged => debug!("Product {} already registered", product.name),
            }
        }
        Ok(())
    }

    /// Link a document to its product; unknown products and undeclared
    /// measurements are [`Error::Linkage`]
    pub fn resolve(&self, document: &DatasetDocument, document_uri: &str) -> Result<LinkedDataset> {
        let linkage = |reason: String| Error::Linkage {
            label: document.label.clone(),
            reason,
        };
        let product = self
            .index
            .get_product(&document.product.name)
            .ok_or_else(|| linkage(format!("unknown product {}", document.product.name)))?;
        if document.location.is_empty() {
            return Err(linkage("document has no location".to_string()));
        }
        if !document.grids.contains_key("default") {
            return Err(linkage("document has no default grid".to_string()));
        }
        if let Some(band) = document
            .measurements
            .keys()
            .find(|band| !product.declares(band))
        {
            return Err(linkage(format!(
                "measurement {} is not declared by product {}",
                band, product.name
            )));
        }
        Ok(LinkedDataset {
            document: document.clone(),
            document_uri: document_uri.to_string(),
            product: product.clone(),
        })
    }

    /// Update the matching record, or insert when none matches
    pub fn register(
        &mut self,
        document: &DatasetDocument,
        document_path: &Path,
    ) -> Result<IndexOutcome> {
        let uri = file_uri(document_path)?;
        let linked = self.resolve(document, &uri)?;
        match self.index.update(&linked) {
            Ok(record) => {
                debug!("Updated {} (id {})", document.label, record.id);
                Ok(IndexOutcome::Updated(record.id))
            }
            Err(IndexError::NotFound(_)) => match self.index.add(&linked) {
                Ok(record) => {
                    info!("Added {} (id {})", document.label, record.id);
                    Ok(IndexOutcome::Added(record.id))
                }
                Err(e) => Err(Error::persistence(document_path, e)),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Read back the first dataset of `product` and check its `band` has real pixels
    pub fn verify(&self, product: &str, band: &str, io: &dyn RasterIo) -> Verification {
        let datasets = self.index.find_datasets(product);
        let Some(sample) = datasets.first() else {
            return Verification::NoDatasets {
                product: product.to_string(),
            };
        };
        info!("Verifying sample dataset {} ({})", sample.id, sample.location);
        if !sample.document.measurements.contains_key(band) {
            return Verification::Failed {
                reason: format!("dataset {} has no measurement {}", sample.id, band),
            };
        }
        let Some(path) = url::Url::parse(&sample.location)
            .ok()
            .and_then(|u| u.to_file_path().ok())
        else {
            return Verification::Failed {
                reason: format!("location {} is not a local file", sample.location),
            };
        };
        // One measurement per file, so the band is always raster band 1
        match io.valid_pixel_count(&path, 1) {
            Ok(0) => Verification::EmptyPixels {
                dataset_id: sample.id,
            },
            Ok(valid_pixels) => Verification::Passed {
                dataset_id: sample.id,
                valid_pixels,
            },
            Err(e) => Verification::Failed {
                reason: format!("load of {:?} failed: {}", path, e),
            },
        }
    }
}
