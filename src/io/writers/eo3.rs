use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::core::records::DatasetDocument;
use crate::error::{Error, Result};
use crate::index::ProductDefinition;

/// Write `bytes` to `path` through a sibling temp file and rename, so readers
/// never observe a half-written document
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| Error::persistence(path, e))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".sarcat_")
        .tempfile_in(parent)
        .map_err(|e| Error::persistence(path, e))?;
    tmp.write_all(bytes).map_err(|e| Error::persistence(path, e))?;
    tmp.persist(path).map_err(|e| Error::persistence(path, e.error))?;
    Ok(())
}

pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_yaml::to_string(value)?;
    write_atomic(path, text.as_bytes())
}

pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::persistence(path, e))?;
    Ok(serde_yaml::from_str(&text)?)
}

/// Persist a dataset document as `<dir>/ds_<label>.yaml`
pub fn write_dataset_document(dir: &Path, doc: &DatasetDocument) -> Result<PathBuf> {
    let path = dir.join(format!("ds_{}.yaml", doc.label));
    write_yaml(&path, doc)?;
    info!("Wrote dataset document: {:?}", path);
    Ok(path)
}

/// Persist a product definition as `<dir>/<name>.yaml`
pub fn write_product_definition(dir: &Path, product: &ProductDefinition) -> Result<PathBuf> {
    let path = dir.join(format!("{}.yaml", product.name));
    write_yaml(&path, product)?;
    info!("Wrote product definition: {:?}", path);
    Ok(path)
}
