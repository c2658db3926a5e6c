//! High-level, ergonomic library API: enumerate a directory of rasters and
//! drive them through the extraction pipeline into either a browsable STAC
//! catalog or an indexed EO3 dataset store. Prefer these entrypoints over
//! the individual resolvers when integrating SARCAT.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::acquisition::resolve_acquisition_time;
use crate::core::classify::{Classify, RuleClassifier};
use crate::core::config::CatalogConfig;
use crate::core::footprint::resolve_footprint;
use crate::core::records::{CatalogItem, build_catalog_item, build_dataset_document};
use crate::error::{Error, Result};
use crate::index::{CatalogIndexer, DatasetIndex, IndexOutcome, Verification, products_from_config};
use crate::io::RasterIo;
use crate::io::writers::eo3::write_dataset_document;
use crate::io::writers::stac::{StacTree, read_first_item};
use crate::types::Mode;

/// Batch processing report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record<T>(&mut self, path: &Path, outcome: &Result<T>) {
        self.attempted += 1;
        match outcome {
            Ok(_) => self.succeeded += 1,
            Err(e) if e.is_ineligible() => {
                info!("[skip] {:?}: {}", path, e);
                self.skipped += 1;
            }
            Err(e) => {
                warn!("[fail] {:?}: {}", path, e);
                self.failed += 1;
            }
        }
    }
}

/// Outcome of [`build_stac_catalog`]
#[derive(Debug, Clone)]
pub struct BrowseReport {
    pub batch: BatchReport,
    pub catalog_path: PathBuf,
}

/// Outcome of [`index_directory`]
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub batch: BatchReport,
    pub added: usize,
    pub updated: usize,
    pub verification: Verification,
}

/// List files in `dir` whose extension matches `extension` (case-insensitive), sorted.
/// Files repeating an earlier stem are dropped. A missing directory or an
/// empty result is fatal: there is nothing to process.
pub fn collect_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        Error::ConfigurationFatal(format!("cannot read input directory {:?}: {}", dir, e))
    })?;
    let mut candidates = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if path.is_file() && matches {
            candidates.push(path);
        }
    }
    candidates.sort();

    // Item ids and document names derive from the stem
    let mut stems = HashSet::new();
    let mut files = Vec::with_capacity(candidates.len());
    for path in candidates {
        let stem = path.file_stem().map(|s| s.to_os_string());
        if stems.insert(stem) {
            files.push(path);
        } else {
            warn!("[skip] {:?}: another input already uses this file stem", path);
        }
    }
    if files.is_empty() {
        return Err(Error::ConfigurationFatal(format!(
            "no .{} files found in {:?}",
            extension, dir
        )));
    }
    Ok(files)
}

/// Open, resolve and build the browsing record for one file
pub fn catalog_item_for(
    path: &Path,
    config: &CatalogConfig,
    io: &dyn RasterIo,
) -> Result<CatalogItem> {
    let source = io.open(path)?;
    let footprint = resolve_footprint(&source, &config.canonical_crs, io)?;
    let time = resolve_acquisition_time(&source, Mode::Browse)?;
    build_catalog_item(&source, &footprint, &time, path, config)
}

/// Build a self-contained STAC catalog for every raster in `config.input_dir`
pub fn build_stac_catalog(config: &CatalogConfig, io: &dyn RasterIo) -> Result<BrowseReport> {
    let inputs = collect_inputs(&config.input_dir, &config.extension)?;
    info!("Found {} .{} file(s); building STAC catalog", inputs.len(), config.extension);

    let mut tree = StacTree::new(config);
    let mut batch = BatchReport::default();
    for path in &inputs {
        info!("Processing: {:?}", path);
        let outcome = catalog_item_for(path, config, io);
        batch.record(path, &outcome);
        if let Ok(item) = outcome {
            tree.add_item(item);
        }
    }

    tree.update_extent_from_items();
    let catalog_path = tree.save(&config.stac_root)?;

    match read_first_item(&catalog_path) {
        Ok(Some(item)) => {
            let href = item
                .assets
                .values()
                .next()
                .map(|a| a.href.as_str())
                .unwrap_or("-");
            info!(
                "Read-back first item: id={} datetime={} asset={}",
                item.id, item.properties.datetime, href
            );
        }
        Ok(None) => warn!("Catalog {:?} contains no items", catalog_path),
        Err(e) => warn!("Catalog read-back failed: {}", e),
    }

    Ok(BrowseReport {
        batch,
        catalog_path,
    })
}

/// Open, resolve, build, persist and register one file
pub fn index_file<I: DatasetIndex>(
    path: &Path,
    config: &CatalogConfig,
    io: &dyn RasterIo,
    indexer: &mut CatalogIndexer<'_, I>,
) -> Result<IndexOutcome> {
    let source = io.open(path)?;
    let footprint = resolve_footprint(&source, &config.canonical_crs, io)?;
    let (product, band) = RuleClassifier::new(&config.product_rules)
        .classify(&source.stem())
        .into_product(&source.file_name())?;
    let time = resolve_acquisition_time(&source, Mode::Index)?;
    let document = build_dataset_document(
        &source,
        &footprint,
        &time,
        &product,
        &band,
        &config.canonical_crs,
    )?;
    let document_path = write_dataset_document(&config.dataset_dir, &document)?;
    indexer.register(&document, &document_path)
}

/// Register products, then index every raster in `config.input_dir`, and
/// finally read back one dataset of `config.verify_product`
pub fn index_directory<I: DatasetIndex>(
    config: &CatalogConfig,
    io: &dyn RasterIo,
    index: &mut I,
) -> Result<IndexReport> {
    let inputs = collect_inputs(&config.input_dir, &config.extension)?;

    let mut indexer = CatalogIndexer::new(index);
    indexer.register_products(&products_from_config(config), &config.product_dir)?;
    info!("Found {} .{} file(s); indexing", inputs.len(), config.extension);

    let mut batch = BatchReport::default();
    let (mut added, mut updated) = (0, 0);
    for path in &inputs {
        info!("Processing: {:?}", path);
        let outcome = index_file(path, config, io, &mut indexer);
        batch.record(path, &outcome);
        match outcome {
            Ok(IndexOutcome::Added(_)) => added += 1,
            Ok(IndexOutcome::Updated(_)) => updated += 1,
            Err(_) => {}
        }
    }
    info!(
        "Indexing complete: {} registered ({} added, {} updated)",
        batch.succeeded, added, updated
    );

    let verification = if batch.succeeded > 0 {
        indexer.verify(&config.verify_product, &config.verify_band, io)
    } else {
        Verification::Skipped
    };
    if verification.passed() {
        info!("Verification {}", verification);
    } else {
        warn!("Verification {}", verification);
    }

    Ok(IndexReport {
        batch,
        added,
        updated,
        verification,
    })
}
