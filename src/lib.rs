#![doc = r#"
SARCAT: catalog builder for Capella SAR GeoTIFF products.

This crate extracts footprint, acquisition time and product role from
raster files and turns them into catalog records: a self-contained STAC
catalog for browsing, or EO3 dataset documents registered idempotently
into a dataset index. It powers the `sarcat` CLI and can be embedded in
your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Build a browsable STAC catalog
------------------------------
```rust,no_run
use std::path::PathBuf;
use sarcat::{build_stac_catalog, CatalogConfig, GdalRasterIo};

fn main() -> sarcat::Result<()> {
    let config = CatalogConfig {
        input_dir: PathBuf::from("/data/capella/cog_files"),
        stac_root: PathBuf::from("/data/capella/stac"),
        ..CatalogConfig::default()
    };
    let report = build_stac_catalog(&config, &GdalRasterIo)?;
    println!(
        "cataloged={} skipped={} failed={}",
        report.batch.succeeded, report.batch.skipped, report.batch.failed
    );
    Ok(())
}
```

Index datasets (update-if-present, else insert)
-----------------------------------------------
```rust,no_run
use std::path::PathBuf;
use sarcat::{index_directory, CatalogConfig, GdalRasterIo, JsonFileIndex};

fn main() -> sarcat::Result<()> {
    let config = CatalogConfig {
        input_dir: PathBuf::from("/data/capella/cog_files"),
        ..CatalogConfig::default()
    };
    let mut index = JsonFileIndex::open(&config.index_dir)?;
    let report = index_directory(&config, &GdalRasterIo, &mut index)?;
    println!("registered={} verification={}", report.batch.succeeded, report.verification);
    Ok(())
}
```

Error handling
--------------
All public functions return `sarcat::Result<T>`. Per-file conditions are
classified by `Error::is_ineligible()` (skip) versus failures; only
`Error::ConfigurationFatal` aborts a batch.

Useful modules
--------------
- [`api`]: batch entry points for both output modes.
- [`core`]: footprint, acquisition time, classification and record builders.
- [`index`]: dataset index trait, file-backed index and the idempotent indexer.
- [`io`]: GDAL raster access and STAC/EO3 writers.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod api;
pub mod core;
pub mod error;
pub mod index;
pub mod io;
pub mod types;

// Curated public API surface
pub use crate::core::acquisition::{AcquisitionTime, resolve_acquisition_time};
pub use crate::core::classify::{Classification, Classify, RuleClassifier};
pub use crate::core::config::{CatalogConfig, ProductRule, RoleRule};
pub use crate::core::footprint::{Footprint, resolve_footprint};
pub use crate::core::records::{
    CatalogItem, DatasetDocument, build_catalog_item, build_dataset_document,
};
pub use error::{Error, Result};
pub use types::{AssetRole, Mode, TimeProvenance};

pub use index::{
    CatalogIndexer, DatasetIndex, IndexError, IndexOutcome, JsonFileIndex, ProductDefinition,
    Verification,
};
pub use io::{Bounds, GdalError, GdalRasterIo, RasterIo, RasterSource};

pub use api::{
    BatchReport, BrowseReport, IndexReport, build_stac_catalog, collect_inputs, index_directory,
};
