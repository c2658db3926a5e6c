//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Separates per-file conditions that make a raster ineligible (skipped) from
//! failures (reported) and from the single fatal configuration condition.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Index error: {0}")]
    Index(#[from] crate::index::IndexError),

    #[error("No spatial reference in {file} (raw/unprojected product?)")]
    NoSpatialReference { file: String },

    #[error("Neither TIFF tag nor filename yields an acquisition time for {file}")]
    TimestampUnresolvable { file: String },

    #[error("No product rule matches {file}")]
    UnclassifiedProduct { file: String },

    #[error("Preview rendering {file} is not an indexable measurement")]
    ThumbnailNotIndexable { file: String },

    #[error("Reprojection from {from} to {to} failed: {reason}")]
    Reprojection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Cannot link dataset {label}: {reason}")]
    Linkage { label: String, reason: String },

    #[error("Failed to persist {path:?}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    ConfigurationFatal(String),
}

impl Error {
    /// True for conditions that skip a file rather than fail it: sources GDAL
    /// cannot open, and sources that are not eligible for the catalog.
    pub fn is_ineligible(&self) -> bool {
        matches!(
            self,
            Error::Gdal(_)
                | Error::NoSpatialReference { .. }
                | Error::UnclassifiedProduct { .. }
                | Error::ThumbnailNotIndexable { .. }
        )
    }

    pub fn persistence<E: std::fmt::Display>(path: impl Into<PathBuf>, e: E) -> Self {
        Error::Persistence {
            path: path.into(),
            reason: e.to_string(),
        }
    }
}
