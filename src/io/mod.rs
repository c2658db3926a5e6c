//! I/O layer: the `RasterIo` capability with its GDAL backend (`gdal`) and
//! `writers` for STAC JSON trees and EO3 YAML documents.
pub mod gdal;
pub use gdal::{Bounds, GdalError, GdalRasterIo, GdalReader, RasterIo, RasterSource};

pub mod writers;
