//! Catalog record construction: STAC items for browsing and EO3 dataset
//! documents for indexing, both assembled from an already resolved
//! footprint and acquisition time.
use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::acquisition::AcquisitionTime;
use crate::core::classify::asset_roles;
use crate::core::config::CatalogConfig;
use crate::core::footprint::Footprint;
use crate::error::{Error, Result};
use crate::io::gdal::RasterSource;
use crate::types::{AssetRole, TimeProvenance};

pub const STAC_VERSION: &str = "1.0.0";
pub const GEOTIFF_MEDIA_TYPE: &str = "image/tiff; application=geotiff";
/// Key of the primary asset on every item
pub const DATA_ASSET_KEY: &str = "data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn json(rel: &str, href: String, title: Option<String>) -> Self {
        Self {
            rel: rel.to_string(),
            href,
            media_type: Some("application/json".to_string()),
            title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub href: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub roles: Vec<AssetRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemProperties {
    pub datetime: DateTime<Utc>,
    #[serde(rename = "sarcat:datetime_source")]
    pub datetime_source: TimeProvenance,
}

/// STAC item describing one raster file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub stac_version: String,
    pub id: String,
    pub geometry: serde_json::Value,
    pub bbox: [f64; 4],
    pub properties: ItemProperties,
    #[serde(default)]
    pub links: Vec<Link>,
    pub assets: BTreeMap<String, Asset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

/// Build the browsing record for `source`. The asset path is made absolute;
/// roles come from the filename alone.
pub fn build_catalog_item(
    source: &RasterSource,
    footprint: &Footprint,
    time: &AcquisitionTime,
    asset_path: &Path,
    config: &CatalogConfig,
) -> Result<CatalogItem> {
    let id = source.stem();
    let absolute = std::path::absolute(asset_path)?;
    let file_name = source.file_name();

    let mut assets = BTreeMap::new();
    assets.insert(
        DATA_ASSET_KEY.to_string(),
        Asset {
            href: absolute.to_string_lossy().into_owned(),
            media_type: GEOTIFF_MEDIA_TYPE.to_string(),
            title: Some(format!("{} (GeoTIFF)", id)),
            roles: asset_roles(&file_name, &config.role_rules, &config.default_roles),
        },
    );

    Ok(CatalogItem {
        kind: "Feature".to_string(),
        stac_version: STAC_VERSION.to_string(),
        id,
        geometry: footprint.geometry.clone(),
        bbox: footprint.bbox,
        properties: ItemProperties {
            datetime: time.datetime,
            datetime_source: time.provenance,
        },
        links: Vec::new(),
        assets,
        collection: Some(config.collection_id.clone()),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProperties {
    #[serde(rename = "odc:processing_datetime")]
    pub processing_datetime: DateTime<Utc>,
    pub datetime: DateTime<Utc>,
    #[serde(rename = "capella:filename")]
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// (rows, cols)
    pub shape: [usize; 2],
    /// Affine coefficients `[a, b, c, d, e, f]`
    pub transform: [f64; 6],
    pub crs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementPath {
    pub path: String,
}

/// EO3 dataset document for one raster file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub id: Uuid,
    pub product: ProductRef,
    pub label: String,
    /// File URI of the source raster; the index matches records on this
    pub location: String,
    pub crs: String,
    pub properties: DatasetProperties,
    pub geometry: serde_json::Value,
    pub grids: BTreeMap<String, Grid>,
    pub measurements: BTreeMap<String, MeasurementPath>,
    #[serde(default)]
    pub lineage: BTreeMap<String, serde_json::Value>,
}

/// `file://` URI for a path, made absolute first
pub fn file_uri(path: &Path) -> Result<String> {
    let absolute = std::path::absolute(path)?;
    url::Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .map_err(|_| Error::Linkage {
            label: absolute.to_string_lossy().into_owned(),
            reason: "path cannot be expressed as a file URI".to_string(),
        })
}

/// Build the indexing record for `source`.
///
/// Every call generates a fresh random id; identity across runs is carried
/// by `location`. The canonical CRS is declared both at the root and on the
/// grid, since consumers look in either place.
pub fn build_dataset_document(
    source: &RasterSource,
    footprint: &Footprint,
    time: &AcquisitionTime,
    product: &str,
    band: &str,
    canonical_crs: &str,
) -> Result<DatasetDocument> {
    let label = source.stem();
    let location = file_uri(&source.path)?;

    let mut grids = BTreeMap::new();
    grids.insert(
        "default".to_string(),
        Grid {
            shape: [source.shape.0, source.shape.1],
            transform: source.transform,
            crs: canonical_crs.to_string(),
        },
    );

    let mut measurements = BTreeMap::new();
    measurements.insert(
        band.to_string(),
        MeasurementPath {
            path: source.file_name(),
        },
    );

    Ok(DatasetDocument {
        id: Uuid::new_v4(),
        product: ProductRef {
            name: product.to_string(),
        },
        label: label.clone(),
        location,
        crs: canonical_crs.to_string(),
        properties: DatasetProperties {
            processing_datetime: Utc::now(),
            datetime: time.datetime,
            filename: label,
        },
        geometry: footprint.geometry.clone(),
        grids,
        measurements,
        lineage: BTreeMap::new(),
    })
}
