use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::AssetRole;

/// Filename marker that identifies a registered product and its measurement band
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRule {
    pub marker: String,
    pub product: String,
    pub band: String,
}

/// Asset roles assigned when any of `markers` occurs in the filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRule {
    pub markers: Vec<String>,
    pub roles: Vec<AssetRole>,
}

/// Run configuration, constructed once and passed by reference to every stage.
/// Suitable for JSON config files; CLI flags override individual fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub input_dir: PathBuf,
    /// Extension filter, without the dot; matched case-insensitively
    pub extension: String,
    pub canonical_crs: String,

    pub stac_root: PathBuf,
    pub catalog_id: String,
    pub catalog_description: String,
    pub collection_id: String,
    pub collection_description: String,
    pub license: String,

    pub dataset_dir: PathBuf,
    pub product_dir: PathBuf,
    pub index_dir: PathBuf,
    /// Product whose first dataset is read back after indexing
    pub verify_product: String,
    pub verify_band: String,

    /// Evaluated in order; first match wins
    pub product_rules: Vec<ProductRule>,
    /// Evaluated in order; first match wins, `default_roles` otherwise
    pub role_rules: Vec<RoleRule>,
    pub default_roles: Vec<AssetRole>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("cog_files"),
            extension: "tif".to_string(),
            canonical_crs: "EPSG:4326".to_string(),
            stac_root: PathBuf::from("stac"),
            catalog_id: "capella-custom-catalog".to_string(),
            catalog_description: "Personal Capella STAC catalog".to_string(),
            collection_id: "capella-local-imagery".to_string(),
            collection_description: "Locally collected Capella satellite imagery".to_string(),
            license: "proprietary".to_string(),
            dataset_dir: PathBuf::from("odc_datasets"),
            product_dir: PathBuf::from("odc_products"),
            index_dir: PathBuf::from("odc_index"),
            verify_product: "capella_gec_hh".to_string(),
            verify_band: "hh".to_string(),
            product_rules: vec![
                ProductRule {
                    marker: "_GEC_HH_".to_string(),
                    product: "capella_gec_hh".to_string(),
                    band: "hh".to_string(),
                },
                ProductRule {
                    marker: "_GEC_VV_".to_string(),
                    product: "capella_gec_vv".to_string(),
                    band: "vv".to_string(),
                },
            ],
            role_rules: vec![
                RoleRule {
                    markers: vec!["preview".to_string()],
                    roles: vec![AssetRole::Thumbnail],
                },
                RoleRule {
                    markers: vec!["GEC".to_string(), "GEO".to_string()],
                    roles: vec![AssetRole::Data, AssetRole::Visual],
                },
            ],
            default_roles: vec![AssetRole::Data],
        }
    }
}

impl CatalogConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigurationFatal(format!("cannot read config {:?}: {}", path, e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            Error::ConfigurationFatal(format!("cannot parse config {:?}: {}", path, e))
        })
    }
}
