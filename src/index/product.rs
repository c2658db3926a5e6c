use serde::{Deserialize, Serialize};

use crate::core::config::CatalogConfig;
use crate::core::records::ProductRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storage {
    pub crs: String,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDef {
    pub name: String,
    pub dtype: String,
    pub nodata: f64,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub product: ProductRef,
}

/// Static registration record for a class of datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDefinition {
    pub name: String,
    pub description: String,
    pub license: String,
    pub metadata_type: String,
    pub metadata: ProductMetadata,
    pub storage: Storage,
    pub measurements: Vec<MeasurementDef>,
}

impl ProductDefinition {
    /// Single-band float32 Capella GEC product on a 0.0001 degree grid
    pub fn capella_gec(name: &str, band: &str, license: &str, crs: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Capella GEC {} Polarization", band.to_uppercase()),
            license: license.to_string(),
            metadata_type: "eo3".to_string(),
            metadata: ProductMetadata {
                product: ProductRef {
                    name: name.to_string(),
                },
            },
            storage: Storage {
                crs: crs.to_string(),
                resolution: Resolution {
                    latitude: -0.0001,
                    longitude: 0.0001,
                },
            },
            measurements: vec![MeasurementDef {
                name: band.to_string(),
                dtype: "float32".to_string(),
                nodata: 0.0,
                units: "1".to_string(),
            }],
        }
    }

    pub fn declares(&self, measurement: &str) -> bool {
        self.measurements.iter().any(|m| m.name == measurement)
    }
}

/// One definition per product named in the configured rule table,
/// carrying every band the rules assign to it
pub fn products_from_config(config: &CatalogConfig) -> Vec<ProductDefinition> {
    let mut products: Vec<ProductDefinition> = Vec::new();
    for rule in &config.product_rules {
        match products.iter_mut().find(|p| p.name == rule.product) {
            Some(existing) if existing.declares(&rule.band) => {}
            Some(existing) => {
                let mut extra = existing.measurements[0].clone();
                extra.name = rule.band.clone();
                existing.measurements.push(extra);
            }
            None => products.push(ProductDefinition::capella_gec(
                &rule.product,
                &rule.band,
                &config.license,
                &config.canonical_crs,
            )),
        }
    }
    products
}
