//! Filename-driven classification: which product/band a raster belongs to,
//! and which asset roles it plays in a browsing catalog.
use crate::core::config::{ProductRule, RoleRule};
use crate::error::{Error, Result};
use crate::types::AssetRole;

const THUMBNAIL_MARKER: &str = "preview";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Recognized { product: String, band: String },
    Thumbnail,
    Unclassified,
}

impl Classification {
    /// Product and band of an indexable file; thumbnails and unknowns are ineligible
    pub fn into_product(self, file: &str) -> Result<(String, String)> {
        match self {
            Classification::Recognized { product, band } => Ok((product, band)),
            Classification::Thumbnail => Err(Error::ThumbnailNotIndexable {
                file: file.to_string(),
            }),
            Classification::Unclassified => Err(Error::UnclassifiedProduct {
                file: file.to_string(),
            }),
        }
    }
}

pub trait Classify {
    fn classify(&self, stem: &str) -> Classification;
}

/// Ordered marker table; the first rule whose marker occurs in the stem wins
#[derive(Debug, Clone)]
pub struct RuleClassifier<'a> {
    rules: &'a [ProductRule],
}

impl<'a> RuleClassifier<'a> {
    pub fn new(rules: &'a [ProductRule]) -> Self {
        Self { rules }
    }
}

impl Classify for RuleClassifier<'_> {
    fn classify(&self, stem: &str) -> Classification {
        if stem.contains(THUMBNAIL_MARKER) {
            return Classification::Thumbnail;
        }
        self.rules
            .iter()
            .find(|rule| stem.contains(&rule.marker))
            .map(|rule| Classification::Recognized {
                product: rule.product.clone(),
                band: rule.band.clone(),
            })
            .unwrap_or(Classification::Unclassified)
    }
}

/// Roles for an asset file name: first matching rule, `default` otherwise
pub fn asset_roles(file_name: &str, rules: &[RoleRule], default: &[AssetRole]) -> Vec<AssetRole> {
    rules
        .iter()
        .find(|rule| rule.markers.iter().any(|m| file_name.contains(m.as_str())))
        .map(|rule| rule.roles.clone())
        .unwrap_or_else(|| default.to_vec())
}
