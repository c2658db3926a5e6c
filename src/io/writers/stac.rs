//! Self-contained STAC tree: one root catalog, one collection, N items.
//! Links are written relative to each document so the tree can be moved
//! as a whole; asset hrefs stay absolute.
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::CatalogConfig;
use crate::core::records::{CatalogItem, Link, STAC_VERSION};
use crate::error::{Error, Result};
use crate::io::writers::eo3::write_atomic;

const CATALOG_FILE: &str = "catalog.json";
const COLLECTION_FILE: &str = "collection.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "type")]
    pub kind: String,
    pub stac_version: String,
    pub id: String,
    pub description: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub bbox: Vec<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalExtent {
    pub interval: Vec<[Option<DateTime<Utc>>; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub spatial: SpatialExtent,
    pub temporal: TemporalExtent,
}

impl Extent {
    /// Open extent used until items are known
    pub fn unbounded() -> Self {
        Self {
            spatial: SpatialExtent {
                bbox: vec![[-180.0, -90.0, 180.0, 90.0]],
            },
            temporal: TemporalExtent {
                interval: vec![[None, None]],
            },
        }
    }

    /// Union of item bboxes and the [earliest, latest] item datetime
    pub fn from_items(items: &[CatalogItem]) -> Option<Self> {
        let first = items.first()?;
        let mut bbox = first.bbox;
        let mut start = first.properties.datetime;
        let mut end = start;
        for item in &items[1..] {
            bbox[0] = bbox[0].min(item.bbox[0]);
            bbox[1] = bbox[1].min(item.bbox[1]);
            bbox[2] = bbox[2].max(item.bbox[2]);
            bbox[3] = bbox[3].max(item.bbox[3]);
            start = start.min(item.properties.datetime);
            end = end.max(item.properties.datetime);
        }
        Some(Self {
            spatial: SpatialExtent { bbox: vec![bbox] },
            temporal: TemporalExtent {
                interval: vec![[Some(start), Some(end)]],
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    #[serde(rename = "type")]
    pub kind: String,
    pub stac_version: String,
    pub id: String,
    pub description: String,
    pub license: String,
    pub extent: Extent,
    pub links: Vec<Link>,
}

/// In-memory catalog tree; items are collected first and the collection
/// extent is recomputed once, after the last item was added
#[derive(Debug, Clone)]
pub struct StacTree {
    pub catalog: Catalog,
    pub collection: Collection,
    pub items: Vec<CatalogItem>,
}

impl StacTree {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            catalog: Catalog {
                kind: "Catalog".to_string(),
                stac_version: STAC_VERSION.to_string(),
                id: config.catalog_id.clone(),
                description: config.catalog_description.clone(),
                links: Vec::new(),
            },
            collection: Collection {
                kind: "Collection".to_string(),
                stac_version: STAC_VERSION.to_string(),
                id: config.collection_id.clone(),
                description: config.collection_description.clone(),
                license: config.license.clone(),
                extent: Extent::unbounded(),
                links: Vec::new(),
            },
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: CatalogItem) {
        self.items.push(item);
    }

    pub fn update_extent_from_items(&mut self) {
        if let Some(extent) = Extent::from_items(&self.items) {
            self.collection.extent = extent;
        }
    }

    fn collection_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.collection.id)
    }

    /// Rewrite every link relative to `root` and write the tree below it.
    /// Returns the path of the root catalog.
    pub fn save(&mut self, root: &Path) -> Result<PathBuf> {
        let coll_id = self.collection.id.clone();

        self.catalog.links = vec![
            Link::json("root", format!("./{}", CATALOG_FILE), None),
            Link::json(
                "child",
                format!("./{}/{}", coll_id, COLLECTION_FILE),
                Some(coll_id.clone()),
            ),
        ];

        let mut coll_links = vec![
            Link::json("root", format!("../{}", CATALOG_FILE), None),
            Link::json("parent", format!("../{}", CATALOG_FILE), None),
        ];
        for item in &mut self.items {
            coll_links.push(Link::json(
                "item",
                format!("./{0}/{0}.json", item.id),
                None,
            ));
            item.collection = Some(coll_id.clone());
            item.links = vec![
                Link::json("root", format!("../../{}", CATALOG_FILE), None),
                Link::json("collection", format!("../{}", COLLECTION_FILE), None),
                Link::json("parent", format!("../{}", COLLECTION_FILE), None),
            ];
        }
        self.collection.links = coll_links;

        let catalog_path = root.join(CATALOG_FILE);
        write_json(&catalog_path, &self.catalog)?;
        let coll_dir = self.collection_dir(root);
        write_json(&coll_dir.join(COLLECTION_FILE), &self.collection)?;
        for item in &self.items {
            let item_path = coll_dir.join(&item.id).join(format!("{}.json", item.id));
            write_json(&item_path, item)?;
        }
        info!(
            "Saved STAC catalog {:?} with {} item(s)",
            catalog_path,
            self.items.len()
        );
        Ok(catalog_path)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    write_atomic(path, text.as_bytes())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::persistence(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

fn follow(base: &Path, links: &[Link], rel: &str) -> Option<PathBuf> {
    let link = links.iter().find(|l| l.rel == rel)?;
    let dir = base.parent()?;
    Some(dir.join(link.href.trim_start_matches("./")))
}

/// Walk a saved tree from `catalog.json` through its first child to the first item
pub fn read_first_item(catalog_path: &Path) -> Result<Option<CatalogItem>> {
    let catalog: Catalog = read_json(catalog_path)?;
    let Some(coll_path) = follow(catalog_path, &catalog.links, "child") else {
        return Ok(None);
    };
    let collection: Collection = read_json(&coll_path)?;
    let Some(item_path) = follow(&coll_path, &collection.links, "item") else {
        return Ok(None);
    };
    Ok(Some(read_json(&item_path)?))
}
