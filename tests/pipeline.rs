use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use sarcat::index::DatasetIndex;
use sarcat::io::writers::stac::Collection;
use sarcat::{
    Bounds, CatalogConfig, CatalogItem, Error, GdalError, JsonFileIndex, RasterIo, RasterSource,
    TimeProvenance, Verification, build_stac_catalog, index_directory,
};
use tempfile::TempDir;

#[derive(Clone)]
struct FakeRaster {
    crs: Option<&'static str>,
    bounds: [f64; 4],
    tag: Option<&'static str>,
}

/// In-memory raster backend keyed by file name
struct FakeIo {
    rasters: HashMap<String, FakeRaster>,
    valid_pixels: usize,
}

impl FakeIo {
    fn new(valid_pixels: usize) -> Self {
        Self {
            rasters: HashMap::new(),
            valid_pixels,
        }
    }

    fn with(mut self, name: &str, raster: FakeRaster) -> Self {
        self.rasters.insert(name.to_string(), raster);
        self
    }
}

impl RasterIo for FakeIo {
    fn open(&self, path: &Path) -> Result<RasterSource, GdalError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raster = self
            .rasters
            .get(&name)
            .ok_or_else(|| GdalError::UnsupportedFormat(name.clone()))?;
        let [min_x, min_y, max_x, max_y] = raster.bounds;
        let mut tags = HashMap::new();
        if let Some(tag) = raster.tag {
            tags.insert("TIFFTAG_DATETIME".to_string(), tag.to_string());
        }
        Ok(RasterSource {
            path: std::path::absolute(path)
                .map_err(|e| GdalError::UnsupportedFormat(e.to_string()))?,
            crs: raster.crs.map(str::to_string),
            bounds: Bounds {
                min_x,
                min_y,
                max_x,
                max_y,
            },
            shape: (10, 10),
            transform: [
                (max_x - min_x) / 10.0,
                0.0,
                min_x,
                0.0,
                -(max_y - min_y) / 10.0,
                max_y,
            ],
            tags,
        })
    }

    // Projected metres to degrees by a fixed factor
    fn transform_coords(
        &self,
        _from: &str,
        _to: &str,
        xs: &mut [f64],
        ys: &mut [f64],
    ) -> Result<(), GdalError> {
        xs.iter_mut().for_each(|x| *x /= 1000.0);
        ys.iter_mut().for_each(|y| *y /= 1000.0);
        Ok(())
    }

    fn valid_pixel_count(&self, _path: &Path, _band: usize) -> Result<usize, GdalError> {
        Ok(self.valid_pixels)
    }
}

fn geographic(bounds: [f64; 4], tag: Option<&'static str>) -> FakeRaster {
    FakeRaster {
        crs: Some("EPSG:4326"),
        bounds,
        tag,
    }
}

struct Workspace {
    _dir: TempDir,
    config: CatalogConfig,
}

fn workspace(files: &[&str]) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let input = root.join("cog_files");
    fs::create_dir_all(&input).unwrap();
    for name in files {
        fs::write(input.join(name), b"").unwrap();
    }
    let config = CatalogConfig {
        input_dir: input,
        stac_root: root.join("stac"),
        dataset_dir: root.join("odc_datasets"),
        product_dir: root.join("odc_products"),
        index_dir: root.join("odc_index"),
        ..CatalogConfig::default()
    };
    Workspace { _dir: dir, config }
}

fn read_item(stac_root: &Path, collection: &str, id: &str) -> CatalogItem {
    let path: PathBuf = stac_root.join(collection).join(id).join(format!("{}.json", id));
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

const TAGGED_HH: &str = "CAPELLA_C05_SP_GEC_HH_20230101000000_20230101000010.tif";
const NAMED_HH: &str = "CAPELLA_C05_SP_GEC_HH_20230601000000_20230601000010.tif";
const UNDATED_HH: &str = "site_GEC_HH_scene.tif";
const RAW_SLC: &str = "CAPELLA_C05_SP_SLC_HH_20230101000000_20230101000010.tif";

#[test]
fn missing_or_empty_input_directory_is_fatal() {
    let ws = workspace(&[]);
    let io = FakeIo::new(1);
    let err = build_stac_catalog(&ws.config, &io).unwrap_err();
    assert!(matches!(err, Error::ConfigurationFatal(_)));

    let mut config = ws.config.clone();
    config.input_dir = config.input_dir.join("does-not-exist");
    let mut index = JsonFileIndex::open(&config.index_dir).unwrap();
    let err = index_directory(&config, &io, &mut index).unwrap_err();
    assert!(matches!(err, Error::ConfigurationFatal(_)));
}

#[test]
fn browse_catalogs_undated_files_and_skips_unprojected_ones() {
    let ws = workspace(&[TAGGED_HH, UNDATED_HH, RAW_SLC]);
    let io = FakeIo::new(1)
        .with(TAGGED_HH, geographic([0.0, 0.0, 1.0, 1.0], Some("2023:01:01 00:00:00")))
        .with(UNDATED_HH, geographic([0.0, 0.0, 1.0, 1.0], None))
        .with(
            RAW_SLC,
            FakeRaster {
                crs: None,
                bounds: [0.0, 0.0, 100.0, 100.0],
                tag: None,
            },
        );

    let before = Utc::now();
    let report = build_stac_catalog(&ws.config, &io).unwrap();
    assert_eq!(report.batch.attempted, 3);
    assert_eq!(report.batch.succeeded, 2);
    assert_eq!(report.batch.skipped, 1);
    assert_eq!(report.batch.failed, 0);
    assert!(report.catalog_path.ends_with("catalog.json"));

    let undated = read_item(&ws.config.stac_root, "capella-local-imagery", "site_GEC_HH_scene");
    assert_eq!(undated.properties.datetime_source, TimeProvenance::FallbackNow);
    assert!(undated.properties.datetime >= before);

    let tagged = read_item(
        &ws.config.stac_root,
        "capella-local-imagery",
        "CAPELLA_C05_SP_GEC_HH_20230101000000_20230101000010",
    );
    assert_eq!(tagged.properties.datetime_source, TimeProvenance::Tag);
    assert!(
        !ws.config
            .stac_root
            .join("capella-local-imagery")
            .join("CAPELLA_C05_SP_SLC_HH_20230101000000_20230101000010")
            .exists()
    );
}

#[test]
fn collection_extent_is_union_of_items() {
    let ws = workspace(&[TAGGED_HH, NAMED_HH]);
    let io = FakeIo::new(1)
        .with(TAGGED_HH, geographic([0.0, 0.0, 1.0, 1.0], Some("2023:01:01 00:00:00")))
        .with(
            NAMED_HH,
            FakeRaster {
                crs: Some("EPSG:32633"),
                bounds: [2000.0, 2000.0, 3000.0, 3000.0],
                tag: None,
            },
        );

    build_stac_catalog(&ws.config, &io).unwrap();
    let path = ws
        .config
        .stac_root
        .join("capella-local-imagery")
        .join("collection.json");
    let collection: Collection = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

    let bbox = collection.extent.spatial.bbox[0];
    for (got, want) in bbox.iter().zip([0.0, 0.0, 3.0, 3.0]) {
        assert!((got - want).abs() < 1e-9, "{:?}", bbox);
    }
    assert_eq!(
        collection.extent.temporal.interval,
        vec![[
            Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap()),
        ]]
    );
    assert_eq!(collection.links.iter().filter(|l| l.rel == "item").count(), 2);
}

#[test]
fn index_registers_once_and_updates_on_rerun() {
    const PREVIEW: &str = "CAPELLA_C05_SP_GEC_HH_20230101000000_preview.tif";
    const VV: &str = "CAPELLA_C05_SP_GEC_VV_20230301000000_20230301000010.tif";
    let ws = workspace(&[TAGGED_HH, UNDATED_HH, PREVIEW, VV, RAW_SLC]);
    let raw = FakeRaster {
        crs: Some("EPSG:4326"),
        bounds: [0.0, 0.0, 1.0, 1.0],
        tag: None,
    };
    let io = FakeIo::new(42)
        .with(TAGGED_HH, geographic([0.0, 0.0, 1.0, 1.0], Some("2023:01:01 00:00:00")))
        .with(UNDATED_HH, geographic([0.0, 0.0, 1.0, 1.0], None))
        .with(PREVIEW, geographic([0.0, 0.0, 1.0, 1.0], None))
        .with(VV, geographic([1.0, 1.0, 2.0, 2.0], None))
        .with(RAW_SLC, raw);

    let mut index = JsonFileIndex::open(&ws.config.index_dir).unwrap();
    let first = index_directory(&ws.config, &io, &mut index).unwrap();
    assert_eq!(first.batch.attempted, 5);
    assert_eq!(first.batch.succeeded, 2);
    // preview and unclassified SLC
    assert_eq!(first.batch.skipped, 2);
    // undated file cannot be indexed
    assert_eq!(first.batch.failed, 1);
    assert_eq!(first.added, 2);
    assert_eq!(first.updated, 0);
    assert!(first.verification.passed(), "{}", first.verification);
    assert!(matches!(
        first.verification,
        Verification::Passed { valid_pixels: 42, .. }
    ));

    let hh_id = index.find_datasets("capella_gec_hh")[0].id;
    assert!(ws.config.product_dir.join("capella_gec_hh.yaml").exists());
    assert!(ws.config.product_dir.join("capella_gec_vv.yaml").exists());
    assert!(
        ws.config
            .dataset_dir
            .join("ds_CAPELLA_C05_SP_GEC_HH_20230101000000_20230101000010.yaml")
            .exists()
    );

    let mut reopened = JsonFileIndex::open(&ws.config.index_dir).unwrap();
    assert_eq!(reopened.dataset_count(), 2);
    let second = index_directory(&ws.config, &io, &mut reopened).unwrap();
    assert_eq!(second.added, 0);
    assert_eq!(second.updated, 2);
    assert_eq!(reopened.dataset_count(), 2);
    assert_eq!(reopened.find_datasets("capella_gec_hh")[0].id, hh_id);
}

#[test]
fn verification_reports_empty_pixels_and_missing_datasets() {
    let ws = workspace(&[TAGGED_HH]);
    let io = FakeIo::new(0).with(
        TAGGED_HH,
        geographic([0.0, 0.0, 1.0, 1.0], Some("2023:01:01 00:00:00")),
    );
    let mut index = JsonFileIndex::open(&ws.config.index_dir).unwrap();
    let report = index_directory(&ws.config, &io, &mut index).unwrap();
    assert!(matches!(report.verification, Verification::EmptyPixels { .. }));

    let mut config = ws.config.clone();
    config.verify_product = "capella_gec_vv".to_string();
    config.verify_band = "vv".to_string();
    let report = index_directory(&config, &io, &mut index).unwrap();
    assert!(matches!(report.verification, Verification::NoDatasets { .. }));
}

#[test]
fn verification_is_skipped_when_nothing_was_indexed() {
    let ws = workspace(&[UNDATED_HH]);
    let io = FakeIo::new(7).with(UNDATED_HH, geographic([0.0, 0.0, 1.0, 1.0], None));
    let mut index = JsonFileIndex::open(&ws.config.index_dir).unwrap();
    let report = index_directory(&ws.config, &io, &mut index).unwrap();
    assert_eq!(report.batch.failed, 1);
    assert_eq!(report.verification, Verification::Skipped);
}

#[test]
fn single_timestamp_capella_name_indexes_end_to_end() {
    const SINGLE: &str = "X_GEC_HH_20230101000000.tif";
    let ws = workspace(&[SINGLE]);
    let io = FakeIo::new(5).with(SINGLE, geographic([0.0, 0.0, 1.0, 1.0], None));
    let mut index = JsonFileIndex::open(&ws.config.index_dir).unwrap();
    let report = index_directory(&ws.config, &io, &mut index).unwrap();
    assert_eq!(report.batch.succeeded, 1);
    assert_eq!(report.added, 1);
    assert!(report.verification.passed(), "{}", report.verification);

    let datasets = index.find_datasets("capella_gec_hh");
    assert_eq!(datasets.len(), 1);
    let document = &datasets[0].document;
    assert_eq!(
        document.properties.datetime,
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
    );
    assert!(document.measurements.contains_key("hh"));
    assert!(ws.config.dataset_dir.join("ds_X_GEC_HH_20230101000000.yaml").exists());
}

#[test]
fn unreadable_raster_is_skipped_not_failed() {
    const BROKEN: &str = "CAPELLA_C05_SP_GEC_HH_20230201000000_20230201000010.tif";
    let ws = workspace(&[TAGGED_HH, BROKEN]);
    // BROKEN is unknown to the backend, so opening it fails
    let io = FakeIo::new(1).with(
        TAGGED_HH,
        geographic([0.0, 0.0, 1.0, 1.0], Some("2023:01:01 00:00:00")),
    );
    let report = build_stac_catalog(&ws.config, &io).unwrap();
    assert_eq!(report.batch.attempted, 2);
    assert_eq!(report.batch.succeeded, 1);
    assert_eq!(report.batch.skipped, 1);
    assert_eq!(report.batch.failed, 0);
}

#[test]
fn cli_exits_non_zero_on_empty_input_directory() {
    let ws = workspace(&[]);
    let status = std::process::Command::new(env!("CARGO_BIN_EXE_sarcat"))
        .arg("--input-dir")
        .arg(&ws.config.input_dir)
        .arg("--stac-root")
        .arg(&ws.config.stac_root)
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!ws.config.stac_root.join("catalog.json").exists());
}
