use gdal::raster::ResampleAlg;
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use gdal::{Dataset, Metadata, errors::GdalError as GdalCrateError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors encountered when using the GDAL raster backend
#[derive(Debug, Error)]
pub enum GdalError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalCrateError),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Dimension mismatch: expected {0}x{1}, got {2}")]
    DimensionMismatch(usize, usize, usize),
}

/// Axis-aligned extent in the units of some spatial reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// Read-only view over one raster file, detached from the GDAL handle that produced it
#[derive(Debug, Clone)]
pub struct RasterSource {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Native spatial reference (`EPSG:<code>` when an authority is present, raw WKT otherwise)
    pub crs: Option<String>,
    /// Native-CRS extent of the full pixel grid
    pub bounds: Bounds,
    /// Pixel shape as (rows, cols)
    pub shape: (usize, usize),
    /// Affine coefficients in `a, b, c, d, e, f` order:
    /// x = a*col + b*row + c, y = d*col + e*row + f
    pub transform: [f64; 6],
    /// Default-domain metadata items (TIFF tags surface here as `TIFFTAG_*`)
    pub tags: HashMap<String, String>,
}

impl RasterSource {
    /// File name including extension, lossy
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension; used as the catalog item id
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Raster I/O and coordinate transformation capabilities the pipeline consumes.
///
/// The GDAL-backed [`GdalRasterIo`] is the production implementation; tests
/// substitute in-memory fakes.
pub trait RasterIo {
    /// Open a raster, read everything the pipeline needs and release the handle
    fn open(&self, path: &Path) -> Result<RasterSource, GdalError>;

    /// Transform coordinate pairs in place from one spatial reference to another,
    /// in x/y (longitude/latitude) axis order
    fn transform_coords(
        &self,
        from: &str,
        to: &str,
        xs: &mut [f64],
        ys: &mut [f64],
    ) -> Result<(), GdalError>;

    /// Count pixels of a band (1-based) that are neither NaN nor zero
    fn valid_pixel_count(&self, path: &Path, band: usize) -> Result<usize, GdalError>;
}

/// `EPSG:<code>` when the root of a projection definition carries an EPSG
/// authority, the definition itself otherwise; `None` for an empty projection.
/// Nested authorities (datum, unit) never name the CRS.
pub(crate) fn crs_from_projection(proj: &str) -> Option<String> {
    let proj = proj.trim();
    if proj.is_empty() {
        return None;
    }
    if proj.starts_with("EPSG:") {
        return Some(proj.to_string());
    }
    let root_epsg = SpatialRef::from_wkt(proj).ok().and_then(|srs| {
        let name = srs.auth_name().ok()?;
        let code = srs.auth_code().ok()?;
        name.eq_ignore_ascii_case("EPSG").then(|| format!("EPSG:{}", code))
    });
    Some(root_epsg.unwrap_or_else(|| proj.to_string()))
}

/// Convert a GDAL geotransform `[c, a, b, f, d, e]` into affine `[a, b, c, d, e, f]` order
pub(crate) fn affine_from_geotransform(gt: [f64; 6]) -> [f64; 6] {
    [gt[1], gt[2], gt[0], gt[4], gt[5], gt[3]]
}

/// Extent of a `rows x cols` grid under an affine transform
pub(crate) fn bounds_from_affine(transform: [f64; 6], shape: (usize, usize)) -> Bounds {
    let [a, b, c, d, e, f] = transform;
    let (rows, cols) = (shape.0 as f64, shape.1 as f64);
    let corners = [(0.0, 0.0), (cols, 0.0), (0.0, rows), (cols, rows)];
    let mut bounds = Bounds {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for (col, row) in corners {
        let x = a * col + b * row + c;
        let y = d * col + e * row + f;
        bounds.min_x = bounds.min_x.min(x);
        bounds.min_y = bounds.min_y.min(y);
        bounds.max_x = bounds.max_x.max(x);
        bounds.max_y = bounds.max_y.max(y);
    }
    bounds
}

/// Reader for GeoTIFF/COG rasters via GDAL
pub struct GdalReader {
    pub dataset: Dataset,
    pub source: RasterSource,
}

impl GdalReader {
    /// Open a GDAL-supported raster and extract georeferencing and tags
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GdalError> {
        let path = path.as_ref();
        let dataset = Dataset::open(path)?;
        let (size_x, size_y) = dataset.raster_size();
        if dataset.raster_count() == 0 {
            return Err(GdalError::UnsupportedFormat("No raster bands found".into()));
        }
        let geotransform = match dataset.geo_transform() {
            Ok(gt) => gt,
            Err(_) => [0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        };
        // GCP-only rasters (SLC) report an empty projection and stay without CRS
        let crs = crs_from_projection(&dataset.projection());
        let mut tags = HashMap::new();
        if let Some(entries) = dataset.metadata_domain("") {
            for entry in entries {
                if let Some((key, val)) = entry.split_once('=') {
                    tags.insert(key.to_string(), val.to_string());
                }
            }
        }
        let shape = (size_y as usize, size_x as usize);
        let transform = affine_from_geotransform(geotransform);
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        debug!("Opened {:?}: shape={:?} crs={:?}", absolute, shape, crs);
        Ok(GdalReader {
            dataset,
            source: RasterSource {
                path: absolute,
                crs,
                bounds: bounds_from_affine(transform, shape),
                shape,
                transform,
                tags,
            },
        })
    }

    /// Read a single band (1-based index) as an f64 ndarray of shape (rows, cols)
    pub fn read_band(
        &self,
        index: usize,
        e_resample_alg: Option<ResampleAlg>,
    ) -> Result<Array2<f64>, GdalError> {
        if index == 0 || index > self.dataset.raster_count() as usize {
            return Err(GdalError::UnsupportedFormat(format!(
                "Band index {} out of range",
                index
            )));
        }
        let band = self.dataset.rasterband(index)?;
        let (rows, cols) = self.source.shape;
        let window = (cols, rows);
        let buf = band.read_as::<f64>((0, 0), window, window, e_resample_alg)?;
        let data_vec = buf.data().to_vec();
        let len = data_vec.len();
        Array2::from_shape_vec((rows, cols), data_vec)
            .map_err(|_| GdalError::DimensionMismatch(cols, rows, len))
    }
}

/// Production [`RasterIo`] backed by GDAL
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalRasterIo;

impl RasterIo for GdalRasterIo {
    fn open(&self, path: &Path) -> Result<RasterSource, GdalError> {
        // Dataset handle is dropped here; only the detached view escapes
        let reader = GdalReader::open(path)?;
        Ok(reader.source)
    }

    fn transform_coords(
        &self,
        from: &str,
        to: &str,
        xs: &mut [f64],
        ys: &mut [f64],
    ) -> Result<(), GdalError> {
        let mut source_srs = SpatialRef::from_definition(from)?;
        let mut target_srs = SpatialRef::from_definition(to)?;
        // GeoJSON wants [longitude, latitude] regardless of the EPSG axis order
        source_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        target_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        let transform = CoordTransform::new(&source_srs, &target_srs)?;
        let mut zs = vec![0.0; xs.len()];
        transform.transform_coords(xs, ys, &mut zs)?;
        Ok(())
    }

    fn valid_pixel_count(&self, path: &Path, band: usize) -> Result<usize, GdalError> {
        let reader = GdalReader::open(path)?;
        let data = reader.read_band(band, Some(ResampleAlg::NearestNeighbour))?;
        Ok(data.iter().filter(|v| !v.is_nan() && **v != 0.0).count())
    }
}
