//! Spatial footprint resolution: native extent to canonical bbox + boundary polygon.
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{Error, Result};
use crate::io::gdal::{Bounds, RasterIo, RasterSource};

/// Points sampled per bbox edge when reprojecting, so curved edges are covered
const DENSIFY_POINTS: usize = 21;

/// Bounding box and boundary polygon, both in the canonical reference system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// `[min_x, min_y, max_x, max_y]`
    pub bbox: [f64; 4],
    /// GeoJSON Polygon
    pub geometry: serde_json::Value,
}

/// Closed GeoJSON ring through the given corners
fn polygon(corners: &[(f64, f64); 4]) -> serde_json::Value {
    let ring: Vec<[f64; 2]> = corners
        .iter()
        .chain(std::iter::once(&corners[0]))
        .map(|&(x, y)| [x, y])
        .collect();
    json!({ "type": "Polygon", "coordinates": [ring] })
}

fn box_corners(b: &Bounds) -> [(f64, f64); 4] {
    [
        (b.min_x, b.min_y),
        (b.max_x, b.min_y),
        (b.max_x, b.max_y),
        (b.min_x, b.max_y),
    ]
}

/// Boundary of `b` walked counter-clockwise with `DENSIFY_POINTS` samples per edge
fn densified_ring(b: &Bounds) -> (Vec<f64>, Vec<f64>) {
    let corners = box_corners(b);
    let mut xs = Vec::with_capacity(4 * DENSIFY_POINTS);
    let mut ys = Vec::with_capacity(4 * DENSIFY_POINTS);
    for i in 0..4 {
        let (x0, y0) = corners[i];
        let (x1, y1) = corners[(i + 1) % 4];
        for k in 0..DENSIFY_POINTS {
            let t = k as f64 / DENSIFY_POINTS as f64;
            xs.push(x0 + (x1 - x0) * t);
            ys.push(y0 + (y1 - y0) * t);
        }
    }
    (xs, ys)
}

pub fn same_crs(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Resolve the footprint of `source` in `canonical_crs`.
///
/// A source without a spatial reference is ineligible and yields
/// [`Error::NoSpatialReference`]; it never receives a default geometry.
/// The bbox and polygon are produced from one set of transformed
/// coordinates, so they cannot drift apart.
pub fn resolve_footprint(
    source: &RasterSource,
    canonical_crs: &str,
    io: &dyn RasterIo,
) -> Result<Footprint> {
    let native = source
        .crs
        .as_deref()
        .ok_or_else(|| Error::NoSpatialReference {
            file: source.file_name(),
        })?;

    let bounds = source.bounds;
    if same_crs(native, canonical_crs) {
        return Ok(Footprint {
            bbox: bounds.to_array(),
            geometry: polygon(&box_corners(&bounds)),
        });
    }

    debug!("Reprojecting {} from {} to {}", source.file_name(), native, canonical_crs);
    let reprojection_error = |reason: String| Error::Reprojection {
        from: native.to_string(),
        to: canonical_crs.to_string(),
        reason,
    };

    let (mut xs, mut ys) = densified_ring(&bounds);
    io.transform_coords(native, canonical_crs, &mut xs, &mut ys)
        .map_err(|e| reprojection_error(e.to_string()))?;
    if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
        return Err(reprojection_error("non-finite coordinates".to_string()));
    }

    let fold_min = |v: &[f64]| v.iter().cloned().fold(f64::INFINITY, f64::min);
    let fold_max = |v: &[f64]| v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let bbox = [
        fold_min(&xs[..]),
        fold_min(&ys[..]),
        fold_max(&xs[..]),
        fold_max(&ys[..]),
    ];

    // Corner i sits at sample i * DENSIFY_POINTS of the ring
    let corner = |i: usize| (xs[i * DENSIFY_POINTS], ys[i * DENSIFY_POINTS]);
    let geometry = polygon(&[corner(0), corner(1), corner(2), corner(3)]);

    Ok(Footprint { bbox, geometry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::gdal::GdalError;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    /// Doubles x and shifts y by +1; fails for the "EPSG:0" source
    struct ScaleIo;

    impl RasterIo for ScaleIo {
        fn open(&self, _path: &Path) -> std::result::Result<RasterSource, GdalError> {
            Err(GdalError::UnsupportedFormat("not used".into()))
        }

        fn transform_coords(
            &self,
            from: &str,
            _to: &str,
            xs: &mut [f64],
            ys: &mut [f64],
        ) -> std::result::Result<(), GdalError> {
            if from == "EPSG:0" {
                return Err(GdalError::UnsupportedFormat("unknown CRS".into()));
            }
            xs.iter_mut().for_each(|x| *x *= 2.0);
            ys.iter_mut().for_each(|y| *y += 1.0);
            Ok(())
        }

        fn valid_pixel_count(&self, _: &Path, _: usize) -> std::result::Result<usize, GdalError> {
            Ok(0)
        }
    }

    fn source(crs: Option<&str>) -> RasterSource {
        RasterSource {
            path: PathBuf::from("/data/X_GEC_HH_20230101000000.tif"),
            crs: crs.map(str::to_string),
            bounds: Bounds {
                min_x: 10.0,
                min_y: 20.0,
                max_x: 11.0,
                max_y: 21.0,
            },
            shape: (10, 10),
            transform: [0.1, 0.0, 10.0, 0.0, -0.1, 21.0],
            tags: HashMap::new(),
        }
    }

    #[test]
    fn missing_crs_is_ineligible() {
        let err = resolve_footprint(&source(None), "EPSG:4326", &ScaleIo).unwrap_err();
        assert!(matches!(err, Error::NoSpatialReference { .. }));
        assert!(err.is_ineligible());
    }

    #[test]
    fn canonical_source_passes_through() {
        let fp = resolve_footprint(&source(Some("epsg:4326")), "EPSG:4326", &ScaleIo).unwrap();
        assert_eq!(fp.bbox, [10.0, 20.0, 11.0, 21.0]);
        assert_eq!(
            fp.geometry["coordinates"][0],
            json!([[10.0, 20.0], [11.0, 20.0], [11.0, 21.0], [10.0, 21.0], [10.0, 20.0]])
        );
    }

    #[test]
    fn bbox_and_polygon_come_from_one_transform() {
        let fp = resolve_footprint(&source(Some("EPSG:32633")), "EPSG:4326", &ScaleIo).unwrap();
        assert_eq!(fp.bbox, [20.0, 21.0, 22.0, 22.0]);
        let ring = fp.geometry["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], json!([20.0, 21.0]));
        assert_eq!(ring[2], json!([22.0, 22.0]));
        assert_eq!(ring[0], ring[4]);
    }

    #[test]
    fn transform_failure_is_reported() {
        let err = resolve_footprint(&source(Some("EPSG:0")), "EPSG:4326", &ScaleIo).unwrap_err();
        assert!(matches!(err, Error::Reprojection { .. }));
    }
}
