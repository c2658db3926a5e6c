//! Acquisition time resolution with a fixed fallback order:
//! embedded TIFF tag, then filename timestamp, then (browsing only) the current time.
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::io::gdal::RasterSource;
use crate::types::{Mode, TimeProvenance};

/// Tag keys consulted in order
pub const DATETIME_TAGS: [&str; 2] = ["TIFFTAG_DATETIME", "DATETIME"];
/// TIFF DateTime tag layout
pub const TAG_PATTERN: &str = "%Y:%m:%d %H:%M:%S";
/// Capella filename timestamp layout
pub const FILENAME_PATTERN: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionTime {
    pub datetime: DateTime<Utc>,
    pub provenance: TimeProvenance,
}

/// Parse the first non-empty datetime tag; malformed content is a non-match
pub fn time_from_tags(source: &RasterSource) -> Option<NaiveDateTime> {
    let raw = DATETIME_TAGS
        .iter()
        .filter_map(|key| source.tags.get(*key))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())?;
    match NaiveDateTime::parse_from_str(raw, TAG_PATTERN) {
        Ok(dt) => Some(dt),
        Err(e) => {
            warn!(
                "Unparseable datetime tag {:?} in {}: {}; trying filename",
                raw,
                source.file_name(),
                e
            );
            None
        }
    }
}

/// Parse the timestamp token of an underscore-delimited stem.
///
/// The token is the second-from-last, or the third-from-last when the stem
/// ends in `_preview`. If that token is missing or malformed the token after
/// it is tried, which covers names carrying a single timestamp.
pub fn time_from_filename(stem: &str) -> Option<NaiveDateTime> {
    let mut parts: Vec<&str> = stem.split('_').collect();
    if parts.last() == Some(&"preview") {
        parts.pop();
    }
    let n = parts.len();
    let designated = n.checked_sub(2).map(|i| parts[i]);
    let last = if n >= 2 { parts.last().copied() } else { None };
    designated
        .into_iter()
        .chain(last)
        .find_map(|token| NaiveDateTime::parse_from_str(token, FILENAME_PATTERN).ok())
}

/// Resolve one acquisition time for `source`.
///
/// In [`Mode::Browse`] this always succeeds, falling back to the current time.
/// In [`Mode::Index`] an undated file fails with
/// [`Error::TimestampUnresolvable`]; a fabricated time is never indexed.
pub fn resolve_acquisition_time(source: &RasterSource, mode: Mode) -> Result<AcquisitionTime> {
    if let Some(dt) = time_from_tags(source) {
        debug!("{}: datetime from TIFF tag: {}", source.file_name(), dt);
        return Ok(AcquisitionTime {
            datetime: dt.and_utc(),
            provenance: TimeProvenance::Tag,
        });
    }
    if let Some(dt) = time_from_filename(&source.stem()) {
        debug!("{}: datetime from filename: {}", source.file_name(), dt);
        return Ok(AcquisitionTime {
            datetime: dt.and_utc(),
            provenance: TimeProvenance::Filename,
        });
    }
    match mode {
        Mode::Browse => {
            warn!(
                "{}: neither TIFF tag nor filename carries a datetime; using current time",
                source.file_name()
            );
            Ok(AcquisitionTime {
                datetime: Utc::now(),
                provenance: TimeProvenance::FallbackNow,
            })
        }
        Mode::Index => Err(Error::TimestampUnresolvable {
            file: source.file_name(),
        }),
    }
}
