//! Shared types and enums used across SARCAT.
//! Includes the run `Mode`, asset roles (`AssetRole`), and the provenance of
//! a resolved acquisition time (`TimeProvenance`).
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which output a run produces
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Browsable STAC catalog; undated files fall back to the current time
    Browse,
    /// Indexed EO3 dataset store; undated files are rejected
    Index,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Browse => write!(f, "browse"),
            Mode::Index => write!(f, "index"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetRole {
    Data,
    Thumbnail,
    Visual,
}

impl std::fmt::Display for AssetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AssetRole::Data => "data",
            AssetRole::Thumbnail => "thumbnail",
            AssetRole::Visual => "visual",
        };
        write!(f, "{}", s)
    }
}

/// How an acquisition time was obtained
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeProvenance {
    Tag,
    Filename,
    FallbackNow,
}

impl std::fmt::Display for TimeProvenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeProvenance::Tag => write!(f, "tag"),
            TimeProvenance::Filename => write!(f, "filename"),
            TimeProvenance::FallbackNow => write!(f, "fallback-now"),
        }
    }
}
