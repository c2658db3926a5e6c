use clap::Parser;
use std::path::PathBuf;

use sarcat::Mode;

#[derive(Parser)]
#[command(name = "sarcat", version, about = "SARCAT CLI")]
pub struct CliArgs {
    /// Output mode (browse: STAC catalog, index: EO3 documents + dataset index)
    #[arg(long, value_enum, default_value_t = Mode::Browse)]
    pub mode: Mode,

    /// Optional JSON configuration file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input directory containing GeoTIFF files
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Root directory of the STAC catalog (browse mode)
    #[arg(long)]
    pub stac_root: Option<PathBuf>,

    /// Directory for EO3 dataset documents (index mode)
    #[arg(long)]
    pub dataset_dir: Option<PathBuf>,

    /// Directory for product definitions (index mode)
    #[arg(long)]
    pub product_dir: Option<PathBuf>,

    /// Directory holding the dataset index (index mode)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Canonical CRS for footprints (e.g., EPSG:4326)
    #[arg(long)]
    pub canonical_crs: Option<String>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    pub log: bool,
}
