use tracing::info;
use tracing_subscriber::EnvFilter;

use sarcat::{
    BatchReport, CatalogConfig, GdalRasterIo, JsonFileIndex, Mode, build_stac_catalog,
    index_directory,
};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep the existing one
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Merge the optional config file with flag overrides
fn resolve_config(args: &CliArgs) -> Result<CatalogConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => CatalogConfig::from_json_file(path)?,
        None => CatalogConfig::default(),
    };
    if let Some(dir) = &args.input_dir {
        config.input_dir = dir.clone();
    }
    if let Some(dir) = &args.stac_root {
        config.stac_root = dir.clone();
    }
    if let Some(dir) = &args.dataset_dir {
        config.dataset_dir = dir.clone();
    }
    if let Some(dir) = &args.product_dir {
        config.product_dir = dir.clone();
    }
    if let Some(dir) = &args.index_dir {
        config.index_dir = dir.clone();
    }
    if let Some(crs) = &args.canonical_crs {
        if crs.trim().is_empty() {
            return Err(AppError::InvalidArgument {
                arg: "--canonical-crs".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        config.canonical_crs = crs.clone();
    }
    Ok(config)
}

fn print_summary(mode: Mode, batch: &BatchReport) {
    println!("Mode: {}", mode);
    println!("Attempted: {}", batch.attempted);
    println!("Succeeded: {}", batch.succeeded);
    println!("Skipped: {}", batch.skipped);
    println!("Failed: {}", batch.failed);
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    let config = resolve_config(&args)?;
    info!("Input directory: {:?}", config.input_dir);
    info!("Canonical CRS: {}", config.canonical_crs);

    match args.mode {
        Mode::Browse => {
            info!("STAC root: {:?}", config.stac_root);
            let report = build_stac_catalog(&config, &GdalRasterIo).map_err(AppError::from)?;
            print_summary(args.mode, &report.batch);
            println!("Catalog: {}", report.catalog_path.display());
        }
        Mode::Index => {
            info!("Dataset documents: {:?}", config.dataset_dir);
            let mut index = JsonFileIndex::open(&config.index_dir).map_err(AppError::from)?;
            info!("Index file: {:?}", index.path());
            let report =
                index_directory(&config, &GdalRasterIo, &mut index).map_err(AppError::from)?;
            print_summary(args.mode, &report.batch);
            println!("Added: {}", report.added);
            println!("Updated: {}", report.updated);
            println!("Verification: {}", report.verification);
        }
    }

    Ok(())
}
