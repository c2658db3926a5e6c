//! Persistence for catalog outputs: the self-contained STAC tree (`stac`)
//! and EO3 dataset/product YAML documents (`eo3`).
pub mod eo3;
pub mod stac;
