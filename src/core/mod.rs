//! Core pipeline building blocks: run configuration, footprint and
//! acquisition-time resolution, filename classification, and catalog record
//! builders. These are consumed by the high-level `api` module.
pub mod acquisition;
pub mod classify;
pub mod config;
pub mod footprint;
pub mod records;
