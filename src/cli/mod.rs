//! Command Line Interface (CLI) layer for SARCAT.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for the browse and index flows.
//! If you are embedding SARCAT into another application, prefer the
//! high-level `sarcat::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
