use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid value for {arg}: {reason}")]
    InvalidArgument { arg: String, reason: String },

    #[error("Catalog error: {0}")]
    Catalog(#[from] sarcat::Error),

    #[error("Index error: {0}")]
    Index(#[from] sarcat::IndexError),
}
