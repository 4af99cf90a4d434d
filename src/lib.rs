pub mod cli;
pub mod core;
pub mod download;
pub mod report;
pub mod utils;

pub use crate::core::compare::TaxonomyComparer;
pub use crate::core::joiner::TaxonomyJoiner;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaxodiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TaxodiffError>;
