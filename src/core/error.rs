use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Conditions that make any further parsing meaningless. Content problems
/// never surface here; they accumulate in [`crate::core::diagnostics::Diagnostics`].
#[derive(Error, Debug)]
pub enum CanonError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("invalid config {path}: {source}")]
    ConfigError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("missing canonical doc: {0}")]
    MissingCanonicalDoc(String),
    #[error("{0}: could not find any allowlisted tags under '## Allowed Tags'")]
    EmptyTaxonomy(String),
    #[error("empty input")]
    EmptyInput,
    #[error("Not found: {0}")]
    NotFound(String),
}
