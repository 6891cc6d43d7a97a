//! Substitution error type

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image file not found: {path}")]
    MissingImage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Package(#[from] doc_pkg::PkgError),

    #[error(transparent)]
    Tree(#[from] doc_tree::TreeError),

    #[error("token table parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MergeResult<T> = Result<T, MergeError>;
