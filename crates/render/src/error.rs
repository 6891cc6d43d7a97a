//! Conversion error type

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("converter program not found: {0}")]
    ConverterNotFound(PathBuf),

    #[error("converter exited with status {status:?}: {stderr}")]
    ConversionFailed {
        status: Option<i32>,
        stderr: String,
    },

    #[error("converter exited successfully but produced no artifact at {0}")]
    OutputMissing(PathBuf),

    #[error("input path has no file name: {0}")]
    InvalidInput(PathBuf),
}

pub type ConvertResult<T> = Result<T, ConvertError>;
