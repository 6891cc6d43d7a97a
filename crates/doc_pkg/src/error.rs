//! Error types for package operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PkgError {
    /// IO error (file missing, unreadable, or unwritable)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Missing required part
    #[error("missing required part: {0}")]
    MissingPart(String),

    /// Invalid package structure
    #[error("invalid package structure: {0}")]
    InvalidStructure(String),

    /// Relationship graph violation
    #[error("relationship error: {0}")]
    Relationship(String),

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<quick_xml::Error> for PkgError {
    fn from(err: quick_xml::Error) -> Self {
        PkgError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for PkgError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        PkgError::Xml(format!("attribute error: {}", err))
    }
}

impl From<quick_xml::escape::EscapeError> for PkgError {
    fn from(err: quick_xml::escape::EscapeError) -> Self {
        PkgError::Xml(format!("escape error: {}", err))
    }
}

pub type PkgResult<T> = std::result::Result<T, PkgError>;
