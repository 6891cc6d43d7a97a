//! Package store for DOCX containers
//!
//! A DOCX file is a ZIP archive of named parts:
//! - `[Content_Types].xml`: content type declarations
//! - `_rels/.rels`: root relationships
//! - `word/document.xml`: main document content
//! - `word/header*.xml` / `word/footer*.xml`: header and footer parts
//! - `word/_rels/*.rels`: per-part relationship tables
//! - `word/media/`: embedded images
//!
//! This crate opens and saves the container, keeps every part's bytes and
//! relationship table in memory, registers new image parts, and converts
//! structural parts to and from the `doc_tree` model. Saving goes through
//! a temporary file in the destination directory and commits on full
//! success, so the destination is never left half-written.

mod content_types;
mod error;
mod package;
mod reader;
pub mod tree_reader;
pub mod tree_writer;
mod relationships;
pub(crate) mod xml;

pub use content_types::ContentTypes;
pub use error::{PkgError, PkgResult};
pub use package::{Package, StoryPart};
pub use reader::PackageReader;
pub use relationships::{Relationship, Relationships, TargetMode};

/// XML namespaces used in package markup.
pub mod namespaces {
    /// Main WordprocessingML namespace
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Relationships namespace
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    /// DrawingML namespace
    pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
    /// WordprocessingML Drawing namespace
    pub const WP: &str =
        "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
    /// Picture namespace
    pub const PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
}

/// Well-known part names.
pub mod part_names {
    pub const CONTENT_TYPES: &str = "[Content_Types].xml";
    pub const ROOT_RELS: &str = "_rels/.rels";
    pub const DOCUMENT: &str = "word/document.xml";
}

/// Relationship types used by this engine.
pub mod relationship_types {
    pub const DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HEADER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
    pub const FOOTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
}

/// Content types for package parts.
pub mod content_type_values {
    pub const DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
}
