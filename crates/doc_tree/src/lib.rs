//! Structural tree for one DOCX story part
//!
//! This crate models the content of a single structural part (the document
//! body, a header, or a footer) as an owned tree with a closed node set:
//! paragraphs contain runs, runs contain text nodes and drawing nodes.
//! Markup outside the modeled set (tables, section properties, hyperlinks,
//! property blobs) is carried as verbatim raw markup so a part survives a
//! parse/serialize round trip without corruption.
//!
//! Parsing and serialization live in `doc_pkg`; this crate owns the types,
//! the document-order traversal, and the tree surgery used by substitution.

mod error;
mod node;
mod tree;
pub mod unit;

pub use error::*;
pub use node::*;
pub use tree::*;
