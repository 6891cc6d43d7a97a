//! Placeholder substitution and image injection
//!
//! A token table maps placeholder strings (e.g. `{{name}}`) to literal
//! replacement text or to an image path. The scanner walks a part's
//! text nodes and reports every occurrence of every key; the engine
//! applies literal replacements in place and swaps image-placeholder
//! runs for drawing runs wired into the package's relationship graph.
//!
//! Each part is a transaction: the rewritten markup is only stored back
//! into the package after every match for that part has been applied
//! and the drawing references verified.

mod engine;
mod error;
mod image_loader;
mod scanner;
mod token;

pub use engine::{
    substitute_part, ApplyStats, ImageOptions, Substitutor, DEFAULT_HEIGHT_EMU, DEFAULT_WIDTH_EMU,
};
pub use error::{MergeError, MergeResult};
pub use image_loader::{LoadedImage, Rotation};
pub use scanner::{scan, TokenMatch};
pub use token::{TokenTable, TokenValue};
