//! Error types for tree operations

use crate::Locator;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    /// The locator does not name a run that is a child of a paragraph.
    /// Defensive: unreachable on trees produced by the parser.
    #[error("invalid parent at {0}: expected a run inside a paragraph")]
    InvalidParent(Locator),

    /// No node exists at the given position.
    #[error("no node at {0}")]
    NodeNotFound(Locator),
}

pub type Result<T> = std::result::Result<T, TreeError>;
