//! Placeholder scanner
//!
//! Matching never crosses text-node boundaries: a key split across two
//! runs by prior rich-text editing is not found. Callers that need
//! cross-run matching must normalize runs first.

use crate::TokenTable;
use doc_tree::{Locator, Tree};
use tracing::debug;

/// One located occurrence of a token key inside a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    pub location: Locator,
    pub key: String,
    pub is_image: bool,
}

/// Scan a part's text nodes against the table. For each text node, each
/// key is checked in table order, and every occurrence yields its own
/// match.
pub fn scan(tree: &Tree, table: &TokenTable) -> Vec<TokenMatch> {
    let mut found = Vec::new();
    for (location, node) in tree.text_nodes() {
        for (key, value) in table.iter() {
            for _ in node.text.match_indices(key) {
                found.push(TokenMatch {
                    location,
                    key: key.to_string(),
                    is_image: value.is_image(),
                });
            }
        }
    }
    debug!(matches = found.len(), "scanned part");
    found
}
