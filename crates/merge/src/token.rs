//! The token table: ordered placeholder-to-value mapping

use crate::MergeResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Replacement value for one placeholder key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    /// Literal text spliced into the matched text node.
    Text(String),
    /// Path to an image file; the placeholder's run is replaced by a
    /// drawing referencing a freshly registered image part.
    Image {
        #[serde(rename = "image")]
        path: PathBuf,
    },
}

impl TokenValue {
    pub fn is_image(&self) -> bool {
        matches!(self, TokenValue::Image { .. })
    }
}

/// Ordered mapping from placeholder string to replacement value. Keys
/// are matched by exact substring, so they carry their own delimiters
/// (e.g. `{{name}}`). Inserting an existing key replaces its value in
/// place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenTable {
    entries: Vec<(String, TokenValue)>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key.into(), TokenValue::Text(value.into()));
    }

    pub fn insert_image(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.insert(key.into(), TokenValue::Image { path: path.into() });
    }

    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_text(key, value);
        self
    }

    pub fn with_image(mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert_image(key, path);
        self
    }

    fn insert(&mut self, key: String, value: TokenValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&TokenValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Iterate entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a table from a JSON object. String values are literal text;
    /// `{"image": "path"}` values designate an image placeholder.
    /// Entries come back sorted by key rather than in file order; table
    /// order never changes the outcome of a merge.
    pub fn from_json_str(json: &str) -> MergeResult<Self> {
        let parsed: std::collections::BTreeMap<String, TokenValue> = serde_json::from_str(json)?;
        Ok(Self {
            entries: parsed.into_iter().collect(),
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> MergeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let table = TokenTable::new()
            .with_text("{{name}}", "Jane Doe")
            .with_image("{{image}}", "/tmp/logo.jpg");
        assert_eq!(
            table.get("{{name}}"),
            Some(&TokenValue::Text("Jane Doe".to_string()))
        );
        assert!(table.get("{{image}}").unwrap().is_image());
        assert_eq!(table.get("{{missing}}"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_insert_existing_replaces_in_place() {
        let mut table = TokenTable::new()
            .with_text("{{a}}", "1")
            .with_text("{{b}}", "2");
        table.insert_text("{{a}}", "rewritten");
        assert_eq!(table.len(), 2);
        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["{{a}}", "{{b}}"]);
        assert_eq!(
            table.get("{{a}}"),
            Some(&TokenValue::Text("rewritten".to_string()))
        );
    }

    #[test]
    fn test_from_json() {
        let table = TokenTable::from_json_str(
            r#"{"{{name}}": "Jane Doe", "{{amount}}": "500", "{{image}}": {"image": "logo.png"}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get("{{amount}}"),
            Some(&TokenValue::Text("500".to_string()))
        );
        assert_eq!(
            table.get("{{image}}"),
            Some(&TokenValue::Image {
                path: PathBuf::from("logo.png")
            })
        );
        // JSON entries are keyed, not positional: the table sorts them.
        let keys: Vec<&str> = table.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["{{amount}}", "{{image}}", "{{name}}"]);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(TokenTable::from_json_str(r#"["{{name}}"]"#).is_err());
    }
}
