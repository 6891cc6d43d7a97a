//! Per-part relationship tables (`.rels` parts)
//!
//! Every node that points at another part does so through a relationship
//! id; the table maps `rId{n}` to the relationship type and target.

use crate::{xml, PkgError, PkgResult};
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Unique id within the owning part's table (e.g. "rId3")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target, relative to the owning part's directory
    pub target: String,
    pub target_mode: TargetMode,
}

/// Whether the target lives inside the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetMode {
    #[default]
    Internal,
    External,
}

/// The relationship table of one part.
#[derive(Debug, Clone)]
pub struct Relationships {
    entries: BTreeMap<String, Relationship>,
    next_id: u32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new()
    }
}

impl Relationships {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Parse a `.rels` part.
    pub fn parse(content: &str) -> PkgResult<Self> {
        let mut result = Self::new();
        let mut reader = xml::reader(content);
        let mut buf = Vec::new();
        let mut max_id = 0u32;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if xml::matches_element(e.name().as_ref(), "Relationship") {
                        let id = xml::get_attribute(e, b"Id")
                            .ok_or_else(|| PkgError::Xml("Relationship missing Id".into()))?;
                        let rel_type = xml::get_attribute(e, b"Type")
                            .ok_or_else(|| PkgError::Xml("Relationship missing Type".into()))?;
                        let target = xml::get_attribute(e, b"Target")
                            .ok_or_else(|| PkgError::Xml("Relationship missing Target".into()))?;
                        let target_mode = match xml::get_attribute(e, b"TargetMode").as_deref() {
                            Some("External") => TargetMode::External,
                            _ => TargetMode::Internal,
                        };

                        if let Some(num) =
                            id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok())
                        {
                            max_id = max_id.max(num);
                        }

                        result.entries.insert(
                            id.clone(),
                            Relationship {
                                id,
                                rel_type,
                                target,
                                target_mode,
                            },
                        );
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(PkgError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        result.next_id = max_id + 1;
        Ok(result)
    }

    /// Add a relationship and return its freshly minted id. Ids count up
    /// from past the highest parsed id, so they are never reused within
    /// the table.
    pub fn add(&mut self, rel_type: &str, target: &str, target_mode: TargetMode) -> String {
        let id = format!("rId{}", self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id.clone(),
            Relationship {
                id: id.clone(),
                rel_type: rel_type.to_string(),
                target: target.to_string(),
                target_mode,
            },
        );
        id
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All relationships of a given type, in id order.
    pub fn of_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.entries.values().filter(move |r| r.rel_type == rel_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generate the `.rels` markup.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push('\n');
        out.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in self.entries.values() {
            out.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                xml::escape_xml(&rel.id),
                xml::escape_xml(&rel.rel_type),
                xml::escape_xml(&rel.target)
            ));
            if rel.target_mode == TargetMode::External {
                out.push_str(r#" TargetMode="External""#);
            }
            out.push_str("/>");
        }
        out.push_str("</Relationships>");
        out
    }
}
