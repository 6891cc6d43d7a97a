//! `[Content_Types].xml` parsing and generation

use crate::{xml, PkgError, PkgResult};
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// Content type declarations for every part in the package: defaults
/// keyed by extension, overrides keyed by absolute part name.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Parse `[Content_Types].xml`.
    pub fn parse(content: &str) -> PkgResult<Self> {
        let mut result = Self::default();
        let mut reader = xml::reader(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if xml::matches_element(e.name().as_ref(), "Default") {
                        if let (Some(ext), Some(ct)) = (
                            xml::get_attribute(e, b"Extension"),
                            xml::get_attribute(e, b"ContentType"),
                        ) {
                            result.defaults.insert(ext.to_lowercase(), ct);
                        }
                    } else if xml::matches_element(e.name().as_ref(), "Override") {
                        if let (Some(part), Some(ct)) = (
                            xml::get_attribute(e, b"PartName"),
                            xml::get_attribute(e, b"ContentType"),
                        ) {
                            result.overrides.insert(part, ct);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(PkgError::from(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Content type for a part, override first, then default by extension.
    pub fn content_type_for(&self, part_name: &str) -> Option<&str> {
        let absolute = if part_name.starts_with('/') {
            part_name.to_string()
        } else {
            format!("/{}", part_name)
        };
        if let Some(ct) = self.overrides.get(&absolute) {
            return Some(ct);
        }
        part_name
            .rsplit('.')
            .next()
            .and_then(|ext| self.defaults.get(&ext.to_lowercase()))
            .map(String::as_str)
    }

    /// Register a default content type for an extension.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .entry(extension.to_lowercase())
            .or_insert_with(|| content_type.to_string());
    }

    /// Generate `[Content_Types].xml`.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        out.push('\n');
        out.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ct) in &self.defaults {
            out.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                xml::escape_xml(ext),
                xml::escape_xml(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            out.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                xml::escape_xml(part),
                xml::escape_xml(ct)
            ));
        }
        out.push_str("</Types>");
        out
    }
}
