//! XML event-stream helpers shared by the markup codec

use crate::{PkgError, PkgResult};
use quick_xml::events::BytesStart;
use quick_xml::Reader;

/// Create a reader over part markup. Text is not trimmed: whitespace
/// inside `w:t` is significant.
pub fn reader(content: &str) -> Reader<&[u8]> {
    Reader::from_str(content)
}

/// Get an attribute value (raw, still-escaped) from a start event.
pub fn get_attribute(event: &BytesStart, name: &[u8]) -> Option<String> {
    event
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// Check if an element name matches, with or without a namespace prefix.
pub fn matches_element(name: &[u8], expected: &str) -> bool {
    let name = std::str::from_utf8(name).unwrap_or("");
    name == expected
        || name
            .rsplit_once(':')
            .map(|(_, local)| local == expected)
            .unwrap_or(false)
}

/// Reconstruct the verbatim start tag of an event, attributes included.
pub fn start_tag_raw(event: &BytesStart, self_closing: bool) -> PkgResult<String> {
    let name = std::str::from_utf8(event.name().as_ref())
        .map_err(|e| PkgError::Xml(format!("non-UTF8 element name: {}", e)))?
        .to_string();
    let mut tag = String::from("<");
    tag.push_str(&name);
    for attr in event.attributes() {
        let attr = attr?;
        tag.push(' ');
        tag.push_str(
            std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| PkgError::Xml(format!("non-UTF8 attribute name: {}", e)))?,
        );
        tag.push_str("=\"");
        tag.push_str(&String::from_utf8_lossy(&attr.value));
        tag.push('"');
    }
    tag.push_str(if self_closing { "/>" } else { ">" });
    Ok(tag)
}

/// Capture an element and everything inside it as verbatim markup. The
/// reader must be positioned just past the element's start event.
pub fn capture_element(reader: &mut Reader<&[u8]>, start: &BytesStart) -> PkgResult<String> {
    let name = start.name();
    let inner = reader
        .read_text(name)
        .map_err(|e| PkgError::Xml(e.to_string()))?;
    let close = std::str::from_utf8(name.as_ref())
        .map_err(|e| PkgError::Xml(format!("non-UTF8 element name: {}", e)))?;
    Ok(format!("{}{}</{}>", start_tag_raw(start, false)?, inner, close))
}

/// Escape character data for emission into markup.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;

    #[test]
    fn test_matches_element() {
        assert!(matches_element(b"p", "p"));
        assert!(matches_element(b"w:p", "p"));
        assert!(!matches_element(b"w:r", "p"));
        assert!(!matches_element(b"wrap", "p"));
    }

    #[test]
    fn test_start_tag_raw_keeps_attributes() {
        let mut r = reader(r#"<w:t xml:space="preserve">x</w:t>"#);
        let mut buf = Vec::new();
        match r.read_event_into(&mut buf).unwrap() {
            Event::Start(e) => {
                assert_eq!(
                    start_tag_raw(&e, false).unwrap(),
                    r#"<w:t xml:space="preserve">"#
                );
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_capture_element_nested() {
        let src = r#"<w:tbl><w:tr><w:tc>cell</w:tc></w:tr></w:tbl>after"#;
        let mut r = reader(src);
        let mut buf = Vec::new();
        match r.read_event_into(&mut buf).unwrap() {
            Event::Start(e) => {
                let e = e.into_owned();
                let raw = capture_element(&mut r, &e).unwrap();
                assert_eq!(raw, "<w:tbl><w:tr><w:tc>cell</w:tc></w:tr></w:tbl>");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & c"), "a &lt; b &amp; c");
    }
}
