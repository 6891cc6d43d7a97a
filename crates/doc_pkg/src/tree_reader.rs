//! Parse story-part markup into the `doc_tree` model
//!
//! Only `w:p`, `w:r`, `w:t` and picture drawings are lifted into typed
//! nodes; everything else is captured verbatim so serialization cannot
//! corrupt a template this engine does not fully model.

use crate::{xml, PkgError, PkgResult};
use doc_tree::{
    Block, DrawingNode, Inline, Paragraph, PartKind, Placement, Run, RunChild, TextNode, Tree,
    WrapMode,
};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Parse one structural part. Fails on malformed markup or when the root
/// element does not match the expected part kind.
pub fn parse(content: &str, kind: PartKind) -> PkgResult<Tree> {
    let mut reader = xml::reader(content);
    let mut buf = Vec::new();

    // Locate the root element.
    let root_start = loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if !xml::matches_element(e.name().as_ref(), kind.root_local_name()) {
                    return Err(PkgError::InvalidStructure(format!(
                        "expected root element {}, found {}",
                        kind.root_local_name(),
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
                break xml::start_tag_raw(e, false)?;
            }
            Ok(Event::Empty(ref e)) => {
                if xml::matches_element(e.name().as_ref(), kind.root_local_name()) {
                    let mut tree = Tree::new(kind);
                    tree.root_start = xml::start_tag_raw(e, false)?;
                    return Ok(tree);
                }
                return Err(PkgError::InvalidStructure(format!(
                    "expected root element {}, found {}",
                    kind.root_local_name(),
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Ok(Event::Eof) => {
                return Err(PkgError::InvalidStructure(format!(
                    "missing root element {}",
                    kind.root_local_name()
                )))
            }
            Ok(_) => {}
            Err(e) => return Err(PkgError::from(e)),
        }
        buf.clear();
    };

    let mut tree = Tree::new(kind);
    tree.root_start = root_start;

    if kind.has_body_wrapper() {
        // Skip to w:body, preserving anything before it (w:background).
        loop {
            buf.clear();
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if xml::matches_element(e.name().as_ref(), "body") {
                        break;
                    }
                    let e = e.to_owned();
                    tree.prologue.push(xml::capture_element(&mut reader, &e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    if xml::matches_element(e.name().as_ref(), "body") {
                        return Ok(tree);
                    }
                    tree.prologue.push(xml::start_tag_raw(e, true)?);
                }
                Ok(Event::End(_)) => return Ok(tree),
                Ok(Event::Eof) => {
                    return Err(PkgError::InvalidStructure("document part has no body".into()))
                }
                Ok(_) => {}
                Err(e) => return Err(PkgError::from(e)),
            }
        }
    }

    let end_local = if kind.has_body_wrapper() {
        "body"
    } else {
        kind.root_local_name()
    };

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "p") {
                    tree.blocks
                        .push(Block::Paragraph(parse_paragraph(&mut reader)?));
                } else {
                    let e = e.to_owned();
                    tree.blocks
                        .push(Block::Raw(xml::capture_element(&mut reader, &e)?));
                }
            }
            Ok(Event::Empty(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "p") {
                    tree.blocks.push(Block::Paragraph(Paragraph::new()));
                } else {
                    tree.blocks.push(Block::Raw(xml::start_tag_raw(e, true)?));
                }
            }
            Ok(Event::End(ref e)) => {
                if xml::matches_element(e.name().as_ref(), end_local) {
                    break;
                }
                return Err(PkgError::Xml(format!(
                    "unexpected closing element {}",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Ok(Event::Text(ref t)) => {
                let raw = String::from_utf8_lossy(t).to_string();
                if !raw.trim().is_empty() {
                    tree.blocks.push(Block::Raw(raw));
                }
            }
            Ok(Event::Comment(ref t)) => {
                tree.blocks
                    .push(Block::Raw(format!("<!--{}-->", String::from_utf8_lossy(t))));
            }
            Ok(Event::Eof) => {
                return Err(PkgError::Xml(format!(
                    "unexpected end of markup inside {}",
                    end_local
                )))
            }
            Ok(_) => {}
            Err(e) => return Err(PkgError::from(e)),
        }
    }

    Ok(tree)
}

fn parse_paragraph(reader: &mut Reader<&[u8]>) -> PkgResult<Paragraph> {
    let mut paragraph = Paragraph::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "pPr") {
                    let e = e.to_owned();
                    paragraph.properties = Some(xml::capture_element(reader, &e)?);
                } else if xml::matches_element(e.name().as_ref(), "r") {
                    paragraph.children.push(Inline::Run(parse_run(reader)?));
                } else {
                    let e = e.to_owned();
                    paragraph
                        .children
                        .push(Inline::Raw(xml::capture_element(reader, &e)?));
                }
            }
            Ok(Event::Empty(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "r") {
                    paragraph.children.push(Inline::Run(Run::default()));
                } else {
                    paragraph
                        .children
                        .push(Inline::Raw(xml::start_tag_raw(e, true)?));
                }
            }
            Ok(Event::End(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "p") {
                    break;
                }
                return Err(PkgError::Xml(format!(
                    "unexpected closing element {} inside paragraph",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Ok(Event::Text(ref t)) => {
                let raw = String::from_utf8_lossy(t).to_string();
                if !raw.trim().is_empty() {
                    paragraph.children.push(Inline::Raw(raw));
                }
            }
            Ok(Event::Eof) => {
                return Err(PkgError::Xml("unexpected end of markup inside paragraph".into()))
            }
            Ok(_) => {}
            Err(e) => return Err(PkgError::from(e)),
        }
    }

    Ok(paragraph)
}

fn parse_run(reader: &mut Reader<&[u8]>) -> PkgResult<Run> {
    let mut run = Run::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "rPr") {
                    let e = e.to_owned();
                    run.properties = Some(xml::capture_element(reader, &e)?);
                } else if xml::matches_element(e.name().as_ref(), "t") {
                    let preserve_attr = xml::get_attribute(e, b"xml:space")
                        .map(|v| v == "preserve")
                        .unwrap_or(false);
                    let raw = reader
                        .read_text(e.name())
                        .map_err(|err| PkgError::Xml(err.to_string()))?;
                    let text = quick_xml::escape::unescape(&raw)?.into_owned();
                    let mut node = TextNode::new(text);
                    node.preserve_space = node.preserve_space || preserve_attr;
                    run.children.push(RunChild::Text(node));
                } else if xml::matches_element(e.name().as_ref(), "drawing") {
                    let e = e.to_owned();
                    let raw = xml::capture_element(reader, &e)?;
                    run.children.push(classify_drawing(raw)?);
                } else {
                    let e = e.to_owned();
                    run.children
                        .push(RunChild::Raw(xml::capture_element(reader, &e)?));
                }
            }
            Ok(Event::Empty(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "t") {
                    run.children.push(RunChild::Text(TextNode::new("")));
                } else {
                    run.children
                        .push(RunChild::Raw(xml::start_tag_raw(e, true)?));
                }
            }
            Ok(Event::End(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "r") {
                    break;
                }
                return Err(PkgError::Xml(format!(
                    "unexpected closing element {} inside run",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Ok(Event::Eof) => {
                return Err(PkgError::Xml("unexpected end of markup inside run".into()))
            }
            Ok(_) => {}
            Err(e) => return Err(PkgError::from(e)),
        }
    }

    Ok(run)
}

/// Lift a captured `w:drawing` into a typed node when it embeds a
/// picture; keep anything else (shapes, text boxes) verbatim.
fn classify_drawing(raw: String) -> PkgResult<RunChild> {
    let mut reader = xml::reader(&raw);
    let mut buf = Vec::new();

    let mut embed: Option<String> = None;
    let mut name = "Picture".to_string();
    let mut anchored = false;
    let mut width_emu = 0i64;
    let mut height_emu = 0i64;
    let mut x_emu = 0i64;
    let mut y_emu = 0i64;
    let mut wrap = WrapMode::None;
    let mut in_position_h = false;
    let mut in_position_v = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e))
                if xml::matches_element(e.name().as_ref(), "posOffset") =>
            {
                let value = reader
                    .read_text(e.name())
                    .map_err(|err| PkgError::Xml(err.to_string()))?;
                let value = value.trim().parse().unwrap_or(0);
                if in_position_h {
                    x_emu = value;
                } else if in_position_v {
                    y_emu = value;
                }
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let local = e.name();
                let local = local.as_ref();
                if xml::matches_element(local, "anchor") {
                    anchored = true;
                } else if xml::matches_element(local, "extent") {
                    if let Some(cx) = xml::get_attribute(e, b"cx") {
                        width_emu = cx.parse().unwrap_or(0);
                    }
                    if let Some(cy) = xml::get_attribute(e, b"cy") {
                        height_emu = cy.parse().unwrap_or(0);
                    }
                } else if xml::matches_element(local, "positionH") {
                    in_position_h = true;
                } else if xml::matches_element(local, "positionV") {
                    in_position_v = true;
                } else if xml::matches_element(local, "wrapSquare") {
                    wrap = WrapMode::Square;
                } else if xml::matches_element(local, "wrapTight") {
                    wrap = WrapMode::Tight;
                } else if xml::matches_element(local, "wrapThrough") {
                    wrap = WrapMode::Through;
                } else if xml::matches_element(local, "wrapTopAndBottom") {
                    wrap = WrapMode::TopAndBottom;
                } else if xml::matches_element(local, "wrapNone") {
                    wrap = WrapMode::None;
                } else if xml::matches_element(local, "blip") {
                    if let Some(id) = xml::get_attribute(e, b"r:embed") {
                        embed = Some(id);
                    }
                } else if xml::matches_element(local, "docPr") {
                    if let Some(n) = xml::get_attribute(e, b"name") {
                        name = n;
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if xml::matches_element(e.name().as_ref(), "positionH") {
                    in_position_h = false;
                } else if xml::matches_element(e.name().as_ref(), "positionV") {
                    in_position_v = false;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(PkgError::from(e)),
        }
    }

    match embed {
        Some(embed) => {
            let placement = if anchored {
                Placement::Anchored { x_emu, y_emu, wrap }
            } else {
                Placement::Inline
            };
            Ok(RunChild::Drawing(DrawingNode {
                width_emu,
                height_emu,
                placement,
                embed,
                name,
                raw: Some(raw),
            }))
        }
        None => Ok(RunChild::Raw(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        "\n",
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
        r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        r#"<w:body>"#,
        r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#,
        r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Dear {{name}}, </w:t></w:r>"#,
        r#"<w:r><w:t>amount due: {{amount}}</w:t></w:r></w:p>"#,
        r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#,
        r#"</w:body></w:document>"#
    );

    #[test]
    fn test_parse_document_structure() {
        let tree = parse(DOC, PartKind::Document).unwrap();
        assert_eq!(tree.kind, PartKind::Document);
        assert!(tree.root_start.starts_with("<w:document"));
        // paragraph, table (raw), section properties (raw)
        assert_eq!(tree.blocks.len(), 3);
        assert_eq!(tree.paragraphs().count(), 1);

        let p = tree.paragraphs().next().unwrap();
        assert_eq!(
            p.properties.as_deref(),
            Some(r#"<w:pPr><w:jc w:val="center"/></w:pPr>"#)
        );
        assert_eq!(p.runs().count(), 2);
        let first = p.runs().next().unwrap();
        assert_eq!(first.properties.as_deref(), Some("<w:rPr><w:b/></w:rPr>"));
        assert_eq!(tree.text(), "Dear {{name}}, amount due: {{amount}}");
    }

    #[test]
    fn test_table_captured_verbatim() {
        let tree = parse(DOC, PartKind::Document).unwrap();
        match &tree.blocks[1] {
            Block::Raw(raw) => {
                assert!(raw.starts_with("<w:tbl>"));
                assert!(raw.ends_with("</w:tbl>"));
                assert!(raw.contains("cell"));
            }
            other => panic!("expected raw table block, got {:?}", other),
        }
    }

    #[test]
    fn test_preserve_space_attribute() {
        let tree = parse(DOC, PartKind::Document).unwrap();
        let (_, first) = tree.text_nodes().next().unwrap();
        assert!(first.preserve_space);
        assert_eq!(first.text, "Dear {{name}}, ");
    }

    #[test]
    fn test_parse_header() {
        let xml = concat!(
            r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:p><w:r><w:t>{{companyName}}</w:t></w:r></w:p></w:hdr>"#
        );
        let tree = parse(xml, PartKind::Header).unwrap();
        assert_eq!(tree.kind, PartKind::Header);
        assert_eq!(tree.text(), "{{companyName}}");
    }

    #[test]
    fn test_parse_footer() {
        let xml = concat!(
            r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:p><w:r><w:t>Page of {{companyName}}</w:t></w:r></w:p></w:ftr>"#
        );
        let tree = parse(xml, PartKind::Footer).unwrap();
        assert_eq!(tree.kind, PartKind::Footer);
        assert!(tree.root_start.starts_with("<w:ftr"));
        assert_eq!(tree.text(), "Page of {{companyName}}");
    }

    #[test]
    fn test_wrong_root_rejected() {
        let xml = r#"<w:ftr xmlns:w="x"><w:p/></w:ftr>"#;
        let err = parse(xml, PartKind::Header).unwrap_err();
        assert!(matches!(err, PkgError::InvalidStructure(_)));
    }

    #[test]
    fn test_truncated_markup_rejected() {
        let xml = r#"<w:document xmlns:w="x"><w:body><w:p><w:r>"#;
        assert!(parse(xml, PartKind::Document).is_err());
    }

    #[test]
    fn test_entities_unescaped() {
        let xml = concat!(
            r#"<w:hdr xmlns:w="x"><w:p><w:r>"#,
            r#"<w:t>Smith &amp; Sons &lt;Ltd&gt;</w:t></w:r></w:p></w:hdr>"#
        );
        let tree = parse(xml, PartKind::Header).unwrap();
        assert_eq!(tree.text(), "Smith & Sons <Ltd>");
    }

    #[test]
    fn test_inline_picture_drawing_lifted() {
        let xml = concat!(
            r#"<w:hdr xmlns:w="x"><w:p><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="990000" cy="792000"/>"#,
            r#"<wp:docPr id="1" name="logo.jpg"/>"#,
            r#"<a:graphic><a:graphicData uri="pic"><pic:pic><pic:blipFill>"#,
            r#"<a:blip r:embed="rId4"/></pic:blipFill></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p></w:hdr>"#
        );
        let tree = parse(xml, PartKind::Header).unwrap();
        let drawing = tree.drawings().next().expect("drawing lifted");
        assert_eq!(drawing.embed, "rId4");
        assert_eq!(drawing.width_emu, 990000);
        assert_eq!(drawing.height_emu, 792000);
        assert_eq!(drawing.placement, Placement::Inline);
        assert_eq!(drawing.name, "logo.jpg");
        assert!(drawing.raw.as_deref().unwrap().starts_with("<w:drawing>"));
    }

    #[test]
    fn test_anchored_drawing_position_and_wrap() {
        let xml = concat!(
            r#"<w:hdr xmlns:w="x"><w:p><w:r><w:drawing>"#,
            r#"<wp:anchor behindDoc="0"><wp:simplePos x="0" y="0"/>"#,
            r#"<wp:positionH relativeFrom="page"><wp:posOffset>635000</wp:posOffset></wp:positionH>"#,
            r#"<wp:positionV relativeFrom="page"><wp:posOffset>762000</wp:posOffset></wp:positionV>"#,
            r#"<wp:extent cx="2540000" cy="2540000"/>"#,
            r#"<wp:wrapThrough wrapText="bothSides"/>"#,
            r#"<a:blip r:embed="rId9"/>"#,
            r#"</wp:anchor></w:drawing></w:r></w:p></w:hdr>"#
        );
        let tree = parse(xml, PartKind::Header).unwrap();
        let drawing = tree.drawings().next().unwrap();
        assert_eq!(
            drawing.placement,
            Placement::Anchored {
                x_emu: 635000,
                y_emu: 762000,
                wrap: WrapMode::Through
            }
        );
    }

    #[test]
    fn test_shape_drawing_stays_raw() {
        let xml = concat!(
            r#"<w:hdr xmlns:w="x"><w:p><w:r><w:drawing>"#,
            r#"<wp:inline><wp:extent cx="100" cy="100"/>"#,
            r#"<a:graphic><a:graphicData uri="shape"><wps:wsp/></a:graphicData></a:graphic>"#,
            r#"</wp:inline></w:drawing></w:r></w:p></w:hdr>"#
        );
        let tree = parse(xml, PartKind::Header).unwrap();
        assert_eq!(tree.drawings().count(), 0);
        let p = tree.paragraphs().next().unwrap();
        let run = p.runs().next().unwrap();
        assert!(matches!(&run.children[0], RunChild::Raw(raw) if raw.contains("wps:wsp")));
    }
}
