//! Serialize the `doc_tree` model back into story-part markup
//!
//! Raw nodes and captured drawing markup are emitted verbatim, so a
//! parse/serialize cycle preserves everything the model does not
//! represent. Drawings built in memory (no captured markup) are
//! generated as self-contained `wp:inline` or `wp:anchor` elements with
//! their own namespace declarations.

use crate::{namespaces, xml};
use doc_tree::{Block, DrawingNode, Inline, Paragraph, Placement, Run, RunChild, Tree, WrapMode};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Serialize a tree to part markup.
pub fn serialize(tree: &Tree) -> String {
    let mut out = String::new();
    out.push_str(XML_DECL);
    out.push('\n');
    out.push_str(&tree.root_start);
    for item in &tree.prologue {
        out.push_str(item);
    }
    if tree.kind.has_body_wrapper() {
        out.push_str("<w:body>");
    }
    let mut drawing_seq = 0u32;
    for block in &tree.blocks {
        write_block(&mut out, block, &mut drawing_seq);
    }
    if tree.kind.has_body_wrapper() {
        out.push_str("</w:body>");
    }
    out.push_str("</");
    out.push_str(root_element_name(&tree.root_start));
    out.push('>');
    out
}

/// Element name of a verbatim start tag, prefix included.
fn root_element_name(root_start: &str) -> &str {
    root_start
        .trim_start_matches('<')
        .split(|c: char| c.is_whitespace() || c == '>')
        .next()
        .unwrap_or("")
}

fn write_block(out: &mut String, block: &Block, drawing_seq: &mut u32) {
    match block {
        Block::Paragraph(p) => write_paragraph(out, p, drawing_seq),
        Block::Raw(raw) => out.push_str(raw),
    }
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph, drawing_seq: &mut u32) {
    out.push_str("<w:p>");
    if let Some(props) = &paragraph.properties {
        out.push_str(props);
    }
    for child in &paragraph.children {
        match child {
            Inline::Run(run) => write_run(out, run, drawing_seq),
            Inline::Raw(raw) => out.push_str(raw),
        }
    }
    out.push_str("</w:p>");
}

fn write_run(out: &mut String, run: &Run, drawing_seq: &mut u32) {
    out.push_str("<w:r>");
    if let Some(props) = &run.properties {
        out.push_str(props);
    }
    for child in &run.children {
        match child {
            RunChild::Text(t) => {
                if t.preserve_space {
                    out.push_str(r#"<w:t xml:space="preserve">"#);
                } else {
                    out.push_str("<w:t>");
                }
                out.push_str(&xml::escape_xml(&t.text));
                out.push_str("</w:t>");
            }
            RunChild::Drawing(d) => write_drawing(out, d, drawing_seq),
            RunChild::Raw(raw) => out.push_str(raw),
        }
    }
    out.push_str("</w:r>");
}

fn write_drawing(out: &mut String, drawing: &DrawingNode, drawing_seq: &mut u32) {
    if let Some(raw) = &drawing.raw {
        out.push_str(raw);
        return;
    }
    *drawing_seq += 1;
    let id = 1000 + *drawing_seq;
    out.push_str("<w:drawing>");
    match drawing.placement {
        Placement::Inline => {
            out.push_str(&format!(
                r#"<wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="{}">"#,
                namespaces::WP
            ));
            out.push_str(&format!(
                r#"<wp:extent cx="{}" cy="{}"/>"#,
                drawing.width_emu, drawing.height_emu
            ));
            out.push_str(r#"<wp:effectExtent l="0" t="0" r="0" b="0"/>"#);
            write_doc_pr(out, id, &drawing.name);
            write_graphic(out, drawing, id);
            out.push_str("</wp:inline>");
        }
        Placement::Anchored { x_emu, y_emu, wrap } => {
            out.push_str(&format!(
                concat!(
                    r#"<wp:anchor distT="0" distB="0" distL="114300" distR="114300" "#,
                    r#"simplePos="0" relativeHeight="251658240" behindDoc="0" locked="0" "#,
                    r#"layoutInCell="1" allowOverlap="1" xmlns:wp="{}">"#
                ),
                namespaces::WP
            ));
            out.push_str(r#"<wp:simplePos x="0" y="0"/>"#);
            out.push_str(&format!(
                r#"<wp:positionH relativeFrom="page"><wp:posOffset>{}</wp:posOffset></wp:positionH>"#,
                x_emu
            ));
            out.push_str(&format!(
                r#"<wp:positionV relativeFrom="page"><wp:posOffset>{}</wp:posOffset></wp:positionV>"#,
                y_emu
            ));
            out.push_str(&format!(
                r#"<wp:extent cx="{}" cy="{}"/>"#,
                drawing.width_emu, drawing.height_emu
            ));
            out.push_str(r#"<wp:effectExtent l="0" t="0" r="0" b="0"/>"#);
            write_wrap(out, wrap);
            write_doc_pr(out, id, &drawing.name);
            write_graphic(out, drawing, id);
            out.push_str("</wp:anchor>");
        }
    }
    out.push_str("</w:drawing>");
}

fn write_doc_pr(out: &mut String, id: u32, name: &str) {
    out.push_str(&format!(
        r#"<wp:docPr id="{}" name="{}"/>"#,
        id,
        xml::escape_xml(name)
    ));
    out.push_str(&format!(
        r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="{}" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
        namespaces::A
    ));
}

fn write_wrap(out: &mut String, wrap: WrapMode) {
    // Wrap polygons cover the full extent; 21600 is the fixed shape
    // coordinate space.
    const POLYGON: &str = concat!(
        r#"<wp:wrapPolygon edited="0"><wp:start x="0" y="0"/>"#,
        r#"<wp:lineTo x="0" y="21600"/><wp:lineTo x="21600" y="21600"/>"#,
        r#"<wp:lineTo x="21600" y="0"/><wp:lineTo x="0" y="0"/></wp:wrapPolygon>"#
    );
    match wrap {
        WrapMode::Square => out.push_str(r#"<wp:wrapSquare wrapText="bothSides"/>"#),
        WrapMode::Tight => {
            out.push_str(r#"<wp:wrapTight wrapText="bothSides">"#);
            out.push_str(POLYGON);
            out.push_str("</wp:wrapTight>");
        }
        WrapMode::Through => {
            out.push_str(r#"<wp:wrapThrough wrapText="bothSides">"#);
            out.push_str(POLYGON);
            out.push_str("</wp:wrapThrough>");
        }
        WrapMode::TopAndBottom => out.push_str("<wp:wrapTopAndBottom/>"),
        WrapMode::None => out.push_str("<wp:wrapNone/>"),
    }
}

fn write_graphic(out: &mut String, drawing: &DrawingNode, id: u32) {
    let name = xml::escape_xml(&drawing.name);
    let embed = xml::escape_xml(&drawing.embed);
    out.push_str(&format!(r#"<a:graphic xmlns:a="{}">"#, namespaces::A));
    out.push_str(
        r#"<a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
    );
    out.push_str(&format!(r#"<pic:pic xmlns:pic="{}">"#, namespaces::PIC));
    out.push_str(&format!(
        r#"<pic:nvPicPr><pic:cNvPr id="{}" name="{}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
        id, name
    ));
    out.push_str(&format!(
        r#"<pic:blipFill><a:blip r:embed="{}" xmlns:r="{}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
        embed,
        namespaces::R
    ));
    out.push_str(&format!(
        concat!(
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#
        ),
        drawing.width_emu, drawing.height_emu
    ));
    out.push_str("</pic:pic></a:graphicData></a:graphic>");
}
