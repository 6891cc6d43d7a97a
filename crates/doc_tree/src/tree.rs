//! The per-part tree: traversal and surgery

use crate::{Block, Inline, Paragraph, Run, TextNode, TreeError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of story part a tree was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Document,
    Header,
    Footer,
}

impl PartKind {
    /// Local name of the part's root element.
    pub fn root_local_name(&self) -> &'static str {
        match self {
            PartKind::Document => "document",
            PartKind::Header => "hdr",
            PartKind::Footer => "ftr",
        }
    }

    /// Blocks of a document live inside `w:body`; header and footer
    /// blocks sit directly under the root.
    pub fn has_body_wrapper(&self) -> bool {
        matches!(self, PartKind::Document)
    }
}

/// Position of a node inside a tree: block index, inline index within the
/// paragraph, and child index within the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub block: usize,
    pub inline: usize,
    pub child: usize,
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {}, inline {}, child {}",
            self.block, self.inline, self.child
        )
    }
}

/// The in-memory content of one story part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub kind: PartKind,
    /// Verbatim start tag of the root element, namespace declarations
    /// included, as read from the source part.
    pub root_start: String,
    /// Markup between the root element and the block content
    /// (e.g. `w:background`), preserved verbatim.
    pub prologue: Vec<String>,
    pub blocks: Vec<Block>,
}

impl Tree {
    /// An empty tree with a minimal root element.
    pub fn new(kind: PartKind) -> Self {
        let root_start = format!(
            "<w:{} xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
            kind.root_local_name()
        );
        Self {
            kind,
            root_start,
            prologue: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Iterate paragraphs in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Raw(_) => None,
        })
    }

    /// Lazy, restartable traversal of all text nodes in document order:
    /// block order, then inline order within a paragraph, then child order
    /// within a run.
    pub fn text_nodes(&self) -> impl Iterator<Item = (Locator, &TextNode)> {
        self.blocks.iter().enumerate().flat_map(|(block, b)| {
            let paragraph = match b {
                Block::Paragraph(p) => Some(p),
                Block::Raw(_) => None,
            };
            paragraph.into_iter().flat_map(move |p| {
                p.children.iter().enumerate().flat_map(move |(inline, i)| {
                    let run = match i {
                        Inline::Run(r) => Some(r),
                        Inline::Raw(_) => None,
                    };
                    run.into_iter().flat_map(move |r| {
                        r.children.iter().enumerate().filter_map(move |(child, c)| {
                            match c {
                                crate::RunChild::Text(t) => {
                                    Some((Locator { block, inline, child }, t))
                                }
                                _ => None,
                            }
                        })
                    })
                })
            })
        })
    }

    /// All drawing nodes in document order.
    pub fn drawings(&self) -> impl Iterator<Item = &crate::DrawingNode> {
        self.paragraphs().flat_map(|p| {
            p.runs().flat_map(|r| {
                r.children.iter().filter_map(|c| match c {
                    crate::RunChild::Drawing(d) => Some(d),
                    _ => None,
                })
            })
        })
    }

    /// Concatenated character data of the whole part.
    pub fn text(&self) -> String {
        self.text_nodes().map(|(_, t)| t.text.as_str()).collect()
    }

    fn paragraph_mut(&mut self, block: usize) -> Option<&mut Paragraph> {
        match self.blocks.get_mut(block) {
            Some(Block::Paragraph(p)) => Some(p),
            _ => None,
        }
    }

    /// The text node at `loc`, if the locator still names one.
    pub fn text_mut(&mut self, loc: Locator) -> Option<&mut TextNode> {
        let paragraph = self.paragraph_mut(loc.block)?;
        let run = match paragraph.children.get_mut(loc.inline)? {
            Inline::Run(r) => r,
            Inline::Raw(_) => return None,
        };
        match run.children.get_mut(loc.child)? {
            crate::RunChild::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The run at `loc` (the child index is ignored).
    pub fn run(&self, loc: Locator) -> Option<&Run> {
        match self.blocks.get(loc.block)? {
            Block::Paragraph(p) => match p.children.get(loc.inline)? {
                Inline::Run(r) => Some(r),
                Inline::Raw(_) => None,
            },
            Block::Raw(_) => None,
        }
    }

    /// Replace the run at `loc` with another run, in place.
    pub fn replace_run(&mut self, loc: Locator, run: Run) -> crate::Result<()> {
        let paragraph = self
            .paragraph_mut(loc.block)
            .ok_or(TreeError::InvalidParent(loc))?;
        match paragraph.children.get_mut(loc.inline) {
            Some(slot @ Inline::Run(_)) => {
                *slot = Inline::Run(run);
                Ok(())
            }
            _ => Err(TreeError::InvalidParent(loc)),
        }
    }

    /// Insert inline content immediately after the position named by `loc`.
    pub fn insert_inline_after(&mut self, loc: Locator, inline: Inline) -> crate::Result<()> {
        let paragraph = self
            .paragraph_mut(loc.block)
            .ok_or(TreeError::InvalidParent(loc))?;
        if loc.inline >= paragraph.children.len() {
            return Err(TreeError::NodeNotFound(loc));
        }
        paragraph.children.insert(loc.inline + 1, inline);
        Ok(())
    }

    /// Detach and return the inline node at `loc`.
    pub fn remove_inline(&mut self, loc: Locator) -> crate::Result<Inline> {
        let paragraph = self
            .paragraph_mut(loc.block)
            .ok_or(TreeError::InvalidParent(loc))?;
        if loc.inline >= paragraph.children.len() {
            return Err(TreeError::NodeNotFound(loc));
        }
        Ok(paragraph.children.remove(loc.inline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DrawingNode, RunChild};

    fn sample_tree() -> Tree {
        let mut tree = Tree::new(PartKind::Document);
        tree.push_paragraph(Paragraph::with_text("first"));
        let mut p = Paragraph::with_text("second");
        p.children.push(Inline::Run(Run::text("third")));
        tree.push_paragraph(p);
        tree.blocks.push(Block::Raw("<w:sectPr/>".to_string()));
        tree
    }

    #[test]
    fn test_text_nodes_document_order() {
        let tree = sample_tree();
        let texts: Vec<&str> = tree.text_nodes().map(|(_, t)| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        // Restartable: a second traversal yields the same sequence.
        assert_eq!(tree.text_nodes().count(), 3);
        assert_eq!(tree.text(), "firstsecondthird");
    }

    #[test]
    fn test_text_mut_by_locator() {
        let mut tree = sample_tree();
        let (loc, _) = tree
            .text_nodes()
            .find(|(_, t)| t.text == "second")
            .map(|(l, t)| (l, t.text.clone()))
            .unwrap();
        tree.text_mut(loc).unwrap().text = "changed".to_string();
        assert_eq!(tree.text(), "firstchangedthird");
    }

    #[test]
    fn test_replace_run_with_drawing() {
        let mut tree = sample_tree();
        let loc = Locator { block: 0, inline: 0, child: 0 };
        let run = Run::drawing(DrawingNode::inline("rId9", 100, 100));
        tree.replace_run(loc, run).unwrap();
        assert_eq!(tree.drawings().count(), 1);
        assert_eq!(tree.text(), "secondthird");
    }

    #[test]
    fn test_replace_run_invalid_parent() {
        let mut tree = sample_tree();
        // Block 2 is raw section properties, not a paragraph.
        let loc = Locator { block: 2, inline: 0, child: 0 };
        let err = tree
            .replace_run(loc, Run::text("x"))
            .expect_err("raw block is not a valid parent");
        assert!(matches!(err, TreeError::InvalidParent(_)));
    }

    #[test]
    fn test_insert_after_then_remove() {
        let mut tree = sample_tree();
        let loc = Locator { block: 1, inline: 0, child: 0 };
        tree.insert_inline_after(loc, Inline::Run(Run::text("inserted")))
            .unwrap();
        let removed = tree.remove_inline(loc).unwrap();
        match removed {
            Inline::Run(r) => assert_eq!(r.text_content(), "second"),
            _ => panic!("expected a run"),
        }
        assert_eq!(tree.text(), "firstinsertedthird");
    }

    #[test]
    fn test_drawing_with_raw_child_not_listed() {
        let mut tree = Tree::new(PartKind::Header);
        let mut run = Run::text("h");
        run.children.push(RunChild::Raw("<w:tab/>".to_string()));
        tree.push_paragraph(Paragraph {
            properties: None,
            children: vec![Inline::Run(run)],
        });
        assert_eq!(tree.drawings().count(), 0);
        assert_eq!(tree.text(), "h");
    }
}
