//! Closed node set for story-part content

use serde::{Deserialize, Serialize};

/// Block-level content of a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(Paragraph),
    /// Markup outside the modeled node set (tables, section properties,
    /// bookmarks), preserved verbatim.
    Raw(String),
}

/// A paragraph: properties plus a sequence of inline children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Verbatim `w:pPr` markup, if present.
    pub properties: Option<String>,
    pub children: Vec<Inline>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a paragraph holding a single text run.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            properties: None,
            children: vec![Inline::Run(Run::text(text))],
        }
    }

    /// Iterate the runs of this paragraph, skipping raw inline markup.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.children.iter().filter_map(|c| match c {
            Inline::Run(r) => Some(r),
            Inline::Raw(_) => None,
        })
    }
}

/// Inline-level content of a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    Run(Run),
    /// Hyperlinks, bookmarks, proofing marks and other inline markup
    /// outside the modeled set, preserved verbatim.
    Raw(String),
}

/// A run: properties plus text, drawing, or raw children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Verbatim `w:rPr` markup, if present.
    pub properties: Option<String>,
    pub children: Vec<RunChild>,
}

impl Run {
    /// Build a run holding a single text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            properties: None,
            children: vec![RunChild::Text(TextNode::new(text))],
        }
    }

    /// Build a run holding a single drawing node.
    pub fn drawing(drawing: DrawingNode) -> Self {
        Self {
            properties: None,
            children: vec![RunChild::Drawing(drawing)],
        }
    }

    /// Concatenated character data of this run's text nodes.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                RunChild::Text(t) => Some(t.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Content of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunChild {
    Text(TextNode),
    Drawing(DrawingNode),
    /// Breaks, tabs, field chars and other run content outside the
    /// modeled set, preserved verbatim.
    Raw(String),
}

/// A `w:t` element: character data plus its `xml:space` handling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
    /// Emit `xml:space="preserve"` on serialization. Set automatically
    /// when the text carries leading or trailing whitespace.
    pub preserve_space: bool,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let preserve_space = text
            .chars()
            .next()
            .map(char::is_whitespace)
            .unwrap_or(false)
            || text.chars().last().map(char::is_whitespace).unwrap_or(false);
        Self {
            text,
            preserve_space,
        }
    }
}

/// Text-wrap mode of an anchored drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    Square,
    Tight,
    Through,
    TopAndBottom,
    None,
}

/// Where a drawing sits relative to the text flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Flows with the text at the run position.
    Inline,
    /// Anchored at an absolute page offset, in EMU.
    Anchored {
        x_emu: i64,
        y_emu: i64,
        wrap: WrapMode,
    },
}

/// An embedded image: size, placement, and the relationship id that
/// resolves to the image part inside the package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingNode {
    pub width_emu: i64,
    pub height_emu: i64,
    pub placement: Placement,
    /// Relationship id (`rId{n}`) in the owning part's relationship table.
    pub embed: String,
    /// Display name carried into `wp:docPr`.
    pub name: String,
    /// Verbatim source markup for drawings read from an existing part.
    /// When present, serialization re-emits it unchanged; drawings built
    /// by this engine leave it `None` and are generated from the typed
    /// fields.
    pub raw: Option<String>,
}

impl DrawingNode {
    /// An inline drawing of the given EMU size.
    pub fn inline(embed: impl Into<String>, width_emu: i64, height_emu: i64) -> Self {
        Self {
            width_emu,
            height_emu,
            placement: Placement::Inline,
            embed: embed.into(),
            name: "Picture".to_string(),
            raw: None,
        }
    }

    /// A drawing anchored at an absolute page offset with a wrap mode.
    pub fn anchored(
        embed: impl Into<String>,
        width_emu: i64,
        height_emu: i64,
        x_emu: i64,
        y_emu: i64,
        wrap: WrapMode,
    ) -> Self {
        Self {
            width_emu,
            height_emu,
            placement: Placement::Anchored { x_emu, y_emu, wrap },
            embed: embed.into(),
            name: "Picture".to_string(),
            raw: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
