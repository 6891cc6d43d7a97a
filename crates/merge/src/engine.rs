//! The substitution engine
//!
//! Literal text replacements are applied in place. Image placeholders
//! are replaced by run surgery: a drawing run is inserted directly
//! after the matched run, then the matched run is removed, so inline
//! indices of every following sibling are unchanged. Text matches are
//! always applied before image matches so their locators stay valid.

use crate::{image_loader, MergeResult, Rotation, TokenMatch, TokenTable, TokenValue};
use doc_pkg::{tree_reader, tree_writer, Package, StoryPart};
use doc_tree::{unit, DrawingNode, Inline, Placement, Run, Tree, WrapMode};
use tracing::{debug, info};

/// Nominal injected-image size, in EMU.
pub const DEFAULT_WIDTH_EMU: i64 = 990_000;
pub const DEFAULT_HEIGHT_EMU: i64 = 792_000;

/// How injected images are sized and placed.
#[derive(Debug, Clone)]
pub struct ImageOptions {
    pub width_emu: i64,
    pub height_emu: i64,
    pub placement: Placement,
    /// Display name for the drawing; defaults to the image file name.
    pub name: Option<String>,
    pub rotation: Rotation,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width_emu: DEFAULT_WIDTH_EMU,
            height_emu: DEFAULT_HEIGHT_EMU,
            placement: Placement::Inline,
            name: None,
            rotation: Rotation::None,
        }
    }
}

impl ImageOptions {
    pub fn with_size(mut self, width_emu: i64, height_emu: i64) -> Self {
        self.width_emu = width_emu;
        self.height_emu = height_emu;
        self
    }

    /// Size from pixel dimensions at 96dpi, e.g. an image's natural size.
    pub fn with_pixel_size(self, width_px: u32, height_px: u32) -> Self {
        self.with_size(
            unit::pixels_to_emu(width_px),
            unit::pixels_to_emu(height_px),
        )
    }

    /// Anchor injected images at an absolute page offset instead of
    /// flowing them inline.
    pub fn anchored(mut self, x_emu: i64, y_emu: i64, wrap: WrapMode) -> Self {
        self.placement = Placement::Anchored { x_emu, y_emu, wrap };
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Counts of applied replacements for one part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub text_replacements: usize,
    pub images_injected: usize,
}

impl ApplyStats {
    pub fn merge(&mut self, other: ApplyStats) {
        self.text_replacements += other.text_replacements;
        self.images_injected += other.images_injected;
    }
}

/// Applies matches to one part's tree, registering image parts against
/// the owning part's relationship table as it goes.
pub struct Substitutor<'a> {
    package: &'a mut Package,
    part_name: String,
    image_options: ImageOptions,
}

impl<'a> Substitutor<'a> {
    pub fn new(package: &'a mut Package, part_name: impl Into<String>) -> Self {
        Self {
            package,
            part_name: part_name.into(),
            image_options: ImageOptions::default(),
        }
    }

    pub fn with_image_options(mut self, options: ImageOptions) -> Self {
        self.image_options = options;
        self
    }

    /// Apply all matches to the tree. The package gains one image part
    /// and one relationship per injected image. On failure the tree may
    /// be partially mutated; callers must not store it back.
    pub fn apply(
        &mut self,
        tree: &mut Tree,
        matches: &[TokenMatch],
        table: &TokenTable,
    ) -> MergeResult<ApplyStats> {
        let mut stats = ApplyStats::default();

        for m in matches.iter().filter(|m| !m.is_image) {
            let Some(TokenValue::Text(value)) = table.get(&m.key) else {
                continue;
            };
            if let Some(node) = tree.text_mut(m.location) {
                let replaced = node.text.replacen(&m.key, value, 1);
                if replaced != node.text {
                    node.preserve_space = node.preserve_space
                        || replaced.starts_with(char::is_whitespace)
                        || replaced.ends_with(char::is_whitespace);
                    node.text = replaced;
                    stats.text_replacements += 1;
                }
            }
        }

        for m in matches.iter().filter(|m| m.is_image) {
            let Some(TokenValue::Image { path }) = table.get(&m.key) else {
                continue;
            };
            // The run may already have been replaced if the same key
            // matched this node more than once.
            let still_present = tree
                .run(m.location)
                .map(|r| r.text_content().contains(&m.key))
                .unwrap_or(false);
            if !still_present {
                continue;
            }

            let image = image_loader::load(path, self.image_options.rotation)?;
            let (part_name, rel_id) =
                self.package
                    .add_image_part(&self.part_name, image.bytes, image.content_type)?;
            let name = self.image_options.name.clone().unwrap_or_else(|| {
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "Picture".to_string())
            });
            let drawing = DrawingNode {
                width_emu: self.image_options.width_emu,
                height_emu: self.image_options.height_emu,
                placement: self.image_options.placement,
                embed: rel_id,
                name,
                raw: None,
            };
            tree.insert_inline_after(m.location, Inline::Run(Run::drawing(drawing)))?;
            tree.remove_inline(m.location)?;
            debug!(part = %part_name, key = %m.key, "injected image");
            stats.images_injected += 1;
        }

        Ok(stats)
    }
}

/// Scan and substitute one story part, storing the rewritten markup
/// back into the package only after every match has been applied and
/// all drawing references verified. A failed part leaves the package's
/// markup parts untouched.
pub fn substitute_part(
    package: &mut Package,
    part: &StoryPart,
    table: &TokenTable,
    options: &ImageOptions,
) -> MergeResult<ApplyStats> {
    let content = package.xml_part(&part.name)?;
    let mut tree = tree_reader::parse(&content, part.kind)?;
    let found = crate::scan(&tree, table);
    if found.is_empty() {
        debug!(part = %part.name, "no placeholder matches");
        return Ok(ApplyStats::default());
    }
    let stats = Substitutor::new(package, &part.name)
        .with_image_options(options.clone())
        .apply(&mut tree, &found, table)?;
    package.verify_drawing_refs(&part.name, &tree)?;
    package.set_part(&part.name, tree_writer::serialize(&tree).into_bytes());
    info!(
        part = %part.name,
        text = stats.text_replacements,
        images = stats.images_injected,
        "substituted part"
    );
    Ok(stats)
}
