//! The in-memory package: parts, content types, relationship tables

use crate::{
    part_names, relationship_types, ContentTypes, PackageReader, PkgError, PkgResult,
    Relationships, TargetMode,
};
use doc_tree::{PartKind, Tree};
use std::collections::HashMap;
use std::io::{Read, Seek, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A structural part that participates in substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPart {
    pub name: String,
    pub kind: PartKind,
}

/// A loaded DOCX container. Parts are kept as bytes in original entry
/// order; content types and every `.rels` table are parsed on load and
/// regenerated on save. Parts are only added, never removed.
#[derive(Debug)]
pub struct Package {
    order: Vec<String>,
    parts: HashMap<String, Vec<u8>>,
    content_types: ContentTypes,
    /// Relationship tables keyed by owning part name; the package root
    /// owns the empty key.
    rels: HashMap<String, Relationships>,
}

impl Package {
    /// Open a package from disk.
    pub fn load(path: impl AsRef<Path>) -> PkgResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let package = Self::from_reader(file)?;
        debug!(path = %path.display(), parts = package.order.len(), "loaded package");
        Ok(package)
    }

    /// Open a package from any seekable source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> PkgResult<Self> {
        let mut reader = PackageReader::new(reader)?;
        let order = reader.names();

        let mut parts = HashMap::with_capacity(order.len());
        for name in &order {
            parts.insert(name.clone(), reader.read_bytes(name)?);
        }

        for required in [part_names::CONTENT_TYPES, part_names::DOCUMENT] {
            if !parts.contains_key(required) {
                return Err(PkgError::MissingPart(required.to_string()));
            }
        }

        let content_types = ContentTypes::parse(&part_as_string(
            parts.get(part_names::CONTENT_TYPES).unwrap(),
        )?)?;

        let mut rels = HashMap::new();
        for name in &order {
            if let Some(owner) = owner_of_rels(name) {
                let table = Relationships::parse(&part_as_string(parts.get(name).unwrap())?)?;
                rels.insert(owner, table);
            }
        }

        Ok(Self {
            order,
            parts,
            content_types,
            rels,
        })
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// A part decoded as UTF-8 markup.
    pub fn xml_part(&self, name: &str) -> PkgResult<String> {
        let bytes = self
            .parts
            .get(name)
            .ok_or_else(|| PkgError::MissingPart(name.to_string()))?;
        part_as_string(bytes)
    }

    /// Replace a part's bytes, or add the part if it is new.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        if !self.parts.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.parts.insert(name.to_string(), data);
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    /// The relationship table owned by a part, if it has one.
    pub fn rels_for(&self, owner: &str) -> Option<&Relationships> {
        self.rels.get(owner)
    }

    /// The relationship table owned by a part, created empty on demand
    /// (headers and footers often ship without one).
    pub fn rels_mut(&mut self, owner: &str) -> &mut Relationships {
        self.rels.entry(owner.to_string()).or_default()
    }

    /// The document part plus every header and footer reachable through
    /// the document's relationship table, document first.
    pub fn story_parts(&self) -> Vec<StoryPart> {
        let mut parts = vec![StoryPart {
            name: part_names::DOCUMENT.to_string(),
            kind: PartKind::Document,
        }];
        if let Some(doc_rels) = self.rels.get(part_names::DOCUMENT) {
            for (rel_type, kind) in [
                (relationship_types::HEADER, PartKind::Header),
                (relationship_types::FOOTER, PartKind::Footer),
            ] {
                for rel in doc_rels.of_type(rel_type) {
                    let name = resolve_target(part_names::DOCUMENT, &rel.target);
                    if self.has_part(&name) {
                        parts.push(StoryPart { name, kind });
                    }
                }
            }
        }
        parts
    }

    /// Register a new binary image part on behalf of `owner`. Returns the
    /// minted part name and the relationship id added to the owner's
    /// table.
    pub fn add_image_part(
        &mut self,
        owner: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> PkgResult<(String, String)> {
        if !self.has_part(owner) {
            return Err(PkgError::MissingPart(owner.to_string()));
        }
        let extension = extension_for(content_type);
        let sequence = self.next_media_sequence();
        let part_name = format!("word/media/image{}.{}", sequence, extension);

        self.content_types.ensure_default(extension, content_type);
        self.set_part(&part_name, bytes);

        let target = relative_target(owner, &part_name);
        let rel_id =
            self.rels_mut(owner)
                .add(relationship_types::IMAGE, &target, TargetMode::Internal);
        debug!(part = %part_name, rel = %rel_id, owner = %owner, "registered image part");
        Ok((part_name, rel_id))
    }

    fn next_media_sequence(&self) -> u32 {
        let mut max = 0u32;
        for name in &self.order {
            if let Some(rest) = name.strip_prefix("word/media/image") {
                if let Some(digits) = rest.split('.').next() {
                    if let Ok(n) = digits.parse::<u32>() {
                        max = max.max(n);
                    }
                }
            }
        }
        max + 1
    }

    /// Check that every drawing in a tree resolves through the owner's
    /// relationship table to a part present in the package.
    pub fn verify_drawing_refs(&self, owner: &str, tree: &Tree) -> PkgResult<()> {
        for drawing in tree.drawings() {
            let rel = self
                .rels_for(owner)
                .and_then(|r| r.get(&drawing.embed))
                .ok_or_else(|| {
                    PkgError::Relationship(format!(
                        "drawing embed {} has no relationship in {}",
                        drawing.embed, owner
                    ))
                })?;
            if rel.target_mode == TargetMode::Internal {
                let target = resolve_target(owner, &rel.target);
                if !self.has_part(&target) {
                    return Err(PkgError::Relationship(format!(
                        "relationship {} in {} targets missing part {}",
                        rel.id, owner, target
                    )));
                }
            }
        }
        Ok(())
    }

    /// Serialize the package to disk. Writes to a temporary file in the
    /// destination directory and commits on full success; the destination
    /// is never left partially written.
    pub fn save(&self, path: impl AsRef<Path>) -> PkgResult<()> {
        let path = path.as_ref();
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut temp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new_in(".")?,
        };
        self.write_to(&mut temp)?;
        temp.persist(path).map_err(|e| PkgError::Io(e.error))?;
        debug!(path = %path.display(), "saved package");
        Ok(())
    }

    /// Serialize all parts, the content types, and every relationship
    /// table into a container.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> PkgResult<()> {
        let mut regenerated: HashMap<String, Vec<u8>> = HashMap::new();
        regenerated.insert(
            part_names::CONTENT_TYPES.to_string(),
            self.content_types.to_xml().into_bytes(),
        );
        for (owner, table) in &self.rels {
            if !table.is_empty() {
                regenerated.insert(rels_name_for(owner), table.to_xml().into_bytes());
            }
        }

        let mut zip = ZipWriter::new(writer);
        let mut written: Vec<&str> = Vec::new();
        for name in &self.order {
            let data = regenerated
                .get(name.as_str())
                .or_else(|| self.parts.get(name))
                .ok_or_else(|| PkgError::MissingPart(name.clone()))?;
            write_entry(&mut zip, name, data)?;
            written.push(name);
        }
        // Relationship tables created for parts that had none (e.g. a
        // header receiving its first image) get fresh entries.
        for (name, data) in &regenerated {
            if !written.iter().any(|w| w == name) {
                write_entry(&mut zip, name, data)?;
            }
        }
        zip.finish()?;
        Ok(())
    }
}

fn write_entry<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
) -> PkgResult<()> {
    // Media is already compressed; markup deflates well.
    let method = if name.starts_with("word/media/") {
        zip::CompressionMethod::Stored
    } else {
        zip::CompressionMethod::Deflated
    };
    let options = SimpleFileOptions::default().compression_method(method);
    zip.start_file(name, options)?;
    zip.write_all(data)?;
    Ok(())
}

fn part_as_string(bytes: &[u8]) -> PkgResult<String> {
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// The `.rels` part name owning a source part's relationships.
pub(crate) fn rels_name_for(owner: &str) -> String {
    if owner.is_empty() {
        return part_names::ROOT_RELS.to_string();
    }
    match owner.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", owner),
    }
}

/// Inverse of [`rels_name_for`]: the owner of a `.rels` part name.
pub(crate) fn owner_of_rels(name: &str) -> Option<String> {
    let (dir, file) = name.rsplit_once('/')?;
    let stem = file.strip_suffix(".rels")?;
    if dir == "_rels" {
        if stem.is_empty() {
            return Some(String::new());
        }
        return Some(stem.to_string());
    }
    let parent = dir.strip_suffix("/_rels")?;
    Some(format!("{}/{}", parent, stem))
}

/// Resolve a relationship target against its owning part's directory.
pub(crate) fn resolve_target(owner: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = owner
        .rsplit_once('/')
        .map(|(dir, _)| dir.split('/').collect())
        .unwrap_or_default();
    for segment in target.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// A target path for `part` relative to `owner`'s directory.
pub(crate) fn relative_target(owner: &str, part: &str) -> String {
    let dir = owner.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    if dir.is_empty() {
        return part.to_string();
    }
    match part.strip_prefix(&format!("{}/", dir)) {
        Some(relative) => relative.to_string(),
        None => format!("/{}", part),
    }
}

/// Pick a part extension for an image content type.
fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpeg",
        "image/gif" => "gif",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/webp" => "webp",
        _ => "bin",
    }
}
