//! ZIP archive reading

use crate::{PkgError, PkgResult};
use std::io::{Read, Seek};
use zip::ZipArchive;

/// A wrapper around a ZIP archive for reading package parts.
pub struct PackageReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> PackageReader<R> {
    pub fn new(reader: R) -> PkgResult<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Read a part as a string.
    pub fn read_string(&mut self, name: &str) -> PkgResult<String> {
        let bytes = self.read_bytes(name)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Read a part as bytes.
    pub fn read_bytes(&mut self, name: &str) -> PkgResult<Vec<u8>> {
        let mut file = self.archive.by_name(name).map_err(|e| {
            if matches!(e, zip::result::ZipError::FileNotFound) {
                PkgError::MissingPart(name.to_string())
            } else {
                PkgError::from(e)
            }
        })?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.archive.file_names().any(|n| n == name)
    }

    /// Entry names in archive order.
    pub fn names(&mut self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            if let Ok(file) = self.archive.by_index(i) {
                names.push(file.name().to_string());
            }
        }
        names
    }
}
