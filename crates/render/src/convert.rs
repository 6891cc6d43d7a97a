//! The converter process wrapper

use crate::{ConvertError, ConvertResult};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Invokes a headless office process to convert a document to PDF.
#[derive(Debug, Clone)]
pub struct Converter {
    program: PathBuf,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl Converter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Convert `input` to PDF, writing the artifact into `out_dir`. The
    /// artifact keeps the input's base name with a `.pdf` extension.
    /// Blocks until the converter exits; there is no timeout, a hung
    /// converter hangs the caller.
    pub fn convert_to_pdf(&self, input: &Path, out_dir: &Path) -> ConvertResult<PathBuf> {
        let stem = input
            .file_stem()
            .ok_or_else(|| ConvertError::InvalidInput(input.to_path_buf()))?;
        std::fs::create_dir_all(out_dir)?;

        debug!(program = %self.program.display(), input = %input.display(), "invoking converter");
        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::ConverterNotFound(self.program.clone())
                } else {
                    ConvertError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConvertError::ConversionFailed {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let artifact = out_dir.join(format!("{}.pdf", stem.to_string_lossy()));
        if !artifact.is_file() {
            return Err(ConvertError::OutputMissing(artifact));
        }
        info!(artifact = %artifact.display(), "conversion complete");
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program() {
        let converter = Converter::new("/nonexistent/soffice-for-tests");
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.docx");
        std::fs::write(&input, b"stub").unwrap();
        let err = converter
            .convert_to_pdf(&input, dir.path())
            .unwrap_err();
        assert!(matches!(err, ConvertError::ConverterNotFound(_)));
    }

    #[test]
    fn test_input_without_file_name() {
        let converter = Converter::default();
        let dir = tempfile::tempdir().unwrap();
        let err = converter
            .convert_to_pdf(Path::new("/"), dir.path())
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidInput(_)));
    }

    #[cfg(unix)]
    mod fake_converter {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Install an executable shell script standing in for soffice.
        fn install(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-soffice");
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            let mut perms = std::fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).unwrap();
            path
        }

        #[test]
        fn test_successful_conversion() {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("letter.docx");
            std::fs::write(&input, b"stub").unwrap();
            // Args: --headless --convert-to pdf --outdir <dir> <input>
            let program = install(
                dir.path(),
                r#"touch "$5/$(basename "$6" .docx).pdf""#,
            );
            let out_dir = dir.path().join("out");
            let artifact = Converter::new(&program)
                .convert_to_pdf(&input, &out_dir)
                .unwrap();
            assert_eq!(artifact, out_dir.join("letter.pdf"));
            assert!(artifact.is_file());
        }

        #[test]
        fn test_nonzero_exit() {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("letter.docx");
            std::fs::write(&input, b"stub").unwrap();
            let program = install(dir.path(), r#"echo "no filter found" >&2; exit 3"#);
            let err = Converter::new(&program)
                .convert_to_pdf(&input, dir.path())
                .unwrap_err();
            match err {
                ConvertError::ConversionFailed { status, stderr } => {
                    assert_eq!(status, Some(3));
                    assert!(stderr.contains("no filter found"));
                }
                other => panic!("expected ConversionFailed, got {:?}", other),
            }
        }

        #[test]
        fn test_missing_artifact() {
            let dir = tempfile::tempdir().unwrap();
            let input = dir.path().join("letter.docx");
            std::fs::write(&input, b"stub").unwrap();
            let program = install(dir.path(), "exit 0");
            let err = Converter::new(&program)
                .convert_to_pdf(&input, dir.path())
                .unwrap_err();
            match err {
                ConvertError::OutputMissing(path) => {
                    assert_eq!(path, dir.path().join("letter.pdf"));
                }
                other => panic!("expected OutputMissing, got {:?}", other),
            }
        }
    }
}
