//! Pipeline state machine
//!
//! `Idle → Copied → Substituted → Rendered → Done`; the first failing
//! stage moves the pipeline to `Failed` and skips everything after it.
//! Substitution runs part by part, and the package is saved only after
//! the whole substitution phase succeeds, so a half-substituted package
//! never reaches disk. A render failure leaves the already-written
//! package in place for inspection.

use doc_pkg::Package;
use merge::{substitute_part, ApplyStats, ImageOptions, MergeError, TokenTable};
use render::{ConvertError, Converter};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Copied,
    Substituted,
    Rendered,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to copy template {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("substitution failed in {part}: {source}")]
    Substitute {
        part: String,
        #[source]
        source: MergeError,
    },

    #[error(transparent)]
    Package(#[from] doc_pkg::PkgError),

    #[error(transparent)]
    Render(#[from] ConvertError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub text_replacements: usize,
    pub images_injected: usize,
    pub parts_processed: usize,
    pub pdf: Option<PathBuf>,
}

/// One template-to-output run.
pub struct Pipeline {
    template: PathBuf,
    output: PathBuf,
    table: TokenTable,
    image_options: ImageOptions,
    pdf_dir: Option<PathBuf>,
    converter: Converter,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(template: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            output: output.into(),
            table: TokenTable::new(),
            image_options: ImageOptions::default(),
            pdf_dir: None,
            converter: Converter::default(),
            state: PipelineState::Idle,
        }
    }

    pub fn with_table(mut self, table: TokenTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_image_options(mut self, options: ImageOptions) -> Self {
        self.image_options = options;
        self
    }

    /// Render the substituted package to PDF into this directory.
    pub fn with_pdf_output(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pdf_dir = Some(dir.into());
        self
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run all stages. The first failure is returned and the pipeline
    /// ends in `Failed`; nothing is retried.
    pub fn run(&mut self) -> PipelineResult<RunReport> {
        match self.execute() {
            Ok(report) => Ok(report),
            Err(err) => {
                self.state = PipelineState::Failed;
                error!(error = %err, "pipeline failed");
                Err(err)
            }
        }
    }

    fn execute(&mut self) -> PipelineResult<RunReport> {
        std::fs::copy(&self.template, &self.output).map_err(|source| PipelineError::Copy {
            path: self.template.clone(),
            source,
        })?;
        self.state = PipelineState::Copied;
        info!(
            template = %self.template.display(),
            output = %self.output.display(),
            "copied template"
        );

        let mut package = Package::load(&self.output)?;
        let parts = package.story_parts();
        let mut stats = ApplyStats::default();
        for part in &parts {
            let part_stats =
                substitute_part(&mut package, part, &self.table, &self.image_options).map_err(
                    |source| PipelineError::Substitute {
                        part: part.name.clone(),
                        source,
                    },
                )?;
            stats.merge(part_stats);
        }
        package.save(&self.output)?;
        self.state = PipelineState::Substituted;
        info!(
            parts = parts.len(),
            text = stats.text_replacements,
            images = stats.images_injected,
            "substitution complete"
        );

        let pdf = match &self.pdf_dir {
            Some(dir) => {
                let artifact = self.converter.convert_to_pdf(&self.output, dir)?;
                self.state = PipelineState::Rendered;
                info!(artifact = %artifact.display(), "rendered");
                Some(artifact)
            }
            None => None,
        };

        self.state = PipelineState::Done;
        Ok(RunReport {
            text_replacements: stats.text_replacements,
            images_injected: stats.images_injected,
            parts_processed: parts.len(),
            pdf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_pkg::tree_reader;
    use doc_tree::PartKind;
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;

    const CONTENT_TYPES: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
        r#"<Default Extension="xml" ContentType="application/xml"/>"#,
        r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        r#"</Types>"#
    );

    const ROOT_RELS: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        r#"</Relationships>"#
    );

    fn write_template(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("template.docx");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opts = SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", opts).unwrap();
        zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
        zip.start_file("_rels/.rels", opts).unwrap();
        zip.write_all(ROOT_RELS.as_bytes()).unwrap();
        zip.start_file("word/document.xml", opts).unwrap();
        let document = format!(
            concat!(
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
                "<w:body>{}</w:body></w:document>"
            ),
            body
        );
        zip.write_all(document.as_bytes()).unwrap();
        zip.finish().unwrap();
        path
    }

    fn document_text(path: &Path) -> String {
        let package = Package::load(path).unwrap();
        let content = package.xml_part("word/document.xml").unwrap();
        tree_reader::parse(&content, PartKind::Document).unwrap().text()
    }

    #[test]
    fn test_run_substitutes_copy_and_keeps_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(
            dir.path(),
            "<w:p><w:r><w:t>Dear {{name}}, amount due: {{amount}}</w:t></w:r></w:p>",
        );
        let template_bytes = std::fs::read(&template).unwrap();
        let output = dir.path().join("letter.docx");

        let mut pipeline = Pipeline::new(&template, &output).with_table(
            TokenTable::new()
                .with_text("{{name}}", "Jane Doe")
                .with_text("{{amount}}", "500"),
        );
        let report = pipeline.run().unwrap();

        assert_eq!(pipeline.state(), PipelineState::Done);
        assert_eq!(report.text_replacements, 2);
        assert_eq!(report.parts_processed, 1);
        assert_eq!(report.pdf, None);
        assert_eq!(
            document_text(&output),
            "Dear Jane Doe, amount due: 500"
        );
        // The template is byte-identical to what was written.
        assert_eq!(std::fs::read(&template).unwrap(), template_bytes);
    }

    #[test]
    fn test_missing_template_fails_at_copy() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = Pipeline::new(
            dir.path().join("absent.docx"),
            dir.path().join("out.docx"),
        );
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, PipelineError::Copy { .. }));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(!dir.path().join("out.docx").exists());
    }

    #[test]
    fn test_substitution_failure_keeps_copied_document() {
        let dir = tempfile::tempdir().unwrap();
        let template =
            write_template(dir.path(), "<w:p><w:r><w:t>{{image}}</w:t></w:r></w:p>");
        let output = dir.path().join("out.docx");
        let mut pipeline = Pipeline::new(&template, &output).with_table(
            TokenTable::new().with_image("{{image}}", "/nonexistent/logo.png"),
        );
        let err = pipeline.run().unwrap_err();
        match err {
            PipelineError::Substitute { part, source } => {
                assert_eq!(part, "word/document.xml");
                assert!(matches!(source, MergeError::MissingImage { .. }));
            }
            other => panic!("expected Substitute, got {:?}", other),
        }
        assert_eq!(pipeline.state(), PipelineState::Failed);
        // The copy exists but still carries the placeholder.
        assert_eq!(document_text(&output), "{{image}}");
    }

    #[test]
    fn test_render_failure_leaves_package_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let template =
            write_template(dir.path(), "<w:p><w:r><w:t>Dear {{name}}</w:t></w:r></w:p>");
        let output = dir.path().join("out.docx");
        let mut pipeline = Pipeline::new(&template, &output)
            .with_table(TokenTable::new().with_text("{{name}}", "Jane"))
            .with_pdf_output(dir.path().join("pdf"))
            .with_converter(Converter::new("/nonexistent/soffice-for-tests"));
        let err = pipeline.run().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Render(ConvertError::ConverterNotFound(_))
        ));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        // Substitution already committed; the package is inspectable.
        assert_eq!(document_text(&output), "Dear Jane");
    }

    #[cfg(unix)]
    #[test]
    fn test_full_run_with_fake_converter() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let template =
            write_template(dir.path(), "<w:p><w:r><w:t>Dear {{name}}</w:t></w:r></w:p>");
        let output = dir.path().join("letter.docx");
        let program = dir.path().join("fake-soffice");
        std::fs::write(
            &program,
            "#!/bin/sh\ntouch \"$5/$(basename \"$6\" .docx).pdf\"\n",
        )
        .unwrap();
        let mut perms = std::fs::metadata(&program).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&program, perms).unwrap();

        let mut pipeline = Pipeline::new(&template, &output)
            .with_table(TokenTable::new().with_text("{{name}}", "Jane"))
            .with_pdf_output(dir.path().join("pdf"))
            .with_converter(Converter::new(&program));
        let report = pipeline.run().unwrap();
        assert_eq!(pipeline.state(), PipelineState::Done);
        assert_eq!(report.pdf, Some(dir.path().join("pdf").join("letter.pdf")));
        assert!(report.pdf.unwrap().is_file());
    }
}
