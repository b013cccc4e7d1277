//! Text extraction from uploaded documents.
//!
//! The declared filename decides how the bytes are read:
//!
//! | Suffix (any case) | Reader |
//! |---|---|
//! | `.pdf` | page-by-page text via `pdf-extract`, empty pages skipped |
//! | `.docx` | body paragraphs of `word/document.xml`, staged through a temp file |
//! | anything else | UTF-8 text, invalid bytes dropped, Latin-1 as last resort |
//!
//! Structure (pages, paragraphs) is collapsed into newline-separated text.

pub mod docx;
pub mod pdf;
pub mod plain;

use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read PDF: {0}")]
    Pdf(String),
    #[error("Failed to open DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Malformed DOCX markup: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The document formats the extractor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Classify a document by its filename suffix, ignoring case.
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if lower.ends_with(".docx") {
            DocumentKind::Docx
        } else {
            DocumentKind::PlainText
        }
    }
}

/// An uploaded document: raw bytes plus the filename it was declared with.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    pub bytes: &'a [u8],
    pub filename: &'a str,
}

impl<'a> Document<'a> {
    pub fn new(bytes: &'a [u8], filename: &'a str) -> Self {
        Self { bytes, filename }
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_filename(self.filename)
    }
}

/// Extract plain text from `document`.
///
/// `work_dir` is where DOCX uploads are staged while they are parsed; the
/// staged copy is removed before this returns, whatever the outcome.
pub fn extract(document: &Document<'_>, work_dir: &Path) -> Result<String, ExtractError> {
    let kind = document.kind();
    let text = match kind {
        DocumentKind::Pdf => pdf::extract(document.bytes)?,
        DocumentKind::Docx => docx::extract(document.bytes, work_dir)?,
        DocumentKind::PlainText => plain::decode(document.bytes),
    };

    log::debug!(
        "Extracted {} chars from {:?} ({:?}, {} bytes)",
        text.chars().count(),
        document.filename,
        kind,
        document.bytes.len()
    );
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::{extract, Document, DocumentKind, ExtractError};

    #[test]
    fn classifies_by_suffix_ignoring_case() {
        assert_eq!(DocumentKind::from_filename("paper.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("notes.Docx"), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_filename("notes.doc"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_filename("README"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_filename("pdf"), DocumentKind::PlainText);
    }

    #[test]
    fn plain_text_passes_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = Document::new(b"Hello world.", "hello.txt");
        assert_eq!(extract(&doc, dir.path()).unwrap(), "Hello world.");
    }

    #[test]
    fn empty_text_file_yields_empty_string() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = Document::new(b"", "empty.txt");
        assert_eq!(extract(&doc, dir.path()).unwrap(), "");
    }

    #[test]
    fn unknown_suffix_is_read_as_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = Document::new(b"# Title\nBody", "notes.md");
        assert_eq!(extract(&doc, dir.path()).unwrap(), "# Title\nBody");
    }

    #[test]
    fn malformed_pdf_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = Document::new(b"definitely not a pdf", "broken.pdf");
        assert!(matches!(extract(&doc, dir.path()), Err(ExtractError::Pdf(_))));
    }

    #[test]
    fn malformed_docx_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc = Document::new(b"definitely not a zip", "broken.docx");
        assert!(matches!(extract(&doc, dir.path()), Err(ExtractError::Zip(_))));
    }
}
