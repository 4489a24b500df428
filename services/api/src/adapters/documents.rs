//! services/api/src/adapters/documents.rs
//!
//! Extracts plain text from uploaded PDF and Word documents.
//! It implements the `DocumentExtractor` port from the `core` crate.

use async_trait::async_trait;
use classmate_core::domain::{DocumentContext, DocumentKind};
use classmate_core::ports::{DocumentExtractor, PortError, PortResult};
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use lopdf::Document as PdfDocument;
use tracing::{debug, warn};

/// Text extraction via `lopdf` (PDF) and `docx-rs` (Word).
#[derive(Clone, Default)]
pub struct LocalDocumentExtractor;

impl LocalDocumentExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Extracts every page, each preceded by a `--- Page N ---` marker.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    let doc = PdfDocument::load_mem(bytes).map_err(|e| e.to_string())?;

    let mut text = String::new();
    for (index, page_num) in doc.get_pages().keys().enumerate() {
        text.push_str(&format!("\n--- Page {} ---\n", index + 1));
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!("Failed to extract text from page {}: {}", page_num, e),
        }
    }
    Ok(text.trim().to_string())
}

/// Extracts the text of every non-blank paragraph, one per line.
pub fn extract_word_text(bytes: &[u8]) -> Result<String, String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| e.to_string())?;

    let mut text = String::new();
    for child in &docx.document.children {
        let DocumentChild::Paragraph(paragraph) = child else {
            continue;
        };
        let mut line = String::new();
        for paragraph_child in &paragraph.children {
            if let ParagraphChild::Run(run) = paragraph_child {
                for run_child in &run.children {
                    if let RunChild::Text(t) = run_child {
                        line.push_str(&t.text);
                    }
                }
            }
        }
        if !line.trim().is_empty() {
            text.push_str(&line);
            text.push('\n');
        }
    }
    Ok(text.trim().to_string())
}

fn extract(kind: DocumentKind, bytes: &[u8]) -> PortResult<String> {
    match kind {
        DocumentKind::Pdf => extract_pdf_text(bytes).map_err(|e| {
            PortError::Invalid(format!("Error extracting text from PDF: {}", e))
        }),
        DocumentKind::Docx | DocumentKind::Doc => extract_word_text(bytes).map_err(|e| {
            PortError::Invalid(format!("Error extracting text from Word document: {}", e))
        }),
    }
}

#[async_trait]
impl DocumentExtractor for LocalDocumentExtractor {
    async fn extract(
        &self,
        file_name: &str,
        kind: DocumentKind,
        bytes: Vec<u8>,
    ) -> PortResult<DocumentContext> {
        debug!("Extracting {:?} text from {}", kind, file_name);
        let text = tokio::task::spawn_blocking(move || extract(kind, &bytes))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))??;

        Ok(DocumentContext {
            file_name: file_name.to_string(),
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::notes_render::{render_docx, render_pdf};
    use chrono::NaiveDate;
    use classmate_core::domain::NotesDocument;

    fn notes() -> NotesDocument {
        NotesDocument {
            title: "Sorting".into(),
            subject: "Algorithms".into(),
            date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            notes: "Merge sort splits the input.\n\nQuick sort picks a pivot.".into(),
        }
    }

    #[tokio::test]
    async fn word_documents_yield_their_paragraphs() {
        let bytes = render_docx(&notes()).unwrap();
        let doc = LocalDocumentExtractor::new()
            .extract("notes.docx", DocumentKind::Docx, bytes)
            .await
            .unwrap();

        assert_eq!(doc.file_name, "notes.docx");
        assert!(doc.text.starts_with("Sorting"));
        assert!(doc.text.contains("Merge sort splits the input."));
        assert!(doc.text.contains("Quick sort picks a pivot."));
        assert!(!doc.text.contains("\n\n"));
    }

    #[tokio::test]
    async fn pdf_pages_are_marked() {
        let bytes = render_pdf(&notes()).unwrap();
        let doc = LocalDocumentExtractor::new()
            .extract("notes.pdf", DocumentKind::Pdf, bytes)
            .await
            .unwrap();

        assert!(doc.text.starts_with("--- Page 1 ---"));
    }

    #[tokio::test]
    async fn garbage_is_a_descriptive_error() {
        let extractor = LocalDocumentExtractor::new();

        let err = extractor
            .extract("broken.pdf", DocumentKind::Pdf, b"not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Error extracting text from PDF:"));

        let err = extractor
            .extract("broken.doc", DocumentKind::Doc, b"not a doc".to_vec())
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Error extracting text from Word document:"));
    }
}
