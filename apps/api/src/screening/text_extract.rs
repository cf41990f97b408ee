//! Text Extractor: converts uploaded resume bytes into plain text.
//!
//! Dispatch is by MIME type first, then filename extension:
//! PDF → `pdf-extract` (behind the default `pdf` feature), DOCX → `docx-rs`
//! paragraph text, anything else → lossy UTF-8.

use std::path::Path;

use thiserror::Error;

use crate::screening::models::ResumeFile;

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const MSWORD_MIME: &str = "application/msword";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported_format: {0}")]
    UnsupportedFormat(String),

    #[error("pdf_extraction_failed: {0}")]
    Pdf(String),

    #[error("docx_extraction_failed: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    /// Binary Word 97-2003 documents; no extractor exists for them.
    LegacyWord,
    PlainText,
}

impl DocumentKind {
    pub fn detect(mime_type: &str, filename: &str) -> Self {
        let mime = mime_type.trim().to_lowercase();
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if mime == PDF_MIME || extension == "pdf" {
            DocumentKind::Pdf
        } else if extension == "doc" {
            DocumentKind::LegacyWord
        } else if mime == DOCX_MIME || mime == MSWORD_MIME || extension == "docx" {
            DocumentKind::Docx
        } else {
            DocumentKind::PlainText
        }
    }
}

/// Extracts trimmed plain text from a resume file. Pure byte → text transform.
pub fn extract_text(file: &ResumeFile) -> Result<String, ExtractError> {
    let text = match DocumentKind::detect(&file.mime_type, &file.original_filename) {
        DocumentKind::Pdf => extract_pdf(&file.content)?,
        DocumentKind::Docx => extract_docx(&file.content)?,
        DocumentKind::LegacyWord => {
            return Err(ExtractError::UnsupportedFormat(format!(
                "legacy Word document '{}'",
                file.original_filename
            )))
        }
        DocumentKind::PlainText => String::from_utf8_lossy(&file.content).into_owned(),
    };
    Ok(text.trim().to_string())
}

#[cfg(feature = "pdf")]
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed documents.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractError::Pdf("parser panicked on malformed document".to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(_bytes: &[u8]) -> Result<String, ExtractError> {
    Err(ExtractError::UnsupportedFormat(
        "PDF support is not available in this build".to_string(),
    ))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    use docx_rs::DocumentChild;

    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => paragraph_text(paragraph, &mut text),
            DocumentChild::Table(table) => table_text(table, &mut text),
            _ => {}
        }
    }
    Ok(text)
}

/// One line per paragraph, including runs nested in hyperlinks and tracked insertions.
fn paragraph_text(paragraph: &docx_rs::Paragraph, out: &mut String) {
    for child in &paragraph.children {
        paragraph_child_text(child, out);
    }
    out.push('\n');
}

fn paragraph_child_text(child: &docx_rs::ParagraphChild, out: &mut String) {
    use docx_rs::{InsertChild, ParagraphChild};

    match child {
        ParagraphChild::Run(run) => run_text(run, out),
        ParagraphChild::Hyperlink(link) => {
            for nested in &link.children {
                paragraph_child_text(nested, out);
            }
        }
        ParagraphChild::Insert(insert) => {
            for nested in &insert.children {
                if let InsertChild::Run(run) = nested {
                    run_text(run, out);
                }
            }
        }
        _ => {}
    }
}

fn run_text(run: &docx_rs::Run, out: &mut String) {
    for run_child in &run.children {
        if let docx_rs::RunChild::Text(t) = run_child {
            out.push_str(&t.text);
        }
    }
}

fn table_text(table: &docx_rs::Table, out: &mut String) {
    use docx_rs::{TableCellContent, TableChild, TableRowChild};

    for TableChild::TableRow(row) in &table.rows {
        for TableRowChild::TableCell(cell) in &row.cells {
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => paragraph_text(paragraph, out),
                    TableCellContent::Table(nested) => table_text(nested, out),
                    _ => {}
                }
            }
        }
    }
}
