//! Resume text extraction. Dispatch is purely on file extension.

use std::io::{Cursor, Read};
use std::path::Path;

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),

    #[error("Resume is not valid UTF-8 text: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Extraction task failed: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// `.pdf`, `.docx` or `.txt`, case-insensitive. A name without an
    /// extension is taken to be a PDF.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            None | Some("pdf") => Ok(DocumentKind::Pdf),
            Some("docx") => Ok(DocumentKind::Docx),
            Some("txt") => Ok(DocumentKind::Text),
            Some(other) => Err(ExtractError::Unsupported(format!(".{other}"))),
        }
    }
}

/// Plain text of a document, trimmed.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
    let text = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        DocumentKind::Docx => docx_text(bytes)?,
        DocumentKind::Text => String::from_utf8(bytes.to_vec())?,
    };
    Ok(text.trim().to_string())
}

/// `extract_text` on the blocking pool; PDF parsing is CPU-bound.
pub async fn extract_text_blocking(kind: DocumentKind, bytes: Bytes) -> Result<String, ExtractError> {
    tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))?
}

/// One line per `<w:p>` paragraph, joining its `<w:t>` runs. Paragraphs
/// nested inside another (text boxes) get their own line, in document
/// order of where they open.
fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCX_BODY)
        .map_err(|e| ExtractError::Docx(format!("{DOCX_BODY}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    let malformed = |e: quick_xml::Error| ExtractError::Docx(format!("{DOCX_BODY}: {e}"));
    let mut reader = Reader::from_str(&xml);
    let mut lines: Vec<String> = Vec::new();
    // Indexes into `lines` of the paragraphs currently open.
    let mut open: Vec<usize> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.push(lines.len());
                    lines.push(String::new());
                }
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => {
                    open.pop();
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Empty(e) => {
                let piece = match e.name().as_ref() {
                    b"w:p" => {
                        lines.push(String::new());
                        None
                    }
                    // Tab stops in paragraph properties are also `w:tab`.
                    b"w:tab" if run_depth > 0 => Some('\t'),
                    b"w:br" | b"w:cr" if run_depth > 0 => Some('\n'),
                    _ => None,
                };
                if let (Some(c), Some(&line)) = (piece, open.last()) {
                    lines[line].push(c);
                }
            }
            Event::Text(t) if in_text => {
                if let Some(&line) = open.last() {
                    lines[line].push_str(&t.unescape().map_err(malformed)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(lines.join("\n"))
}
