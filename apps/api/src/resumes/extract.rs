//! Resume text extraction.
//!
//! PDF goes through `pdf-extract`; DOCX is a zip container whose
//! `word/document.xml` is stripped of markup. Both parsers are blocking and
//! run under `spawn_blocking`.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

/// Minimum trimmed length for extracted text to count as a readable resume.
pub const MIN_TEXT_CHARS: usize = 20;

const PDF_CONTENT_TYPE: &str = "application/pdf";
const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Picks the kind from the file extension. A specific content type, when
    /// the client sent one, must agree with it.
    pub fn from_upload(file_name: &str, content_type: Option<&str>) -> Result<Self, ExtractError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let kind = match extension.as_str() {
            "pdf" => DocumentKind::Pdf,
            "docx" => DocumentKind::Docx,
            _ => return Err(ExtractError::Unsupported(file_name.to_string())),
        };

        match content_type {
            None | Some("application/octet-stream") => Ok(kind),
            Some(declared) if declared == kind.content_type() => Ok(kind),
            Some(_) => Err(ExtractError::Unsupported(file_name.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_CONTENT_TYPE,
            DocumentKind::Docx => DOCX_CONTENT_TYPE,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error reading upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file '{0}': only .pdf and .docx resumes are accepted")]
    Unsupported(String),

    #[error("Could not read {kind} document: {reason}")]
    Corrupt { kind: &'static str, reason: String },

    #[error("Failed to extract readable text from CV ({chars} characters, need at least {MIN_TEXT_CHARS})")]
    TooShort { chars: usize },
}

impl ExtractError {
    fn corrupt(kind: DocumentKind, reason: impl ToString) -> Self {
        ExtractError::Corrupt {
            kind: kind.extension(),
            reason: reason.to_string(),
        }
    }
}

/// Turns a stored upload into plain text. Implementations block.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String, ExtractError>;
}

/// The production extractor backed by the document parsers.
pub struct FileTextExtractor;

impl TextExtractor for FileTextExtractor {
    fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String, ExtractError> {
        match kind {
            DocumentKind::Pdf => {
                pdf_extract::extract_text(path).map_err(|e| ExtractError::corrupt(kind, e))
            }
            DocumentKind::Docx => extract_docx(path),
        }
    }
}

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</w:p>|<w:br\s*/>|<w:cr\s*/>").expect("static regex"));
static TAB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<w:tab\s*/>").expect("static regex"));

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let kind = DocumentKind::Docx;
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractError::corrupt(kind, e))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::corrupt(kind, e))?;

    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::corrupt(kind, e))?;

    Ok(docx_xml_to_text(&xml))
}

fn docx_xml_to_text(xml: &str) -> String {
    let text = PARAGRAPH_END.replace_all(xml, "\n");
    let text = TAB.replace_all(&text, "\t");
    let text = TAG.replace_all(&text, "");
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Rejects text too short to be a resume. Returns the text untouched.
pub fn ensure_readable(text: String) -> Result<String, ExtractError> {
    let chars = text.trim().chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(ExtractError::TooShort { chars });
    }
    Ok(text)
}

/// Extracts and validates on the blocking pool. A parser panic surfaces as a
/// corrupt document.
pub async fn extract_readable(
    extractor: Arc<dyn TextExtractor>,
    path: PathBuf,
    kind: DocumentKind,
) -> Result<String, ExtractError> {
    let text = tokio::task::spawn_blocking(move || extractor.extract(&path, kind))
        .await
        .map_err(|e| ExtractError::corrupt(kind, format!("parser aborted: {e}")))??;
    ensure_readable(text)
}
