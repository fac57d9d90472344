//! Input acquisition: turns pasted text or an uploaded PDF into a `Document`.
//!
//! Text extraction itself is delegated to a `FileAcquirer`; this module only
//! checks what the user handed over and normalises the result.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// The only media type accepted for uploads
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Upload size limit (10 MB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("no text to summarise")]
    EmptyText,
    #[error("unsupported file type `{0}`: only PDF files are accepted")]
    UnsupportedMediaType(String),
    #[error("file is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },
    #[error("no file chosen")]
    NoFileChosen,
    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),
}

impl InputError {
    /// True for errors caused by what the user provided, as opposed to a
    /// failing extractor.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, InputError::ExtractionFailed(_))
    }
}

/// Where the document content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    File,
}

/// A normalised unit of content to be summarised.
///
/// Fields are read-only once built; a new document replaces an old one
/// wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    source_kind: SourceKind,
    content: String,
    original_length: usize,
    file_name: Option<String>,
    pages: Option<usize>,
}

impl Document {
    /// Build a document from pasted or typed text
    pub fn from_text(text: impl Into<String>) -> Result<Self, InputError> {
        Self::build(SourceKind::Text, text.into(), None, None)
    }

    /// Build a document from text an extractor produced for an upload
    pub fn from_extracted(upload: &FileUpload, extracted: ExtractedText) -> Result<Self, InputError> {
        if extracted.text.trim().is_empty() {
            return Err(InputError::ExtractionFailed(
                "no text found in PDF, it might be a scanned document".to_string(),
            ));
        }
        Self::build(
            SourceKind::File,
            extracted.text,
            Some(upload.name.clone()),
            extracted.pages,
        )
    }

    fn build(
        source_kind: SourceKind,
        content: String,
        file_name: Option<String>,
        pages: Option<usize>,
    ) -> Result<Self, InputError> {
        if content.trim().is_empty() {
            return Err(InputError::EmptyText);
        }
        let original_length = crate::metrics::character_count(&content);
        Ok(Self {
            source_kind,
            content,
            original_length,
            file_name,
            pages,
        })
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Length of the content in characters
    pub fn original_length(&self) -> usize {
        self.original_length
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn pages(&self) -> Option<usize> {
        self.pages
    }
}

/// A file handed over by the platform (picker or drag-and-drop)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// File name as reported by the platform
    pub name: String,
    /// Declared media type; may be empty when the platform does not know
    pub media_type: String,
    /// Raw file bytes
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring the media type from its extension
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = if name.to_lowercase().ends_with(".pdf") {
            PDF_MEDIA_TYPE.to_string()
        } else {
            String::new()
        };
        Ok(Self::new(name, media_type, bytes))
    }

    /// Check media type and size before anything is sent for extraction
    pub fn validate(&self) -> Result<(), InputError> {
        let declared = self.media_type.trim().to_lowercase();
        let is_pdf = if declared.is_empty() {
            self.name.to_lowercase().ends_with(".pdf")
        } else {
            declared == PDF_MEDIA_TYPE
        };
        if !is_pdf {
            let shown = if declared.is_empty() {
                self.name.clone()
            } else {
                declared
            };
            return Err(InputError::UnsupportedMediaType(shown));
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(InputError::FileTooLarge {
                size: self.bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        Ok(())
    }
}

/// Pick the single file to work with from a selection.
///
/// Only the first file counts; the rest are dropped, not queued.
pub fn select_first(files: Vec<FileUpload>) -> Result<FileUpload, InputError> {
    files.into_iter().next().ok_or(InputError::NoFileChosen)
}

/// Text an extractor pulled out of an upload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedText {
    pub text: String,
    pub pages: Option<usize>,
}

/// Capability that turns an uploaded file into plain text
#[async_trait]
pub trait FileAcquirer {
    async fn extract(&self, upload: &FileUpload) -> Result<ExtractedText, InputError>;
}

/// Validate an upload, extract its text and build a document from it
pub async fn acquire_file<A>(acquirer: &A, upload: &FileUpload) -> Result<Document, InputError>
where
    A: FileAcquirer + ?Sized,
{
    upload.validate()?;
    let extracted = acquirer.extract(upload).await?;
    tracing::debug!(
        file = %upload.name,
        pages = ?extracted.pages,
        "extracted text from upload"
    );
    Document::from_extracted(upload, extracted)
}
