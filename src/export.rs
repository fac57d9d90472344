//! Report export: the canonical plain-text report and the clipboard and
//! download capabilities that consume it.
//!
//! Export failures are transient. They are reported to the caller and never
//! touch the workflow state.

use crate::metrics::ResultStats;
use crate::summary::SummaryResult;
use arboard::Clipboard;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Title line at the top of every report
pub const REPORT_TITLE: &str = "AI Summary Report";

/// Label of the notes section
pub const NOTES_HEADING: &str = "Your Notes";

/// Default prefix for downloaded report files
pub const DEFAULT_FILENAME_PREFIX: &str = "summary-report";

/// Content type offered with downloads
pub const REPORT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("copy to clipboard failed: {0}")]
    Clipboard(String),
    #[error("download failed: {0}")]
    Download(String),
}

/// Platform clipboard capability
pub trait ClipboardWriter {
    fn write_text(&self, text: &str) -> Result<(), ExportError>;
}

/// Platform file-save capability
pub trait FileDownloader {
    fn save(&self, download: &Download) -> Result<(), ExportError>;
}

/// A file offered to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

/// Deterministic file name for a report saved at `at`
pub fn download_filename(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}.txt", prefix, at.format("%Y%m%d-%H%M%S"))
}

fn heading(title: &str) -> String {
    format!("{}\n{}\n", title, "-".repeat(title.chars().count()))
}

/// The combined report for one result and the user's notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    text: String,
}

impl Report {
    /// Render title, summary, statistics, numbered key points and notes, in
    /// that order.
    pub fn compose(result: &SummaryResult, notes: &str) -> Self {
        let stats = ResultStats::of(result);
        let mut out = format!(
            "{}\n{}\n\n",
            REPORT_TITLE,
            "=".repeat(REPORT_TITLE.chars().count())
        );

        out.push_str(&heading("Summary"));
        out.push_str(&format!("{}\n\n", result.summary.trim_end()));

        out.push_str(&heading("Statistics"));
        out.push_str(&format!("Engine: {}\n", result.engine_label()));
        out.push_str(&format!("Compression: {}\n", stats.compression));
        out.push_str(&format!("Original sentences: {}\n", stats.original_sentences));
        out.push_str(&format!("Summary sentences: {}\n", stats.sentence_count));
        out.push_str(&format!("Key points: {}\n", stats.key_point_count));
        out.push_str(&format!("Sections covered: {}\n", stats.sections_covered));
        out.push_str(&format!("Original characters: {}\n\n", stats.original_length));

        out.push_str(&heading("Key Points"));
        if result.key_points.is_empty() {
            out.push_str("No key points identified\n");
        }
        for (index, point) in result.key_points.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", index + 1, point));
        }
        out.push('\n');

        out.push_str(&heading(NOTES_HEADING));
        if !notes.is_empty() {
            out.push_str(&format!("{}\n", notes.trim_end()));
        }

        Self { text: out }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Put the exact report text on the clipboard
    pub fn copy_to<C>(&self, clipboard: &C) -> Result<(), ExportError>
    where
        C: ClipboardWriter + ?Sized,
    {
        clipboard.write_text(&self.text).inspect_err(|e| {
            tracing::warn!(error = %e, "clipboard export failed");
        })
    }

    /// Build the download for this report
    pub fn to_download(&self, prefix: &str, at: DateTime<Utc>) -> Download {
        Download {
            filename: download_filename(prefix, at),
            content_type: REPORT_CONTENT_TYPE,
            body: self.text.clone(),
        }
    }

    /// Offer the report as a file and return what was offered
    pub fn download<D>(&self, downloader: &D, prefix: &str, at: DateTime<Utc>) -> Result<Download, ExportError>
    where
        D: FileDownloader + ?Sized,
    {
        let download = self.to_download(prefix, at);
        downloader.save(&download).inspect_err(|e| {
            tracing::warn!(file = %download.filename, error = %e, "report download failed");
        })?;
        tracing::info!(file = %download.filename, bytes = download.body.len(), "report saved");
        Ok(download)
    }
}

/// Clipboard backed by the platform clipboard through arboard.
///
/// The handle is kept for the lifetime of the value so the copied text stays
/// available on platforms where the owning process serves the selection.
pub struct SystemClipboard {
    clipboard: Mutex<Option<Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let clipboard = match Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!("Failed to initialize clipboard: {}", e);
                None
            }
        };
        Self {
            clipboard: Mutex::new(clipboard),
        }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard").finish_non_exhaustive()
    }
}

impl ClipboardWriter for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), ExportError> {
        let mut guard = self
            .clipboard
            .lock()
            .map_err(|_| ExportError::Clipboard("clipboard lock poisoned".to_string()))?;
        if guard.is_none() {
            *guard = Some(Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?);
        }
        match guard.as_mut() {
            Some(clipboard) => clipboard
                .set_text(text)
                .map_err(|e| ExportError::Clipboard(e.to_string())),
            None => Err(ExportError::Clipboard("clipboard not available".to_string())),
        }
    }
}

/// Saves downloads into a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Where a download with this file name ends up
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl FileDownloader for DirectoryDownloader {
    fn save(&self, download: &Download) -> Result<(), ExportError> {
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(self.path_for(&download.filename), &download.body))
            .map_err(|e| ExportError::Download(e.to_string()))
    }
}
