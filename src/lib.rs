//! # Precis
//!
//! Document summarisation workflow: submit pasted text or a PDF to a
//! summarisation service, review the summary and key points, add notes and
//! export a report.
//!
//! ## Features
//!
//! - **Explicit Workflow**: `WorkflowController` is a plain state machine with pure transitions
//! - **Live Statistics**: word, character, reading time, quality and compression figures
//! - **Pluggable Backends**: the HTTP summarisation service or Gemini via rstructor
//! - **Report Export**: deterministic plain-text report for clipboard and file download

pub mod agent;
pub mod config;
pub mod document;
pub mod export;
pub mod gateway;
pub mod metrics;
pub mod summary;
pub mod ui;
pub mod workflow;

pub use config::Config;
pub use document::{Document, FileUpload};
pub use export::Report;
pub use summary::SummaryResult;
pub use workflow::{Phase, WorkflowController};
