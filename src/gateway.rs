//! Summarisation gateway: the request/response contract with the external
//! summarisation service.
//!
//! Uses reqwest for the HTTP backend. No timeout is set on requests; a caller
//! that gives up simply stops waiting and lets the workflow discard the late
//! reply.

use crate::document::{Document, ExtractedText, FileAcquirer, FileUpload, InputError, PDF_MEDIA_TYPE};
use crate::summary::{SummaryLength, SummaryResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("precis/", env!("CARGO_PKG_VERSION"), " (https://github.com/cladam/precis)");

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("could not reach summarisation service: {0}")]
    Network(#[from] reqwest::Error),
    #[error("summarisation service returned {status}: {message}")]
    Service { status: StatusCode, message: String },
    #[error("malformed response from summarisation service: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl GatewayError {
    /// Whether resubmitting the same document could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network(_) | GatewayError::Malformed(_) => true,
            GatewayError::Service { status, .. } => !status.is_client_error(),
        }
    }
}

/// A failed submission as presented to the user.
///
/// The workflow never retries on its own; `retryable` only tells the host
/// whether to emphasise the retry action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Failure {
    pub message: String,
    pub retryable: bool,
}

impl Failure {
    pub fn new(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            message: message.into(),
            retryable,
        }
    }
}

impl From<GatewayError> for Failure {
    fn from(err: GatewayError) -> Self {
        let retryable = err.is_retryable();
        let message = match &err {
            GatewayError::Service { message, .. } => message.clone(),
            _ => err.to_string(),
        };
        Failure { message, retryable }
    }
}

/// Capability that produces a summary for a document
#[async_trait]
pub trait Summarizer {
    async fn submit(&self, document: &Document) -> Result<SummaryResult, Failure>;
}

/// Reply of the service health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub ai_engine: Option<String>,
    #[serde(default)]
    pub gemini_available: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    length: SummaryLength,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct ExtractBody {
    text: String,
    #[serde(default)]
    pages: Option<usize>,
}

/// Create a configured HTTP client for the service
fn create_client() -> Result<Client, reqwest::Error> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Turn a response into `T`, mapping `{"error": ...}` bodies and non-2xx
/// statuses into `GatewayError::Service`.
async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await?;

    if let Ok(err) = serde_json::from_str::<ErrorBody>(&body) {
        return Err(GatewayError::Service {
            status,
            message: err.error,
        });
    }
    if !status.is_success() {
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body.trim().to_string()
        };
        return Err(GatewayError::Service { status, message });
    }

    Ok(serde_json::from_str(&body)?)
}

/// Summariser backed by the HTTP summarisation service
#[derive(Debug, Clone)]
pub struct HttpSummarizer {
    client: Client,
    base_url: String,
    length: SummaryLength,
}

impl HttpSummarizer {
    pub fn new(base_url: &str, length: SummaryLength) -> Result<Self, GatewayError> {
        Ok(Self {
            client: create_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            length,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query the service health endpoint
    pub async fn health(&self) -> Result<HealthStatus, GatewayError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// Send one summarisation request
    pub async fn request(&self, document: &Document) -> Result<SummaryResult, GatewayError> {
        let url = format!("{}/summarize", self.base_url);
        tracing::info!(
            %url,
            characters = document.original_length(),
            length = %self.length,
            "submitting document for summarisation"
        );

        let response = self
            .client
            .post(&url)
            .json(&SummarizeRequest {
                text: document.content(),
                length: self.length,
            })
            .send()
            .await?;

        let result: SummaryResult = decode(response).await?;
        tracing::debug!(method = %result.method, key_points = result.key_points.len(), "summary received");
        Ok(result)
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn submit(&self, document: &Document) -> Result<SummaryResult, Failure> {
        self.request(document).await.map_err(|e| {
            tracing::warn!(error = %e, "summarisation request failed");
            Failure::from(e)
        })
    }
}

/// Extractor that hands PDFs to the service's extraction endpoint
#[derive(Debug, Clone)]
pub struct ServiceExtractor {
    client: Client,
    base_url: String,
}

impl ServiceExtractor {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Ok(Self {
            client: create_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn request(&self, upload: &FileUpload) -> Result<ExtractedText, GatewayError> {
        let url = format!("{}/extract-pdf", self.base_url);
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.name.clone())
            .mime_str(PDF_MEDIA_TYPE)?;
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let body: ExtractBody = decode(response).await?;
        Ok(ExtractedText {
            text: body.text,
            pages: body.pages,
        })
    }
}

#[async_trait]
impl FileAcquirer for ServiceExtractor {
    async fn extract(&self, upload: &FileUpload) -> Result<ExtractedText, InputError> {
        self.request(upload).await.map_err(|e| {
            tracing::warn!(file = %upload.name, error = %e, "pdf extraction failed");
            match e {
                GatewayError::Service { message, .. } => InputError::ExtractionFailed(message),
                other => InputError::ExtractionFailed(other.to_string()),
            }
        })
    }
}
