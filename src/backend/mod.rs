//! Backend seam: one trait method per remote operation, plus the reqwest
//! implementation used at runtime.

mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::{Reply, StatusResponse};

use async_trait::async_trait;
use bytes::Bytes;

use crate::dispatch::{EssayLength, EssayType, ScienceSubject};

/// Remote assistant operations consumed by the client core
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/status`
    async fn status(&self) -> Result<StatusResponse, BackendError>;

    /// `POST /api/chat`
    async fn chat(&self, message: &str) -> Result<Reply, BackendError>;

    /// `POST /api/write/essay`
    async fn write_essay(
        &self,
        topic: &str,
        essay_type: EssayType,
        length: EssayLength,
    ) -> Result<Reply, BackendError>;

    /// `POST /api/analyze/image` as a raw multipart upload
    async fn analyze_image(
        &self,
        file_name: &str,
        image: Bytes,
        question: Option<&str>,
    ) -> Result<Reply, BackendError>;

    /// `POST /api/help/code`
    async fn help_code(&self, code: &str, question: &str) -> Result<Reply, BackendError>;

    /// `POST /api/help/science`
    async fn help_science(
        &self,
        subject: ScienceSubject,
        question: &str,
    ) -> Result<Reply, BackendError>;

    /// `POST /api/ocr` with the image embedded as base64
    async fn extract_text(&self, image: Bytes) -> Result<Reply, BackendError>;
}

/// Failures of a single backend call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Cannot reach backend: {message}")]
    Connectivity { message: String },

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Backend returned an empty result")]
    EmptyResult,

    #[error("Parse error: {message}")]
    Parse { message: String },
}

impl BackendError {
    /// Transport-level failure as opposed to a failure the backend reported.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BackendError::Connectivity { .. })
    }
}
