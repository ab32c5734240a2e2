use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{
    ChatRequest, CodeHelpRequest, EssayRequest, OcrRequest, OcrResponse, Reply,
    ScienceHelpRequest, StatusResponse, ToolResponse,
};
use super::{Backend, BackendError};
use crate::config::BackendConfig;
use crate::dispatch::{EssayLength, EssayType, ScienceSubject};

const STATUS_PATH: &str = "/api/status";
const CHAT_PATH: &str = "/api/chat";
const ESSAY_PATH: &str = "/api/write/essay";
const ANALYZE_IMAGE_PATH: &str = "/api/analyze/image";
const CODE_HELP_PATH: &str = "/api/help/code";
const SCIENCE_HELP_PATH: &str = "/api/help/science";
const OCR_PATH: &str = "/api/ocr";

/// reqwest-backed client for the local assistant server
pub struct HttpBackend {
    base_url: String,
    http_client: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let backend = Self::new(config.base_url.as_str());
        let Some(secs) = config.request_timeout_secs else {
            return Ok(backend);
        };
        let http_client = Client::builder()
            .timeout(Duration::from_secs(secs))
            .build()
            .map_err(|e| BackendError::Connectivity {
                message: e.to_string(),
            })?;
        Ok(Self {
            http_client,
            ..backend
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        tracing::debug!("POST {}", path);
        let response = self
            .http_client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        decode(response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn status(&self) -> Result<StatusResponse, BackendError> {
        let response = self
            .http_client
            .get(self.url(STATUS_PATH))
            .send()
            .await
            .map_err(network_error)?;
        decode(response).await
    }

    async fn chat(&self, message: &str) -> Result<Reply, BackendError> {
        let body: ToolResponse = self.post_json(CHAT_PATH, &ChatRequest { message }).await?;
        into_reply(body)
    }

    async fn write_essay(
        &self,
        topic: &str,
        essay_type: EssayType,
        length: EssayLength,
    ) -> Result<Reply, BackendError> {
        let request = EssayRequest {
            topic,
            essay_type: essay_type.as_str(),
            length: length.as_str(),
        };
        let body: ToolResponse = self.post_json(ESSAY_PATH, &request).await?;
        into_reply(body)
    }

    async fn analyze_image(
        &self,
        file_name: &str,
        image: Bytes,
        question: Option<&str>,
    ) -> Result<Reply, BackendError> {
        let part = Part::bytes(image.to_vec())
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))
            .map_err(|e| BackendError::Parse {
                message: e.to_string(),
            })?;
        let mut form = Form::new().part("image", part);
        if let Some(question) = question {
            form = form.text("question", question.to_string());
        }

        tracing::debug!("POST {} ({})", ANALYZE_IMAGE_PATH, file_name);
        let response = self
            .http_client
            .post(self.url(ANALYZE_IMAGE_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        let body: ToolResponse = decode(response).await?;
        into_reply(body)
    }

    async fn help_code(&self, code: &str, question: &str) -> Result<Reply, BackendError> {
        let body: ToolResponse = self
            .post_json(CODE_HELP_PATH, &CodeHelpRequest { code, question })
            .await?;
        into_reply(body)
    }

    async fn help_science(
        &self,
        subject: ScienceSubject,
        question: &str,
    ) -> Result<Reply, BackendError> {
        let request = ScienceHelpRequest {
            subject: subject.as_str(),
            question,
        };
        let body: ToolResponse = self.post_json(SCIENCE_HELP_PATH, &request).await?;
        into_reply(body)
    }

    async fn extract_text(&self, image: Bytes) -> Result<Reply, BackendError> {
        let request = OcrRequest {
            image_data: base64::engine::general_purpose::STANDARD.encode(&image),
        };
        let body: OcrResponse = self.post_json(OCR_PATH, &request).await?;
        ocr_into_reply(body)
    }
}

fn network_error(e: reqwest::Error) -> BackendError {
    BackendError::Connectivity {
        message: e.to_string(),
    }
}

async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(BackendError::Backend {
            status: status.as_u16(),
            message: text,
        });
    }

    let text = response.text().await.map_err(network_error)?;
    serde_json::from_str(&text).map_err(|e| BackendError::Parse {
        message: e.to_string(),
    })
}

fn into_reply(body: ToolResponse) -> Result<Reply, BackendError> {
    match body.response {
        Some(text) if !text.trim().is_empty() => {
            let reply = Reply::new(text);
            Ok(match body.method {
                Some(method) => reply.with_method(method),
                None => reply,
            })
        }
        _ => Err(BackendError::EmptyResult),
    }
}

fn ocr_into_reply(body: OcrResponse) -> Result<Reply, BackendError> {
    if let Some(error) = body.error {
        return Err(BackendError::Backend {
            status: 200,
            message: error,
        });
    }
    match body.text {
        Some(text) if !text.trim().is_empty() => Ok(Reply::new(text)),
        _ => Err(BackendError::EmptyResult),
    }
}

fn image_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "image/png",
    }
}
