use serde::{Deserialize, Serialize};

/// `GET /api/status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    /// Older backends report this as `gpt2_ready`.
    #[serde(alias = "gpt2_ready", default)]
    pub ready: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct EssayRequest<'a> {
    pub topic: &'a str,
    pub essay_type: &'a str,
    pub length: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CodeHelpRequest<'a> {
    pub code: &'a str,
    pub question: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScienceHelpRequest<'a> {
    pub subject: &'a str,
    pub question: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct OcrRequest {
    pub image_data: String,
}

/// Body shared by chat, essay, image, code and science endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// `POST /api/ocr` answers with either `text` or `error`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// What a successful tool call hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub method: Option<String>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            method: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }
}
