//! Scripted fakes for the backend and host shell

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::backend::{Backend, BackendError, Reply, StatusResponse};
use crate::dispatch::{EssayLength, EssayType, ScienceSubject};
use crate::shell::{HostShell, Screenshot, ShellError};

/// Next outcome of a tool call
pub enum Scripted {
    Reply(Result<Reply, BackendError>),
    Panic,
}

/// Backend that replays queued results and records every call
#[derive(Default)]
pub struct ScriptedBackend {
    statuses: Mutex<VecDeque<Result<StatusResponse, BackendError>>>,
    replies: Mutex<VecDeque<Scripted>>,
    status_times: Mutex<Vec<Instant>>,
    calls: Mutex<Vec<String>>,
    hold: Option<Arc<Semaphore>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tool calls block until [`ScriptedBackend::release`] is called.
    pub fn held() -> Self {
        Self {
            hold: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub fn release(&self, calls: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(calls);
        }
    }

    pub fn push_status(&self, status: Result<StatusResponse, BackendError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn push_reply(&self, reply: Result<Reply, BackendError>) {
        self.replies.lock().unwrap().push_back(Scripted::Reply(reply));
    }

    pub fn push_panic(&self) {
        self.replies.lock().unwrap().push_back(Scripted::Panic);
    }

    pub fn status_calls(&self) -> usize {
        self.status_times.lock().unwrap().len()
    }

    pub fn status_times(&self) -> Vec<Instant> {
        self.status_times.lock().unwrap().clone()
    }

    /// Tool calls as `"<endpoint>:<args>"`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn tool_call(&self, call: String) -> Result<Reply, BackendError> {
        self.calls.lock().unwrap().push(call);
        if let Some(hold) = &self.hold {
            hold.acquire().await.unwrap().forget();
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => reply,
            Some(Scripted::Panic) => panic!("scripted backend panic"),
            None => Err(BackendError::Connectivity {
                message: "no scripted reply".to_string(),
            }),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn status(&self) -> Result<StatusResponse, BackendError> {
        self.status_times.lock().unwrap().push(Instant::now());
        let next = self.statuses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(BackendError::Connectivity {
                message: "no scripted status".to_string(),
            })
        })
    }

    async fn chat(&self, message: &str) -> Result<Reply, BackendError> {
        self.tool_call(format!("chat:{}", message)).await
    }

    async fn write_essay(
        &self,
        topic: &str,
        essay_type: EssayType,
        length: EssayLength,
    ) -> Result<Reply, BackendError> {
        self.tool_call(format!("essay:{}|{}|{}", topic, essay_type, length))
            .await
    }

    async fn analyze_image(
        &self,
        file_name: &str,
        image: Bytes,
        question: Option<&str>,
    ) -> Result<Reply, BackendError> {
        self.tool_call(format!(
            "image:{}|{}|{}",
            file_name,
            image.len(),
            question.unwrap_or("-")
        ))
        .await
    }

    async fn help_code(&self, code: &str, question: &str) -> Result<Reply, BackendError> {
        self.tool_call(format!("code:{}|{}", code, question)).await
    }

    async fn help_science(
        &self,
        subject: ScienceSubject,
        question: &str,
    ) -> Result<Reply, BackendError> {
        self.tool_call(format!("science:{}|{}", subject, question))
            .await
    }

    async fn extract_text(&self, image: Bytes) -> Result<Reply, BackendError> {
        self.tool_call(format!("ocr:{}", image.len())).await
    }
}

/// Host shell that records what it was asked to do
#[derive(Default)]
pub struct RecordingShell {
    screenshots: Mutex<VecDeque<Screenshot>>,
    overlay_calls: Mutex<Vec<bool>>,
    focus_requests: Mutex<usize>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_screenshot(&self, shot: Screenshot) {
        self.screenshots.lock().unwrap().push_back(shot);
    }

    pub fn overlay_calls(&self) -> Vec<bool> {
        self.overlay_calls.lock().unwrap().clone()
    }

    pub fn focus_requests(&self) -> usize {
        *self.focus_requests.lock().unwrap()
    }
}

#[async_trait]
impl HostShell for RecordingShell {
    async fn capture_screenshot(&self) -> Result<Screenshot, ShellError> {
        let next = self.screenshots.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(Screenshot::failed))
    }

    async fn set_overlay_chrome(&self, enabled: bool) -> Result<(), ShellError> {
        self.overlay_calls.lock().unwrap().push(enabled);
        Ok(())
    }

    fn show_and_focus(&self) {
        *self.focus_requests.lock().unwrap() += 1;
    }
}
