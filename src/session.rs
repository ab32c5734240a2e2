//! Per-session image selection
//!
//! The session owns at most one selected image. A new selection replaces the
//! old one wholesale; a failed selection leaves it as it was.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::dispatch::ImagePayload;
use crate::error::{AssistantError, Result};
use crate::shell::HostShell;

const SCREENSHOT_NAME: &str = "screenshot.png";

pub type SelectedImage = ImagePayload;

pub struct Session {
    shell: Arc<dyn HostShell>,
    selected: Option<SelectedImage>,
}

impl Session {
    pub fn new(shell: Arc<dyn HostShell>) -> Self {
        Self {
            shell,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    pub async fn select_file(&mut self, path: &Path) -> Result<&SelectedImage> {
        let bytes = tokio::fs::read(path).await?;
        if bytes.is_empty() {
            return Err(AssistantError::Selection(format!("{} is empty", path.display())));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::info!(name = %name, bytes = bytes.len(), "Selected image file");
        Ok(self.selected.insert(ImagePayload::new(name, Bytes::from(bytes))))
    }

    pub async fn select_screenshot(&mut self) -> Result<&SelectedImage> {
        let shot = self.shell.capture_screenshot().await?;
        if !shot.success || shot.image_data.is_empty() {
            return Err(AssistantError::Selection("screenshot capture failed".to_string()));
        }

        tracing::info!(bytes = shot.image_data.len(), "Selected screenshot");
        Ok(self
            .selected
            .insert(ImagePayload::new(SCREENSHOT_NAME, shot.image_data)))
    }
}
