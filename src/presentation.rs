//! View mode and theme state

use std::sync::Arc;

use crate::config::{PresentationConfig, Theme, ThemeMode};
use crate::conversation::Turn;
use crate::render::ClassifyMode;
use crate::shell::HostShell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Normal,
    /// Compact, always-on-top view of the latest turns
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationState {
    pub mode: ViewMode,
    pub theme: ThemeMode,
}

pub struct PresentationModeController {
    state: PresentationState,
    theme: Theme,
    overlay_turns: usize,
    classify_mode: ClassifyMode,
    shell: Arc<dyn HostShell>,
}

impl PresentationModeController {
    pub fn new(config: &PresentationConfig, shell: Arc<dyn HostShell>) -> Self {
        let classify_mode = if config.escaped_dollars {
            ClassifyMode::Escaped
        } else {
            ClassifyMode::Compat
        };
        Self {
            state: PresentationState {
                mode: ViewMode::Normal,
                theme: config.theme,
            },
            theme: Theme::for_mode(config.theme),
            overlay_turns: config.overlay_turns,
            classify_mode,
            shell,
        }
    }

    pub fn state(&self) -> PresentationState {
        self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.state.mode
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn classify_mode(&self) -> ClassifyMode {
        self.classify_mode
    }

    /// Switch view mode and tell the host shell, without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.state.mode = mode;
        let shell = self.shell.clone();
        let enabled = mode == ViewMode::Overlay;
        tokio::spawn(async move {
            if let Err(e) = shell.set_overlay_chrome(enabled).await {
                tracing::debug!("Overlay chrome request failed: {}", e);
            }
        });
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        self.state.theme = theme;
        self.theme = Theme::for_mode(theme);
    }

    /// The tail of `log` that the current mode shows. The log itself is
    /// never trimmed.
    pub fn visible_turns<'a>(&self, log: &'a [Turn]) -> &'a [Turn] {
        match self.state.mode {
            ViewMode::Normal => log,
            ViewMode::Overlay => &log[log.len().saturating_sub(self.overlay_turns)..],
        }
    }
}
