//! Host shell capabilities: screenshots, overlay chrome and the
//! system-wide activation signal.

use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;
use crossterm::{execute, terminal::SetTitle};
use tokio::process::Command;
use tokio::sync::mpsc;

const WINDOW_TITLE: &str = "Veswo Assistant";
const OVERLAY_TITLE: &str = "Veswo Assistant (overlay)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    pub success: bool,
    pub image_data: Bytes,
}

impl Screenshot {
    pub fn failed() -> Self {
        Self {
            success: false,
            image_data: Bytes::new(),
        }
    }
}

/// A recognised system-wide signal asking for the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationEvent {
    GlobalShortcut,
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Screenshot command failed: {0}")]
    CommandFailed(String),

    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Native integration the client core talks to
#[async_trait]
pub trait HostShell: Send + Sync {
    async fn capture_screenshot(&self) -> Result<Screenshot, ShellError>;

    /// Request transparent/draggable chrome. Callers never wait on this.
    async fn set_overlay_chrome(&self, enabled: bool) -> Result<(), ShellError>;

    /// Bring the window forward after an activation signal.
    fn show_and_focus(&self);
}

/// Host shell for a plain terminal session
pub struct TerminalShell {
    screenshot_command: Vec<String>,
}

impl TerminalShell {
    pub fn new(screenshot_command: Vec<String>) -> Self {
        Self { screenshot_command }
    }
}

#[async_trait]
impl HostShell for TerminalShell {
    async fn capture_screenshot(&self) -> Result<Screenshot, ShellError> {
        let Some((program, args)) = self.screenshot_command.split_first() else {
            tracing::debug!("No screenshot command configured");
            return Ok(Screenshot::failed());
        };

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ShellError::CommandFailed(format!("{}: {}", program, e)))?;

        if !output.status.success() {
            tracing::warn!(
                "Screenshot command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(Screenshot::failed());
        }

        Ok(Screenshot {
            success: !output.stdout.is_empty(),
            image_data: Bytes::from(output.stdout),
        })
    }

    async fn set_overlay_chrome(&self, enabled: bool) -> Result<(), ShellError> {
        let title = if enabled { OVERLAY_TITLE } else { WINDOW_TITLE };
        let mut stdout = std::io::stdout();
        execute!(stdout, SetTitle(title))?;
        Ok(())
    }

    fn show_and_focus(&self) {
        let mut stdout = std::io::stdout();
        // BEL asks most terminal emulators to flag or raise the window.
        let _ = execute!(stdout, SetTitle(WINDOW_TITLE));
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }
}

/// Deliver `SIGUSR1` as [`ActivationEvent::GlobalShortcut`].
///
/// Bind a desktop-wide hotkey to `pkill -USR1 veswo` to summon the session.
#[cfg(unix)]
pub fn spawn_activation_listener(
    tx: mpsc::UnboundedSender<ActivationEvent>,
) -> Result<(), ShellError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut signals = signal(SignalKind::user_defined1())?;
    tokio::spawn(async move {
        while signals.recv().await.is_some() {
            tracing::debug!("Activation signal received");
            if tx.send(ActivationEvent::GlobalShortcut).is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn spawn_activation_listener(
    _tx: mpsc::UnboundedSender<ActivationEvent>,
) -> Result<(), ShellError> {
    tracing::debug!("Activation signal not supported on this platform");
    Ok(())
}
