// Event loop - input lines, store appends, readiness changes and activation

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};

use super::{commands, App};
use crate::dispatch::{DispatchOutcome, RejectReason};
use crate::error::{AssistantError, Result};
use crate::presentation::ViewMode;
use crate::shell::{self, ActivationEvent};

impl App {
    pub async fn run(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut appended = self.dispatcher.store().subscribe();
        let mut readiness_rx = self.readiness.subscribe();
        let mut outcome_rx = self.outcome_rx.take().ok_or(AssistantError::ChannelClosed)?;

        let (activation_tx, mut activation_rx) = mpsc::unbounded_channel::<ActivationEvent>();
        shell::spawn_activation_listener(activation_tx)?;

        if self.start_in_overlay {
            self.presentation.set_mode(ViewMode::Overlay);
        }
        self.readiness.start();
        self.draw_banner()?;
        self.draw_readiness(&readiness_rx.borrow_and_update().clone())?;
        self.draw_prompt()?;

        while !self.should_quit {
            let prompt = tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match commands::parse(&line) {
                        Ok(command) => self.handle_command(command).await?,
                        Err(message) => {
                            self.draw_error(&message)?;
                            self.draw_help()?;
                        }
                    }
                    true
                }
                turn = appended.recv() => match turn {
                    Ok(turn) => {
                        self.draw_appended(&turn).await?;
                        true
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Renderer fell behind by {} turns", skipped);
                        self.redraw().await?;
                        true
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                changed = readiness_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = readiness_rx.borrow_and_update().clone();
                    self.draw_readiness(&state)?;
                    true
                }
                Some(outcome) = outcome_rx.recv() => self.draw_outcome(&outcome)?,
                Some(event) = activation_rx.recv() => {
                    self.activate(event);
                    self.redraw().await?;
                    true
                }
            };
            if prompt && !self.should_quit {
                self.draw_prompt()?;
            }
        }

        tracing::info!("Session ended with {} turns", self.dispatcher.store().len().await);
        Ok(())
    }

    /// Returns whether anything was printed that needs a fresh prompt.
    fn draw_outcome(&self, outcome: &DispatchOutcome) -> Result<bool> {
        let (notice, prompt) = outcome_feedback(outcome);
        if let Some(notice) = notice {
            self.draw_error(&notice)?;
        }
        Ok(prompt)
    }

    pub(super) fn activate(&self, event: ActivationEvent) {
        match event {
            ActivationEvent::GlobalShortcut => {
                tracing::debug!("Global shortcut, bringing window forward");
                self.shell.show_and_focus();
            }
        }
    }
}

/// Notice to show for a finished submission, and whether the prompt needs
/// redrawing. Blank input gets neither.
pub(super) fn outcome_feedback(outcome: &DispatchOutcome) -> (Option<String>, bool) {
    match outcome {
        DispatchOutcome::Rejected(RejectReason::EmptyInput) => (None, false),
        DispatchOutcome::Rejected(reason) => (Some(format!("Not sent: {}", reason)), true),
        // The busy marker on the prompt has cleared.
        DispatchOutcome::Settled { .. } => (None, true),
    }
}
