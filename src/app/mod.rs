mod commands;
mod event_loop;
mod rendering;

use commands::Command;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::{Backend, HttpBackend};
use crate::config::AppConfig;
use crate::conversation::ConversationStore;
use crate::dispatch::{DispatchOutcome, RequestDispatcher, ToolAction};
use crate::error::{AssistantError, Result};
use crate::presentation::{PresentationModeController, ViewMode};
use crate::readiness::{ReadinessMonitor, RetryPolicy};
use crate::session::Session;
use crate::shell::{HostShell, TerminalShell};

pub struct App {
    dispatcher: RequestDispatcher,
    readiness: ReadinessMonitor,
    presentation: PresentationModeController,
    session: Session,
    shell: Arc<dyn HostShell>,
    outcome_tx: mpsc::UnboundedSender<DispatchOutcome>,
    outcome_rx: Option<mpsc::UnboundedReceiver<DispatchOutcome>>,
    start_in_overlay: bool,
    should_quit: bool,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let backend: Arc<dyn Backend> = Arc::new(
            HttpBackend::from_config(&config.backend)
                .map_err(|e| AssistantError::Config(e.to_string()))?,
        );
        let shell: Arc<dyn HostShell> =
            Arc::new(TerminalShell::new(config.shell.screenshot_command.clone()));
        Ok(Self::with_parts(config, backend, shell))
    }

    pub fn with_parts(
        config: &AppConfig,
        backend: Arc<dyn Backend>,
        shell: Arc<dyn HostShell>,
    ) -> Self {
        let readiness = ReadinessMonitor::new(backend.clone(), RetryPolicy::from_config(&config.backend));
        let dispatcher = RequestDispatcher::new(backend, ConversationStore::new(), readiness.subscribe());
        let presentation = PresentationModeController::new(&config.presentation, shell.clone());
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        Self {
            dispatcher,
            readiness,
            presentation,
            session: Session::new(shell.clone()),
            shell,
            outcome_tx,
            outcome_rx: Some(outcome_rx),
            start_in_overlay: config.presentation.start_in_overlay,
            should_quit: false,
        }
    }

    /// Run `action` on its own task so input keeps flowing. The outcome comes
    /// back through the event loop.
    fn submit(&self, action: ToolAction) {
        let dispatcher = self.dispatcher.clone();
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.submit(action).await;
            let _ = outcome_tx.send(outcome);
        });
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Chat(message) => self.submit(ToolAction::Chat { message }),
            Command::Solve(problem) => self.submit(ToolAction::ProblemSolve { problem }),
            Command::Essay {
                topic,
                essay_type,
                length,
            } => self.submit(ToolAction::EssayWrite {
                topic,
                essay_type,
                length,
            }),
            Command::Image(question) => match self.session.selected() {
                Some(image) => self.submit(ToolAction::ImageAnalyze {
                    image: image.clone(),
                    question,
                }),
                None => self.draw_error("No image selected. Use /open <path> or /screenshot first.")?,
            },
            Command::Ocr => match self.session.selected() {
                Some(image) => self.submit(ToolAction::TextExtract {
                    image: image.clone(),
                }),
                None => self.draw_error("No image selected. Use /open <path> or /screenshot first.")?,
            },
            Command::Code { question, code } => self.submit(ToolAction::CodeHelp { code, question }),
            Command::Science { subject, question } => {
                self.submit(ToolAction::ScienceHelp { subject, question })
            }
            Command::Open(path) => {
                let message = match self.session.select_file(&path).await {
                    Ok(image) => Ok(format!("Selected {} ({} bytes)", image.name, image.bytes.len())),
                    Err(e) => Err(e.to_string()),
                };
                self.draw_result(message)?;
            }
            Command::Screenshot => {
                let message = match self.session.select_screenshot().await {
                    Ok(image) => Ok(format!("Captured screenshot ({} bytes)", image.bytes.len())),
                    Err(e) => Err(e.to_string()),
                };
                self.draw_result(message)?;
            }
            Command::Overlay => {
                self.presentation.set_mode(ViewMode::Overlay);
                self.redraw().await?;
            }
            Command::Normal => {
                self.presentation.set_mode(ViewMode::Normal);
                self.redraw().await?;
            }
            Command::Theme(mode) => {
                let mode = mode.unwrap_or_else(|| self.presentation.state().theme.toggled());
                self.presentation.set_theme(mode);
                self.draw_info(&format!("Theme: {}", mode))?;
            }
            Command::Retry => {
                self.readiness.retry();
                let probes = self.readiness.probe_count();
                self.draw_info(&format!("Checking backend... ({} checks so far)", probes))?;
            }
            Command::History => self.draw_history().await?,
            Command::Examples => self.draw_examples()?,
            Command::Help => self.draw_help()?,
            Command::Quit => self.should_quit = true,
        }
        Ok(())
    }
}
