// Rendering - banner, notices and the visible slice of the conversation

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

use super::commands::{EXAMPLES, HELP};
use super::App;
use crate::conversation::Turn;
use crate::error::Result;
use crate::presentation::ViewMode;
use crate::readiness::ReadinessState;
use crate::render::{self, layout_turn, Tone};

const BANNER: &str = "Veswo - study assistant";
const LOADING: &str = "Loading AI model...";

impl App {
    pub(super) fn draw_banner(&self) -> Result<()> {
        let mut out = io::stdout();
        let theme = self.presentation.theme();
        render::write_notice(&mut out, BANNER, Tone::User, theme)?;
        if self.presentation.mode() == ViewMode::Normal {
            render::write_notice(&mut out, "Type /help for commands.", Tone::Muted, theme)?;
        }
        Ok(())
    }

    pub(super) fn draw_readiness(&self, state: &ReadinessState) -> Result<()> {
        let mut out = io::stdout();
        let theme = self.presentation.theme();
        match state {
            ReadinessState::Loading(hint) => {
                render::write_notice(&mut out, LOADING, Tone::Muted, theme)?;
                if let Some(hint) = hint {
                    render::write_notice(&mut out, &format!("  {}", hint), Tone::Muted, theme)?;
                }
            }
            ReadinessState::Ready => {
                render::write_notice(&mut out, "Backend ready.", Tone::Assistant, theme)?;
            }
            ReadinessState::Unreachable(reason) => {
                let text = format!("Backend unreachable: {}. Type /retry to try again.", reason);
                render::write_notice(&mut out, &text, Tone::Error, theme)?;
            }
        }
        Ok(())
    }

    pub(super) fn draw_prompt(&self) -> Result<()> {
        let mut out = io::stdout();
        let prompt = if self.dispatcher.is_busy() { "… " } else { "> " };
        write!(out, "{}", prompt)?;
        out.flush()?;
        Ok(())
    }

    pub(super) fn draw_info(&self, text: &str) -> Result<()> {
        render::write_notice(&mut io::stdout(), text, Tone::Muted, self.presentation.theme())?;
        Ok(())
    }

    pub(super) fn draw_error(&self, text: &str) -> Result<()> {
        render::write_notice(&mut io::stdout(), text, Tone::Error, self.presentation.theme())?;
        Ok(())
    }

    pub(super) fn draw_result(&self, result: std::result::Result<String, String>) -> Result<()> {
        match result {
            Ok(text) => self.draw_info(&text),
            Err(text) => self.draw_error(&text),
        }
    }

    fn draw_turns(&self, turns: &[Turn]) -> Result<()> {
        let mut out = io::stdout();
        for turn in turns {
            let lines = layout_turn(turn, self.presentation.classify_mode());
            render::write_lines(&mut out, &lines, self.presentation.theme())?;
        }
        Ok(())
    }

    /// Show a newly recorded turn. Overlay mode repaints its window instead.
    pub(super) async fn draw_appended(&self, turn: &Turn) -> Result<()> {
        match self.presentation.mode() {
            ViewMode::Normal => {
                // Step off the prompt line first.
                writeln!(io::stdout())?;
                self.draw_turns(std::slice::from_ref(turn))
            }
            ViewMode::Overlay => self.redraw().await,
        }
    }

    /// Clear the screen and show what the current mode allows.
    pub(super) async fn redraw(&self) -> Result<()> {
        let mut out = io::stdout();
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        out.flush()?;

        self.draw_banner()?;
        if !self.readiness.state().is_ready() {
            self.draw_readiness(&self.readiness.state())?;
        }
        let log = self.dispatcher.store().snapshot().await;
        self.draw_turns(self.presentation.visible_turns(&log))
    }

    /// The whole log, whatever the view mode.
    pub(super) async fn draw_history(&self) -> Result<()> {
        let store = self.dispatcher.store();
        if store.is_empty().await {
            return self.draw_info("No messages yet.");
        }
        self.draw_turns(&store.snapshot().await)
    }

    pub(super) fn draw_examples(&self) -> Result<()> {
        let mut out = io::stdout();
        let theme = self.presentation.theme();
        render::write_notice(&mut out, "Quick actions:", Tone::User, theme)?;
        for (title, hint, line) in EXAMPLES {
            render::write_notice(&mut out, &format!("  {} - {}", title, hint), Tone::Assistant, theme)?;
            render::write_notice(&mut out, &format!("    {}", line), Tone::Muted, theme)?;
        }
        Ok(())
    }

    pub(super) fn draw_help(&self) -> Result<()> {
        render::write_notice(&mut io::stdout(), HELP, Tone::Plain, self.presentation.theme())?;
        Ok(())
    }
}
