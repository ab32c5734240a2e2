//! Turn rendering
//!
//! Layout and styling are separate steps: [`layout_turn`] turns a recorded
//! turn into toned lines, [`write_lines`] applies the theme and prints them.

mod classify;

pub use classify::{classify, classify_with, ClassifyMode, Segment};

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{ContentStyle, Print, PrintStyledContent};

use crate::config::Theme;
use crate::conversation::{Role, Turn};

const BLOCK_INDENT: &str = "    ";

/// Semantic colour role of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    User,
    Assistant,
    Math,
    Muted,
    Error,
}

impl Tone {
    fn style(self, theme: &Theme) -> ContentStyle {
        match self {
            Tone::Plain => theme.plain_style(),
            Tone::User => theme.user_style(),
            Tone::Assistant => theme.assistant_style(),
            Tone::Math => theme.math_style(),
            Tone::Muted => theme.muted_style(),
            Tone::Error => theme.error_style(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
}

impl Span {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line(pub Vec<Span>);

impl Line {
    pub fn raw(text: impl Into<String>, tone: Tone) -> Self {
        Self(vec![Span::new(text, tone)])
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|s| s.text.is_empty())
    }

    fn push(&mut self, text: &str, tone: Tone) {
        if !text.is_empty() {
            self.0.push(Span::new(text, tone));
        }
    }
}

/// Header line plus body lines for one turn.
pub fn layout_turn(turn: &Turn, mode: ClassifyMode) -> Vec<Line> {
    let (label, body_tone) = match turn.role() {
        Role::User => ("You", Tone::User),
        Role::Assistant => ("Assistant", Tone::Assistant),
    };

    let mut header = Line::raw(label, body_tone);
    if let Some(method) = turn.method() {
        header.push(&format!(" ({})", method), Tone::Muted);
    }

    let segments = match mode {
        ClassifyMode::Compat => classify(turn.content()),
        ClassifyMode::Escaped => classify_with(turn.content(), mode),
    };

    let mut lines = vec![header];
    lines.extend(layout_segments(&segments, body_tone));
    lines
}

fn layout_segments(segments: &[Segment], body_tone: Tone) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line::default();

    for segment in segments {
        match segment {
            Segment::Text(text) => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next() {
                    current.push(first, body_tone);
                }
                for part in parts {
                    lines.push(std::mem::take(&mut current));
                    current.push(part, body_tone);
                }
            }
            Segment::InlineMath(math) => current.push(math, Tone::Math),
            Segment::BlockMath(math) => {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                for row in math.trim().lines() {
                    lines.push(Line::raw(format!("{}{}", BLOCK_INDENT, row.trim()), Tone::Math));
                }
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Print `lines` with the theme's styles.
pub fn write_lines<W: Write>(out: &mut W, lines: &[Line], theme: &Theme) -> io::Result<()> {
    for line in lines {
        for span in &line.0 {
            queue!(out, PrintStyledContent(span.tone.style(theme).apply(span.text.as_str())))?;
        }
        queue!(out, Print("\n"))?;
    }
    out.flush()
}

/// Print a one-off notice, e.g. a rejection or a status hint.
pub fn write_notice<W: Write>(out: &mut W, text: &str, tone: Tone, theme: &Theme) -> io::Result<()> {
    queue!(out, PrintStyledContent(tone.style(theme).apply(text)), Print("\n"))?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    impl Line {
        fn plain(&self) -> String {
            self.0.iter().map(|s| s.text.as_str()).collect()
        }
    }

    fn plain(lines: &[Line]) -> Vec<String> {
        lines.iter().map(Line::plain).collect()
    }

    #[test]
    fn test_user_turn_layout() {
        let lines = layout_turn(&Turn::user("Hello"), ClassifyMode::Compat);
        assert_eq!(plain(&lines), vec!["You", "Hello"]);
        assert_eq!(lines[1].0[0].tone, Tone::User);
    }

    #[test]
    fn test_method_is_muted_suffix() {
        let turn = Turn::assistant("x = 4", Some("Direct Evaluation".to_string()));
        let lines = layout_turn(&turn, ClassifyMode::Compat);
        assert_eq!(lines[0].plain(), "Assistant (Direct Evaluation)");
        assert_eq!(lines[0].0[1].tone, Tone::Muted);
    }

    #[test]
    fn test_inline_math_stays_on_line() {
        let turn = Turn::assistant("so $x^2$ grows", None);
        let lines = layout_turn(&turn, ClassifyMode::Compat);
        assert_eq!(
            lines[1],
            Line(vec![
                Span::new("so ", Tone::Assistant),
                Span::new("x^2", Tone::Math),
                Span::new(" grows", Tone::Assistant),
            ])
        );
    }

    #[test]
    fn test_block_math_gets_its_own_indented_line() {
        let turn = Turn::assistant("Result: $$x = 4$$ done", None);
        let lines = layout_turn(&turn, ClassifyMode::Compat);
        assert_eq!(plain(&lines), vec!["Assistant", "Result: ", "    x = 4", " done"]);
        assert_eq!(lines[2].0[0].tone, Tone::Math);
    }

    #[test]
    fn test_multiline_text() {
        let turn = Turn::assistant("one\ntwo\n\nfour", None);
        let lines = layout_turn(&turn, ClassifyMode::Compat);
        assert_eq!(plain(&lines), vec!["Assistant", "one", "two", "", "four"]);
    }

    #[test]
    fn test_write_lines_emits_text() {
        let mut out = Vec::new();
        let lines = layout_turn(&Turn::user("Hello"), ClassifyMode::Compat);
        write_lines(&mut out, &lines, &Theme::dark()).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("You"));
        assert!(printed.contains("Hello"));
        assert_eq!(printed.matches('\n').count(), 2);
    }
}
