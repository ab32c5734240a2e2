//! Text / math segment classification for assistant output
//!
//! Two tiers, one pass each. If the content holds a `$$` pair anywhere, it is
//! split into block math and text only; otherwise single `$` pairs mark inline
//! math. Text spans are never re-scanned. An unpaired delimiter leaves the rest
//! of the string in the trailing text segment.

const INLINE: &str = "$";
const BLOCK: &str = "$$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    InlineMath(String),
    BlockMath(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifyMode {
    /// Bare delimiters only, no escaping.
    #[default]
    Compat,
    /// `\$` is a literal dollar: never a delimiter, shown as `$` in text.
    Escaped,
}

pub fn classify(content: &str) -> Vec<Segment> {
    classify_with(content, ClassifyMode::Compat)
}

pub fn classify_with(content: &str, mode: ClassifyMode) -> Vec<Segment> {
    if find_delimiter(content, 0, BLOCK, mode).is_some() {
        split_pairs(content, BLOCK, mode, Segment::BlockMath)
    } else if find_delimiter(content, 0, INLINE, mode).is_some() {
        split_pairs(content, INLINE, mode, Segment::InlineMath)
    } else {
        vec![text(content, mode)]
    }
}

/// Always yields `Text (Math Text)*`, so the count is odd.
fn split_pairs(
    content: &str,
    delim: &str,
    mode: ClassifyMode,
    math: fn(String) -> Segment,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while let Some(open) = find_delimiter(content, pos, delim, mode) {
        let inner_start = open + delim.len();
        let Some(close) = find_delimiter(content, inner_start, delim, mode) else {
            break;
        };
        segments.push(text(&content[pos..open], mode));
        segments.push(math(content[inner_start..close].to_string()));
        pos = close + delim.len();
    }

    segments.push(text(&content[pos..], mode));
    segments
}

/// Byte offset of the next `delim` at or after `from`.
fn find_delimiter(content: &str, from: usize, delim: &str, mode: ClassifyMode) -> Option<usize> {
    let mut from = from;
    loop {
        let at = content.get(from..)?.find(delim)? + from;
        if mode == ClassifyMode::Escaped && is_escaped(content, at) {
            // Skip the escaped `$` only; a following `$` may still open.
            from = at + 1;
            continue;
        }
        return Some(at);
    }
}

fn is_escaped(content: &str, at: usize) -> bool {
    at > 0 && content.as_bytes()[at - 1] == b'\\'
}

fn text(span: &str, mode: ClassifyMode) -> Segment {
    match mode {
        ClassifyMode::Compat => Segment::Text(span.to_string()),
        ClassifyMode::Escaped => Segment::Text(span.replace("\\$", "$")),
    }
}
