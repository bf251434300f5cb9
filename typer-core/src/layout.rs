//! Where a renderer should put things for a given [`Frame`].
//!
//! Pure geometry; nothing here draws. Lines are placed on a fixed baseline grid
//! (`font.size + line_spacing * index`), optionally centred in the viewport,
//! and the caret sits right after the last printed character.

use crate::config::TyperConfig;
use crate::error::{Result, TyperError};
use crate::services::TextMeasurer;
use crate::state_machine::{Frame, State};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// One line as it should appear on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintedLine {
    pub index: usize,
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaretPlacement {
    pub glyph: String,
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameLayout {
    pub lines: Vec<PrintedLine>,
    /// `None` when nothing is on screen or no caret glyph is configured.
    pub caret: Option<CaretPlacement>,
}

impl FrameLayout {
    pub fn compute(
        frame: &Frame,
        config: &TyperConfig,
        measurer: &dyn TextMeasurer,
        viewport: Viewport,
    ) -> Result<Self> {
        let session = &frame.session;
        if frame.state == State::Started || session.is_empty() {
            return Ok(Self::default());
        }

        let current = frame.progress.current_line_index;
        let last = current.min(session.line_count() - 1);
        let font_size = config.font.size as f32;

        let y_offset = if config.center_vertically {
            viewport.height / 2.0 - session.block_height() / 2.0
        } else {
            0.0
        };

        let mut lines = Vec::with_capacity(last + 1);
        for (index, line) in session.lines().iter().enumerate().take(last + 1) {
            let shown = if index < current {
                line.as_str()
            } else {
                prefix_chars(line, frame.progress.current_char_index)
            };

            let mut x = 0.0;
            if config.center_horizontally {
                let width = session.line_widths().get(index).copied().unwrap_or(0.0);
                x += viewport.width / 2.0 - width / 2.0;
            }

            lines.push(PrintedLine {
                index,
                text: display_text(shown),
                x,
                y: font_size + config.line_spacing * index as f32 + y_offset,
            });
        }

        let caret = match lines.last() {
            Some(tail) if !config.caret.is_empty() => {
                let size = measurer
                    .measure(&tail.text, &config.font)
                    .map_err(|source| TyperError::Measure {
                        line: tail.index,
                        source,
                    })?;
                Some(CaretPlacement {
                    glyph: config.caret.clone(),
                    x: tail.x + size.width,
                    y: tail.y,
                    visible: frame.progress.caret_visible(),
                })
            }
            _ => None,
        };

        Ok(Self { lines, caret })
    }

    /// Printed text of every line joined with `\n`. Handy for terminals and tests.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The first `n` chars of `line` (all of it if shorter).
pub fn prefix_chars(line: &str, n: usize) -> &str {
    match line.char_indices().nth(n) {
        Some((byte, _)) => &line[..byte],
        None => line,
    }
}

/// Collapse display escapes: a backslash directly before `[` or `]` is dropped.
pub fn display_text(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('[') | Some(']')) {
            continue;
        }
        out.push(c);
    }

    out
}
