//! The immutable data of one typing session: cleaned lines, their pause
//! tables and their measured extents.

use crate::config::FontSpec;
use crate::directive::{DirectiveParser, Pause};
use crate::error::{Result, TyperError};
use crate::services::TextMeasurer;

/// Pending pauses, one ordered list per line.
///
/// Consuming a pause removes it, so each directive fires at most once even
/// when several share an offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PauseTable {
    lines: Vec<Vec<Pause>>,
}

impl PauseTable {
    pub fn for_line(&self, line: usize) -> &[Pause] {
        self.lines.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Remove and return the first pending pause at `offset` on `line`,
    /// first meaning lowest blink count, then earliest discovered.
    pub fn take(&mut self, line: usize, offset: usize) -> Option<Pause> {
        let pending = self.lines.get_mut(line)?;
        let idx = pending.iter().position(|p| p.offset == offset)?;
        Some(pending.remove(idx))
    }

    pub fn pending(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    lines: Vec<String>,
    line_lengths: Vec<usize>,
    pauses: PauseTable,
    line_widths: Vec<f32>,
    line_heights: Vec<f32>,
    block_height: f32,
}

impl Session {
    /// A session with no lines. This is what the engine holds after a reset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Split `raw` into lines, strip their directives and measure them.
    ///
    /// Both `\n` and `\r\n` break lines. Trailing empty lines are kept.
    /// The block height is the sum of all line heights plus `line_spacing`
    /// for each gap between lines.
    pub fn build(
        raw: &str,
        measurer: &dyn TextMeasurer,
        font: &FontSpec,
        line_spacing: f32,
    ) -> Result<Self> {
        let raw_lines = split_lines(raw);
        let count = raw_lines.len();

        let mut session = Self {
            lines: Vec::with_capacity(count),
            line_lengths: Vec::with_capacity(count),
            pauses: PauseTable {
                lines: Vec::with_capacity(count),
            },
            line_widths: Vec::with_capacity(count),
            line_heights: Vec::with_capacity(count),
            block_height: 0.0,
        };

        for (idx, raw_line) in raw_lines.into_iter().enumerate() {
            let parsed = DirectiveParser::extract(raw_line);

            let size = measurer
                .measure(&parsed.text, font)
                .map_err(|source| TyperError::Measure { line: idx, source })?;

            session.block_height += size.height;
            if idx + 1 < count {
                session.block_height += line_spacing;
            }

            session.line_lengths.push(parsed.text.chars().count());
            session.line_widths.push(size.width);
            session.line_heights.push(size.height);
            session.pauses.lines.push(parsed.pauses);
            session.lines.push(parsed.text);
        }

        tracing::debug!(
            "Built session: {} lines, {} pauses, height {}",
            session.lines.len(),
            session.pauses.pending(),
            session.block_height
        );

        Ok(session)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length of `line` in chars, 0 past the end.
    pub fn line_len(&self, line: usize) -> usize {
        self.line_lengths.get(line).copied().unwrap_or(0)
    }

    /// Total revealable characters across all lines.
    pub fn char_count(&self) -> usize {
        self.line_lengths.iter().sum()
    }

    pub fn pauses(&self) -> &PauseTable {
        &self.pauses
    }

    pub fn line_widths(&self) -> &[f32] {
        &self.line_widths
    }

    pub fn line_heights(&self) -> &[f32] {
        &self.line_heights
    }

    pub fn block_height(&self) -> f32 {
        self.block_height
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn split_lines(raw: &str) -> Vec<&str> {
    raw.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}
