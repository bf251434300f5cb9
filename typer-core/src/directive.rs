//! Inline pause directives.
//!
//! A directive is a bracketed marker such as `[3]` embedded in a line of text.
//! It is removed from the line before display; when its content is an integer
//! it also schedules a caret-blink pause at the character offset it occupied.
//! A directive preceded by a backslash (`\[3]`) is escaped and left alone.

use regex::Regex;
use std::sync::OnceLock;

static DIRECTIVE_REGEX: OnceLock<Regex> = OnceLock::new();

fn directive_regex() -> &'static Regex {
    DIRECTIVE_REGEX
        .get_or_init(|| Regex::new(r"\[([^\]]+)\]").expect("Invalid Directive Regex"))
}

/// A pause scheduled at `offset` (in chars of the cleaned line) that blinks the
/// caret `blinks` times before typing resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pause {
    pub offset: usize,
    pub blinks: i32,
}

/// The result of stripping directives from one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLine {
    pub text: String,
    /// Ordered by `blinks` ascending; ties keep discovery order.
    pub pauses: Vec<Pause>,
}

pub struct DirectiveParser;

impl DirectiveParser {
    /// Strip every unescaped directive from `raw`, leftmost first.
    ///
    /// Each removal is recorded at the char offset where the directive stood
    /// in the text as it was at that moment, so later offsets already account
    /// for earlier removals. Non-numeric directives are removed but not recorded.
    ///
    /// The returned pauses are sorted by blink count, not by position. Two
    /// directives sharing an offset therefore fire smallest-count first, and
    /// equal counts fire in the order they were found.
    pub fn extract(raw: &str) -> ParsedLine {
        let mut text = raw.to_string();
        let mut pauses = Vec::new();

        while let Some(found) = find_unescaped(&text) {
            let offset = text[..found.start].chars().count();
            let value = parse_count(&text[found.content_start..found.content_end]);

            text.replace_range(found.start..found.end, "");

            match value {
                Some(blinks) => pauses.push(Pause { offset, blinks }),
                None => tracing::trace!("Dropped non-numeric directive at {}", offset),
            }
        }

        // `sort_by_key` is stable, which is what keeps ties in discovery order.
        pauses.sort_by_key(|p| p.blinks);

        ParsedLine { text, pauses }
    }
}

struct Found {
    start: usize,
    end: usize,
    content_start: usize,
    content_end: usize,
}

/// Leftmost `[...]` whose opening bracket is not preceded by a backslash.
/// An escaped candidate only rules out its own `[`; the search resumes right
/// after it, so `\[a[2]` still finds `[2]`.
fn find_unescaped(text: &str) -> Option<Found> {
    let re = directive_regex();
    let mut from = 0;

    while let Some(caps) = re.captures_at(text, from) {
        let whole = caps.get(0)?;
        let content = caps.get(1)?;

        if !text[..whole.start()].ends_with('\\') {
            return Some(Found {
                start: whole.start(),
                end: whole.end(),
                content_start: content.start(),
                content_end: content.end(),
            });
        }

        // '[' is a single byte, so this stays on a char boundary.
        from = whole.start() + 1;
    }

    None
}

/// Integer parse tolerant of surrounding whitespace and an explicit sign.
fn parse_count(content: &str) -> Option<i32> {
    content.trim().parse::<i32>().ok()
}
