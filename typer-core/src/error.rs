use thiserror::Error;

use crate::state_machine::State;

/// Everything the engine can report back to its host.
///
/// Malformed directives and cancellation are deliberately absent: the first
/// is stripped silently, the second is a normal way for a run to end.
#[derive(Debug, Error)]
pub enum TyperError {
    /// The measurement service could not size a line (bad font, missing glyphs, ...).
    #[error("failed to measure line {line}: {source}")]
    Measure {
        line: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to decode configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// An operation was called in a state that does not allow it.
    #[error("`{op}` is not allowed while {state:?}")]
    InvalidCall { op: &'static str, state: State },
}

pub type Result<T> = std::result::Result<T, TyperError>;
