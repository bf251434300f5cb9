pub mod config;
pub mod directive;
pub mod error;
pub mod layout;
pub mod schedule;
pub mod services;
pub mod state_machine;
pub mod timeline;

// Re-export the main struct so users can just use `typer_core::Typer`
pub use state_machine::Typer;

// Re-export the simpler types for renderers and hosts
pub use config::{FontSpec, TyperConfig};
pub use error::TyperError;
pub use state_machine::{Frame, Progress, State};

/// Why an `Updated` event was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCause {
    Init,   // New session loaded
    Reveal, // One more character visible
    Blink,  // Caret blink tick
    Reset,  // Session cleared
    Query,  // Snapshot taken on request, never sent
}

/// The event stream from the engine. Renderers redraw on `Updated`; the host
/// listens for `Finished`.
#[derive(Debug, Clone)]
pub enum TyperEvent {
    Updated(Frame),
    Finished, // Fired once per completed run, after the fade-out
}
