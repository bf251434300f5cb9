//! Cooperative suspension and run identity.
//!
//! A run never gets interrupted mid-step. It suspends only in [`wait`] and,
//! after every resume, checks its [`RunToken`] against the live session before
//! touching anything. A token from an older session is simply stale.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Identity of one `init` (or reset). A new one is issued every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Held by a spawned run. Only valid while its session is the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunToken {
    session: SessionId,
}

impl RunToken {
    pub fn new(session: SessionId) -> Self {
        Self { session }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn is_current(&self, live: SessionId) -> bool {
        self.session == live
    }
}

/// Suspend the current run for one interval.
///
/// A zero interval still yields so other tasks (and `stop()` callers) get a
/// turn, but arms no timer.
pub async fn wait(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}
