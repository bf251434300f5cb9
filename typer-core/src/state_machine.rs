use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::TyperConfig;
use crate::error::{Result, TyperError};
use crate::schedule::{self, RunToken, SessionId};
use crate::services::Services;
use crate::timeline::{PauseTable, Session};
use crate::{TyperEvent, UpdateCause};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    /// Initialised, nothing drawn yet.
    Started,
    /// Revealing characters.
    Typing,
    /// Blinking the caret, no characters advance.
    Pause,
    /// Terminal for this run. Fade-out and reset follow.
    Finished,
}

/// The mutable cursor of the active run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Progress {
    pub current_line_index: usize,
    pub current_char_index: usize,
    /// Blink target of the current pause.
    pub caret_blink_budget: i32,
    /// Blink ticks completed in the current pause.
    pub caret_blink_elapsed: u32,
}

impl Progress {
    /// The caret is drawn on even ticks, hidden on odd ones.
    pub fn caret_visible(&self) -> bool {
        self.caret_blink_elapsed % 2 == 0
    }
}

/// Blink ticks performed for a target of `budget` blinks: `2 * budget - 1`,
/// which leaves the caret hidden when the pause ends.
pub fn blink_ticks(budget: i32) -> u32 {
    u32::try_from(i64::from(budget) * 2 - 1).unwrap_or(0)
}

/// A consistent snapshot handed to renderers with every update.
#[derive(Debug, Clone)]
pub struct Frame {
    pub session: Arc<Session>,
    pub progress: Progress,
    pub state: State,
    pub cause: UpdateCause,
}

struct Shared {
    session_id: SessionId,
    session: Arc<Session>,
    pending: PauseTable,
    progress: Progress,
    state: State,
    /// A run has been spawned for this session and has not ended.
    armed: bool,
}

impl Shared {
    fn frame(&self, cause: UpdateCause) -> Frame {
        Frame {
            session: Arc::clone(&self.session),
            progress: self.progress,
            state: self.state,
            cause,
        }
    }

    fn enter(&mut self, next: State) {
        debug!("Typer {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

/// What a step of the run decided to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Typing,
    Pause,
    Finished,
    Abandon,
}

/// The typewriter engine.
///
/// Cheap to clone; every clone drives the same session. Events are delivered
/// in order on the channel returned by [`Typer::new`], each one sent while the
/// state lock is held so no mutation can interleave with its delivery.
#[derive(Clone)]
pub struct Typer {
    config: Arc<TyperConfig>,
    services: Services,
    shared: Arc<Mutex<Shared>>,
    events: mpsc::UnboundedSender<TyperEvent>,
}

impl std::fmt::Debug for Typer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.lock();
        f.debug_struct("Typer")
            .field("session_id", &shared.session_id)
            .field("state", &shared.state)
            .field("progress", &shared.progress)
            .finish()
    }
}

impl Typer {
    pub fn new(
        config: TyperConfig,
        services: Services,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TyperEvent>)> {
        config.validate()?;

        let (events, rx) = mpsc::unbounded_channel();
        let shared = Shared {
            session_id: SessionId::new(),
            session: Arc::new(Session::empty()),
            pending: PauseTable::default(),
            progress: Progress::default(),
            state: State::Started,
            armed: false,
        };

        let typer = Self {
            config: Arc::new(config),
            services,
            shared: Arc::new(Mutex::new(shared)),
            events,
        };

        Ok((typer, rx))
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_update(&self, shared: &Shared, cause: UpdateCause) {
        // A host that dropped the receiver just isn't listening.
        let _ = self.events.send(TyperEvent::Updated(shared.frame(cause)));
    }

    /// Load `text` (or the configured default text when empty) as a fresh
    /// session and rewind to `Started`. Any run still suspended on the old
    /// session goes stale and exits on its next check.
    ///
    /// Fails only when the measurement service cannot size a line; the
    /// current session is left untouched in that case.
    pub fn init(&self, text: &str) -> Result<SessionId> {
        let text = if text.is_empty() {
            self.config.text.as_str()
        } else {
            text
        };

        let session = Session::build(
            text,
            self.services.measurer.as_ref(),
            &self.config.font,
            self.config.line_spacing,
        )?;

        let mut shared = self.lock();
        let id = SessionId::new();

        shared.session_id = id;
        shared.pending = session.pauses().clone();
        shared.session = Arc::new(session);
        shared.progress = Progress::default();
        shared.state = State::Started;
        shared.armed = false;

        info!(
            "Typer init: session {} ({} lines, {} chars)",
            id,
            shared.session.line_count(),
            shared.session.char_count()
        );
        self.emit_update(&shared, UpdateCause::Init);

        Ok(id)
    }

    /// Spawn the run: wait the start delay, then type.
    ///
    /// Only valid from a freshly initialised `Started` session, once. Any
    /// other call is rejected without touching progress.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, since the run is spawned
    /// with `tokio::spawn`.
    pub fn start(&self) -> Result<JoinHandle<()>> {
        let token = {
            let mut shared = self.lock();
            if shared.state != State::Started || shared.armed {
                warn!("Rejected start() while {:?}", shared.state);
                return Err(TyperError::InvalidCall {
                    op: "start",
                    state: shared.state,
                });
            }
            shared.armed = true;
            RunToken::new(shared.session_id)
        };

        info!("Typer start: session {}", token.session());
        let typer = self.clone();
        Ok(tokio::spawn(async move { typer.run(token).await }))
    }

    /// Force `Finished`. The live run notices at its next check, skips the
    /// remaining characters and runs the fade-out sequence. Without a live
    /// run this only flips the state.
    pub fn stop(&self) {
        let mut shared = self.lock();
        if shared.state != State::Finished {
            shared.enter(State::Finished);
        }
    }

    /// Drop the session and progress and cancel any run, without `Finished`.
    /// The engine stays inert until the next `init`.
    pub fn reset(&self) {
        let mut shared = self.lock();
        self.reset_locked(&mut shared);
    }

    fn reset_locked(&self, shared: &mut Shared) {
        shared.session_id = SessionId::new();
        shared.session = Arc::new(Session::empty());
        shared.pending = PauseTable::default();
        shared.progress = Progress::default();
        shared.state = State::Finished;
        shared.armed = false;

        debug!("Typer reset");
        self.emit_update(shared, UpdateCause::Reset);
    }

    // -- Queries --

    pub fn config(&self) -> &TyperConfig {
        &self.config
    }

    pub fn state(&self) -> State {
        self.lock().state
    }

    pub fn progress(&self) -> Progress {
        self.lock().progress
    }

    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.lock().session)
    }

    pub fn session_id(&self) -> SessionId {
        self.lock().session_id
    }

    /// Pauses on `line` that have not fired yet.
    pub fn pending_pauses(&self, line: usize) -> usize {
        self.lock().pending.for_line(line).len()
    }

    pub fn frame(&self) -> Frame {
        self.lock().frame(UpdateCause::Query)
    }

    // -- The run --

    async fn run(self, token: RunToken) {
        schedule::wait(self.config.start_delay()).await;

        let mut next = {
            let mut shared = self.lock();
            if !token.is_current(shared.session_id) {
                Next::Abandon
            } else {
                match shared.state {
                    State::Started => {
                        shared.progress.caret_blink_elapsed = 0;
                        shared.enter(State::Typing);
                        Next::Typing
                    }
                    State::Finished => Next::Finished,
                    _ => Next::Abandon,
                }
            }
        };

        loop {
            next = match next {
                Next::Typing => self.type_loop(&token).await,
                Next::Pause => self.blink_loop(&token).await,
                Next::Finished => {
                    self.finish(&token).await;
                    return;
                }
                Next::Abandon => {
                    warn!("Typer run for session {} abandoned", token.session());
                    return;
                }
            };
        }
    }

    /// Whether this run may keep stepping in `expected`.
    fn check(shared: &Shared, token: &RunToken, expected: State) -> Option<Next> {
        if !token.is_current(shared.session_id) {
            return Some(Next::Abandon);
        }
        match shared.state {
            s if s == expected => None,
            State::Finished => Some(Next::Finished),
            _ => Some(Next::Abandon),
        }
    }

    async fn type_loop(&self, token: &RunToken) -> Next {
        loop {
            let revealed = {
                let mut shared = self.lock();
                if let Some(next) = Self::check(&shared, token, State::Typing) {
                    return next;
                }

                let line = shared.progress.current_line_index;
                if line >= shared.session.line_count() {
                    shared.progress.caret_blink_budget = self.config.final_caret_blink_times;
                    shared.enter(State::Pause);
                    return Next::Pause;
                }

                let ch = shared.progress.current_char_index;
                if ch < shared.session.line_len(line) {
                    if let Some(pause) = shared.pending.take(line, ch) {
                        debug!(
                            "Pause directive at {}:{} fired ({} blinks)",
                            line, ch, pause.blinks
                        );
                        shared.progress.caret_blink_budget = pause.blinks;
                        shared.enter(State::Pause);
                        return Next::Pause;
                    }

                    shared.progress.current_char_index += 1;
                    trace!("Revealed {}:{}", line, ch + 1);
                    self.emit_update(&shared, UpdateCause::Reveal);
                    true
                } else {
                    shared.progress.current_line_index += 1;
                    shared.progress.current_char_index = 0;
                    false
                }
            };

            if revealed {
                if let Some(sound) = &self.services.sound {
                    sound.play();
                }
            }

            schedule::wait(self.config.typing_interval()).await;
        }
    }

    async fn blink_loop(&self, token: &RunToken) -> Next {
        loop {
            {
                let mut shared = self.lock();
                if let Some(next) = Self::check(&shared, token, State::Pause) {
                    return next;
                }

                let target = blink_ticks(shared.progress.caret_blink_budget);
                if shared.progress.caret_blink_elapsed < target {
                    shared.progress.caret_blink_elapsed += 1;
                    trace!(
                        "Caret blink {}/{}",
                        shared.progress.caret_blink_elapsed,
                        target
                    );
                    self.emit_update(&shared, UpdateCause::Blink);
                } else if shared.progress.current_line_index >= shared.session.line_count() {
                    shared.enter(State::Finished);
                    return Next::Finished;
                } else {
                    shared.progress.caret_blink_elapsed = 0;
                    shared.enter(State::Typing);
                    return Next::Typing;
                }
            }

            schedule::wait(self.config.caret_blink_interval()).await;
        }
    }

    async fn finish(&self, token: &RunToken) {
        let pre_fade = self.config.pre_fade_delay();
        if !pre_fade.is_zero() {
            schedule::wait(pre_fade).await;
        }

        let fade = self.config.fade_duration();
        if !fade.is_zero() {
            if let Some(effect) = &self.services.fade {
                if let Err(e) = effect.fade_out(fade).await {
                    warn!("Fade-out failed: {:#}", e);
                }
            }
        }

        let mut shared = self.lock();
        if !token.is_current(shared.session_id) {
            warn!(
                "Typer run for session {} finished after its session was replaced",
                token.session()
            );
            return;
        }

        self.reset_locked(&mut shared);
        info!("Typer finished: session {}", token.session());
        let _ = self.events.send(TyperEvent::Finished);
    }
}
