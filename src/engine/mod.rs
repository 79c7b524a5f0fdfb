//! The feed-acquisition engine.
//!
//! ## Architecture overview
//!
//! ```text
//!  SessionHandle ──Command──┐
//!                           ▼
//!  fetch tasks ──┐    ┌──────────────┐  FeedMsg   ┌─────────┐
//!  timers ───────┼──► │  session.rs  │ ─────────► │  app.rs │
//!  player links ─┘    │ (controller) │ (channel)  │  (TUI)  │
//!     EngineEvent     └──────┬───────┘            └─────────┘
//!                            │ AcquireCtx
//!                 ┌──────────┴──────────┐
//!           ┌───────────┐        ┌─────────────┐
//!           │ retry.rs  │        │ failover.rs │
//!           │  (image)  │        │  (stream)   │
//!           └───────────┘        └─────────────┘
//! ```
//!
//! Everything that happens asynchronously (a response, a timer, a player
//! signal) becomes an [`Event`] on one queue.  The controller task drains
//! the queue and hands each event to the active [`Acquirer`], so all state
//! transitions run one at a time and in arrival order.  Events that belong
//! to a superseded attempt carry an id the acquirer no longer expects and
//! are dropped.

mod failover;
mod retry;
mod session;
mod timer;

#[cfg(test)]
pub(crate) mod testing;

pub use failover::FailoverSequencer;
pub use retry::RetryingAcquirer;
pub use session::{spawn, SessionController, SessionHandle};

use std::fmt;
use std::str::FromStr;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::cache::CacheStore;
use crate::error::{FeedError, FetchError};
use crate::source::{EarthView, PlayerSignal};

/// Which strategy the session is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Image,
    Stream,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Image => f.write_str("image"),
            Mode::Stream => f.write_str("stream"),
        }
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Mode::Image),
            "stream" | "live" => Ok(Mode::Stream),
            other => anyhow::bail!("unknown mode {other:?} (expected \"image\" or \"stream\")"),
        }
    }
}

/// Requests from the presentation layer.
#[derive(Debug)]
pub enum Command {
    Acquire(Mode),
    Retry,
    Shutdown,
}

/// Completions produced by the engine's own tasks and collaborators.
#[derive(Debug)]
pub enum EngineEvent {
    Fetched {
        attempt: u64,
        result: Result<serde_json::Value, FetchError>,
    },
    BackoffElapsed {
        attempt: u64,
    },
    Player {
        ticket: u64,
        signal: PlayerSignal,
    },
    WatchdogTick {
        epoch: u64,
    },
}

/// Everything the controller's queue carries.
#[derive(Debug)]
pub enum Event {
    Command(Command),
    Engine(EngineEvent),
}

pub type EventSender = mpsc::UnboundedSender<Event>;

/// The stream that is currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStatus {
    pub source_index: usize,
    pub source_id: String,
    pub label: String,
}

/// A successful acquisition, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Image(Vec<EarthView>),
    Stream(StreamStatus),
}

/// A terminal failure.  The presentation layer always offers a retry.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub mode: Mode,
    pub error: FeedError,
}

impl ErrorReport {
    pub fn reason(&self) -> String {
        self.error.to_string()
    }
}

/// Messages sent from the engine to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMsg {
    Success(Delivery),
    Error(ErrorReport),
    Status(String),
}

/// The one session, owned by the controller.
#[derive(Debug, Default)]
pub struct SessionState {
    pub mode: Mode,
    pub is_loading: bool,
    /// The last acquisition ended in a terminal error.  Only then is a
    /// retry honoured.
    pub failed: bool,
    pub current_source_index: usize,
    /// Last liveness proof from the stream player.  Unused in image mode.
    pub last_alive_at: Option<Instant>,
}

/// What an acquirer may touch while handling one event.
pub struct AcquireCtx<'a> {
    pub state: &'a mut SessionState,
    pub cache: &'a mut CacheStore<Vec<EarthView>>,
    pub events: &'a EventSender,
    pub updates: &'a mpsc::UnboundedSender<FeedMsg>,
}

impl AcquireCtx<'_> {
    /// Surface a non-terminal status line.
    pub fn status(&self, text: impl Into<String>) {
        let _ = self.updates.send(FeedMsg::Status(text.into()));
    }
}

/// Result of one acquirer transition, as seen by the controller.
#[derive(Debug, PartialEq)]
pub enum Progress {
    /// Nothing the controller needs to act on.
    Unchanged,
    /// Work is in flight again.
    Loading,
    Ready(Delivery),
    Failed(FeedError),
}

/// One acquisition strategy.
pub trait Acquirer {
    /// Begin acquiring from the first source.
    fn start(&mut self, ctx: &mut AcquireCtx<'_>) -> Progress;

    /// Handle one completion addressed to the engine.
    fn on_event(&mut self, event: EngineEvent, ctx: &mut AcquireCtx<'_>) -> Progress;

    /// Cancel everything in flight and return to idle.
    fn teardown(&mut self, ctx: &mut AcquireCtx<'_>);

    /// User-initiated restart from index 0.
    fn reset(&mut self, ctx: &mut AcquireCtx<'_>) -> Progress {
        self.teardown(ctx);
        self.start(ctx)
    }
}
