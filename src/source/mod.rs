//! Upstream sources and the collaborators that talk to them.
//!
//! The engine never performs I/O itself.  It reaches the outside world
//! through two seams defined here:
//!
//! * [`NetworkClient`] fetches and parses one image-mode endpoint.
//! * [`StreamPlayer`] loads one live stream and reports its lifecycle back
//!   through a [`PlayerLink`].
//!
//! Concrete implementations live in sub-modules ([`epic`] for HTTP,
//! [`probe`] for the terminal stream stand-in).  Tests swap in scripted
//! fakes.
//!
//! ## For contributors: adding a new stream backend
//!
//! 1. Create a file in this directory and define a struct for it.
//! 2. Implement [`StreamPlayer`]: `load()` must start the source and emit
//!    signals through the given link, `stop()` must silence it.
//! 3. Construct it in `main.rs` in place of [`ProbePlayer`].

mod earth_view;
pub mod epic;
pub mod probe;

pub use earth_view::{Centroid, EarthView};
pub use epic::HttpClient;
pub use probe::ProbePlayer;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::engine::{EngineEvent, Event};
use crate::error::FetchError;

/// One image-mode endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    /// URL, possibly containing an `{api_key}` placeholder.
    pub url_template: String,
    pub requires_key: bool,
}

impl ImageSource {
    pub fn new(url_template: impl Into<String>, requires_key: bool) -> Self {
        Self {
            url_template: url_template.into(),
            requires_key,
        }
    }

    /// Concrete URL for one request.  The key is only substituted into
    /// sources that ask for it.
    pub fn url(&self, api_key: &str) -> String {
        if self.requires_key {
            self.url_template.replace("{api_key}", api_key)
        } else {
            self.url_template.clone()
        }
    }
}

/// One live stream candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    pub source_id: String,
    pub label: String,
}

impl StreamSource {
    pub fn new(source_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            label: label.into(),
        }
    }
}

/// Fetches one endpoint and returns its parsed JSON body.
///
/// Dropping the returned future cancels the request; the engine relies on
/// that to enforce its own per-attempt timeout.
#[async_trait]
pub trait NetworkClient: Send + Sync {
    async fn request(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, FetchError>;
}

/// Playback state reported by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Playing,
    Buffering,
    Paused,
    Ended,
    Unstarted,
}

/// Lifecycle signal emitted by a [`StreamPlayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSignal {
    Ready,
    StateChanged(PlayerState),
    Error(i32),
}

/// Return path from a player to the engine for one `load()` call.
///
/// Each link carries the ticket of the load that created it, so signals a
/// player emits for a source the engine has already moved past are dropped.
#[derive(Debug, Clone)]
pub struct PlayerLink {
    ticket: u64,
    events: mpsc::UnboundedSender<Event>,
}

impl PlayerLink {
    pub(crate) fn new(ticket: u64, events: mpsc::UnboundedSender<Event>) -> Self {
        Self { ticket, events }
    }

    /// Deliver a signal.  Returns `false` once the engine has shut down.
    pub fn emit(&self, signal: PlayerSignal) -> bool {
        self.events
            .send(Event::Engine(EngineEvent::Player {
                ticket: self.ticket,
                signal,
            }))
            .is_ok()
    }
}

/// A live stream player.  One instance is reused across every source.
pub trait StreamPlayer: Send {
    /// Start playing `source`, replacing whatever was loaded before.
    fn load(&mut self, source: &StreamSource, link: PlayerLink);

    /// Stop playback and emit nothing further.
    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_substituted_only_when_required() {
        let keyed = ImageSource::new("https://a.test/x?api_key={api_key}", true);
        assert_eq!(keyed.url("K"), "https://a.test/x?api_key=K");

        let open = ImageSource::new("https://b.test/{api_key}", false);
        assert_eq!(open.url("K"), "https://b.test/{api_key}");
    }

    #[test]
    fn link_tags_signals_with_ticket() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let link = PlayerLink::new(7, tx);
        assert!(link.emit(PlayerSignal::Ready));

        match rx.try_recv() {
            Ok(Event::Engine(EngineEvent::Player { ticket, signal })) => {
                assert_eq!(ticket, 7);
                assert_eq!(signal, PlayerSignal::Ready);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn link_reports_closed_engine() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let link = PlayerLink::new(1, tx);
        assert!(!link.emit(PlayerSignal::Error(5)));
    }
}
