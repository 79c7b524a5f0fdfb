//! Scripted collaborators for engine tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::{AcquireCtx, EngineEvent, Event, EventSender, FeedMsg, SessionState};
use crate::cache::CacheStore;
use crate::config::EngineConfig;
use crate::error::FetchError;
use crate::source::{
    EarthView, ImageSource, NetworkClient, PlayerLink, PlayerSignal, StreamPlayer, StreamSource,
};

pub const PRIMARY_URL: &str = "https://primary.test/epic?api_key=TEST_KEY";
pub const FALLBACK_URL: &str = "https://fallback.test/epic";

pub fn test_config() -> EngineConfig {
    EngineConfig {
        api_key: "TEST_KEY".to_string(),
        primary: ImageSource::new("https://primary.test/epic?api_key={api_key}", true),
        fallback: ImageSource::new(FALLBACK_URL, false),
        streams: vec![
            StreamSource::new("A", "Stream A"),
            StreamSource::new("B", "Stream B"),
            StreamSource::new("C", "Stream C"),
        ],
        ..EngineConfig::default()
    }
}

pub fn view(identifier: &str) -> EarthView {
    EarthView {
        identifier: identifier.to_string(),
        image: format!("epic_1b_{identifier}"),
        caption: String::new(),
        captured_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        centroid: None,
    }
}

/// An EPIC response body listing one record per identifier.
pub fn body(identifiers: &[&str]) -> serde_json::Value {
    identifiers
        .iter()
        .map(|id| {
            json!({
                "identifier": id,
                "image": format!("epic_1b_{id}"),
                "caption": "",
                "date": "2024-01-01 00:00:00"
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub enum Reply {
    Body(serde_json::Value),
    Fail(FetchError),
    /// Answer with a body, but only after the given delay.
    Slow(Duration, serde_json::Value),
    /// Never answer.
    Hang,
}

/// Answers request `n` with `replies[n]`, repeating the last reply forever.
pub struct ScriptedClient {
    replies: Vec<Reply>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl NetworkClient for ScriptedClient {
    async fn request(
        &self,
        url: &str,
        _timeout: Duration,
    ) -> Result<serde_json::Value, FetchError> {
        let reply = {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.len();
            calls.push((url.to_string(), Instant::now()));
            self.replies
                .get(n)
                .or(self.replies.last())
                .cloned()
                .unwrap_or(Reply::Hang)
        };

        match reply {
            Reply::Body(body) => Ok(body),
            Reply::Fail(err) => Err(err),
            Reply::Slow(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            Reply::Hang => std::future::pending().await,
        }
    }
}

type Behaviour = Box<dyn FnMut(usize, &StreamSource) -> Vec<PlayerSignal> + Send>;

/// What a [`ScriptedPlayer`] was asked to do.
#[derive(Clone, Default)]
pub struct PlayerLog {
    loads: Arc<Mutex<Vec<String>>>,
    links: Arc<Mutex<Vec<PlayerLink>>>,
    stops: Arc<Mutex<usize>>,
}

impl PlayerLog {
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }

    /// Link handed out by the `n`th load.
    pub fn link(&self, n: usize) -> PlayerLink {
        self.links.lock().unwrap()[n].clone()
    }

    pub fn stops(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

/// Emits whatever `behaviour(load_number, source)` returns on every load.
pub struct ScriptedPlayer {
    behaviour: Behaviour,
    log: PlayerLog,
}

impl ScriptedPlayer {
    pub fn new<F>(behaviour: F) -> (Self, PlayerLog)
    where
        F: FnMut(usize, &StreamSource) -> Vec<PlayerSignal> + Send + 'static,
    {
        let log = PlayerLog::default();
        let player = Self {
            behaviour: Box::new(behaviour),
            log: log.clone(),
        };
        (player, log)
    }

    /// A player that stays silent.
    pub fn silent() -> (Self, PlayerLog) {
        Self::new(|_, _| Vec::new())
    }
}

impl StreamPlayer for ScriptedPlayer {
    fn load(&mut self, source: &StreamSource, link: PlayerLink) {
        let n = {
            let mut loads = self.log.loads.lock().unwrap();
            loads.push(source.source_id.clone());
            loads.len() - 1
        };
        self.log.links.lock().unwrap().push(link.clone());
        for signal in (self.behaviour)(n, source) {
            link.emit(signal);
        }
    }

    fn stop(&mut self) {
        *self.log.stops.lock().unwrap() += 1;
    }
}

/// Owned state behind an [`AcquireCtx`], for driving one acquirer by hand.
pub struct Harness {
    pub state: SessionState,
    pub cache: CacheStore<Vec<EarthView>>,
    pub events: EventSender,
    pub events_rx: mpsc::UnboundedReceiver<Event>,
    pub updates: mpsc::UnboundedSender<FeedMsg>,
    pub updates_rx: mpsc::UnboundedReceiver<FeedMsg>,
}

impl Harness {
    pub fn new() -> Self {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (updates, updates_rx) = mpsc::unbounded_channel();
        Self {
            state: SessionState::default(),
            cache: CacheStore::new(test_config().cache_ttl),
            events,
            events_rx,
            updates,
            updates_rx,
        }
    }

    pub fn ctx(&mut self) -> AcquireCtx<'_> {
        AcquireCtx {
            state: &mut self.state,
            cache: &mut self.cache,
            events: &self.events,
            updates: &self.updates,
        }
    }

    /// Next queued engine event, without waiting.
    pub fn next_engine_event(&mut self) -> Option<EngineEvent> {
        match self.events_rx.try_recv() {
            Ok(Event::Engine(event)) => Some(event),
            _ => None,
        }
    }
}

/// Wait for the next success or error, skipping status lines.
pub async fn next_outcome(rx: &mut mpsc::UnboundedReceiver<FeedMsg>) -> FeedMsg {
    loop {
        match rx.recv().await {
            Some(FeedMsg::Status(_)) => continue,
            Some(msg) => return msg,
            None => panic!("engine closed the update channel"),
        }
    }
}

/// Drain what is queued right now and return any successes or errors.
pub fn pending_outcomes(rx: &mut mpsc::UnboundedReceiver<FeedMsg>) -> Vec<FeedMsg> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if !matches!(msg, FeedMsg::Status(_)) {
            out.push(msg);
        }
    }
    out
}
