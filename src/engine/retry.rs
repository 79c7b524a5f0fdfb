//! Image-mode acquisition: cache first, then bounded retries across the
//! primary and fallback endpoints with linear backoff.
//!
//! Attempt 0 goes to the primary endpoint.  Every later attempt goes to the
//! fallback endpoint.  The delay before attempt `n + 1` is
//! `retry_delay * (n + 1)`, so with the default configuration the schedule
//! is: attempt, 2 s, attempt, 4 s, attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::timer::{self, TaskHandle};
use super::{AcquireCtx, Acquirer, Delivery, EngineEvent, Event, Progress};
use crate::config::EngineConfig;
use crate::error::{FeedError, FetchError};
use crate::source::{EarthView, ImageSource, NetworkClient};

const PRIMARY: usize = 0;
const FALLBACK: usize = 1;

/// One in-flight request.
#[derive(Debug, Clone)]
pub struct AcquisitionAttempt {
    /// Unique per attempt, echoed back by the fetch task.
    pub id: u64,
    pub source_index: usize,
    /// Zero-based.
    pub attempt_number: u32,
    pub started_at: Instant,
}

#[derive(Debug)]
enum Pending {
    Idle,
    InFlight {
        attempt: AcquisitionAttempt,
        _task: TaskHandle,
    },
    Backoff {
        id: u64,
        next_attempt: u32,
        _timer: TaskHandle,
    },
}

pub struct RetryingAcquirer {
    client: Arc<dyn NetworkClient>,
    sources: [ImageSource; 2],
    api_key: String,
    max_attempts: u32,
    retry_delay: Duration,
    request_timeout: Duration,
    next_id: u64,
    pending: Pending,
}

impl RetryingAcquirer {
    pub fn new(config: &EngineConfig, client: Arc<dyn NetworkClient>) -> Self {
        Self {
            client,
            sources: [config.primary.clone(), config.fallback.clone()],
            api_key: config.api_key.clone(),
            max_attempts: config.max_attempts(),
            retry_delay: config.retry_delay,
            request_timeout: config.request_timeout,
            next_id: 0,
            pending: Pending::Idle,
        }
    }

    /// The request currently awaiting a response, if any.
    pub fn in_flight(&self) -> Option<&AcquisitionAttempt> {
        match &self.pending {
            Pending::InFlight { attempt, .. } => Some(attempt),
            _ => None,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn launch(&mut self, attempt_number: u32, ctx: &mut AcquireCtx<'_>) {
        let source_index = if attempt_number == 0 { PRIMARY } else { FALLBACK };
        let url = self.sources[source_index].url(&self.api_key);
        let attempt = AcquisitionAttempt {
            id: self.next_id(),
            source_index,
            attempt_number,
            started_at: Instant::now(),
        };

        ctx.state.current_source_index = source_index;
        if attempt_number == 0 {
            ctx.status("Fetching the latest Earth image…");
        } else {
            ctx.status(format!(
                "Retrying via fallback source (attempt {}/{})…",
                attempt_number + 1,
                self.max_attempts
            ));
        }
        debug!(
            attempt = attempt_number + 1,
            of = self.max_attempts,
            source = source_index,
            "starting image request"
        );

        let client = Arc::clone(&self.client);
        let events = ctx.events.clone();
        let timeout = self.request_timeout;
        let id = attempt.id;
        let task = TaskHandle::spawn(async move {
            let result = match tokio::time::timeout(timeout, client.request(&url, timeout)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            };
            let _ = events.send(Event::Engine(EngineEvent::Fetched { attempt: id, result }));
        });

        self.pending = Pending::InFlight {
            attempt,
            _task: task,
        };
    }

    fn on_fetched(
        &mut self,
        id: u64,
        result: Result<serde_json::Value, FetchError>,
        ctx: &mut AcquireCtx<'_>,
    ) -> Progress {
        let attempt = match self.in_flight() {
            Some(attempt) if attempt.id == id => attempt.clone(),
            _ => {
                debug!(attempt = id, "discarding response from superseded attempt");
                return Progress::Unchanged;
            }
        };
        self.pending = Pending::Idle;

        match result.and_then(|body| EarthView::from_body(&body)) {
            Ok(views) => {
                info!(
                    images = views.len(),
                    source = attempt.source_index,
                    elapsed_ms = attempt.started_at.elapsed().as_millis() as u64,
                    "image metadata fetched"
                );
                ctx.cache.put(views.clone());
                Progress::Ready(Delivery::Image(views))
            }
            Err(err) => self.on_failure(attempt, err, ctx),
        }
    }

    fn on_failure(
        &mut self,
        attempt: AcquisitionAttempt,
        err: FetchError,
        ctx: &mut AcquireCtx<'_>,
    ) -> Progress {
        warn!(
            attempt = attempt.attempt_number + 1,
            of = self.max_attempts,
            source = attempt.source_index,
            elapsed_ms = attempt.started_at.elapsed().as_millis() as u64,
            "image request failed: {err}"
        );

        let next_attempt = attempt.attempt_number + 1;
        if next_attempt >= self.max_attempts {
            error!("giving up after {} attempts: {err}", self.max_attempts);
            return Progress::Failed(FeedError::AcquisitionExhausted(err));
        }

        let delay = self.retry_delay * next_attempt;
        let id = self.next_id();
        ctx.status(format!("{err}; retrying in {} s…", delay.as_secs()));
        self.pending = Pending::Backoff {
            id,
            next_attempt,
            _timer: timer::after(delay, ctx.events, EngineEvent::BackoffElapsed { attempt: id }),
        };
        Progress::Unchanged
    }

    fn on_backoff(&mut self, id: u64, ctx: &mut AcquireCtx<'_>) -> Progress {
        match self.pending {
            Pending::Backoff {
                id: expected,
                next_attempt,
                ..
            } if expected == id => {
                self.launch(next_attempt, ctx);
                Progress::Unchanged
            }
            _ => {
                debug!(attempt = id, "ignoring stale backoff timer");
                Progress::Unchanged
            }
        }
    }
}

impl Acquirer for RetryingAcquirer {
    fn start(&mut self, ctx: &mut AcquireCtx<'_>) -> Progress {
        self.pending = Pending::Idle;

        if let Some(entry) = ctx.cache.get() {
            debug!("serving cached image metadata");
            return Progress::Ready(Delivery::Image(entry.payload.clone()));
        }

        self.launch(0, ctx);
        Progress::Loading
    }

    fn on_event(&mut self, event: EngineEvent, ctx: &mut AcquireCtx<'_>) -> Progress {
        match event {
            EngineEvent::Fetched { attempt, result } => self.on_fetched(attempt, result, ctx),
            EngineEvent::BackoffElapsed { attempt } => self.on_backoff(attempt, ctx),
            EngineEvent::Player { .. } | EngineEvent::WatchdogTick { .. } => Progress::Unchanged,
        }
    }

    fn teardown(&mut self, _ctx: &mut AcquireCtx<'_>) {
        self.pending = Pending::Idle;
    }
}
