//! The session controller.
//!
//! Runs as one tokio task that owns the session state and the cache, drains
//! the event queue, and routes every event to the acquirer for the current
//! mode.  The presentation layer talks to it through a [`SessionHandle`] and
//! listens for [`FeedMsg`]s on the returned channel.

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{
    AcquireCtx, Acquirer, Command, ErrorReport, Event, EventSender, FailoverSequencer, FeedMsg,
    Mode, Progress, RetryingAcquirer, SessionState,
};
use crate::cache::CacheStore;
use crate::config::EngineConfig;
use crate::source::{EarthView, NetworkClient, StreamPlayer};

/// Fire-and-forget commands for a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: EventSender,
}

impl SessionHandle {
    pub fn acquire(&self, mode: Mode) {
        self.send(Command::Acquire(mode));
    }

    pub fn retry(&self) {
        self.send(Command::Retry);
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    fn send(&self, command: Command) {
        if self.events.send(Event::Command(command)).is_err() {
            debug!("session already closed");
        }
    }
}

pub struct SessionController {
    state: SessionState,
    cache: CacheStore<Vec<EarthView>>,
    image: RetryingAcquirer,
    stream: FailoverSequencer,
    events: EventSender,
    updates: mpsc::UnboundedSender<FeedMsg>,
}

impl SessionController {
    pub fn new(
        config: &EngineConfig,
        client: Arc<dyn NetworkClient>,
        player: Box<dyn StreamPlayer>,
        events: EventSender,
        updates: mpsc::UnboundedSender<FeedMsg>,
    ) -> Self {
        Self {
            state: SessionState::default(),
            cache: CacheStore::new(config.cache_ttl),
            image: RetryingAcquirer::new(config, client),
            stream: FailoverSequencer::new(config, player),
            events,
            updates,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Drain the queue until shutdown.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<Event>) {
        while let Some(event) = events.recv().await {
            if self.handle(event).is_break() {
                break;
            }
        }
        debug!("session controller stopped");
    }

    /// Apply one event.  This is the whole state-transition function.
    pub fn handle(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::Command(Command::Acquire(mode)) => self.acquire(mode),
            Event::Command(Command::Retry) => self.retry(),
            Event::Command(Command::Shutdown) => {
                self.drive(|acquirer, ctx| {
                    acquirer.teardown(ctx);
                    Progress::Unchanged
                });
                self.state.is_loading = false;
                return ControlFlow::Break(());
            }
            Event::Engine(event) => {
                let progress = self.drive(|acquirer, ctx| acquirer.on_event(event, ctx));
                self.apply(progress);
            }
        }
        ControlFlow::Continue(())
    }

    fn acquire(&mut self, mode: Mode) {
        if self.state.is_loading {
            debug!(%mode, "acquisition already in flight; ignoring request");
            return;
        }

        if mode != self.state.mode {
            info!(from = %self.state.mode, to = %mode, "switching mode");
            self.drive(|acquirer, ctx| {
                acquirer.teardown(ctx);
                Progress::Unchanged
            });
            self.state.mode = mode;
        }

        self.state.is_loading = true;
        self.state.failed = false;
        let progress = self.drive(|acquirer, ctx| acquirer.start(ctx));
        self.apply(progress);
    }

    fn retry(&mut self) {
        if self.state.is_loading {
            debug!("retry requested while loading; ignoring");
            return;
        }
        if !self.state.failed {
            debug!("retry requested without a failure; ignoring");
            return;
        }

        info!(mode = %self.state.mode, "retrying from the first source");
        self.state.is_loading = true;
        self.state.failed = false;
        self.state.current_source_index = 0;
        let progress = self.drive(|acquirer, ctx| acquirer.reset(ctx));
        self.apply(progress);
    }

    /// Run `f` against the acquirer for the current mode.
    fn drive<F>(&mut self, f: F) -> Progress
    where
        F: FnOnce(&mut dyn Acquirer, &mut AcquireCtx<'_>) -> Progress,
    {
        let Self {
            state,
            cache,
            image,
            stream,
            events,
            updates,
        } = self;

        let acquirer: &mut dyn Acquirer = match state.mode {
            Mode::Image => image,
            Mode::Stream => stream,
        };
        let mut ctx = AcquireCtx {
            state,
            cache,
            events,
            updates,
        };
        f(acquirer, &mut ctx)
    }

    fn apply(&mut self, progress: Progress) {
        match progress {
            Progress::Unchanged => {}
            Progress::Loading => self.state.is_loading = true,
            Progress::Ready(delivery) => {
                self.state.is_loading = false;
                self.state.failed = false;
                let _ = self.updates.send(FeedMsg::Success(delivery));
            }
            Progress::Failed(error) => {
                self.state.is_loading = false;
                self.state.failed = true;
                let _ = self.updates.send(FeedMsg::Error(ErrorReport {
                    mode: self.state.mode,
                    error,
                }));
            }
        }
    }
}

/// Start a session controller on the current tokio runtime.
pub fn spawn(
    config: &EngineConfig,
    client: Arc<dyn NetworkClient>,
    player: Box<dyn StreamPlayer>,
) -> (SessionHandle, mpsc::UnboundedReceiver<FeedMsg>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();

    let controller = SessionController::new(config, client, player, events_tx.clone(), updates_tx);
    tokio::spawn(controller.run(events_rx));

    (SessionHandle { events: events_tx }, updates_rx)
}
