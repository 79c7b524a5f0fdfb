//! Stream-mode acquisition: ordered failover with a liveness watchdog.
//!
//! ```text
//!  Idle ──start──► Loading(i) ──ready──► Active(i)
//!                     │                     │
//!                     └──── stall ──────────┴──► Loading(i + 1) │ Exhausted
//! ```
//!
//! A stall is any of: player error, `ended`, `unstarted`, or a watchdog
//! tick that finds no liveness proof for a whole health-check period.  All
//! of them go through [`FailoverSequencer::advance`]; only running off the
//! end of the list is reported as an error.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::timer::{self, TaskHandle};
use super::{AcquireCtx, Acquirer, Delivery, EngineEvent, Progress, StreamStatus};
use crate::config::EngineConfig;
use crate::error::{FeedError, StallReason};
use crate::source::{PlayerLink, PlayerSignal, PlayerState, StreamPlayer, StreamSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading(usize),
    Active(usize),
    Exhausted,
}

pub struct FailoverSequencer {
    sources: Vec<StreamSource>,
    player: Box<dyn StreamPlayer>,
    health_check: Duration,
    phase: Phase,
    /// Bumped on every load; player signals carrying an older ticket are
    /// from a source we already left.
    ticket: u64,
    /// Bumped on every arm; ticks carrying an older epoch were cancelled.
    epoch: u64,
    watchdog: Option<TaskHandle>,
}

impl FailoverSequencer {
    pub fn new(config: &EngineConfig, player: Box<dyn StreamPlayer>) -> Self {
        Self {
            sources: config.streams.clone(),
            player,
            health_check: config.health_check,
            phase: Phase::Idle,
            ticket: 0,
            epoch: 0,
            watchdog: None,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn status_for(&self, index: usize) -> StreamStatus {
        let source = &self.sources[index];
        StreamStatus {
            source_index: index,
            source_id: source.source_id.clone(),
            label: source.label.clone(),
        }
    }

    fn load(&mut self, index: usize, ctx: &mut AcquireCtx<'_>) -> Progress {
        self.phase = Phase::Loading(index);
        self.ticket += 1;
        ctx.state.current_source_index = index;
        ctx.state.last_alive_at = Some(Instant::now());

        let source = &self.sources[index];
        info!(stream = %source.label, index, "loading stream");
        ctx.status(format!("Loading {}…", source.label));
        self.player
            .load(source, PlayerLink::new(self.ticket, ctx.events.clone()));

        self.arm_watchdog(ctx);
        Progress::Loading
    }

    fn arm_watchdog(&mut self, ctx: &mut AcquireCtx<'_>) {
        self.cancel_watchdog();
        self.epoch += 1;
        self.watchdog = Some(timer::after(
            self.health_check,
            ctx.events,
            EngineEvent::WatchdogTick { epoch: self.epoch },
        ));
    }

    fn cancel_watchdog(&mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.cancel();
        }
    }

    fn activate(&mut self, ctx: &mut AcquireCtx<'_>) -> Progress {
        let Phase::Loading(index) = self.phase else {
            return Progress::Unchanged;
        };

        self.phase = Phase::Active(index);
        ctx.state.last_alive_at = Some(Instant::now());
        self.arm_watchdog(ctx);
        ctx.status("Connecting…");
        Progress::Ready(Delivery::Stream(self.status_for(index)))
    }

    fn on_signal(&mut self, signal: PlayerSignal, ctx: &mut AcquireCtx<'_>) -> Progress {
        match signal {
            PlayerSignal::Ready => self.activate(ctx),
            PlayerSignal::StateChanged(PlayerState::Playing) => {
                // Some players skip `ready` and go straight to playing.
                let progress = self.activate(ctx);
                ctx.state.last_alive_at = Some(Instant::now());
                ctx.status("Live");
                progress
            }
            PlayerSignal::StateChanged(PlayerState::Buffering) => {
                ctx.status("Buffering…");
                Progress::Unchanged
            }
            PlayerSignal::StateChanged(PlayerState::Paused) => {
                ctx.status("Paused");
                Progress::Unchanged
            }
            PlayerSignal::StateChanged(PlayerState::Ended) => self.advance(StallReason::Ended, ctx),
            PlayerSignal::StateChanged(PlayerState::Unstarted) => {
                self.advance(StallReason::Unstarted, ctx)
            }
            PlayerSignal::Error(code) => self.advance(StallReason::PlayerError(code), ctx),
        }
    }

    fn on_tick(&mut self, ctx: &mut AcquireCtx<'_>) -> Progress {
        self.watchdog = None;
        let silent = ctx
            .state
            .last_alive_at
            .map(|at| at.elapsed())
            .unwrap_or(self.health_check);

        if silent >= self.health_check {
            warn!(silent_ms = silent.as_millis() as u64, "stream stalled");
            self.advance(StallReason::Stalled(self.health_check.as_secs()), ctx)
        } else {
            self.arm_watchdog(ctx);
            Progress::Unchanged
        }
    }

    /// Give up on the current source and move to the next one.
    pub fn advance(&mut self, reason: StallReason, ctx: &mut AcquireCtx<'_>) -> Progress {
        let current = match self.phase {
            Phase::Loading(index) | Phase::Active(index) => index,
            Phase::Idle | Phase::Exhausted => return Progress::Unchanged,
        };
        self.cancel_watchdog();

        let next = current + 1;
        warn!(stream = %self.sources[current].label, %reason, "stream source failed");

        if next >= self.sources.len() {
            self.phase = Phase::Exhausted;
            self.ticket += 1;
            self.player.stop();
            ctx.state.last_alive_at = None;
            error!(%reason, "all stream sources exhausted");
            return Progress::Failed(FeedError::SourceExhausted { reason });
        }

        ctx.status(format!("{reason}; switching source…"));
        self.load(next, ctx)
    }
}

impl Acquirer for FailoverSequencer {
    fn start(&mut self, ctx: &mut AcquireCtx<'_>) -> Progress {
        match self.phase {
            Phase::Active(index) => return Progress::Ready(Delivery::Stream(self.status_for(index))),
            Phase::Loading(_) => return Progress::Loading,
            Phase::Idle | Phase::Exhausted => {}
        }

        if self.sources.is_empty() {
            self.phase = Phase::Exhausted;
            return Progress::Failed(FeedError::SourceExhausted {
                reason: StallReason::NoSources,
            });
        }
        self.load(0, ctx)
    }

    fn on_event(&mut self, event: EngineEvent, ctx: &mut AcquireCtx<'_>) -> Progress {
        match event {
            EngineEvent::Player { ticket, signal } => {
                if ticket != self.ticket {
                    debug!(ticket, current = self.ticket, ?signal, "dropping signal from previous source");
                    return Progress::Unchanged;
                }
                self.on_signal(signal, ctx)
            }
            EngineEvent::WatchdogTick { epoch } => {
                if epoch != self.epoch || self.watchdog.is_none() {
                    debug!(epoch, "ignoring cancelled watchdog tick");
                    return Progress::Unchanged;
                }
                self.on_tick(ctx)
            }
            EngineEvent::Fetched { .. } | EngineEvent::BackoffElapsed { .. } => Progress::Unchanged,
        }
    }

    fn teardown(&mut self, ctx: &mut AcquireCtx<'_>) {
        self.cancel_watchdog();
        self.ticket += 1;
        if self.phase != Phase::Idle {
            self.player.stop();
        }
        self.phase = Phase::Idle;
        ctx.state.last_alive_at = None;
    }
}
