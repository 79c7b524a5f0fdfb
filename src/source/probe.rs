//! Terminal stand-in for a live video player.
//!
//! A terminal cannot play video, but it can tell whether a stream is still
//! being served.  [`ProbePlayer`] asks YouTube's oEmbed endpoint about the
//! loaded stream on a fixed interval and translates the answers into the
//! same lifecycle signals an embedded player would emit.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::{PlayerLink, PlayerSignal, PlayerState, StreamPlayer, StreamSource};

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed?format=json&url=https://www.youtube.com/watch?v=";

/// Embedded-player error codes, reused so the rest of the engine sees the
/// same numbers a browser player reports.
const ERR_NOT_FOUND: i32 = 100;
const ERR_NOT_EMBEDDABLE: i32 = 150;

/// Polls stream availability and reports it as playback.
pub struct ProbePlayer {
    client: reqwest::Client,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl ProbePlayer {
    /// `interval` must be shorter than the engine's health-check period,
    /// otherwise a healthy stream is judged stalled between probes.
    pub fn new(interval: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            interval,
            task: None,
        }
    }
}

impl StreamPlayer for ProbePlayer {
    fn load(&mut self, source: &StreamSource, link: PlayerLink) {
        self.stop();

        let client = self.client.clone();
        let interval = self.interval;
        let url = format!("{OEMBED_ENDPOINT}{}", source.source_id);
        let label = source.label.clone();

        self.task = Some(tokio::spawn(async move {
            let mut ready = false;
            loop {
                let signal = match client.get(&url).timeout(interval).send().await {
                    Ok(response) => signal_for_status(response.status().as_u16()),
                    Err(e) => {
                        debug!(stream = %label, "probe failed: {e}");
                        PlayerSignal::StateChanged(PlayerState::Buffering)
                    }
                };

                if signal == PlayerSignal::StateChanged(PlayerState::Playing) && !ready {
                    ready = true;
                    if !link.emit(PlayerSignal::Ready) {
                        return;
                    }
                }
                if !link.emit(signal) {
                    return;
                }
                if matches!(signal, PlayerSignal::Error(_)) {
                    return;
                }

                tokio::time::sleep(interval).await;
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ProbePlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Map an oEmbed status code onto a player signal.
fn signal_for_status(status: u16) -> PlayerSignal {
    match status {
        200..=299 => PlayerSignal::StateChanged(PlayerState::Playing),
        404 => PlayerSignal::Error(ERR_NOT_FOUND),
        401 | 403 => PlayerSignal::Error(ERR_NOT_EMBEDDABLE),
        429 | 500..=599 => PlayerSignal::StateChanged(PlayerState::Buffering),
        other => PlayerSignal::Error(i32::from(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_means_playing() {
        assert_eq!(
            signal_for_status(200),
            PlayerSignal::StateChanged(PlayerState::Playing)
        );
    }

    #[test]
    fn missing_or_private_streams_are_errors() {
        assert_eq!(signal_for_status(404), PlayerSignal::Error(ERR_NOT_FOUND));
        assert_eq!(signal_for_status(401), PlayerSignal::Error(ERR_NOT_EMBEDDABLE));
        assert_eq!(signal_for_status(400), PlayerSignal::Error(400));
    }

    #[test]
    fn transient_upstream_trouble_is_buffering() {
        for status in [429, 500, 503] {
            assert_eq!(
                signal_for_status(status),
                PlayerSignal::StateChanged(PlayerState::Buffering)
            );
        }
    }
}
