//! Engine configuration.
//!
//! Everything here is a compile-time constant.  [`EngineConfig`] bundles the
//! constants into one value so the session controller can be built with
//! shorter source lists or tighter timings in tests.

use std::time::Duration;

use crate::source::{ImageSource, StreamSource};

/// Key sent to the primary endpoint.  NASA's shared demo key is rate limited,
/// which is one of the failures the retry path exists for.
pub const API_KEY: &str = "DEMO_KEY";

/// Primary EPIC metadata endpoint.  `{api_key}` is substituted per request.
pub const PRIMARY_ENDPOINT: &str = "https://api.nasa.gov/EPIC/api/natural?api_key={api_key}";

/// Fallback EPIC endpoint served directly by GSFC; needs no credential.
pub const FALLBACK_ENDPOINT: &str = "https://epic.gsfc.nasa.gov/api/natural";

/// Root of the EPIC image archive.
pub const ARCHIVE_BASE: &str = "https://epic.gsfc.nasa.gov/archive/natural";

pub const CACHE_TTL: Duration = Duration::from_millis(3_600_000);
pub const MAX_RETRIES: u32 = 2;
pub const RETRY_DELAY: Duration = Duration::from_millis(2_000);
pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const HEALTH_CHECK_DELAY: Duration = Duration::from_millis(15_000);

/// How often the terminal stream player re-checks the loaded stream.  Kept
/// below the health-check period so a healthy stream always refreshes its
/// liveness before the watchdog looks.
pub const PROBE_INTERVAL: Duration = Duration::from_millis(10_000);

/// Live Earth streams in priority order: `(source id, label)`.
pub const STREAM_SOURCES: &[(&str, &str)] = &[
    ("P9C25Un7xaM", "NASA ISS Live"),
    ("xRPjKQtRXR8", "Earth from the ISS (HD)"),
    ("86YLFOog4GM", "Space Station Live Cams"),
];

/// Runtime view of the constants above.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api_key: String,
    pub primary: ImageSource,
    pub fallback: ImageSource,
    pub cache_ttl: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub streams: Vec<StreamSource>,
    pub health_check: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: API_KEY.to_string(),
            primary: ImageSource::new(PRIMARY_ENDPOINT, true),
            fallback: ImageSource::new(FALLBACK_ENDPOINT, false),
            cache_ttl: CACHE_TTL,
            max_retries: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
            request_timeout: REQUEST_TIMEOUT,
            streams: STREAM_SOURCES
                .iter()
                .map(|(id, label)| StreamSource::new(*id, *label))
                .collect(),
            health_check: HEALTH_CHECK_DELAY,
        }
    }
}

impl EngineConfig {
    /// Total number of image attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}
