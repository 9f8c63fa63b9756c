use crate::model::{EntityKind, Sport};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_ORIGIN: &str = "https://nmhuathletics.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBackend {
    Chrome,
    Http,
}

/// Site settings. Built once at start-up and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_origin: String,
    pub navigation_timeout: Duration,
    pub marker_timeout: Duration,
    /// Quiet period after the load event, stands in for "network idle".
    pub settle_delay: Duration,
    pub backend: FetchBackend,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_origin: DEFAULT_BASE_ORIGIN.to_string(),
            navigation_timeout: Duration::from_millis(30_000),
            marker_timeout: Duration::from_millis(10_000),
            settle_delay: Duration::from_millis(1_500),
            backend: FetchBackend::Chrome,
        }
    }
}

fn env_ms(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_origin = env::var("ATHLETICS_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_origin);

        let backend = match env::var("ATHLETICS_FETCH_BACKEND").ok().as_deref() {
            Some("http") => FetchBackend::Http,
            _ => FetchBackend::Chrome,
        };

        Self {
            navigation_timeout: env_ms("ATHLETICS_NAV_TIMEOUT_MS", defaults.navigation_timeout),
            marker_timeout: env_ms("ATHLETICS_MARKER_TIMEOUT_MS", defaults.marker_timeout),
            settle_delay: env_ms("ATHLETICS_SETTLE_MS", defaults.settle_delay),
            backend,
            ..Self::with_base_origin(&base_origin)
        }
    }

    pub fn with_base_origin(base_origin: &str) -> Self {
        Self {
            base_origin: base_origin.trim().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// `{origin}/sports/{sport}/{roster|schedule|stats|archives}`
    pub fn page_url(&self, sport: Sport, kind: EntityKind) -> String {
        format!("{}/sports/{}/{}", self.base_origin, sport.slug(), kind.path_segment())
    }
}
