//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the portalvisor runtime.
//!
//! Config is used in two ways:
//! 1. **Runtime creation**: `RuntimeBuilder::new(config, ..)`
//! 2. **Extraction defaults**: `ExtractionSettings::from(&config)`
//!
//! ## Sentinel values
//! - `refresh_rate_hz = None` → ask the UI surface, else 60 ticks/s
//! - `max_restarts = 0` → unlimited session restarts

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Lowest refresh rate accepted for the tick loop.
pub const MIN_REFRESH_HZ: f64 = 15.0;
/// Highest refresh rate accepted for the tick loop.
pub const MAX_REFRESH_HZ: f64 = 75.0;
/// Rate used when the refresh rate is unknown or out of band.
pub const DEFAULT_REFRESH_HZ: f64 = 60.0;

/// Global configuration for the portalvisor runtime.
///
/// ## Field semantics
/// - `capacity`: concurrent task slots (min 1)
/// - `refresh_rate_hz`: tick rate override (`None` = detect)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
/// - `grace`: drain window after the UI closes
/// - `min_session_remaining`, `logout_probe`, `restart_backoff`,
///   `max_restarts`: extraction loop tunables
///
/// ## Notes
/// All fields are public. Prefer the helper accessors over checking
/// sentinels inline.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of live tasks.
    pub capacity: usize,

    /// Tick rate in Hz.
    ///
    /// - `None` → use the UI surface's reported rate
    /// - outside `[15, 75]` (or not finite) → 60
    pub refresh_rate_hz: Option<f64>,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Maximum time to wait for live tasks once the UI has closed.
    ///
    /// If exceeded, `Runtime::run` returns `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Restart the session proactively when fewer seconds remain.
    pub min_session_remaining: Duration,

    /// Timeout for the logout check after entering a unit.
    pub logout_probe: Duration,

    /// Delay before each replacement session.
    pub restart_backoff: BackoffPolicy,

    /// Consecutive session restarts without progress before giving up.
    ///
    /// - `0` = unlimited
    pub max_restarts: u32,
}

impl Config {
    /// Returns the slot count clamped to a minimum of 1.
    #[inline]
    pub fn capacity_clamped(&self) -> usize {
        self.capacity.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the restart cap as an `Option`.
    ///
    /// - `None` → restart indefinitely
    #[inline]
    pub fn restart_limit(&self) -> Option<u32> {
        if self.max_restarts == 0 {
            None
        } else {
            Some(self.max_restarts)
        }
    }

    /// Period between ticks.
    ///
    /// `detected` is the UI surface's refresh rate, used when no override is set.
    pub fn tick_period(&self, detected: Option<f64>) -> Duration {
        let hz = self
            .refresh_rate_hz
            .or(detected)
            .filter(|hz| hz.is_finite() && (MIN_REFRESH_HZ..=MAX_REFRESH_HZ).contains(hz))
            .unwrap_or(DEFAULT_REFRESH_HZ);
        Duration::from_secs_f64(1.0 / hz)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `capacity = 2`
    /// - `refresh_rate_hz = None` (detect)
    /// - `bus_capacity = 1024`
    /// - `grace = 60s`
    /// - `min_session_remaining = 120s`
    /// - `logout_probe = 2s`
    /// - `restart_backoff = BackoffPolicy::default()` (constant 100ms)
    /// - `max_restarts = 0` (unlimited)
    fn default() -> Self {
        Self {
            capacity: 2,
            refresh_rate_hz: None,
            bus_capacity: 1024,
            grace: Duration::from_secs(60),
            min_session_remaining: Duration::from_secs(120),
            logout_probe: Duration::from_secs(2),
            restart_backoff: BackoffPolicy::default(),
            max_restarts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hz(period: Duration) -> f64 {
        (1.0 / period.as_secs_f64()).round()
    }

    #[test]
    fn tick_period_clamps_to_band() {
        let cfg = Config::default();
        assert_eq!(hz(cfg.tick_period(None)), 60.0);
        assert_eq!(hz(cfg.tick_period(Some(30.0))), 30.0);
        assert_eq!(hz(cfg.tick_period(Some(144.0))), 60.0);
        assert_eq!(hz(cfg.tick_period(Some(10.0))), 60.0);
        assert_eq!(hz(cfg.tick_period(Some(f64::NAN))), 60.0);
        assert_eq!(hz(cfg.tick_period(Some(75.0))), 75.0);
    }

    #[test]
    fn override_beats_detected_rate() {
        let cfg = Config {
            refresh_rate_hz: Some(20.0),
            ..Config::default()
        };
        assert_eq!(hz(cfg.tick_period(Some(50.0))), 20.0);
    }

    #[test]
    fn sentinels_are_hidden_by_accessors() {
        let cfg = Config {
            capacity: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.capacity_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.restart_limit(), None);
    }
}
