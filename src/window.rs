//! Time-of-day arithmetic and the validated ramp window.
//!
//! All times are seconds since local midnight as `f64`, in `[0, 86400)`.
//! A window whose stop is numerically smaller than its start runs past
//! midnight.

use std::fmt;

use crate::{ramp, AlarmError};

pub const SECONDS_PER_DAY: f64 = 24.0 * 3600.0;

/// Delay between "now" and the start of the window a new controller gets.
pub const DEFAULT_START_DELAY: f64 = 70.0;
/// Fade length of the window a new controller gets.
pub const DEFAULT_FADE: f64 = 70.0;

/// Wraps any finite number of seconds into `[0, 86400)`.
pub fn wrap_seconds(seconds: f64) -> f64 {
    let wrapped = seconds.rem_euclid(SECONDS_PER_DAY);
    // rem_euclid rounds tiny negative inputs up to the modulus itself.
    if wrapped >= SECONDS_PER_DAY {
        0.0
    } else {
        wrapped
    }
}

/// Shortest distance between two times of day, going either way around midnight.
pub fn wrapped_distance(a: f64, b: f64) -> f64 {
    let d = wrap_seconds(a - b);
    d.min(SECONDS_PER_DAY - d)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    start: f64,
    stop: f64,
}

impl Window {
    pub fn new(start: f64, stop: f64) -> Result<Self, AlarmError> {
        let invalid = |reason| AlarmError::InvalidWindow {
            start,
            stop,
            reason,
        };
        if !start.is_finite() || !stop.is_finite() {
            return Err(invalid("bounds must be finite"));
        }
        if !(0.0..SECONDS_PER_DAY).contains(&start) || !(0.0..SECONDS_PER_DAY).contains(&stop) {
            return Err(invalid("bounds must lie within one day"));
        }
        if start == stop {
            return Err(invalid("window has zero length"));
        }
        Ok(Self { start, stop })
    }

    /// Window of `fade` seconds that ends at `stop`, wrapping back past
    /// midnight when needed.
    pub fn ending_at(stop: f64, fade: f64) -> Result<Self, AlarmError> {
        if !fade.is_finite() || fade <= 0.0 || fade >= SECONDS_PER_DAY {
            return Err(AlarmError::InvalidWindow {
                start: stop - fade,
                stop,
                reason: "fade duration must be positive and shorter than a day",
            });
        }
        Self::new(wrap_seconds(stop - fade), stop)
    }

    /// A window that is safely in the future, so a fresh controller never
    /// fires straight away.
    pub fn default_from(now: f64) -> Self {
        Self {
            start: wrap_seconds(now + DEFAULT_START_DELAY),
            stop: wrap_seconds(now + DEFAULT_START_DELAY + DEFAULT_FADE),
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn stop(&self) -> f64 {
        self.stop
    }

    /// Length of the ramp in seconds, always in `(0, 86400)`.
    pub fn duration(&self) -> f64 {
        wrap_seconds(self.stop - self.start)
    }

    /// Seconds since `start`, in `[0, 86400)`.
    pub fn elapsed(&self, now: f64) -> f64 {
        wrap_seconds(now - self.start)
    }

    /// Ramp value at `now`, see [`ramp::intensity`].
    pub fn intensity_at(&self, now: f64) -> f64 {
        match ramp::intensity(now, self.start, self.stop) {
            Ok(value) => value,
            // `new` rejects zero-length windows; treat one as instant-on.
            Err(_) => 1.0,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}s..{:.1}s", self.start, self.stop)
    }
}
