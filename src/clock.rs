use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveTime, Timelike};

use crate::window::wrap_seconds;

/// Source of the current time of day, in seconds since midnight.
pub trait ClockSource: Send + Sync {
    fn now(&self) -> f64;
}

/// Seconds since midnight, including the fractional part.
pub fn seconds_of_day(time: NaiveTime) -> f64 {
    // Leap seconds report up to 1_999_999_999 ns.
    let nanos = time.nanosecond().min(999_999_999);
    wrap_seconds(time.num_seconds_from_midnight() as f64 + nanos as f64 / 1e9)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl ClockSource for LocalClock {
    fn now(&self) -> f64 {
        seconds_of_day(Local::now().time())
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<Mutex<f64>>);

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self(Arc::new(Mutex::new(wrap_seconds(now))))
    }

    pub fn set(&self, now: f64) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = wrap_seconds(now);
    }

    pub fn advance(&self, seconds: f64) {
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now = wrap_seconds(*now + seconds);
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> f64 {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_of_day_keeps_fraction() {
        let time = NaiveTime::from_hms_milli_opt(7, 59, 0, 250).unwrap();
        assert_eq!(seconds_of_day(time), 28740.25);
    }

    #[test]
    fn manual_clock_wraps_at_midnight() {
        let clock = ManualClock::new(86399.0);
        let handle = clock.clone();
        handle.advance(2.0);
        assert_eq!(clock.now(), 1.0);
    }

    #[test]
    fn local_clock_stays_within_a_day() {
        let now = LocalClock.now();
        assert!((0.0..86400.0).contains(&now));
    }
}
