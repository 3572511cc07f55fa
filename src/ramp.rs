use crate::window::wrap_seconds;
use crate::AlarmError;

/// Fraction of the window that has passed at `now`, clamped to `0.0..=1.0`.
///
/// A window whose `stop` is smaller than `start` is taken to end on the
/// following day. Times before `start` count from the previous day's start,
/// so they clamp to full brightness rather than to zero.
pub fn intensity(now: f64, start: f64, stop: f64) -> Result<f64, AlarmError> {
    let p = wrap_seconds(now - start);
    let q = wrap_seconds(stop - start);
    if q <= 0.0 {
        return Err(AlarmError::InvalidWindow {
            start,
            stop,
            reason: "window has zero length",
        });
    }
    Ok((p / q).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Window, SECONDS_PER_DAY};

    const EPS: f64 = 1e-9;

    #[test]
    fn starts_dark_and_ends_bright() {
        for (start, stop) in [(100.0, 220.0), (28680.0, 28800.0), (86000.0, 400.0)] {
            assert!(intensity(start, start, stop).unwrap().abs() < EPS);
            assert!((intensity(stop, start, stop).unwrap() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn never_decreases_inside_the_window() {
        let (start, stop) = (86000.0, 400.0);
        let mut last = 0.0;
        for step in 0..=80 {
            let now = (start + step as f64 * 10.0) % SECONDS_PER_DAY;
            let value = intensity(now, start, stop).unwrap();
            assert!(value >= last, "{value} < {last} at {now}");
            last = value;
        }
    }

    #[test]
    fn window_across_midnight() {
        let value = intensity(1.0, 86399.0, 69.0).unwrap();
        assert!((value - 2.0 / 70.0).abs() < EPS);
        assert!(value > 0.0 && value < 1.0);
    }

    #[test]
    fn clamps_outside_the_window() {
        assert_eq!(intensity(500.0, 100.0, 220.0).unwrap(), 1.0);
        // Before the start counts as a day later, hence full brightness.
        assert_eq!(intensity(99.0, 100.0, 220.0).unwrap(), 1.0);
        for now in [0.0, 50.0, 300.0, 43200.0, 86399.9] {
            let value = intensity(now, 100.0, 220.0).unwrap();
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn degenerate_window_is_an_error() {
        assert!(matches!(
            intensity(10.0, 500.0, 500.0),
            Err(AlarmError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn an_instant_before_start_is_still_dark() {
        // Rounds to a whole day before start, which is the start itself.
        assert_eq!(intensity(1000.0 - 1e-12, 1000.0, 1120.0).unwrap(), 0.0);
    }

    #[test]
    fn window_uses_the_same_ramp() {
        for (start, stop) in [(1000.0, 1120.0), (86399.0, 69.0)] {
            let window = Window::new(start, stop).unwrap();
            for offset in [-1e-12, 0.0, 1e-12, -0.3, 0.3, 35.0, 69.0, 120.0, 500.0] {
                let now = wrap_seconds(start + offset);
                assert_eq!(
                    window.intensity_at(now),
                    intensity(now, start, stop).unwrap(),
                    "at {now}"
                );
            }
        }
    }

    #[test]
    fn midpoint_of_two_minute_fade() {
        let start = 7.0 * 3600.0 + 58.0 * 60.0;
        let stop = 8.0 * 3600.0;
        let value = intensity(7.0 * 3600.0 + 59.0 * 60.0, start, stop).unwrap();
        assert!((value - 0.5).abs() < EPS);
    }
}
