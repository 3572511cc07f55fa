use log::info;

use crate::window::{wrap_seconds, wrapped_distance, Window, SECONDS_PER_DAY};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Activation {
    #[default]
    Idle,
    Ramping,
}

/// The wake-up state machine, advanced one clock sample at a time.
///
/// `Idle` becomes `Ramping` when a sample lands within half a cycle of the
/// window start, and goes back to `Idle` when a sample lands within half a
/// cycle of the stop. Start and stop instants that fall between two samples
/// still count, so a late sample never swallows the alarm.
#[derive(Debug, Clone)]
pub struct Alarm {
    window: Window,
    enabled: bool,
    activation: Activation,
    last_sample: Option<f64>,
    retimed: bool,
}

impl Alarm {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            enabled: false,
            activation: Activation::Idle,
            last_sample: None,
            retimed: false,
        }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Takes effect at the next sample. A running ramp keeps going against
    /// the new window, or ends without a write if the next sample falls
    /// outside it.
    pub fn set_window(&mut self, window: Window) {
        self.retimed |= self.activation == Activation::Ramping && window != self.window;
        self.window = window;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn arm(&mut self) {
        self.enabled = true;
    }

    /// Stops scheduling until the next [`Alarm::arm`].
    pub fn disarm(&mut self) {
        self.enabled = false;
        self.reset();
    }

    /// Drops any running ramp but stays armed.
    pub fn reset(&mut self) {
        self.activation = Activation::Idle;
        self.last_sample = None;
        self.retimed = false;
    }

    /// Feeds one clock sample and returns the intensity to apply, if any.
    ///
    /// `period` is the sampling interval in seconds.
    pub fn poll(&mut self, now: f64, period: f64) -> Option<f64> {
        if !self.enabled {
            self.reset();
            return None;
        }
        let half = period / 2.0;
        let previous = self.last_sample.replace(now);
        let retimed = std::mem::take(&mut self.retimed);
        let window = self.window;
        match self.activation {
            Activation::Idle => {
                let due = wrapped_distance(now, window.start()) <= half
                    || previous.is_some_and(|prev| crossed(prev, now, window.start()));
                if !due {
                    return None;
                }
                info!("Alarm started, ramping over {window}");
                self.activation = Activation::Ramping;
                Some(self.ramp_value(now, half))
            }
            Activation::Ramping => {
                let value = self.ramp_value(now, half);
                let overran =
                    !self.just_before_start(now, half) && window.elapsed(now) >= window.duration();
                if retimed && overran && wrapped_distance(now, window.stop()) > half {
                    info!("Window moved to {window}, ramp dropped");
                    self.activation = Activation::Idle;
                    return None;
                }
                if wrapped_distance(now, window.stop()) <= half || overran {
                    info!("Alarm finished at {value:.3}");
                    self.activation = Activation::Idle;
                }
                Some(value)
            }
        }
    }

    fn ramp_value(&self, now: f64, half: f64) -> f64 {
        if self.just_before_start(now, half) {
            0.0
        } else {
            self.window.intensity_at(now)
        }
    }

    // The ramp formula counts these samples from yesterday's start.
    fn just_before_start(&self, now: f64, half: f64) -> bool {
        let elapsed = self.window.elapsed(now);
        elapsed > 0.0 && SECONDS_PER_DAY - elapsed <= half
    }
}

/// Whether `target` lies in `(prev, now]`, going forward from `prev`.
fn crossed(prev: f64, now: f64, target: f64) -> bool {
    let span = wrap_seconds(now - prev);
    let offset = wrap_seconds(target - prev);
    span < SECONDS_PER_DAY / 2.0 && offset > 0.0 && offset <= span
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn hms(h: f64, m: f64, s: f64) -> f64 {
        h * 3600.0 + m * 60.0 + s
    }

    fn armed(start: f64, stop: f64) -> Alarm {
        let mut alarm = Alarm::new(Window::new(start, stop).unwrap());
        alarm.arm();
        alarm
    }

    #[test]
    fn two_minute_fade_before_eight() {
        let mut alarm = armed(hms(7.0, 58.0, 0.0), hms(8.0, 0.0, 0.0));

        assert_eq!(alarm.poll(hms(7.0, 57.0, 59.0), 1.0), None);
        assert_eq!(alarm.poll(hms(7.0, 58.0, 0.0), 1.0), Some(0.0));
        assert_eq!(alarm.activation(), Activation::Ramping);

        let half_way = alarm.poll(hms(7.0, 59.0, 0.0), 1.0).unwrap();
        assert!((half_way - 0.5).abs() < EPS);

        assert_eq!(alarm.poll(hms(8.0, 0.0, 1.0), 1.0), Some(1.0));
        assert_eq!(alarm.activation(), Activation::Idle);
        assert_eq!(alarm.poll(hms(8.0, 0.0, 2.0), 1.0), None);
        assert_eq!(alarm.poll(hms(8.0, 30.0, 0.0), 1.0), None);
    }

    #[test]
    fn stays_idle_away_from_start() {
        let mut alarm = armed(1000.0, 1120.0);
        for now in [0.0, 500.0, 999.0] {
            assert_eq!(alarm.poll(now, 1.0), None);
        }
        assert_eq!(alarm.activation(), Activation::Idle);
    }

    #[test]
    fn arming_mid_window_waits_for_next_start() {
        let mut alarm = armed(1000.0, 1120.0);
        assert_eq!(alarm.poll(1060.0, 1.0), None);
        assert_eq!(alarm.poll(1061.0, 1.0), None);
        assert_eq!(alarm.activation(), Activation::Idle);
    }

    #[test]
    fn late_sample_still_catches_start() {
        let mut alarm = armed(1000.0, 1120.0);
        assert_eq!(alarm.poll(999.4, 1.0), None);
        let value = alarm.poll(1000.6, 1.0).unwrap();
        assert!((value - 0.6 / 120.0).abs() < EPS);
        assert_eq!(alarm.activation(), Activation::Ramping);
    }

    #[test]
    fn sample_just_before_start_stays_dark() {
        let mut alarm = armed(1000.0, 1120.0);
        assert_eq!(alarm.poll(999.7, 1.0), Some(0.0));
        assert_eq!(alarm.activation(), Activation::Ramping);
        let value = alarm.poll(1000.7, 1.0).unwrap();
        assert!((value - 0.7 / 120.0).abs() < EPS);
    }

    #[test]
    fn late_sample_still_catches_stop() {
        let mut alarm = armed(1000.0, 1120.0);
        alarm.poll(1000.0, 1.0);
        alarm.poll(1119.4, 1.0);
        assert_eq!(alarm.activation(), Activation::Ramping);
        assert_eq!(alarm.poll(1120.6, 1.0), Some(1.0));
        assert_eq!(alarm.activation(), Activation::Idle);
    }

    #[test]
    fn moving_the_window_away_drops_the_ramp_without_a_write() {
        let mut alarm = armed(1000.0, 1120.0);
        alarm.poll(1000.0, 1.0);
        assert!((alarm.poll(1060.0, 1.0).unwrap() - 0.5).abs() < EPS);

        alarm.set_window(Window::new(2000.0, 2120.0).unwrap());
        assert_eq!(alarm.poll(1061.0, 1.0), None);
        assert_eq!(alarm.activation(), Activation::Idle);
        assert_eq!(alarm.poll(1062.0, 1.0), None);
        assert_eq!(alarm.poll(2000.0, 1.0), Some(0.0));
        assert_eq!(alarm.activation(), Activation::Ramping);
    }

    #[test]
    fn moving_the_window_around_now_keeps_ramping() {
        let mut alarm = armed(1000.0, 1120.0);
        alarm.poll(1000.0, 1.0);
        alarm.poll(1060.0, 1.0);

        alarm.set_window(Window::new(1000.0, 1240.0).unwrap());
        let value = alarm.poll(1061.0, 1.0).unwrap();
        assert!((value - 61.0 / 240.0).abs() < EPS);
        assert_eq!(alarm.activation(), Activation::Ramping);
    }

    #[test]
    fn ramps_across_midnight() {
        let mut alarm = armed(86399.0, 69.0);
        assert_eq!(alarm.poll(86399.0, 1.0), Some(0.0));
        let value = alarm.poll(1.0, 1.0).unwrap();
        assert!((value - 2.0 / 70.0).abs() < EPS);
        assert_eq!(alarm.activation(), Activation::Ramping);
        assert_eq!(alarm.poll(69.2, 1.0), Some(1.0));
        assert_eq!(alarm.activation(), Activation::Idle);
    }

    #[test]
    fn disabled_alarm_never_fires() {
        let mut alarm = Alarm::new(Window::new(1000.0, 1120.0).unwrap());
        assert_eq!(alarm.poll(1000.0, 1.0), None);
        assert_eq!(alarm.activation(), Activation::Idle);
    }

    #[test]
    fn disarm_stops_a_running_ramp() {
        let mut alarm = armed(1000.0, 1120.0);
        alarm.poll(1000.0, 1.0);
        alarm.disarm();
        assert_eq!(alarm.activation(), Activation::Idle);
        assert!(!alarm.enabled());
        assert_eq!(alarm.poll(1010.0, 1.0), None);
    }

    #[test]
    fn crossing_is_forward_only() {
        assert!(crossed(86399.5, 0.5, 0.0));
        assert!(!crossed(10.0, 11.0, 9.0));
        assert!(!crossed(10.0, 11.0, 10.0));
        assert!(crossed(10.0, 11.0, 11.0));
    }
}
