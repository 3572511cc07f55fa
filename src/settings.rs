//! Mapping between the user-facing alarm settings and the controller.
//!
//! The user picks a wake-up time and a fade length; the ramp window is the
//! fade that ends at the wake-up time.

use chrono::NaiveTime;
use log::warn;

use crate::clock::seconds_of_day;
use crate::controller::AlarmController;
use crate::window::Window;
use crate::AlarmError;

/// A wake-up time as entered, in seconds of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WakeupTime {
    Parsed(f64),
    /// The input could not be read, so the current time was used instead.
    FellBack(f64),
}

impl WakeupTime {
    /// Reads `HH:MM` (or `HH:MM:SS`), falling back to `now`.
    pub fn parse(input: &str, now: f64) -> Self {
        let input = input.trim();
        match NaiveTime::parse_from_str(input, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        {
            Ok(time) => WakeupTime::Parsed(seconds_of_day(time)),
            Err(e) => {
                warn!("Unreadable wake-up time {input:?} ({e}), using current time");
                WakeupTime::FellBack(now)
            }
        }
    }

    pub fn seconds(self) -> f64 {
        match self {
            WakeupTime::Parsed(s) | WakeupTime::FellBack(s) => s,
        }
    }

    pub fn fell_back(self) -> bool {
        matches!(self, WakeupTime::FellBack(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlarmSettings {
    pub enabled: bool,
    pub wakeup: String,
    pub fade_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applied {
    pub wakeup: WakeupTime,
    pub window: Window,
}

impl AlarmSettings {
    /// Sets the window and the enabled flag.
    ///
    /// The enabled flag is applied even when the window is rejected, in which
    /// case the previous window stays and the window error is returned.
    pub fn apply(&self, controller: &AlarmController) -> Result<Applied, AlarmError> {
        let wakeup = WakeupTime::parse(&self.wakeup, controller.now());
        let window = Window::ending_at(wakeup.seconds(), 60.0 * self.fade_minutes);
        if let Ok(window) = &window {
            controller.set_window_to(*window);
        }
        controller.set_enabled(self.enabled)?;
        Ok(Applied {
            wakeup,
            window: window?,
        })
    }

    /// Settings that reproduce the controller's current configuration.
    pub fn from_controller(controller: &AlarmController) -> Self {
        let window = controller.window();
        Self {
            enabled: controller.enabled(),
            wakeup: wakeup_label(&window),
            fade_minutes: fade_minutes(&window),
        }
    }
}

/// Wake-up time of `window` as `HH:MM`, rounded to the nearest minute.
pub fn wakeup_label(window: &Window) -> String {
    let minutes = (window.stop() / 60.0).round() as u32 % (24 * 60);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Fade length of `window` in whole minutes.
pub fn fade_minutes(window: &Window) -> f64 {
    (window.duration() / 60.0).round()
}
