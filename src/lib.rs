//! Wake-up light: ramps a dimmable light from off to full over a daily
//! window that ends at the wake-up time.
#![deny(clippy::future_not_send)]

pub mod alarm;
pub mod clock;
pub mod config;
pub mod controller;
mod error;
pub mod preset;
pub mod pwm;
pub mod ramp;
pub mod settings;
pub mod window;

pub use alarm::Activation;
pub use clock::{ClockSource, LocalClock, ManualClock};
pub use config::{AppConfig, ControllerConfig, PwmConfig, SinkKind};
pub use controller::{AlarmController, Status};
pub use error::AlarmError;
pub use preset::{Preset, PresetLevels};
pub use pwm::{DummyPwm, PwmSink, WiringPiPwm};
pub use settings::{AlarmSettings, WakeupTime};
pub use window::Window;
