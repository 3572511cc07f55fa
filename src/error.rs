use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlarmError {
    /// Window bounds that are out of range or describe a zero-length ramp.
    #[error("invalid window {start}s..{stop}s: {reason}")]
    InvalidWindow {
        start: f64,
        stop: f64,
        reason: &'static str,
    },
    #[error("intensity {0} is outside 0..=1")]
    InvalidIntensity(f64),
    /// The hardware sink could not be prepared at startup.
    #[error("failed to set up PWM output: {0}")]
    ActuatorSetup(String),
    /// The hardware sink rejected a duty cycle. Not retried.
    #[error("failed to apply duty cycle {duty:.3}: {reason}")]
    ActuatorWrite { duty: f64, reason: String },
    #[error("failed to build alarm loop runtime")]
    Runtime(#[source] std::io::Error),
    #[error("failed to spawn alarm loop thread")]
    Spawn(#[source] std::io::Error),
    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },
}
