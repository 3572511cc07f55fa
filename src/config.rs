use std::str::FromStr;
use std::time::Duration;

use crate::preset::PresetLevels;
use crate::AlarmError;

/// Base clock of the Raspberry Pi PWM peripheral.
pub const PWM_BASE_CLOCK_HZ: f64 = 19_200_000.0;

pub const DEFAULT_CYCLE_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// How often the alarm loop samples the clock.
    pub cycle_period: Duration,
    pub presets: PresetLevels,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cycle_period: DEFAULT_CYCLE_PERIOD,
            presets: PresetLevels::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PwmConfig {
    pub program: String,
    pub pin: u8,
    pub range: u32,
    pub clock_divisor: u32,
}

impl PwmConfig {
    pub fn frequency_hz(&self) -> f64 {
        PWM_BASE_CLOCK_HZ / self.clock_divisor as f64 / self.range as f64
    }
}

impl Default for PwmConfig {
    fn default() -> Self {
        // 19.2 MHz / 96 / 1000 = 200 Hz
        Self {
            program: "gpio".to_string(),
            pin: 1,
            range: 1000,
            clock_divisor: 96,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkKind {
    /// Hardware when the `gpio` tool works, the dummy output otherwise.
    #[default]
    Auto,
    Dummy,
    WiringPi,
}

impl FromStr for SinkKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SinkKind::Auto),
            "dummy" => Ok(SinkKind::Dummy),
            "wiringpi" | "hardware" => Ok(SinkKind::WiringPi),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub controller: ControllerConfig,
    pub pwm: PwmConfig,
    pub sink: SinkKind,
}

const SINK_KEY: &str = "WAKELIGHT_SINK";
const PIN_KEY: &str = "WAKELIGHT_PIN";
const CYCLE_KEY: &str = "WAKELIGHT_CYCLE_MS";
const GPIO_KEY: &str = "WAKELIGHT_GPIO";

impl AppConfig {
    pub fn from_env() -> Result<Self, AlarmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source, starting from the
    /// defaults and overriding whatever `lookup` knows about.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AlarmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(SINK_KEY) {
            config.sink = parse(SINK_KEY, value)?;
        }
        if let Some(value) = lookup(PIN_KEY) {
            config.pwm.pin = parse(PIN_KEY, value)?;
        }
        if let Some(value) = lookup(CYCLE_KEY) {
            let millis: u64 = parse(CYCLE_KEY, value.clone())?;
            if millis == 0 {
                return Err(AlarmError::Config {
                    key: CYCLE_KEY,
                    value,
                });
            }
            config.controller.cycle_period = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(GPIO_KEY) {
            config.pwm.program = value;
        }
        Ok(config)
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, AlarmError> {
    value
        .trim()
        .parse()
        .map_err(|_| AlarmError::Config { key, value })
}
