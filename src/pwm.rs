use std::process::Command;

use log::{debug, info};

use crate::config::PwmConfig;
use crate::AlarmError;

/// Anything that can take a duty cycle in `0.0..=1.0`.
pub trait PwmSink: Send {
    fn set_duty_cycle(&mut self, duty: f64) -> Result<(), AlarmError>;

    fn duty_cycle(&self) -> f64;
}

/// Maps a normalized duty cycle onto an integer register range.
pub fn register_value(duty: f64, range: u32) -> u32 {
    (duty.clamp(0.0, 1.0) * range as f64).round() as u32
}

/// Output for machines without PWM hardware. Only logs.
#[derive(Debug, Default)]
pub struct DummyPwm {
    duty: f64,
}

impl DummyPwm {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PwmSink for DummyPwm {
    fn set_duty_cycle(&mut self, duty: f64) -> Result<(), AlarmError> {
        debug!("Dummy PWM duty cycle set to {duty:.4}");
        self.duty = duty;
        Ok(())
    }

    fn duty_cycle(&self) -> f64 {
        self.duty
    }
}

/// Raspberry Pi hardware PWM, programmed through the WiringPi `gpio` tool.
#[derive(Debug)]
pub struct WiringPiPwm {
    config: PwmConfig,
    duty: f64,
}

impl WiringPiPwm {
    /// Claims the pin and puts it in mark-space PWM mode at
    /// [`PwmConfig::frequency_hz`]. Safe to run again on an already
    /// configured pin.
    pub fn new(config: PwmConfig) -> Result<Self, AlarmError> {
        let pin = config.pin.to_string();
        let range = config.range.to_string();
        let divisor = config.clock_divisor.to_string();
        // Fails when the pin was never exported.
        let _ = run(&config.program, &["unexport", pin.as_str()]);
        let steps: [&[&str]; 4] = [
            &["mode", pin.as_str(), "pwm"],
            &["pwm-ms"],
            &["pwmr", range.as_str()],
            &["pwmc", divisor.as_str()],
        ];
        for args in steps {
            run(&config.program, args).map_err(AlarmError::ActuatorSetup)?;
        }
        info!(
            "PWM on pin {} at {:.0} Hz, range {}",
            config.pin,
            config.frequency_hz(),
            config.range
        );
        Ok(Self { config, duty: 0.0 })
    }

    /// Whether the `gpio` tool can be run at all on this machine.
    pub fn is_available(program: &str) -> bool {
        let available = run(program, &["-v"]).is_ok();
        if available {
            info!("Running on real hardware");
        } else {
            info!("No usable {program:?} tool, PWM hardware unavailable");
        }
        available
    }
}

impl PwmSink for WiringPiPwm {
    fn set_duty_cycle(&mut self, duty: f64) -> Result<(), AlarmError> {
        let value = register_value(duty, self.config.range);
        let pin = self.config.pin.to_string();
        let value = value.to_string();
        run(&self.config.program, &["pwm", pin.as_str(), value.as_str()])
            .map_err(|reason| AlarmError::ActuatorWrite { duty, reason })?;
        self.duty = duty;
        Ok(())
    }

    fn duty_cycle(&self) -> f64 {
        self.duty
    }
}

fn run(program: &str, args: &[&str]) -> Result<(), String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("could not run {program}: {e}"))?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!(
            "`{program} {}` exited with {}: {}",
            args.join(" "),
            output.status,
            stderr.trim()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(program: &str) -> PwmConfig {
        PwmConfig {
            program: program.to_string(),
            ..PwmConfig::default()
        }
    }

    #[test]
    fn register_value_rounds_onto_range() {
        assert_eq!(register_value(0.0, 1000), 0);
        assert_eq!(register_value(0.05, 1000), 50);
        assert_eq!(register_value(0.6004, 1000), 600);
        assert_eq!(register_value(1.0, 1000), 1000);
        assert_eq!(register_value(1.5, 1000), 1000);
    }

    #[test]
    fn dummy_records_last_value() {
        let mut pwm = DummyPwm::new();
        pwm.set_duty_cycle(0.6).unwrap();
        assert_eq!(pwm.duty_cycle(), 0.6);
    }

    #[test]
    fn missing_tool_fails_setup() {
        let result = WiringPiPwm::new(config("/nonexistent/gpio"));
        assert!(matches!(result, Err(AlarmError::ActuatorSetup(_))));
        assert!(!WiringPiPwm::is_available("/nonexistent/gpio"));
    }

    #[cfg(unix)]
    #[test]
    fn successful_write_is_recorded() {
        let mut pwm = WiringPiPwm::new(config("true")).unwrap();
        pwm.set_duty_cycle(0.25).unwrap();
        assert_eq!(pwm.duty_cycle(), 0.25);
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_keeps_previous_value() {
        let mut pwm = WiringPiPwm {
            config: config("false"),
            duty: 0.5,
        };
        let err = pwm.set_duty_cycle(0.9).unwrap_err();
        assert!(matches!(err, AlarmError::ActuatorWrite { duty, .. } if duty == 0.9));
        assert_eq!(pwm.duty_cycle(), 0.5);
    }
}
