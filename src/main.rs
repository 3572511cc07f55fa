mod console;

use std::io;
use std::sync::Arc;

use anyhow::Context;
use log::{info, warn};
use wakeup_light::{
    AlarmController, AppConfig, DummyPwm, LocalClock, PwmSink, SinkKind, WiringPiPwm,
};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Wake-up light {}", env!("BUILD_ID"));

    let config = AppConfig::from_env()?;
    let sink = open_sink(&config)?;
    let controller = AlarmController::new(Arc::new(LocalClock), sink, config.controller);
    info!("{}", controller.status());

    console::run(&controller, io::stdin().lock(), io::stdout().lock())?;

    info!("Shutting down...");
    controller.set_enabled(false)?;

    Ok(())
}

fn open_sink(config: &AppConfig) -> anyhow::Result<Box<dyn PwmSink>> {
    let hardware = match config.sink {
        SinkKind::Dummy => false,
        SinkKind::WiringPi => true,
        SinkKind::Auto => WiringPiPwm::is_available(&config.pwm.program),
    };
    if !hardware {
        warn!("Using dummy PWM output, the light will not change");
        return Ok(Box::new(DummyPwm::new()));
    }
    let pwm = WiringPiPwm::new(config.pwm.clone())
        .with_context(|| format!("setting up PWM pin {}", config.pwm.pin))?;
    Ok(Box::new(pwm))
}
