//! The alarm controller and its background polling loop.
//!
//! All alarm state and the output live behind one mutex. The loop thread
//! and every public call take that lock before reading or changing either,
//! so a window update is never seen half-applied and two writers never race
//! on the output.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;

use crate::alarm::{Activation, Alarm};
use crate::clock::ClockSource;
use crate::config::ControllerConfig;
use crate::preset::Preset;
use crate::pwm::PwmSink;
use crate::window::Window;
use crate::AlarmError;

struct State {
    alarm: Alarm,
    sink: Box<dyn PwmSink>,
}

struct Shared {
    clock: Arc<dyn ClockSource>,
    state: Mutex<State>,
    period: Duration,
    loop_starts: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation is a plain assignment, so a panicking holder cannot
        // leave the state half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poll(&self) {
        let now = self.clock.now();
        let mut state = self.lock();
        let State { alarm, sink } = &mut *state;
        if let Some(duty) = alarm.poll(now, self.period.as_secs_f64()) {
            if let Err(e) = sink.set_duty_cycle(duty) {
                error!("{e}");
            }
        }
        debug!(
            "now={now:.1}s window={} enabled={} activation={:?} duty={:.3}",
            alarm.window(),
            alarm.enabled(),
            alarm.activation(),
            sink.duty_cycle()
        );
    }
}

struct Worker {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Drives a [`PwmSink`] from a daily wake-up window.
///
/// Created disabled, with a window starting 70 seconds from now. Enabling
/// starts one background thread that samples the clock every cycle period;
/// disabling stops it and waits for it to exit.
pub struct AlarmController {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
    config: ControllerConfig,
}

impl AlarmController {
    pub fn new(
        clock: Arc<dyn ClockSource>,
        sink: Box<dyn PwmSink>,
        config: ControllerConfig,
    ) -> Self {
        let window = Window::default_from(clock.now());
        let shared = Shared {
            clock,
            state: Mutex::new(State {
                alarm: Alarm::new(window),
                sink,
            }),
            period: config.cycle_period,
            loop_starts: AtomicUsize::new(0),
        };
        Self {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
            config,
        }
    }

    pub fn now(&self) -> f64 {
        self.shared.clock.now()
    }

    pub fn set_window(&self, start: f64, stop: f64) -> Result<(), AlarmError> {
        self.set_window_to(Window::new(start, stop)?);
        Ok(())
    }

    pub fn set_window_to(&self, window: Window) {
        info!("Alarm window set to {window}");
        self.shared.lock().alarm.set_window(window);
    }

    pub fn window(&self) -> Window {
        self.shared.lock().alarm.window()
    }

    /// Arms the alarm and starts the loop, or disarms it and stops the loop.
    ///
    /// Both directions are idempotent. Disabling returns only after the loop
    /// thread has exited, so no scheduled write can follow.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), AlarmError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if enabled {
            if worker.is_none() {
                info!("Starting alarm clock ...");
                *worker = Some(self.spawn()?);
            }
            self.shared.lock().alarm.arm();
        } else {
            self.shared.lock().alarm.disarm();
            if let Some(Worker { cancel, handle }) = worker.take() {
                info!("Stopping alarm clock ...");
                // The receiver only disappears once the loop has returned.
                let _ = cancel.send(true);
                if handle.join().is_err() {
                    error!("Alarm loop thread panicked");
                }
            }
        }
        Ok(())
    }

    /// Whether the alarm is armed.
    pub fn enabled(&self) -> bool {
        self.shared.lock().alarm.enabled()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn loop_starts(&self) -> usize {
        self.shared.loop_starts.load(Ordering::SeqCst)
    }

    pub fn activation(&self) -> Activation {
        self.shared.lock().alarm.activation()
    }

    /// Sets the output directly and disarms the alarm until it is enabled
    /// again. The loop keeps running but stops writing.
    pub fn set_intensity(&self, intensity: f64) -> Result<(), AlarmError> {
        if !(0.0..=1.0).contains(&intensity) {
            return Err(AlarmError::InvalidIntensity(intensity));
        }
        let mut state = self.shared.lock();
        if state.alarm.activation() == Activation::Ramping {
            warn!("Manual intensity {intensity:.3} overrides running alarm");
        }
        state.alarm.disarm();
        state.sink.set_duty_cycle(intensity)
    }

    pub fn apply_preset(&self, preset: Preset) -> Result<(), AlarmError> {
        info!("Preset {preset}");
        self.set_intensity(self.config.presets.level(preset))
    }

    pub fn intensity(&self) -> f64 {
        self.shared.lock().sink.duty_cycle()
    }

    pub fn status(&self) -> Status {
        let running = self.is_running();
        let state = self.shared.lock();
        Status {
            running,
            enabled: state.alarm.enabled(),
            window: state.alarm.window(),
            activation: state.alarm.activation(),
            intensity: state.sink.duty_cycle(),
        }
    }

    fn spawn(&self) -> Result<Worker, AlarmError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(AlarmError::Runtime)?;
        let (cancel, cancelled) = watch::channel(false);
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("alarm-loop".to_string())
            .spawn(move || runtime.block_on(run(shared, cancelled)))
            .map_err(AlarmError::Spawn)?;
        self.shared.loop_starts.fetch_add(1, Ordering::SeqCst);
        Ok(Worker { cancel, handle })
    }
}

impl Drop for AlarmController {
    fn drop(&mut self) {
        let _ = self.set_enabled(false);
    }
}

async fn run(shared: Arc<Shared>, mut cancelled: watch::Receiver<bool>) {
    info!("Alarm loop running every {:?}", shared.period);
    while !*cancelled.borrow() {
        if catch_unwind(AssertUnwindSafe(|| shared.poll())).is_err() {
            error!("Alarm poll panicked, continuing with next cycle");
        }
        tokio::select! {
            _ = tokio::time::sleep(shared.period) => {}
            changed = cancelled.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    shared.lock().alarm.reset();
    info!("Alarm loop stopped");
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub running: bool,
    pub enabled: bool,
    pub window: Window,
    pub activation: Activation,
    pub intensity: f64,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0}% (alarm {}, {:?}, window {})",
            100.0 * self.intensity,
            if self.enabled { "on" } else { "off" },
            self.activation,
            self.window
        )
    }
}
