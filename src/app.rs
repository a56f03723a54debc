//! One complete run: create, load, start, drive, kill.
//!
//! Kept out of `main.rs` so the whole flow can be tested against a
//! `RecordingStrip` instead of real hardware.

use crate::config::{Program, RunConfig};
use crate::error::{AppError, StripError};
use crate::injector::{ColorSource, run_injector};
use crate::is_running;
use crate::pattern::{Pattern, PatternStatus};
use crate::strip::LedStrip;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

/// How often the rainbow program checks for shutdown.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Run the configured program until `running` goes false or the pattern
/// worker dies.
///
/// `make_strip` is called on the worker thread to initialize the strip.
pub fn run<S, F>(
    config: &RunConfig,
    make_strip: F,
    running: &AtomicBool,
) -> Result<PatternStatus, AppError>
where
    S: LedStrip,
    F: FnOnce() -> Result<S, StripError> + Send + 'static,
{
    config.validate()?;

    let settings = config.settings;
    tracing::info!(
        "Program: {} on {}x{} ({} LEDs)",
        config.program,
        settings.layout.width,
        settings.layout.height,
        settings.layout.led_count()
    );

    let mut pattern = Pattern::create(config.program, settings);
    pattern.load(make_strip)?;
    pattern.start()?;

    let outcome = match config.program {
        Program::Rainbow => {
            // Nothing to feed; just hold until Ctrl+C.
            while is_running(running) && pattern.is_alive() {
                thread::sleep(IDLE_POLL);
            }
            Ok(())
        }
        Program::Pulse => {
            tracing::info!(
                "Injecting {:?} colors every {:.2}s, {} LEDs/s, pulse width {}",
                config.injection_order,
                config.sleep_rate.as_secs_f64(),
                settings.movement_rate,
                settings.pulse_width
            );
            let mut source = ColorSource::new(config.injection_order, rand::rng());
            run_injector(&pattern, running, config.sleep_rate, &mut source).map(|_| ())
        }
    };

    if is_running(running) {
        tracing::warn!("{} pattern worker stopped on its own", pattern.name());
    }

    // A render failure inside the worker is the root cause of any inject
    // error, so report what kill() says first.
    let status = pattern.kill()?;
    outcome?;

    tracing::info!(
        "Rendered {} frames, {} injections",
        status.frames_rendered,
        status.injections
    );
    Ok(status)
}
