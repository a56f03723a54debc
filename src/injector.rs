//! Feeds palette colors into a running pattern at a steady pace.
//!
//! This is the main-thread half of the pulse program: every `sleep_rate`
//! it picks the next palette color (in order or at random), gives it a
//! random strength, and injects it.

use crate::config::InjectionOrder;
use crate::error::PatternError;
use crate::pattern::{Injection, Pattern};
use crate::{PALETTE, is_running};
use rand::Rng;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::{Duration, Instant};

/// How often a sleeping injector checks the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Endless supply of palette injections.
pub struct ColorSource<R> {
    order: InjectionOrder,
    next: usize,
    rng: R,
}

impl<R: Rng> ColorSource<R> {
    pub fn new(order: InjectionOrder, rng: R) -> Self {
        Self { order, next: 0, rng }
    }

    pub fn next_injection(&mut self) -> Injection {
        let color = match self.order {
            InjectionOrder::Sequential => {
                let color = PALETTE[self.next];
                self.next = (self.next + 1) % PALETTE.len();
                color
            }
            InjectionOrder::Random => PALETTE[self.rng.random_range(0..PALETTE.len())],
        };
        Injection::new(color, self.rng.random_range(0..100))
    }
}

impl<R: Rng> Iterator for ColorSource<R> {
    type Item = Injection;

    fn next(&mut self) -> Option<Injection> {
        Some(self.next_injection())
    }
}

/// Sleep for `duration`, waking early once `running` goes false.
pub fn sleep_while_running(running: &AtomicBool, duration: Duration) {
    // A deadline past what `Instant` can hold means "until shutdown".
    let deadline = Instant::now().checked_add(duration);
    while is_running(running) {
        let left = deadline.map_or(POLL_INTERVAL, |d| d.saturating_duration_since(Instant::now()));
        if left.is_zero() {
            break;
        }
        thread::sleep(left.min(POLL_INTERVAL));
    }
}

/// Inject colors until shutdown or until the pattern's worker dies.
///
/// Returns how many colors were injected.
pub fn run_injector<R: Rng>(
    pattern: &Pattern,
    running: &AtomicBool,
    sleep_rate: Duration,
    source: &mut ColorSource<R>,
) -> Result<u64, PatternError> {
    let mut injected = 0;

    while is_running(running) && pattern.is_alive() {
        let Injection { color, strength } = source.next_injection();
        match pattern.inject(color, strength) {
            Ok(()) => {
                injected += 1;
                tracing::trace!("Injected {:06X} at {}%", color.to_packed(), strength);
            }
            Err(PatternError::Busy(_)) => {
                tracing::trace!("Worker busy, dropped {:06X}", color.to_packed());
            }
            Err(e) => return Err(e),
        }

        if sleep_rate.is_zero() {
            thread::yield_now();
        } else {
            sleep_while_running(running, sleep_rate);
        }
    }

    tracing::debug!("Injector stopped after {} colors", injected);
    Ok(injected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use crate::config::PatternSettings;
    use crate::pulse::Pulse;
    use crate::strip::{FrameLog, RecordingStrip};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn sequential_order_cycles_the_palette() {
        let source = ColorSource::new(InjectionOrder::Sequential, seeded());
        let colors: Vec<Color> = source.take(10).map(|i| i.color).collect();

        let mut expected = PALETTE.to_vec();
        expected.extend_from_slice(&PALETTE[..2]);
        assert_eq!(colors, expected);
    }

    #[test]
    fn random_order_stays_in_palette() {
        let source = ColorSource::new(InjectionOrder::Random, seeded());
        for injection in source.take(200) {
            assert!(PALETTE.contains(&injection.color));
        }
    }

    #[test]
    fn strengths_are_below_100() {
        let source = ColorSource::new(InjectionOrder::Sequential, seeded());
        assert!(source.take(500).all(|i| i.strength < 100));
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let a: Vec<Injection> = ColorSource::new(InjectionOrder::Random, seeded())
            .take(20)
            .collect();
        let b: Vec<Injection> = ColorSource::new(InjectionOrder::Random, seeded())
            .take(20)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn sleep_returns_at_once_when_not_running() {
        let running = AtomicBool::new(false);
        let start = Instant::now();
        sleep_while_running(&running, Duration::from_secs(10));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn endless_sleep_ends_on_shutdown() {
        let running = Arc::new(AtomicBool::new(true));
        let stopper = {
            let running = running.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                running.store(false, Ordering::SeqCst);
            })
        };
        let start = Instant::now();
        sleep_while_running(&running, Duration::MAX);
        stopper.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn sleep_lasts_the_full_duration_while_running() {
        let running = AtomicBool::new(true);
        let start = Instant::now();
        sleep_while_running(&running, Duration::from_millis(30));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn injector_does_nothing_once_stopped() {
        let log = FrameLog::new();
        let strip_log = log.clone();
        let mut pattern = Pattern::new(
            Pulse::new(&PatternSettings::default()),
            PatternSettings::default(),
        );
        pattern
            .load(move || Ok(RecordingStrip::new(8, strip_log)))
            .unwrap();

        let running = AtomicBool::new(false);
        let mut source = ColorSource::new(InjectionOrder::Sequential, seeded());
        let injected =
            run_injector(&pattern, &running, Duration::from_millis(1), &mut source).unwrap();

        assert_eq!(injected, 0);
        pattern.kill().unwrap();
    }

    #[test]
    fn injector_feeds_pattern_until_shutdown() {
        let log = FrameLog::new();
        let strip_log = log.clone();
        let settings = PatternSettings {
            movement_rate: 1000.0,
            pulse_width: 1,
            ..PatternSettings::default()
        };
        let mut pattern = Pattern::new(Pulse::new(&settings), settings);
        pattern
            .load(move || Ok(RecordingStrip::new(8, strip_log)))
            .unwrap();
        pattern.start().unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let stopper = {
            let running = running.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(40));
                running.store(false, Ordering::SeqCst);
            })
        };

        let mut source = ColorSource::new(InjectionOrder::Sequential, seeded());
        let injected =
            run_injector(&pattern, &running, Duration::from_millis(5), &mut source).unwrap();
        stopper.join().unwrap();

        assert!(injected > 0);
        let status = pattern.kill().unwrap();
        assert_eq!(status.injections, injected);
        assert!(status.frames_rendered > 0);
    }

    #[test]
    fn zero_sleep_rate_still_lets_frames_through() {
        let log = FrameLog::new();
        let strip_log = log.clone();
        let settings = PatternSettings {
            movement_rate: 1000.0,
            ..PatternSettings::default()
        };
        let mut pattern = Pattern::new(Pulse::new(&settings), settings);
        pattern
            .load(move || Ok(RecordingStrip::new(300, strip_log)))
            .unwrap();
        pattern.start().unwrap();

        let running = Arc::new(AtomicBool::new(true));
        let stopper = {
            let running = running.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                running.store(false, Ordering::SeqCst);
            })
        };

        let mut source = ColorSource::new(InjectionOrder::Random, seeded());
        let injected = run_injector(&pattern, &running, Duration::ZERO, &mut source).unwrap();
        stopper.join().unwrap();

        let stopping = Instant::now();
        let status = pattern.kill().unwrap();
        assert!(stopping.elapsed() < Duration::from_secs(1));
        assert!(status.frames_rendered > 0);
        assert!(!log.is_empty());
        assert_eq!(status.injections, injected);
    }
}
