//! Pattern lifecycle and the worker thread that renders frames.
//!
//! A pattern is an `Animation` (what each frame looks like) wrapped in a
//! `Pattern` handle (when frames get rendered). The handle exposes the
//! lifecycle the CLI drives:
//!
//! ```text
//! create ──load──▶ Paused ──start──▶ Running ──kill──▶ Stopped
//!                    ▲                  │
//!                    └──────pause───────┘        (render error ──▶ Failed)
//! ```
//!
//! ## Threading
//! `load` spawns one worker thread that owns the strip. The driver is not
//! thread-safe (and not `Send`), so the strip is built *on* the worker from
//! a factory closure. The handle talks to the worker with `PatternCommand`
//! values over a bounded `mpsc` channel, and reads progress from a shared
//! `Arc<Mutex<PatternStatus>>`. A due frame is rendered before the next
//! command is taken, so a flood of injections cannot starve the strip.
//!
//! ## Rust concepts
//! - Trait objects (`Box<dyn Animation>`) in place of a table of function pointers
//! - `recv_timeout()` to wait for commands *or* the next frame deadline
//! - `JoinHandle<Result<..>>` to carry the worker's error back to `kill`

use crate::Color;
use crate::config::{PatternSettings, Program};
use crate::error::{PatternError, StripError};
use crate::pulse::Pulse;
use crate::rainbow::Rainbow;
use crate::strip::LedStrip;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Commands that may wait for the worker before `inject` starts dropping.
pub const COMMAND_QUEUE: usize = 64;

// ── Animation ────────────────────────────────────────────────────────

/// A color pushed into a running pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Injection {
    pub color: Color,
    /// Peak brightness, 0-100.
    pub strength: u8,
}

impl Injection {
    pub fn new(color: Color, strength: u8) -> Self {
        Self {
            color,
            strength: strength.min(100),
        }
    }
}

/// Per-frame color computation for a pattern.
///
/// Implementations run on the worker thread, so they must be `Send`.
pub trait Animation: Send + 'static {
    fn name(&self) -> &'static str;

    /// Time between two rendered frames.
    fn frame_interval(&self) -> Duration;

    /// Compute the next frame in place. `frame` keeps the previous frame's
    /// colors, so shifting animations can build on them.
    fn step(&mut self, frame: &mut [Color]);

    /// Accept an injected color. Patterns that have no use for it ignore it.
    fn inject(&mut self, injection: Injection) {
        tracing::debug!(
            "{} pattern ignores injected color {:06X}",
            self.name(),
            injection.color.to_packed()
        );
    }
}

// ── Commands and status ──────────────────────────────────────────────

/// Commands sent from the handle to the worker thread.
#[derive(Debug)]
pub enum PatternCommand {
    Start,
    Pause,
    Inject(Injection),
    Stop,
}

/// Where a pattern is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternState {
    Created,
    Paused,
    Running,
    Stopped,
    Failed,
}

/// Progress shared between the worker (writes) and the handle (reads).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternStatus {
    pub state: PatternState,
    pub frames_rendered: u64,
    pub injections: u64,
}

impl PatternStatus {
    pub fn new() -> Self {
        Self {
            state: PatternState::Created,
            frames_rendered: 0,
            injections: 0,
        }
    }
}

impl Default for PatternStatus {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_status(status: &Mutex<PatternStatus>) -> MutexGuard<'_, PatternStatus> {
    status.lock().unwrap_or_else(|e| e.into_inner())
}

// ── Pattern handle ───────────────────────────────────────────────────

struct Worker {
    command_tx: SyncSender<PatternCommand>,
    handle: JoinHandle<Result<(), StripError>>,
}

/// A pattern and (once loaded) the worker thread rendering it.
pub struct Pattern {
    name: &'static str,
    settings: PatternSettings,
    animation: Option<Box<dyn Animation>>,
    status: Arc<Mutex<PatternStatus>>,
    worker: Option<Worker>,
}

impl Pattern {
    pub fn new(animation: impl Animation, settings: PatternSettings) -> Self {
        Self {
            name: animation.name(),
            settings,
            animation: Some(Box::new(animation)),
            status: Arc::new(Mutex::new(PatternStatus::new())),
            worker: None,
        }
    }

    /// Create the canned pattern for `program`.
    pub fn create(program: Program, settings: PatternSettings) -> Self {
        tracing::trace!("Creating {} pattern", program);
        match program {
            Program::Rainbow => Self::new(Rainbow::new(settings.layout), settings),
            Program::Pulse => Self::new(Pulse::new(&settings), settings),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn settings(&self) -> &PatternSettings {
        &self.settings
    }

    /// Spawn the worker thread and initialize the strip on it.
    ///
    /// Returns once the strip is ready (or failed to initialize). The
    /// pattern starts out paused.
    pub fn load<S, F>(&mut self, make_strip: F) -> Result<(), PatternError>
    where
        S: LedStrip,
        F: FnOnce() -> Result<S, StripError> + Send + 'static,
    {
        tracing::trace!("{}: load", self.name);
        let animation = match (&self.worker, self.animation.take()) {
            (None, Some(animation)) => animation,
            (_, animation) => {
                self.animation = animation;
                return Err(PatternError::AlreadyLoaded(self.name));
            }
        };

        let (command_tx, command_rx) = mpsc::sync_channel(COMMAND_QUEUE);
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let status = self.status.clone();
        let clear_on_exit = self.settings.clear_on_exit;

        let handle = thread::Builder::new()
            .name(format!("pattern-{}", self.name))
            .spawn(move || {
                let mut strip = match make_strip() {
                    Ok(strip) => strip,
                    Err(e) => {
                        lock_status(&status).state = PatternState::Failed;
                        let _ = ready_tx.send(Err(e.clone()));
                        return Err(e);
                    }
                };
                lock_status(&status).state = PatternState::Paused;
                let _ = ready_tx.send(Ok(()));
                run_worker(&mut strip, animation, command_rx, status, clear_on_exit)
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e.into());
            }
            Err(_) => {
                // The sender was dropped without a word: the factory panicked.
                let _ = handle.join();
                lock_status(&self.status).state = PatternState::Failed;
                return Err(PatternError::WorkerPanicked(self.name));
            }
        }

        self.worker = Some(Worker { command_tx, handle });
        tracing::info!("{} pattern loop is now running", self.name);
        Ok(())
    }

    /// Begin (or resume) rendering frames.
    pub fn start(&self) -> Result<(), PatternError> {
        tracing::trace!("{}: start", self.name);
        self.send(PatternCommand::Start)
    }

    /// Stop rendering frames. The strip keeps showing the last frame.
    pub fn pause(&self) -> Result<(), PatternError> {
        tracing::trace!("{}: pause", self.name);
        self.send(PatternCommand::Pause)
    }

    /// Hand a color to the animation.
    ///
    /// Never blocks. Returns `PatternError::Busy` and drops the color when
    /// `COMMAND_QUEUE` commands are already waiting.
    pub fn inject(&self, color: Color, strength: u8) -> Result<(), PatternError> {
        let worker = self
            .worker
            .as_ref()
            .ok_or(PatternError::NotLoaded(self.name))?;
        let command = PatternCommand::Inject(Injection::new(color, strength));
        match worker.command_tx.try_send(command) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PatternError::Busy(self.name)),
            Err(TrySendError::Disconnected(_)) => Err(PatternError::WorkerGone(self.name)),
        }
    }

    /// True while the worker thread is alive. Goes false after a fatal
    /// render error.
    pub fn is_alive(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Snapshot of the worker's progress.
    pub fn status(&self) -> PatternStatus {
        lock_status(&self.status).clone()
    }

    /// Stop the worker, wait for it to exit, and return the final status.
    ///
    /// If the worker died on a render error, that error is returned here.
    pub fn kill(mut self) -> Result<PatternStatus, PatternError> {
        tracing::trace!("{}: kill", self.name);
        let Some(worker) = self.worker.take() else {
            return Err(PatternError::NotLoaded(self.name));
        };

        tracing::debug!("{} pattern loop: stopping run", self.name);
        // Fails only if the worker already exited; join tells us why.
        let _ = worker.command_tx.send(PatternCommand::Stop);

        tracing::debug!("{} pattern loop: waiting for worker thread to end", self.name);
        match worker.handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(PatternError::WorkerPanicked(self.name)),
        }

        tracing::info!("{} pattern loop: now stopped", self.name);
        Ok(self.status())
    }

    fn send(&self, command: PatternCommand) -> Result<(), PatternError> {
        let worker = self
            .worker
            .as_ref()
            .ok_or(PatternError::NotLoaded(self.name))?;
        worker
            .command_tx
            .send(command)
            .map_err(|_| PatternError::WorkerGone(self.name))
    }
}

impl Drop for Pattern {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            // Disconnecting the channel makes the worker leave its loop.
            drop(worker.command_tx);
            if worker.handle.join().is_err() {
                tracing::warn!("{} pattern worker panicked during shutdown", self.name);
            }
        }
    }
}

// ── Worker loop ──────────────────────────────────────────────────────

/// Body of the worker thread. Runs until `Stop`, channel disconnect, or a
/// render error.
///
/// While paused it blocks on the channel. While running it renders any
/// frame that is due, then waits for a command only until the next
/// deadline. At most one command is handled between two due frames.
fn run_worker<S: LedStrip>(
    strip: &mut S,
    mut animation: Box<dyn Animation>,
    command_rx: Receiver<PatternCommand>,
    status: Arc<Mutex<PatternStatus>>,
    clear_on_exit: bool,
) -> Result<(), StripError> {
    let name = animation.name();
    let interval = animation.frame_interval();
    let mut frame = vec![Color::BLACK; strip.len()];
    let mut paused = true;
    // `None` once the next deadline is past what `Instant` can hold.
    let mut next_frame = Some(Instant::now());

    loop {
        let due = next_frame.filter(|due| !paused && *due <= Instant::now());
        if let Some(due) = due {
            animation.step(&mut frame);
            if let Err(e) = strip.render(&frame) {
                tracing::error!("{name} pattern: {e}");
                lock_status(&status).state = PatternState::Failed;
                return Err(e);
            }
            let frames = {
                let mut s = lock_status(&status);
                s.frames_rendered += 1;
                s.frames_rendered
            };
            tracing::trace!("{name} pattern: rendered frame {frames}");

            // Skip missed deadlines rather than rendering a burst.
            next_frame = due.checked_add(interval).map(|next| next.max(Instant::now()));
        }

        let command = match next_frame {
            Some(due) if !paused => {
                let wait = due.saturating_duration_since(Instant::now());
                match command_rx.recv_timeout(wait) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            _ => match command_rx.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        match command {
            PatternCommand::Start => {
                if paused {
                    paused = false;
                    next_frame = Some(Instant::now());
                    lock_status(&status).state = PatternState::Running;
                    tracing::debug!("{name} pattern started");
                }
            }
            PatternCommand::Pause => {
                paused = true;
                lock_status(&status).state = PatternState::Paused;
                tracing::debug!("{name} pattern paused");
            }
            PatternCommand::Inject(injection) => {
                animation.inject(injection);
                lock_status(&status).injections += 1;
            }
            PatternCommand::Stop => break,
        }
    }

    if clear_on_exit {
        tracing::info!("{name} pattern loop: clearing strip");
        if let Err(e) = strip.clear() {
            tracing::error!("{name} pattern: {e}");
            lock_status(&status).state = PatternState::Failed;
            return Err(e);
        }
    }

    lock_status(&status).state = PatternState::Stopped;
    Ok(())
}
