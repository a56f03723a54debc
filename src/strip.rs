//! The LED strip contract: initialize, render, finalize.
//!
//! The real work of driving a WS281x chain (DMA descriptors, PWM timing,
//! pin muxing) belongs to the driver library. Patterns only ever see this
//! trait:
//! - **initialize**: constructing the strip value (`Ws281xStrip::new`, ...)
//! - **render**: push one full frame of colors out to the LEDs
//! - **finalize**: `Drop`
//!
//! `RecordingStrip` keeps every frame in memory instead, so animations and
//! the worker thread can be exercised on a laptop.

use crate::Color;
use crate::error::StripError;
use std::sync::{Arc, Mutex, MutexGuard};

/// Something that can display a frame of LED colors.
pub trait LedStrip {
    /// Number of LEDs on the strip.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Show `frame` on the strip. Blocks until the driver accepted it.
    ///
    /// Colors past the end of the strip are ignored. A short frame leaves
    /// the remaining LEDs as they were.
    fn render(&mut self, frame: &[Color]) -> Result<(), StripError>;

    /// Turn every LED off.
    fn clear(&mut self) -> Result<(), StripError> {
        let black = vec![Color::BLACK; self.len()];
        self.render(&black)
    }
}

// ── Recording strip ──────────────────────────────────────────────────

/// Shared list of frames rendered by a `RecordingStrip`.
///
/// The strip lives on the worker thread, so the log is shared through an
/// `Arc<Mutex<_>>` and read from the test (or main) thread.
#[derive(Clone, Default)]
pub struct FrameLog {
    frames: Arc<Mutex<Vec<Vec<Color>>>>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<Color>>> {
        // A panicking renderer must not hide the frames it already pushed.
        self.frames.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every frame rendered so far.
    pub fn frames(&self) -> Vec<Vec<Color>> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Vec<Color>> {
        self.lock().last().cloned()
    }

    fn push(&self, frame: Vec<Color>) {
        self.lock().push(frame);
    }
}

/// In-memory strip that records every rendered frame.
///
/// Each logged frame is what the whole strip shows after the render,
/// tail included.
pub struct RecordingStrip {
    shown: Vec<Color>,
    log: FrameLog,
    fail_after: Option<usize>,
    rendered: usize,
}

impl RecordingStrip {
    pub fn new(led_count: usize, log: FrameLog) -> Self {
        Self {
            shown: vec![Color::BLACK; led_count],
            log,
            fail_after: None,
            rendered: 0,
        }
    }

    /// Make `render` fail once `renders` frames have gone through.
    pub fn fail_after(mut self, renders: usize) -> Self {
        self.fail_after = Some(renders);
        self
    }
}

impl LedStrip for RecordingStrip {
    fn len(&self) -> usize {
        self.shown.len()
    }

    fn render(&mut self, frame: &[Color]) -> Result<(), StripError> {
        if self.fail_after.is_some_and(|limit| self.rendered >= limit) {
            return Err(StripError::Render("simulated render failure".into()));
        }
        let n = frame.len().min(self.shown.len());
        self.shown[..n].copy_from_slice(&frame[..n]);
        self.log.push(self.shown.clone());
        self.rendered += 1;
        Ok(())
    }
}
