//! Rainbow pattern: the whole hue wheel spread across each row.
//!
//! Every row shows one full trip around the hue wheel from left to right.
//! Each row starts a little further round than the one below it, and the
//! whole picture drifts a few degrees per frame.

use crate::pattern::Animation;
use crate::{Color, StripLayout};
use std::time::Duration;

pub const FRAMES_PER_SECOND: u32 = 15;

/// Degrees the rainbow drifts each frame.
const HUE_STEP: usize = 3;
/// Degrees between the start of one row and the next.
const ROW_HUE_STEP: usize = 30;

pub struct Rainbow {
    layout: StripLayout,
    offset: usize,
}

impl Rainbow {
    pub fn new(layout: StripLayout) -> Self {
        Self { layout, offset: 0 }
    }

    /// Hue (0-359) of the LED at chain index `index` for the current frame.
    fn hue_at(&self, index: usize) -> u16 {
        let width = self.layout.width.max(1) as usize;
        let x = index % width;
        let y = index / width;
        ((x * 360 / width + y * ROW_HUE_STEP + self.offset) % 360) as u16
    }
}

impl Animation for Rainbow {
    fn name(&self) -> &'static str {
        "rainbow"
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / FRAMES_PER_SECOND
    }

    fn step(&mut self, frame: &mut [Color]) {
        for (i, led) in frame.iter_mut().enumerate() {
            *led = Color::from_hue(self.hue_at(i));
        }
        self.offset = (self.offset + HUE_STEP) % 360;
    }
}
