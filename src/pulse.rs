//! Pulse pattern: injected colors travel down the strip as soft pulses.
//!
//! Every frame moves each LED's color one position along the strip and
//! feeds a new color in at the head (LED 0). An injected color becomes a
//! pulse: the head ramps up to the color over `pulse_width` frames and back
//! down over another `pulse_width`, so each pulse covers `2 * pulse_width`
//! LEDs as it moves.
//!
//! Injections that arrive while a pulse is still entering wait in a queue
//! and follow it back to back.

use crate::Color;
use crate::config::PatternSettings;
use crate::pattern::{Animation, Injection};
use std::collections::VecDeque;
use std::time::Duration;

/// Injections beyond this many waiting pulses push out the oldest one.
pub const MAX_QUEUED_PULSES: usize = 64;

struct ActivePulse {
    injection: Injection,
    step: u64,
}

pub struct Pulse {
    width: u32,
    maintain_color: bool,
    interval: Duration,
    queue: VecDeque<Injection>,
    active: Option<ActivePulse>,
    /// Peak color of the last finished pulse, shown between pulses when
    /// `maintain_color` is set.
    held: Option<Color>,
    /// Pulses pushed out since the queue last had room.
    dropped: u64,
}

/// Brightness level of a pulse of `width` at `step` (0-based).
///
/// Ramps `1/w, 2/w, .. 1.0` then back down `(w-1)/w, .. 0.0`.
pub fn ramp_level(width: u32, step: u64) -> f64 {
    let width = u64::from(width.max(1));
    let rung = if step < width {
        step + 1
    } else {
        (2 * width).saturating_sub(step.saturating_add(1))
    };
    rung as f64 / width as f64
}

impl Pulse {
    pub fn new(settings: &PatternSettings) -> Self {
        Self {
            width: settings.pulse_width.max(1),
            maintain_color: settings.maintain_color,
            interval: settings.move_interval(),
            queue: VecDeque::new(),
            active: None,
            held: None,
            dropped: 0,
        }
    }

    /// Pulses waiting behind the one currently entering the strip.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// True while a pulse is entering the strip.
    pub fn is_pulsing(&self) -> bool {
        self.active.is_some()
    }

    /// Color for LED 0 this frame.
    fn next_head(&mut self) -> Color {
        if self.active.is_none() {
            self.active = self
                .queue
                .pop_front()
                .map(|injection| ActivePulse { injection, step: 0 });
        }

        let width = u64::from(self.width);
        let Some(pulse) = self.active.as_mut() else {
            return match (self.maintain_color, self.held) {
                (true, Some(color)) => color,
                _ => Color::BLACK,
            };
        };

        let Injection { color, strength } = pulse.injection;
        let head = color
            .scale(ramp_level(self.width, pulse.step))
            .apply_brightness(strength);
        pulse.step += 1;

        if pulse.step >= 2 * width {
            self.held = Some(color.apply_brightness(strength));
            self.active = None;
        }
        head
    }
}

impl Animation for Pulse {
    fn name(&self) -> &'static str {
        "pulse"
    }

    fn frame_interval(&self) -> Duration {
        self.interval
    }

    fn step(&mut self, frame: &mut [Color]) {
        let len = frame.len();
        if len == 0 {
            return;
        }
        let head = self.next_head();
        frame.copy_within(0..len - 1, 1);
        frame[0] = head;
    }

    fn inject(&mut self, injection: Injection) {
        if self.queue.len() >= MAX_QUEUED_PULSES {
            // Warn once per overflow; a zero sleep rate overflows every frame.
            if self.dropped == 0 {
                tracing::warn!(
                    "Pulse queue full ({} waiting), dropping oldest pulses",
                    self.queue.len()
                );
            }
            self.dropped += 1;
            self.queue.pop_front();
        } else if self.dropped > 0 {
            tracing::debug!("Pulse queue has room again, {} pulses dropped", self.dropped);
            self.dropped = 0;
        }
        tracing::debug!(
            "Queued pulse {:06X} at {}%",
            injection.color.to_packed(),
            injection.strength
        );
        self.queue.push_back(injection);
    }
}
