//! Shared building blocks for the LED strip pattern runner.
//!
//! This module provides the pieces every other module leans on:
//! - Strip layout (width x height mapped onto one LED chain)
//! - Our own `Color` type and the dot-color palette
//! - Signal handling for clean shutdown
//!
//! The pattern machinery lives in submodules: `pattern` holds the
//! polymorphic interface and the worker thread, `rainbow` and `pulse` are
//! the two animations, `injector` feeds colors into the pulse, and `app`
//! wires it all together for the binary.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod injector;
pub mod pattern;
pub mod pulse;
pub mod rainbow;
pub mod strip;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Strip layout ───────────────────────────────────────────────────

/// How the LEDs of a single chain are arranged.
///
/// A plain strip is `width x 1`. Taller layouts are treated as rows laid
/// end to end, so `(x, y)` lives at `y * width + x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripLayout {
    pub width: u32,
    pub height: u32,
}

impl StripLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of LEDs on the chain.
    pub fn led_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Index into the LED chain for column `x`, row `y`.
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl Default for StripLayout {
    fn default() -> Self {
        Self {
            width: 300,
            height: 1,
        }
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// Our own color type, decoupled from the hardware crate.
///
/// This lets us test animation math anywhere, without `rs_ws281x`.
/// At the hardware boundary, we convert via `Into<[u8; 4]>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from a `0x00RRGGBB` word. The top byte is ignored.
    pub const fn from_packed(word: u32) -> Self {
        Self {
            r: ((word >> 16) & 0xFF) as u8,
            g: ((word >> 8) & 0xFF) as u8,
            b: (word & 0xFF) as u8,
        }
    }

    /// The `0x00RRGGBB` word for this color.
    pub const fn to_packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Create a color from a hue value (0-360), with full saturation and brightness.
    ///
    /// # Rust concept: match expressions
    /// Rust's `match` is exhaustive, so the compiler ensures we handle all cases.
    pub fn from_hue(hue: u16) -> Self {
        let hue = hue % 360;
        let sector = hue / 60;
        let fraction = ((hue % 60) as f32) / 60.0;
        let rising = (fraction * 255.0) as u8;
        let falling = ((1.0 - fraction) * 255.0) as u8;

        match sector {
            0 => Self::new(255, rising, 0),  // Red → Yellow
            1 => Self::new(falling, 255, 0), // Yellow → Green
            2 => Self::new(0, 255, rising),  // Green → Cyan
            3 => Self::new(0, falling, 255), // Cyan → Blue
            4 => Self::new(rising, 0, 255),  // Blue → Magenta
            5 => Self::new(255, 0, falling), // Magenta → Red
            _ => Self::new(255, 0, 0),       // Unreachable, but Rust requires exhaustiveness
        }
    }

    /// Apply brightness scaling (0-100) to this color.
    pub fn apply_brightness(self, brightness: u8) -> Self {
        if brightness >= 100 {
            return self;
        }
        Self {
            r: ((self.r as u16 * brightness as u16) / 100) as u8,
            g: ((self.g as u16 * brightness as u16) / 100) as u8,
            b: ((self.b as u16 * brightness as u16) / 100) as u8,
        }
    }

    /// Multiply every channel by `level`, truncating toward zero.
    ///
    /// `level` is clamped to `0.0..=1.0`; NaN counts as zero.
    pub fn scale(self, level: f64) -> Self {
        let level = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 1.0)
        };
        Self {
            r: (self.r as f64 * level) as u8,
            g: (self.g as f64 * level) as u8,
            b: (self.b as f64 * level) as u8,
        }
    }
}

/// Convert our Color to the driver's raw LED word at the boundary.
///
/// `rs_ws281x` stores each LED as a little-endian `0xWWRRGGBB` word, so the
/// bytes come out as `[b, g, r, w]`. The strip type configured on the channel
/// takes care of the wire order.
impl From<Color> for [u8; 4] {
    fn from(c: Color) -> Self {
        [c.b, c.g, c.r, 0]
    }
}

// ── Palette ────────────────────────────────────────────────────────

/// The eight dot colors the pulse program cycles through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamedColor {
    Red,
    Orange,
    Yellow,
    Green,
    LightBlue,
    Blue,
    Purple,
    Pink,
}

impl NamedColor {
    pub const ALL: [NamedColor; 8] = [
        NamedColor::Red,
        NamedColor::Orange,
        NamedColor::Yellow,
        NamedColor::Green,
        NamedColor::LightBlue,
        NamedColor::Blue,
        NamedColor::Purple,
        NamedColor::Pink,
    ];

    pub const fn color(self) -> Color {
        match self {
            NamedColor::Red => Color::from_packed(0x00FF_0000),
            NamedColor::Orange => Color::from_packed(0x00FF_8000),
            NamedColor::Yellow => Color::from_packed(0x00FF_FF00),
            NamedColor::Green => Color::from_packed(0x0000_FF00),
            NamedColor::LightBlue => Color::from_packed(0x0000_FFFF),
            NamedColor::Blue => Color::from_packed(0x0000_00FF),
            NamedColor::Purple => Color::from_packed(0x00FF_00FF),
            NamedColor::Pink => Color::from_packed(0x00FF_0080),
        }
    }
}

/// The palette as plain colors, in `NamedColor::ALL` order.
pub const PALETTE: [Color; 8] = [
    NamedColor::Red.color(),
    NamedColor::Orange.color(),
    NamedColor::Yellow.color(),
    NamedColor::Green.color(),
    NamedColor::LightBlue.color(),
    NamedColor::Blue.color(),
    NamedColor::Purple.color(),
    NamedColor::Pink.color(),
];

// ── Signal handling ────────────────────────────────────────────────

/// Set up a handler for Ctrl+C and SIGTERM that sets `running` to false.
///
/// # Rust concept: Arc and AtomicBool
/// We need to share the `running` flag between the main loop and the
/// signal handler. `Arc` lets multiple owners share data, and `AtomicBool`
/// is a thread-safe boolean with no mutex needed for a single bool.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        tracing::info!("Shutdown signal received");
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    // ── StripLayout tests ──────────────────────────────────────────

    #[test]
    fn layout_default_is_300x1() {
        let layout = StripLayout::default();
        assert_eq!(layout.width, 300);
        assert_eq!(layout.height, 1);
        assert_eq!(layout.led_count(), 300);
    }

    #[rstest]
    #[case(300, 1, 300)]
    #[case(8, 8, 64)]
    #[case(32, 4, 128)]
    fn test_led_count(#[case] width: u32, #[case] height: u32, #[case] expected: usize) {
        assert_eq!(StripLayout::new(width, height).led_count(), expected);
    }

    #[test]
    fn index_is_row_major() {
        let layout = StripLayout::new(8, 4);
        assert_eq!(layout.index(0, 0), 0);
        assert_eq!(layout.index(7, 0), 7);
        assert_eq!(layout.index(0, 1), 8);
        assert_eq!(layout.index(3, 2), 19);
    }

    // ── Color tests ────────────────────────────────────────────────

    #[rstest]
    #[case(0, 255, 0, 0)] // Red
    #[case(60, 255, 255, 0)] // Yellow
    #[case(120, 0, 255, 0)] // Green
    #[case(180, 0, 255, 255)] // Cyan
    #[case(240, 0, 0, 255)] // Blue
    #[case(300, 255, 0, 255)] // Magenta
    fn test_color_from_hue_primary(#[case] hue: u16, #[case] r: u8, #[case] g: u8, #[case] b: u8) {
        assert_eq!(Color::from_hue(hue), Color::new(r, g, b));
    }

    #[test]
    fn color_from_hue_wraps_at_360() {
        assert_eq!(Color::from_hue(0), Color::from_hue(360));
        assert_eq!(Color::from_hue(90), Color::from_hue(450));
    }

    #[test]
    fn packed_words_split_into_channels() {
        assert_eq!(Color::from_packed(0x00FF_8000), Color::new(255, 128, 0));
        assert_eq!(Color::new(0x12, 0x34, 0x56).to_packed(), 0x0012_3456);
    }

    #[test]
    fn from_packed_ignores_white_byte() {
        assert_eq!(Color::from_packed(0xAB00_00FF), Color::new(0, 0, 255));
    }

    #[test]
    fn apply_brightness_100_is_identity() {
        let c = Color::new(100, 200, 50);
        assert_eq!(c.apply_brightness(100), c);
    }

    #[test]
    fn apply_brightness_0_is_black() {
        assert_eq!(Color::new(255, 255, 255).apply_brightness(0), Color::BLACK);
    }

    #[test]
    fn apply_brightness_50_halves() {
        assert_eq!(
            Color::new(200, 100, 50).apply_brightness(50),
            Color::new(100, 50, 25)
        );
    }

    #[rstest]
    #[case(1.0, Color::new(255, 128, 64))]
    #[case(0.5, Color::new(127, 64, 32))]
    #[case(0.0, Color::BLACK)]
    #[case(2.0, Color::new(255, 128, 64))]
    #[case(-1.0, Color::BLACK)]
    #[case(f64::NAN, Color::BLACK)]
    fn test_scale(#[case] level: f64, #[case] expected: Color) {
        assert_eq!(Color::new(255, 128, 64).scale(level), expected);
    }

    #[test]
    fn raw_word_is_bgrw() {
        let raw: [u8; 4] = Color::new(1, 2, 3).into();
        assert_eq!(raw, [3, 2, 1, 0]);
    }

    // ── Palette tests ──────────────────────────────────────────────

    #[test]
    fn palette_matches_named_colors() {
        for (named, color) in NamedColor::ALL.iter().zip(PALETTE) {
            assert_eq!(named.color(), color);
        }
    }

    #[test]
    fn palette_starts_red_and_ends_pink() {
        assert_eq!(PALETTE[0], Color::new(255, 0, 0));
        assert_eq!(PALETTE[7], Color::new(255, 0, 128));
    }

    // ── Signal flag tests ──────────────────────────────────────────

    #[test]
    fn is_running_reads_flag() {
        let flag = AtomicBool::new(true);
        assert!(is_running(&flag));
        flag.store(false, Ordering::SeqCst);
        assert!(!is_running(&flag));
    }
}
