//! Run configuration: hardware settings, pattern settings, and program choice.
//!
//! These are plain data types with defaults that match a common wiring:
//! a WS2812 (GRB) strip on GPIO 18 (PWM0), driven through DMA channel 10.
//! The CLI builds a `RunConfig` from flags; tests build them directly.

use crate::StripLayout;
use crate::error::ConfigError;
use clap::ValueEnum;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_FREQ_HZ: u32 = 800_000;
pub const DEFAULT_GPIO: i32 = 18;
pub const DEFAULT_DMA: u8 = 10;
pub const DEFAULT_BRIGHTNESS: u8 = 255;
pub const DEFAULT_MOVEMENT_RATE: f64 = 100.0;
pub const DEFAULT_PULSE_WIDTH: u32 = 10;
pub const DEFAULT_SLEEP_RATE: Duration = Duration::from_millis(500);

/// DMA channels at or above this are rejected.
pub const DMA_CHANNEL_LIMIT: u8 = 14;

/// Widest accepted pulse ramp. A whole pulse (two ramps) still fits a `u32`.
pub const MAX_PULSE_WIDTH: u32 = u32::MAX / 2;

// ── Strip type ───────────────────────────────────────────────────────

/// Color order (and white channel) of the LEDs on the strip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StripKind {
    Rgb,
    Rbg,
    /// WS2812 / SK6812RGB integrated chip+leds
    #[default]
    Grb,
    Gbr,
    Brg,
    Bgr,
    Rgbw,
    Grbw,
}

impl StripKind {
    /// True for SK6812 strips with a dedicated white LED.
    pub fn has_white(self) -> bool {
        matches!(self, StripKind::Rgbw | StripKind::Grbw)
    }
}

impl fmt::Display for StripKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StripKind::Rgb => "rgb",
            StripKind::Rbg => "rbg",
            StripKind::Grb => "grb",
            StripKind::Gbr => "gbr",
            StripKind::Brg => "brg",
            StripKind::Bgr => "bgr",
            StripKind::Rgbw => "rgbw",
            StripKind::Grbw => "grbw",
        };
        f.write_str(name)
    }
}

// ── Hardware ─────────────────────────────────────────────────────────

/// Settings handed to the driver library when the strip is initialized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HardwareConfig {
    pub freq_hz: u32,
    pub dma: u8,
    pub gpio: i32,
    pub invert: bool,
    /// Driver-side brightness, 0-255.
    pub brightness: u8,
    pub strip_kind: StripKind,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            freq_hz: DEFAULT_FREQ_HZ,
            dma: DEFAULT_DMA,
            gpio: DEFAULT_GPIO,
            invert: false,
            brightness: DEFAULT_BRIGHTNESS,
            strip_kind: StripKind::default(),
        }
    }
}

// ── Pattern settings ─────────────────────────────────────────────────

/// Which canned pattern to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Program {
    #[default]
    #[value(alias = "0")]
    Rainbow,
    #[value(alias = "1")]
    Pulse,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Program::Rainbow => f.write_str("rainbow"),
            Program::Pulse => f.write_str("pulse"),
        }
    }
}

/// Order in which the pulse program picks palette colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InjectionOrder {
    #[default]
    Sequential,
    Random,
}

/// Settings shared by every pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatternSettings {
    pub layout: StripLayout,
    /// Render a black frame when the pattern is killed.
    pub clear_on_exit: bool,
    /// Keep the last pulse color lit between pulses.
    pub maintain_color: bool,
    /// LED moves per second.
    pub movement_rate: f64,
    /// LEDs per ramp; a whole pulse spans twice this many.
    pub pulse_width: u32,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            layout: StripLayout::default(),
            clear_on_exit: false,
            maintain_color: false,
            movement_rate: DEFAULT_MOVEMENT_RATE,
            pulse_width: DEFAULT_PULSE_WIDTH,
        }
    }
}

impl PatternSettings {
    /// Time between two pulse frames.
    ///
    /// A rate too slow for a `Duration` gives `Duration::MAX`; `validate`
    /// rejects such rates.
    pub fn move_interval(&self) -> Duration {
        interval_for_rate(self.movement_rate).unwrap_or(Duration::MAX)
    }
}

// ── Whole run ────────────────────────────────────────────────────────

/// Everything `app::run` needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunConfig {
    pub hardware: HardwareConfig,
    pub settings: PatternSettings,
    pub program: Program,
    /// Pause between injected pulses.
    pub sleep_rate: Duration,
    pub injection_order: InjectionOrder,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            hardware: HardwareConfig::default(),
            settings: PatternSettings::default(),
            program: Program::default(),
            sleep_rate: DEFAULT_SLEEP_RATE,
            injection_order: InjectionOrder::default(),
        }
    }
}

impl RunConfig {
    /// Reject settings the strip or the animations cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hardware.dma >= DMA_CHANNEL_LIMIT {
            return Err(ConfigError::InvalidDma(self.hardware.dma));
        }
        let layout = self.settings.layout;
        if layout.width == 0 {
            return Err(ConfigError::InvalidWidth(layout.width));
        }
        if layout.height == 0 {
            return Err(ConfigError::InvalidHeight(layout.height));
        }
        let rate = self.settings.movement_rate;
        if interval_for_rate(rate).is_none() {
            return Err(ConfigError::InvalidMovementRate(rate));
        }
        let width = self.settings.pulse_width;
        if width == 0 || width > MAX_PULSE_WIDTH {
            return Err(ConfigError::InvalidPulseWidth(width));
        }
        Ok(())
    }
}

/// Parse a number of seconds into a `Duration`.
///
/// Used by the CLI for `--sleep-rate`. Negative, NaN and infinite values
/// are rejected.
pub fn parse_seconds(value: &str) -> Result<Duration, ConfigError> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSleepRate(f64::NAN))?;
    Duration::try_from_secs_f64(seconds).map_err(|_| ConfigError::InvalidSleepRate(seconds))
}

/// Parse a movement rate: a finite, positive number of moves per second
/// whose frame interval fits a `Duration`.
pub fn parse_movement_rate(value: &str) -> Result<f64, ConfigError> {
    let rate: f64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidMovementRate(f64::NAN))?;
    match interval_for_rate(rate) {
        Some(_) => Ok(rate),
        None => Err(ConfigError::InvalidMovementRate(rate)),
    }
}

fn interval_for_rate(rate: f64) -> Option<Duration> {
    if rate.is_finite() && rate > 0.0 {
        Duration::try_from_secs_f64(1.0 / rate).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn hardware_defaults_match_common_wiring() {
        let hw = HardwareConfig::default();
        assert_eq!(hw.freq_hz, 800_000);
        assert_eq!(hw.gpio, 18);
        assert_eq!(hw.dma, 10);
        assert_eq!(hw.brightness, 255);
        assert_eq!(hw.strip_kind, StripKind::Grb);
        assert!(!hw.invert);
    }

    #[test]
    fn default_run_config_is_valid() {
        assert_eq!(RunConfig::default().validate(), Ok(()));
    }

    #[test]
    fn default_run_config_runs_rainbow_every_half_second() {
        let config = RunConfig::default();
        assert_eq!(config.program, Program::Rainbow);
        assert_eq!(config.sleep_rate, Duration::from_millis(500));
    }

    #[test]
    fn dma_14_is_rejected() {
        let mut config = RunConfig::default();
        config.hardware.dma = 14;
        assert_eq!(config.validate(), Err(ConfigError::InvalidDma(14)));
        config.hardware.dma = 13;
        assert_eq!(config.validate(), Ok(()));
    }

    #[rstest]
    #[case(0, 1, ConfigError::InvalidWidth(0))]
    #[case(8, 0, ConfigError::InvalidHeight(0))]
    fn zero_dimensions_are_rejected(
        #[case] width: u32,
        #[case] height: u32,
        #[case] expected: ConfigError,
    ) {
        let mut config = RunConfig::default();
        config.settings.layout = StripLayout::new(width, height);
        assert_eq!(config.validate(), Err(expected));
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_PULSE_WIDTH + 1)]
    #[case(3_000_000_000)]
    fn out_of_range_pulse_width_is_rejected(#[case] width: u32) {
        let mut config = RunConfig::default();
        config.settings.pulse_width = width;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPulseWidth(width)));
    }

    #[test]
    fn widest_pulse_is_accepted() {
        let mut config = RunConfig::default();
        config.settings.pulse_width = MAX_PULSE_WIDTH;
        assert_eq!(config.validate(), Ok(()));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::INFINITY)]
    #[case(f64::NAN)]
    #[case(1e-30)]
    #[case(f64::MIN_POSITIVE / 4.0)]
    fn bad_movement_rate_is_rejected(#[case] rate: f64) {
        let mut config = RunConfig::default();
        config.settings.movement_rate = rate;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMovementRate(_))
        ));
    }

    #[test]
    fn move_interval_is_inverse_of_rate() {
        let settings = PatternSettings {
            movement_rate: 100.0,
            ..PatternSettings::default()
        };
        assert_eq!(settings.move_interval(), Duration::from_millis(10));
    }

    #[test]
    fn move_interval_saturates_for_unusable_rates() {
        let settings = PatternSettings {
            movement_rate: 1e-30,
            ..PatternSettings::default()
        };
        assert_eq!(settings.move_interval(), Duration::MAX);
    }

    #[rstest]
    #[case("0.5", Duration::from_millis(500))]
    #[case("2", Duration::from_secs(2))]
    #[case(" 0 ", Duration::ZERO)]
    fn test_parse_seconds(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_seconds(input), Ok(expected));
    }

    #[rstest]
    #[case("-1")]
    #[case("soon")]
    #[case("inf")]
    fn parse_seconds_rejects_garbage(#[case] input: &str) {
        assert!(parse_seconds(input).is_err());
    }

    #[test]
    fn parse_movement_rate_accepts_fractions() {
        assert_eq!(parse_movement_rate("12.5"), Ok(12.5));
        assert!(parse_movement_rate("0").is_err());
        assert!(parse_movement_rate("fast").is_err());
        assert_eq!(
            parse_movement_rate("1e-30"),
            Err(ConfigError::InvalidMovementRate(1e-30))
        );
    }

    #[test]
    fn only_sk6812_kinds_have_white() {
        assert!(StripKind::Rgbw.has_white());
        assert!(StripKind::Grbw.has_white());
        assert!(!StripKind::Grb.has_white());
    }

    #[test]
    fn program_display_names() {
        assert_eq!(Program::Rainbow.to_string(), "rainbow");
        assert_eq!(Program::Pulse.to_string(), "pulse");
    }
}
