//! Command-line flags.
//!
//! Short options follow the classic rpi_ws281x test program (`-s`, `-x`,
//! `-y`, `-d`, `-g`, `-i`, `-c`, `-v`), plus the pattern flags (`-p`, `-m`,
//! `-M`, `-S`, `-P`). Hardware flags can also come from `LED_STRIP_*`
//! environment variables, which is handy under systemd.

use crate::StripLayout;
use crate::config::{
    DEFAULT_BRIGHTNESS, DEFAULT_DMA, DEFAULT_FREQ_HZ, DEFAULT_GPIO, DEFAULT_MOVEMENT_RATE,
    DEFAULT_PULSE_WIDTH, DMA_CHANNEL_LIMIT, HardwareConfig, InjectionOrder, MAX_PULSE_WIDTH,
    PatternSettings, Program, RunConfig, StripKind, parse_movement_rate, parse_seconds,
};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, value_parser};
use std::time::Duration;

/// WS281x LED strip pattern runner
#[derive(Parser, Debug)]
#[command(name = "led-strip-rs")]
#[command(about = "Run rainbow and pulse patterns on a WS281x LED strip")]
#[command(version, disable_version_flag = true)]
pub struct Args {
    /// Print version information
    #[arg(short = 'v', long, action = ArgAction::Version)]
    version: (),

    /// Strip type (color order)
    #[arg(
        short = 's',
        long,
        value_enum,
        ignore_case = true,
        default_value_t = StripKind::Grb,
        env = "LED_STRIP_TYPE"
    )]
    pub strip: StripKind,

    /// Matrix width
    #[arg(short = 'x', long, default_value_t = 300, value_parser = value_parser!(u32).range(1..))]
    pub width: u32,

    /// Matrix height
    #[arg(short = 'y', long, default_value_t = 1, value_parser = value_parser!(u32).range(1..))]
    pub height: u32,

    /// DMA channel to use
    #[arg(
        short = 'd',
        long,
        default_value_t = DEFAULT_DMA,
        env = "LED_STRIP_DMA",
        value_parser = value_parser!(u8).range(0..i64::from(DMA_CHANNEL_LIMIT))
    )]
    pub dma: u8,

    /// GPIO to use (18 is PWM0)
    #[arg(short = 'g', long, default_value_t = DEFAULT_GPIO, env = "LED_STRIP_GPIO")]
    pub gpio: i32,

    /// Signal frequency in Hz
    #[arg(long, default_value_t = DEFAULT_FREQ_HZ, env = "LED_STRIP_FREQ")]
    pub freq: u32,

    /// Invert pin output (pulse LOW)
    #[arg(short = 'i', long)]
    pub invert: bool,

    /// Clear the strip on exit
    #[arg(short = 'c', long)]
    pub clear: bool,

    /// Driver brightness (0-255)
    #[arg(short = 'b', long, default_value_t = DEFAULT_BRIGHTNESS)]
    pub brightness: u8,

    /// Which program to run
    #[arg(short = 'p', long, value_enum, default_value_t = Program::Rainbow)]
    pub program: Program,

    /// How many LEDs a pulse moves per second
    #[arg(
        short = 'm',
        long,
        default_value_t = DEFAULT_MOVEMENT_RATE,
        value_parser = parse_movement_rate
    )]
    pub movement_rate: f64,

    /// Keep the last pulse color lit between pulses
    #[arg(
        short = 'M',
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub maintain_color: bool,

    /// Seconds to sleep between injected pulses
    #[arg(short = 'S', long, default_value = "0.5", value_parser = parse_seconds)]
    pub sleep_rate: Duration,

    /// LEDs per pulse ramp; a pulse covers twice this many
    #[arg(
        short = 'P',
        long,
        default_value_t = DEFAULT_PULSE_WIDTH,
        value_parser = value_parser!(u32).range(1..=i64::from(MAX_PULSE_WIDTH))
    )]
    pub pulse_width: u32,

    /// Inject palette colors in random order
    #[arg(short = 'r', long)]
    pub random: bool,
}

impl Args {
    pub fn into_run_config(self) -> RunConfig {
        RunConfig {
            hardware: HardwareConfig {
                freq_hz: self.freq,
                dma: self.dma,
                gpio: self.gpio,
                invert: self.invert,
                brightness: self.brightness,
                strip_kind: self.strip,
            },
            settings: PatternSettings {
                layout: StripLayout::new(self.width, self.height),
                clear_on_exit: self.clear,
                maintain_color: self.maintain_color,
                movement_rate: self.movement_rate,
                pulse_width: self.pulse_width,
            },
            program: self.program,
            sleep_rate: self.sleep_rate,
            injection_order: if self.random {
                InjectionOrder::Random
            } else {
                InjectionOrder::Sequential
            },
        }
    }
}
