//! `LedStrip` backed by the `rs_ws281x` driver (a binding to rpi_ws281x).
//!
//! Only builds with the `hardware` feature. Must run as root on a supported
//! Raspberry Pi, because the driver maps peripheral memory directly.
//!
//! The driver's controller holds raw pointers and is not `Send`, so a
//! `Ws281xStrip` has to be created on the thread that renders with it.
//! `Pattern::load` takes a factory closure for exactly that reason.

use crate::Color;
use crate::config::{HardwareConfig, StripKind};
use crate::error::StripError;
use crate::strip::LedStrip;
use rs_ws281x::{ChannelBuilder, Controller, ControllerBuilder, StripType};

/// We only ever drive channel 0; channel 1 is left unconfigured.
const CHANNEL: usize = 0;

impl From<StripKind> for StripType {
    fn from(kind: StripKind) -> Self {
        match kind {
            StripKind::Rgb => StripType::Ws2811Rgb,
            StripKind::Rbg => StripType::Ws2811Rbg,
            StripKind::Grb => StripType::Ws2811Grb,
            StripKind::Gbr => StripType::Ws2811Gbr,
            StripKind::Brg => StripType::Ws2811Brg,
            StripKind::Bgr => StripType::Ws2811Bgr,
            StripKind::Rgbw => StripType::Sk6812Rgbw,
            StripKind::Grbw => StripType::Sk6812Grbw,
        }
    }
}

/// A WS281x strip on one PWM/PCM/SPI channel of the Pi.
///
/// Dropping it calls the driver's `fini`, which releases DMA and GPIO.
pub struct Ws281xStrip {
    controller: Controller,
    led_count: usize,
}

impl Ws281xStrip {
    /// Initialize the driver for `led_count` LEDs.
    pub fn new(hw: &HardwareConfig, led_count: usize) -> Result<Self, StripError> {
        let count = i32::try_from(led_count)
            .map_err(|_| StripError::Init(format!("too many LEDs: {led_count}")))?;

        tracing::debug!(
            "Initializing ws281x: gpio={} dma={} freq={}Hz type={} white={} count={}",
            hw.gpio,
            hw.dma,
            hw.freq_hz,
            hw.strip_kind,
            hw.strip_kind.has_white(),
            led_count
        );

        let controller = ControllerBuilder::new()
            .freq(hw.freq_hz)
            .dma(i32::from(hw.dma))
            .channel(
                CHANNEL,
                ChannelBuilder::new()
                    .pin(hw.gpio)
                    .count(count)
                    .invert(hw.invert)
                    .strip_type(hw.strip_kind.into())
                    .brightness(hw.brightness)
                    .build(),
            )
            .build()
            .map_err(|e| StripError::Init(format!("{e:?}")))?;

        Ok(Self {
            controller,
            led_count,
        })
    }
}

impl LedStrip for Ws281xStrip {
    fn len(&self) -> usize {
        self.led_count
    }

    fn render(&mut self, frame: &[Color]) -> Result<(), StripError> {
        let leds = self.controller.leds_mut(CHANNEL);
        for (led, color) in leds.iter_mut().zip(frame) {
            *led = (*color).into();
        }

        self.controller
            .render()
            .map_err(|e| StripError::Render(format!("{e:?}")))
    }
}
