//! WS281x LED strip pattern runner
//!
//! Drives a strip of WS2811/WS2812/SK6812 LEDs from a Raspberry Pi with one
//! of two canned patterns:
//! - **rainbow** (`-p 0`): the hue wheel spread across the strip
//! - **pulse** (`-p 1`): palette colors injected every `--sleep-rate`
//!   seconds, each travelling down the strip as a soft pulse
//!
//! ## Architecture
//! - **Worker thread** (std::thread): owns the strip, renders frames
//! - **Main thread**: parses flags, injects colors, waits for Ctrl+C
//!
//! ## Usage
//! ```sh
//! sudo ./target/release/led-strip-rs -p pulse -x 300 -m 100 -P 10 -S 0.5 -c
//! ```

#[cfg(not(feature = "hardware"))]
fn main() {
    eprintln!("This binary requires the 'hardware' feature (rs_ws281x).");
    eprintln!("Build with: cargo build --release");
    eprintln!("Tests can run without it: cargo test --no-default-features");
    std::process::exit(1);
}

#[cfg(feature = "hardware")]
fn main() {
    use clap::Parser;
    use led_strip_rs::cli::Args;
    use led_strip_rs::hardware::Ws281xStrip;
    use led_strip_rs::{app, setup_signal_handler};
    use tracing_subscriber::EnvFilter;

    // Debug by default; override with RUST_LOG=info (or trace for every frame).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let config = Args::parse().into_run_config();

    tracing::info!("LED strip runner v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Strip: {} on GPIO {}, DMA {}, {} Hz{}",
        config.hardware.strip_kind,
        config.hardware.gpio,
        config.hardware.dma,
        config.hardware.freq_hz,
        if config.hardware.invert { ", inverted" } else { "" }
    );

    // Signals are only handled here; everything below just watches the flag.
    let running = match setup_signal_handler() {
        Ok(running) => running,
        Err(e) => {
            tracing::error!("Failed to install signal handler: {}", e);
            std::process::exit(1);
        }
    };

    let hardware = config.hardware;
    let led_count = config.settings.layout.led_count();

    match app::run(&config, move || Ws281xStrip::new(&hardware, led_count), &running) {
        Ok(_) => tracing::info!("Shut down cleanly."),
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}
