//! Error types for the strip, the pattern worker, and configuration.

use thiserror::Error;

/// Failures reported by an LED strip backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StripError {
    #[error("failed to initialize LED strip: {0}")]
    Init(String),
    #[error("failed to render LED strip: {0}")]
    Render(String),
}

/// Failures from the pattern lifecycle (load/start/pause/inject/kill).
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern '{0}' is already loaded")]
    AlreadyLoaded(&'static str),
    #[error("pattern '{0}' is not loaded")]
    NotLoaded(&'static str),
    #[error("worker for pattern '{0}' has stopped")]
    WorkerGone(&'static str),
    #[error("command queue for pattern '{0}' is full")]
    Busy(&'static str),
    #[error("worker for pattern '{0}' panicked")]
    WorkerPanicked(&'static str),
    #[error("failed to spawn pattern worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error(transparent)]
    Strip(#[from] StripError),
}

/// Invalid run configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid dma {0} (must be below 14)")]
    InvalidDma(u8),
    #[error("invalid width {0}")]
    InvalidWidth(u32),
    #[error("invalid height {0}")]
    InvalidHeight(u32),
    #[error("invalid movement rate {0} (must be a positive number of moves per second)")]
    InvalidMovementRate(f64),
    #[error("invalid pulse width {0}")]
    InvalidPulseWidth(u32),
    #[error("invalid sleep rate {0}")]
    InvalidSleepRate(f64),
}

/// Anything that can end a run early.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pattern(#[from] PatternError),
}
