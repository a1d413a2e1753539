use thiserror::Error;

/// Rejected tuning parameters.  Raised once at startup, never per frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("smoothing factor must be in (0, 1], got {0}")]
    SmoothingFactor(f32),

    #[error("pinch thresholds must satisfy 0 < enter < exit, got enter={enter} exit={exit}")]
    PinchBand { enter: f32, exit: f32 },

    #[error("surface must be non-empty, got {width}x{height}")]
    EmptySurface { width: u32, height: u32 },
}
