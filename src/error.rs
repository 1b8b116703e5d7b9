use crate::mpsse::EncodingError;

/// Errors surfaced by the display and playback layers.
///
/// `E` is the error type of the underlying [`Channel`](crate::interface::Channel).
/// Every variant is fatal for the current session.
#[derive(Debug, thiserror::Error)]
pub enum Error<E: core::fmt::Debug> {
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("no bridge device available: {0:?}")]
    DeviceUnavailable(E),
    #[error("channel I/O failed: {0:?}")]
    Channel(E),
    #[error("short write: {written} of {expected} bytes accepted")]
    ShortWrite { expected: usize, written: usize },
    #[error(transparent)]
    GeometryMismatch(#[from] GeometryMismatch),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),
}

/// Rejected builder or playback settings.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("display size must be 1..=128 x 8..=64 with a height multiple of 8")]
    InvalidDisplaySize,
    #[error("I2C address must fit in 7 bits")]
    InvalidAddress,
    #[error("frame rate must be positive and finite")]
    InvalidFrameRate,
}

/// A frame whose dimensions differ from the configured panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("frame {frame} is {}x{}, panel is {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
pub struct GeometryMismatch {
    /// Position of the offending frame in its animation.
    pub frame: usize,
    pub expected: (u16, u16),
    pub actual: (u16, u16),
}
