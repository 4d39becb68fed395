//! Pattern detectors.
//!
//! Three families share the [`crate::Detector`] trait:
//!
//! - **Candlestick (17)**: doji variants, hammer family, marubozu, engulfing,
//!   stars, soldiers/crows. Latest-occurrence scan over the whole series.
//! - **Volume (15)**: spike, breakout, climax, accumulation/distribution,
//!   OBV/VPT trends, and other rolling-volume rules on the latest bars.
//! - **Chart (4)**: support/resistance level tests and moving-average trend
//!   structure.

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod candlestick;
pub mod chart;
pub mod volume;

// Re-export all detectors for convenience
pub use candlestick::*;
pub use chart::*;
pub use volume::*;
