//! # candlescan
//!
//! Rule-based OHLCV pattern annotator: candlestick, volume, and chart
//! pattern detection over validated candle series, with candle synthesis /
//! repair for degenerate feeds and chart-ready coordinate payloads on every
//! match.
//!
//! ## Quick Start
//!
//! ```rust
//! use candlescan::prelude::*;
//!
//! // Synthesize a reproducible daily series (or build one from real data
//! // with `CandleSeries::build`).
//! let synth = CandleSynthesizer::new(
//!     Timeframe::D1,
//!     SynthesisConfig { seed: Some(7), ..SynthesisConfig::default() },
//! )?;
//! let series = synth.synthesize();
//!
//! // Run every built-in detector over it.
//! let registry = DetectorRegistry::builder().with_all_defaults().build();
//! let analysis = registry.analyze(series);
//!
//! for m in &analysis.matches {
//!     println!("{} ({}%, {:?})", m.name, m.confidence, m.direction);
//! }
//! # Ok::<(), candlescan::Error>(())
//! ```

pub mod catalog;
pub mod coords;
pub mod detectors;
pub mod series;
pub mod synth;

pub mod prelude {
    pub use crate::{
        // Detectors
        detectors::*,
        // Parallel
        analyze_parallel,
        // Coordinates
        coords::{CoordinateBuilder, Coordinates},
        // Series
        series::{Candle, CandleSeries, Timeframe},
        // Synthesis
        synth::{CandleSynthesizer, PricePoint, SynthesisConfig},
        // Core types
        Analysis,
        Category,
        Detector,
        DetectorRegistry,
        Direction,
        // Errors
        Error,
        InstrumentAnalysis,
        InvalidSeriesError,
        PatternMatch,
        RegistryBuilder,
        Result,
        SynthesisConfigError,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidSeries(#[from] InvalidSeriesError),

    #[error(transparent)]
    SynthesisConfig(#[from] SynthesisConfigError),

    /// A detector's own failure. Surfaced to `run_all`, which logs it and
    /// moves on to the next detector.
    #[error("detector {detector} failed: {message}")]
    Detector {
        detector: &'static str,
        message: String,
    },
}

/// A candle sequence that cannot form a valid series.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidSeriesError {
    #[error("series too short: need {need} candles, got {got}")]
    TooShort { need: usize, got: usize },

    #[error("timestamps decrease at index {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("unknown timeframe: {0:?}")]
    UnknownTimeframe(String),
}

/// Rejected synthesis configuration.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SynthesisConfigError {
    #[error("target_count must be at least 1, got {0}")]
    TargetCount(usize),

    #[error("volatility_fraction must be positive and finite, got {0}")]
    Volatility(f64),

    #[error("base_price must be positive and finite, got {0}")]
    BasePrice(f64),
}

// ============================================================
// CORE TYPES
// ============================================================

/// Directional read of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
    Continuation,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }
}

/// Pattern family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Category {
    Candle,
    Chart,
    #[serde(rename = "Volume-Based")]
    Volume,
    #[serde(rename = "Price Action")]
    PriceAction,
}

/// One detected pattern with everything a consumer needs to rank and render
/// it without going back to the series.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PatternMatch {
    pub name: Cow<'static, str>,
    pub category: Category,
    /// 0..=100.
    pub confidence: u8,
    pub direction: Direction,
    /// Index of the pattern's final (most recent) candle.
    pub index: usize,
    pub coordinates: coords::Coordinates,
    pub description: String,
}

// ============================================================
// DETECTOR TRAIT + REGISTRY
// ============================================================

use std::borrow::Cow;
use std::panic::{catch_unwind, AssertUnwindSafe};

use series::CandleSeries;

/// A pattern detection rule. Implementations are stateless with respect to
/// the series; the same series must always yield the same matches.
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Series shorter than this contribute nothing; the registry skips the
    /// detector without calling [`Detector::detect`].
    fn min_len(&self) -> usize;

    fn detect(&self, series: &CandleSeries) -> Result<Vec<PatternMatch>>;
}

/// Ordered collection of detectors. Runs them in registration order and
/// isolates individual failures: a detector that errors or panics is logged
/// and skipped, never aborting the pass.
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Runs every registered detector over the series, in registration
    /// order. Always returns; a failing detector costs only its own matches.
    pub fn run_all(&self, series: &CandleSeries) -> Vec<PatternMatch> {
        let mut matches = Vec::new();
        for detector in &self.detectors {
            if series.len() < detector.min_len() {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| detector.detect(series))) {
                Ok(Ok(found)) => matches.extend(found),
                Ok(Err(error)) => {
                    tracing::warn!(detector = detector.name(), %error, "detector failed, skipped");
                }
                Err(_) => {
                    tracing::warn!(detector = detector.name(), "detector panicked, skipped");
                }
            }
        }
        matches
    }

    /// Runs all detectors and bundles the series with its matches.
    pub fn analyze(&self, series: CandleSeries) -> Analysis {
        let matches = self.run_all(&series);
        Analysis { series, matches }
    }
}

/// Builder for [`DetectorRegistry`]. Grouped `with_*_defaults` methods add
/// whole families; `register` adds one detector, custom or built-in.
#[derive(Default)]
pub struct RegistryBuilder {
    detectors: Vec<Box<dyn Detector>>,
}

/// Box a list of detector types constructed via `with_defaults()`.
macro_rules! detector_defaults {
  ($($detector:ty),* $(,)?) => {
    [$(Box::new(<$detector>::with_defaults()) as Box<dyn Detector>),*]
  };
}

impl RegistryBuilder {
    /// All 17 candlestick detectors with default thresholds.
    pub fn with_candlestick_defaults(mut self) -> Self {
        use detectors::candlestick::*;
        self.detectors.extend(detector_defaults![
            DojiDetector,
            DragonflyDojiDetector,
            GravestoneDojiDetector,
            HammerDetector,
            HangingManDetector,
            InvertedHammerDetector,
            ShootingStarDetector,
            MarubozuDetector,
            SpinningTopDetector,
            EngulfingDetector,
            HaramiDetector,
            PiercingDetector,
            DarkCloudCoverDetector,
            MorningStarDetector,
            EveningStarDetector,
            ThreeWhiteSoldiersDetector,
            ThreeBlackCrowsDetector,
        ]);
        self
    }

    /// All 15 volume detectors with default thresholds.
    pub fn with_volume_defaults(mut self) -> Self {
        use detectors::volume::*;
        self.detectors.extend(detector_defaults![
            VolumeSpikeDetector,
            VolumeBreakoutDetector,
            AccumulationDistributionDetector,
            VolumeClimaxDetector,
            LowVolumePullbackDetector,
            VolumeConfirmationDetector,
            VolumeDivergenceDetector,
            HighVolumeReversalDetector,
            VolumeThrustDetector,
            VolumeDryingUpDetector,
            VolumeExpansionDetector,
            VolumeContractionDetector,
            ObvTrendDetector,
            VptConfirmationDetector,
            HeavyVolumeRejectionDetector,
        ]);
        self
    }

    /// Support/resistance and trend-structure detectors.
    pub fn with_chart_defaults(mut self) -> Self {
        use detectors::chart::*;
        self.detectors.extend(detector_defaults![
            SupportLevelDetector,
            ResistanceLevelDetector,
            BullishTrendDetector,
            BearishTrendDetector,
        ]);
        self
    }

    pub fn with_all_defaults(self) -> Self {
        self.with_candlestick_defaults()
            .with_volume_defaults()
            .with_chart_defaults()
    }

    /// Register a single detector, after any already registered.
    pub fn register<D: Detector + 'static>(mut self, detector: D) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn build(self) -> DetectorRegistry {
        DetectorRegistry {
            detectors: self.detectors,
        }
    }
}

// ============================================================
// ANALYSIS
// ============================================================

/// A series together with everything the registry found in it.
#[derive(Debug, serde::Serialize)]
pub struct Analysis {
    pub series: CandleSeries,
    /// Registration-ordered.
    pub matches: Vec<PatternMatch>,
}

impl Analysis {
    /// Highest-confidence match; first-registered wins ties.
    pub fn strongest(&self) -> Option<&PatternMatch> {
        let mut best: Option<&PatternMatch> = None;
        for m in &self.matches {
            if best.map_or(true, |b| m.confidence > b.confidence) {
                best = Some(m);
            }
        }
        best
    }
}

// ============================================================
// PARALLEL ANALYSIS
// ============================================================

use rayon::prelude::*;

/// Analysis of one named instrument.
#[derive(Debug, serde::Serialize)]
pub struct InstrumentAnalysis {
    pub symbol: String,
    pub analysis: Analysis,
}

/// Analyzes many instruments in parallel with one shared registry. Each
/// series gets an independent pass; order of the output follows the input.
pub fn analyze_parallel<'a, I>(
    registry: &DetectorRegistry,
    instruments: I,
) -> Vec<InstrumentAnalysis>
where
    I: IntoParallelIterator<Item = (&'a str, CandleSeries)>,
{
    instruments
        .into_par_iter()
        .map(|(symbol, series)| InstrumentAnalysis {
            symbol: symbol.to_string(),
            analysis: registry.analyze(series),
        })
        .collect()
}

// ============================================================
// TESTS
// ============================================================
