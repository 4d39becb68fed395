//! Candle data model and the ordered series with derived rolling statistics.
//!
//! A [`CandleSeries`] is built once per analysis request and never mutated.
//! Derived series (rolling means/extrema, percent change) are computed lazily
//! and memoized, so repeated detector access is cheap and `run_all` stays
//! idempotent.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::InvalidSeriesError;

// ============================================================
// TIMEFRAME
// ============================================================

/// Duration each candle represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
    #[serde(rename = "1m")]
    M1,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
            Timeframe::M1 => "1m",
        }
    }

    /// Wall-clock span of one bar.
    pub fn duration(self) -> Duration {
        match self {
            Timeframe::H1 => Duration::hours(1),
            Timeframe::H4 => Duration::hours(4),
            Timeframe::D1 => Duration::days(1),
            Timeframe::W1 => Duration::days(7),
            Timeframe::M1 => Duration::days(30),
        }
    }

    /// Multiplier applied to the configured volatility fraction during
    /// synthesis. Longer timeframes get proportionally larger bar ranges.
    pub fn volatility_scale(self) -> f64 {
        match self {
            Timeframe::H1 => 0.3,
            Timeframe::H4 => 0.6,
            Timeframe::D1 => 1.0,
            Timeframe::W1 => 1.6,
            Timeframe::M1 => 2.2,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = InvalidSeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Timeframe::H1),
            "4h" => Ok(Timeframe::H4),
            "1d" => Ok(Timeframe::D1),
            "1w" => Ok(Timeframe::W1),
            "1m" => Ok(Timeframe::M1),
            _ => Err(InvalidSeriesError::UnknownTimeframe(s.to_string())),
        }
    }
}

// ============================================================
// CANDLE
// ============================================================

/// One OHLCV bar. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[inline]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    #[inline]
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    #[inline]
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    #[inline]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    #[inline]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// A zero-volatility placeholder bar: open == high == low == close.
    /// One raw sample per period collapses to this shape.
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.open == self.high && self.high == self.low && self.low == self.close
    }

    /// Checks the OHLC ordering invariant:
    /// `low <= min(open, close) <= max(open, close) <= high`.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return false;
        }
        self.low <= self.open.min(self.close)
            && self.open.max(self.close) <= self.high
            && self.volume >= 0.0
    }
}

// ============================================================
// CANDLE SERIES
// ============================================================

/// Minimum number of candles a series must have.
pub const MIN_SERIES_LEN: usize = 2;

#[derive(Debug, Default)]
struct DerivedCache {
    volume_mean: HashMap<usize, Arc<[f64]>>,
    volume_max: HashMap<usize, Arc<[f64]>>,
    high_max: HashMap<usize, Arc<[f64]>>,
    close_mean: HashMap<usize, Arc<[f64]>>,
    percent_change: Option<Arc<[f64]>>,
}

/// Ordered, immutable-once-built candle sequence with lazily memoized
/// derived statistics.
///
/// Rolling statistics use the partial-window policy: at index `i < window-1`
/// the value is computed over all candles `[0..=i]` instead of being
/// undefined. Detectors rely on this determinism at early indices.
#[derive(Debug, serde::Serialize)]
pub struct CandleSeries {
    candles: Vec<Candle>,
    timeframe: Timeframe,
    #[serde(skip)]
    derived: Mutex<DerivedCache>,
}

impl Clone for CandleSeries {
    fn clone(&self) -> Self {
        Self {
            candles: self.candles.clone(),
            timeframe: self.timeframe,
            derived: Mutex::new(DerivedCache::default()),
        }
    }
}

impl CandleSeries {
    /// Builds a series, validating length and timestamp ordering.
    ///
    /// Timestamps must be monotonically non-decreasing. Degenerate (flat)
    /// candles are accepted here; repairing them is the synthesizer's job.
    pub fn build(
        candles: Vec<Candle>,
        timeframe: Timeframe,
    ) -> Result<Self, InvalidSeriesError> {
        if candles.len() < MIN_SERIES_LEN {
            return Err(InvalidSeriesError::TooShort {
                need: MIN_SERIES_LEN,
                got: candles.len(),
            });
        }
        for (i, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(InvalidSeriesError::NonMonotonicTimestamps { index: i + 1 });
            }
        }
        Ok(Self {
            candles,
            timeframe,
            derived: Mutex::new(DerivedCache::default()),
        })
    }

    /// Constructor for synthesized output whose ordering is guaranteed by
    /// construction. Bypasses the minimum-length check so a caller may ask
    /// the synthesizer for a single candle.
    pub(crate) fn from_synthesized(candles: Vec<Candle>, timeframe: Timeframe) -> Self {
        debug_assert!(candles.windows(2).all(|p| p[0].timestamp <= p[1].timestamp));
        Self {
            candles,
            timeframe,
            derived: Mutex::new(DerivedCache::default()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    #[inline]
    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    #[inline]
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    #[inline]
    pub fn candle_at(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    #[inline]
    pub fn last(&self) -> &Candle {
        // Invariant: build() guarantees at least MIN_SERIES_LEN candles.
        &self.candles[self.candles.len() - 1]
    }

    /// True if any bar in the series is a flat placeholder.
    pub fn has_flat_candles(&self) -> bool {
        self.candles.iter().any(Candle::is_flat)
    }

    /// Rolling mean of volume, aligned to the candle sequence.
    pub fn rolling_volume_mean(&self, window: usize) -> Arc<[f64]> {
        let mut cache = self.derived.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .volume_mean
            .entry(window)
            .or_insert_with(|| {
                rolling_mean(&collect(&self.candles, |c| c.volume), window).into()
            })
            .clone()
    }

    /// Rolling max of volume, aligned to the candle sequence.
    pub fn rolling_volume_max(&self, window: usize) -> Arc<[f64]> {
        let mut cache = self.derived.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .volume_max
            .entry(window)
            .or_insert_with(|| {
                rolling_max(&collect(&self.candles, |c| c.volume), window).into()
            })
            .clone()
    }

    /// Rolling max of high, aligned to the candle sequence.
    pub fn rolling_high_max(&self, window: usize) -> Arc<[f64]> {
        let mut cache = self.derived.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .high_max
            .entry(window)
            .or_insert_with(|| rolling_max(&collect(&self.candles, |c| c.high), window).into())
            .clone()
    }

    /// Rolling mean of close (simple moving average).
    pub fn rolling_close_mean(&self, window: usize) -> Arc<[f64]> {
        let mut cache = self.derived.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .close_mean
            .entry(window)
            .or_insert_with(|| {
                rolling_mean(&collect(&self.candles, |c| c.close), window).into()
            })
            .clone()
    }

    /// Simple percent change of close. Index 0 is 0.0 by convention.
    pub fn percent_change(&self) -> Arc<[f64]> {
        let mut cache = self.derived.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .percent_change
            .get_or_insert_with(|| {
                let mut out = Vec::with_capacity(self.candles.len());
                out.push(0.0);
                for pair in self.candles.windows(2) {
                    let prev = pair[0].close;
                    let cur = pair[1].close;
                    out.push(if prev > 0.0 { (cur - prev) / prev } else { 0.0 });
                }
                out.into()
            })
            .clone()
    }
}

#[inline]
fn collect(candles: &[Candle], f: impl Fn(&Candle) -> f64) -> Vec<f64> {
    candles.iter().map(f).collect()
}

/// Rolling mean with the partial-window policy for `i < window-1`.
fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for i in 0..values.len() {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        let count = (i + 1).min(window);
        out.push(sum / count as f64);
    }
    out
}

/// Rolling max with the partial-window policy for `i < window-1`.
fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = (i + 1).saturating_sub(window);
        let max = values[start..=i]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        out.push(max);
    }
    out
}

// ============================================================
// TESTS
// ============================================================
