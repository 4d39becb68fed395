//! Shared numeric helpers for the detector families.
//!
//! Trend direction is deliberately crude: the difference between the last and
//! first values of the trailing sub-window divided by the span, not a
//! regression. The detectors only consume its sign and rough magnitude.

use crate::series::{Candle, CandleSeries};

// ============================================================
// SHAPE THRESHOLDS
// ============================================================

/// Body is doji-like when body <= range * DOJI_BODY_RATIO.
pub const DOJI_BODY_RATIO: f64 = 0.1;
/// A wick dominating a bar: wick >= WICK_DOMINANT_RATIO * body.
pub const WICK_DOMINANT_RATIO: f64 = 2.0;
/// Marubozu: body >= range * MARUBOZU_BODY_RATIO.
pub const MARUBOZU_BODY_RATIO: f64 = 0.95;
/// Spinning top: body <= range * SPINNING_TOP_BODY_RATIO with wicks on both sides.
pub const SPINNING_TOP_BODY_RATIO: f64 = 0.3;
/// Long wick for doji variants: wick >= range * LONG_WICK_RANGE_RATIO.
pub const LONG_WICK_RANGE_RATIO: f64 = 0.6;
/// Star gap body: middle bar body <= STAR_BODY_RATIO * first bar body.
pub const STAR_BODY_RATIO: f64 = 0.3;

/// Per-bar slope over the trailing `window` values. Returns 0.0 when fewer
/// than two values are available.
pub fn trailing_trend(values: &[f64], window: usize) -> f64 {
    let n = values.len();
    if n < 2 || window < 2 {
        return 0.0;
    }
    let start = n.saturating_sub(window);
    let slice = &values[start..];
    (slice[slice.len() - 1] - slice[0]) / (slice.len() - 1) as f64
}

/// Trailing trend of closing prices.
pub fn close_trend(series: &CandleSeries, window: usize) -> f64 {
    let closes: Vec<f64> = series.candles().iter().map(|c| c.close).collect();
    trailing_trend(&closes, window)
}

/// Trailing trend of volumes.
pub fn volume_trend(series: &CandleSeries, window: usize) -> f64 {
    let volumes: Vec<f64> = series.candles().iter().map(|c| c.volume).collect();
    trailing_trend(&volumes, window)
}

/// Trend of closes over the `window` bars strictly before `index`.
/// Used as the prior-trend context for reversal candlestick shapes.
pub fn prior_close_trend(series: &CandleSeries, index: usize, window: usize) -> f64 {
    if index < 2 {
        return 0.0;
    }
    let closes: Vec<f64> = series.candles()[..index].iter().map(|c| c.close).collect();
    trailing_trend(&closes, window)
}

// ============================================================
// CUMULATIVE VOLUME INDICATORS
// ============================================================

/// On-balance volume: cumulative volume signed by the close-to-close move.
pub fn on_balance_volume(series: &CandleSeries) -> Vec<f64> {
    let candles = series.candles();
    let mut out = Vec::with_capacity(candles.len());
    if candles.is_empty() {
        return out;
    }
    let mut acc = 0.0;
    out.push(acc);
    for pair in candles.windows(2) {
        if pair[1].close > pair[0].close {
            acc += pair[1].volume;
        } else if pair[1].close < pair[0].close {
            acc -= pair[1].volume;
        }
        out.push(acc);
    }
    out
}

/// Accumulation/distribution line: cumulative money-flow volume.
/// Zero-range bars contribute nothing.
pub fn accumulation_distribution(series: &CandleSeries) -> Vec<f64> {
    let mut acc = 0.0;
    series
        .candles()
        .iter()
        .map(|c| {
            let range = c.range();
            if range > 0.0 {
                let multiplier = ((c.close - c.low) - (c.high - c.close)) / range;
                acc += multiplier * c.volume;
            }
            acc
        })
        .collect()
}

/// Volume-price trend: cumulative volume weighted by percent change.
pub fn volume_price_trend(series: &CandleSeries) -> Vec<f64> {
    let pct = series.percent_change();
    let mut acc = 0.0;
    series
        .candles()
        .iter()
        .zip(pct.iter())
        .map(|(c, p)| {
            acc += c.volume * p;
            acc
        })
        .collect()
}

// ============================================================
// MISC
// ============================================================

/// Clamps a raw confidence score into the `0..=100` contract.
#[inline]
pub fn confidence(raw: f64) -> u8 {
    raw.clamp(0.0, 100.0) as u8
}

/// Mean volume over a candle slice; 0.0 for an empty slice.
pub fn mean_volume(candles: &[Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    candles.iter().map(|c| c.volume).sum::<f64>() / candles.len() as f64
}
