//! Chart-family detectors: support/resistance level tests and moving-average
//! trend structure. These are the only producers of the `horizontal_line` and
//! `trend_lines` coordinate shapes.

use crate::coords::CoordinateBuilder;
use crate::detectors::helpers::confidence;
use crate::series::CandleSeries;
use crate::{Category, Detector, Direction, PatternMatch};

/// Lookback for the support/resistance extremes.
pub const LEVEL_WINDOW: usize = 20;
/// Close must come within this fraction of the level to count as a test.
pub const LEVEL_TOLERANCE: f64 = 0.02;

const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;

impl_with_defaults!(
    SupportLevelDetector,
    ResistanceLevelDetector,
    BullishTrendDetector,
    BearishTrendDetector,
);

/// Support Level Test: the latest close within 2% of the 20-bar low.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportLevelDetector;

impl Detector for SupportLevelDetector {
    fn name(&self) -> &'static str {
        "Support Level Test"
    }

    fn min_len(&self) -> usize {
        LEVEL_WINDOW
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let n = series.len();
        let start = n - LEVEL_WINDOW;
        let support = series.candles()[start..]
            .iter()
            .map(|c| c.low)
            .fold(f64::INFINITY, f64::min);
        let close = series.last().close;
        if support <= 0.0 || (close - support).abs() / support > LEVEL_TOLERANCE {
            return Ok(vec![]);
        }
        Ok(vec![PatternMatch {
            name: self.name().into(),
            category: Category::PriceAction,
            confidence: confidence(75.0),
            direction: Direction::Bullish,
            index: n - 1,
            coordinates: CoordinateBuilder::new(series).horizontal_line(support, start, n - 1),
            description: format!("Price testing support near {support:.2}"),
        }])
    }
}

/// Resistance Level Test: the latest close within 2% of the 20-bar high.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResistanceLevelDetector;

impl Detector for ResistanceLevelDetector {
    fn name(&self) -> &'static str {
        "Resistance Level Test"
    }

    fn min_len(&self) -> usize {
        LEVEL_WINDOW
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let n = series.len();
        let start = n - LEVEL_WINDOW;
        let resistance = series.rolling_high_max(LEVEL_WINDOW)[n - 1];
        let close = series.last().close;
        if resistance <= 0.0 || (resistance - close).abs() / resistance > LEVEL_TOLERANCE {
            return Ok(vec![]);
        }
        Ok(vec![PatternMatch {
            name: self.name().into(),
            category: Category::PriceAction,
            confidence: confidence(75.0),
            direction: Direction::Bearish,
            index: n - 1,
            coordinates: CoordinateBuilder::new(series).horizontal_line(resistance, start, n - 1),
            description: format!("Price testing resistance near {resistance:.2}"),
        }])
    }
}

fn trend_match(
    series: &CandleSeries,
    name: &'static str,
    direction: Direction,
    description: String,
) -> Vec<PatternMatch> {
    let n = series.len();
    let sma_short = series.rolling_close_mean(SMA_SHORT)[n - 1];
    let sma_long = series.rolling_close_mean(SMA_LONG)[n - 1];
    vec![PatternMatch {
        name: name.into(),
        category: Category::Chart,
        confidence: confidence(70.0),
        direction,
        index: n - 1,
        coordinates: CoordinateBuilder::new(series).trend_lines(
            sma_short,
            sma_long,
            n - SMA_SHORT,
            n - 1,
        ),
        description,
    }]
}

/// Bullish Trend: close above the 20-bar SMA, which is above the 50-bar SMA.
#[derive(Debug, Clone, Copy, Default)]
pub struct BullishTrendDetector;

impl Detector for BullishTrendDetector {
    fn name(&self) -> &'static str {
        "Bullish Trend"
    }

    fn min_len(&self) -> usize {
        SMA_LONG
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let n = series.len();
        let close = series.last().close;
        let sma_short = series.rolling_close_mean(SMA_SHORT)[n - 1];
        let sma_long = series.rolling_close_mean(SMA_LONG)[n - 1];
        if close > sma_short && sma_short > sma_long {
            Ok(trend_match(
                series,
                self.name(),
                Direction::Bullish,
                "Price stacked above both moving averages".to_string(),
            ))
        } else {
            Ok(vec![])
        }
    }
}

/// Bearish Trend: close below the 20-bar SMA, which is below the 50-bar SMA.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearishTrendDetector;

impl Detector for BearishTrendDetector {
    fn name(&self) -> &'static str {
        "Bearish Trend"
    }

    fn min_len(&self) -> usize {
        SMA_LONG
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let n = series.len();
        let close = series.last().close;
        let sma_short = series.rolling_close_mean(SMA_SHORT)[n - 1];
        let sma_long = series.rolling_close_mean(SMA_LONG)[n - 1];
        if close < sma_short && sma_short < sma_long {
            Ok(trend_match(
                series,
                self.name(),
                Direction::Bearish,
                "Price stacked below both moving averages".to_string(),
            ))
        } else {
            Ok(vec![])
        }
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Coordinates;
    use crate::series::{Candle, Timeframe};
    use chrono::{TimeZone, Utc};

    fn build(closes: &[f64]) -> CandleSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let ts = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                Candle::new(ts, c - 0.5, c + 1.0, c - 1.0, c, 1000.0)
            })
            .collect();
        CandleSeries::build(candles, Timeframe::D1).unwrap()
    }

    #[test]
    fn test_support_level_test() {
        // Range-bound market dipping back to its floor.
        let mut closes: Vec<f64> = (0..19).map(|i| 105.0 + (i % 4) as f64).collect();
        closes.push(104.5);
        let matches = SupportLevelDetector::with_defaults().detect(&build(&closes)).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.direction, Direction::Bullish);
        assert!(matches!(m.coordinates, Coordinates::HorizontalLine { .. }));
    }

    #[test]
    fn test_resistance_level_test() {
        let mut closes: Vec<f64> = (0..19).map(|i| 105.0 - (i % 4) as f64).collect();
        closes.push(105.5);
        let matches = ResistanceLevelDetector::with_defaults()
            .detect(&build(&closes))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, Direction::Bearish);
    }

    #[test]
    fn test_bullish_trend_stacking() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let matches = BullishTrendDetector::with_defaults().detect(&build(&closes)).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.confidence, 70);
        match m.coordinates {
            Coordinates::TrendLines {
                sma_short, sma_long, ..
            } => assert!(sma_short > sma_long),
            ref other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_bearish_trend_stacking() {
        let closes: Vec<f64> = (0..60).map(|i| 130.0 - i as f64 * 0.5).collect();
        let matches = BearishTrendDetector::with_defaults().detect(&build(&closes)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, Direction::Bearish);
    }

    #[test]
    fn test_flat_market_has_no_trend() {
        let closes = vec![100.0; 60];
        assert!(BullishTrendDetector::with_defaults()
            .detect(&build(&closes))
            .unwrap()
            .is_empty());
        assert!(BearishTrendDetector::with_defaults()
            .detect(&build(&closes))
            .unwrap()
            .is_empty());
    }
}
