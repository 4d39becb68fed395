//! Visualization coordinate payloads.
//!
//! Every detected pattern carries one of four coordinate shapes so the
//! charting layer can render it without re-deriving anything from the series.
//! Consumers switch on the serde `type` tag.

use std::borrow::Cow;

use chrono::{DateTime, Utc};

use crate::series::CandleSeries;

/// Tagged-union coordinate payload attached to each pattern match.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Coordinates {
    /// Highlight box spanning one or more candles.
    PatternRange {
        start_index: usize,
        end_index: usize,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        pattern_high: f64,
        pattern_low: f64,
        highlight_color: Cow<'static, str>,
        pattern_name: String,
    },
    /// Single-candle emphasis with that candle's OHLC.
    CandlestickHighlight {
        index: usize,
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
    /// Support/resistance-style price level over a time span.
    HorizontalLine {
        level: f64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
    /// Trend confirmation: the two moving-average values over a time span.
    TrendLines {
        sma_short: f64,
        sma_long: f64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    },
}

// ============================================================
// COLOR TABLES
// ============================================================

/// Neutral fallback for unrecognized keys. Lookups never fail.
pub const DEFAULT_COLOR: &str = "#BDC3C7";

pub const BULLISH_COLOR: &str = "#10B981";
pub const BEARISH_COLOR: &str = "#EF4444";
pub const NEUTRAL_COLOR: &str = "#F59E0B";

/// Highlight color for volume-family pattern slugs.
pub fn volume_color(slug: &str) -> &'static str {
    match slug {
        "spike" => "#FF6B6B",
        "breakout" => "#4ECDC4",
        "accumulation" => "#45B7D1",
        "distribution" => "#96CEB4",
        "climax" => "#FFEAA7",
        "pullback" => "#DDA0DD",
        "confirmation" => "#98D8C8",
        "divergence" => "#F7DC6F",
        "reversal" => "#BB8FCE",
        "thrust" => "#85C1E9",
        "drying" => "#F8C471",
        "expansion" => "#82E0AA",
        "contraction" => "#F1948A",
        "obv_trend" => "#AED6F1",
        "vpt" => "#A9DFBF",
        "rejection" => "#F5B7B1",
        _ => DEFAULT_COLOR,
    }
}

/// Highlight color for candlestick patterns, keyed by pattern name.
pub fn candle_color(pattern_name: &str) -> &'static str {
    const BULLISH: &[&str] = &[
        "Hammer",
        "Inverted Hammer",
        "Morning Star",
        "Piercing Pattern",
        "Three White Soldiers",
        "Dragonfly Doji",
        "Bullish Engulfing",
    ];
    const BEARISH: &[&str] = &[
        "Hanging Man",
        "Evening Star",
        "Dark Cloud Cover",
        "Three Black Crows",
        "Gravestone Doji",
        "Bearish Engulfing",
        "Shooting Star",
    ];

    if BULLISH.iter().any(|b| pattern_name.contains(b)) {
        BULLISH_COLOR
    } else if BEARISH.iter().any(|b| pattern_name.contains(b)) {
        BEARISH_COLOR
    } else {
        NEUTRAL_COLOR
    }
}

// ============================================================
// COORDINATE BUILDER
// ============================================================

/// Builds coordinate payloads from series positions. Shared by every
/// detector so all shapes stay consistent with the analyzed series.
pub struct CoordinateBuilder<'a> {
    series: &'a CandleSeries,
}

impl<'a> CoordinateBuilder<'a> {
    pub fn new(series: &'a CandleSeries) -> Self {
        Self { series }
    }

    /// Range highlight over `[start_index, end_index]` with the pattern's
    /// high/low over the span. Indices are clamped to the series.
    pub fn pattern_range(
        &self,
        start_index: usize,
        end_index: usize,
        pattern_name: &str,
        color: &'static str,
    ) -> Coordinates {
        let last = self.series.len() - 1;
        let end_index = end_index.min(last);
        let start_index = start_index.min(end_index);
        let span = &self.series.candles()[start_index..=end_index];

        let pattern_high = span.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let pattern_low = span.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);

        Coordinates::PatternRange {
            start_index,
            end_index,
            start_time: span[0].timestamp,
            end_time: span[span.len() - 1].timestamp,
            pattern_high,
            pattern_low,
            highlight_color: color.into(),
            pattern_name: pattern_name.to_string(),
        }
    }

    /// Single-candle highlight carrying the candle's own OHLC.
    pub fn candlestick_highlight(&self, index: usize) -> Coordinates {
        let index = index.min(self.series.len() - 1);
        let c = &self.series.candles()[index];
        Coordinates::CandlestickHighlight {
            index,
            timestamp: c.timestamp,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
        }
    }

    /// Horizontal price level spanning `[start_index, end_index]`.
    pub fn horizontal_line(
        &self,
        level: f64,
        start_index: usize,
        end_index: usize,
    ) -> Coordinates {
        let last = self.series.len() - 1;
        let end_index = end_index.min(last);
        let start_index = start_index.min(end_index);
        Coordinates::HorizontalLine {
            level,
            start_time: self.series.candles()[start_index].timestamp,
            end_time: self.series.candles()[end_index].timestamp,
        }
    }

    /// Two moving-average values spanning `[start_index, end_index]`.
    pub fn trend_lines(
        &self,
        sma_short: f64,
        sma_long: f64,
        start_index: usize,
        end_index: usize,
    ) -> Coordinates {
        let last = self.series.len() - 1;
        let end_index = end_index.min(last);
        let start_index = start_index.min(end_index);
        Coordinates::TrendLines {
            sma_short,
            sma_long,
            start_time: self.series.candles()[start_index].timestamp,
            end_time: self.series.candles()[end_index].timestamp,
        }
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Candle, Timeframe};
    use chrono::TimeZone;

    fn series() -> CandleSeries {
        let candles = (0..10)
            .map(|i| {
                let ts = Utc.timestamp_opt(1_700_000_000 + i * 86_400, 0).unwrap();
                let base = 100.0 + i as f64;
                Candle::new(ts, base, base + 2.0, base - 2.0, base + 1.0, 1000.0)
            })
            .collect();
        CandleSeries::build(candles, Timeframe::D1).unwrap()
    }

    #[test]
    fn test_pattern_range_span_high_low() {
        let s = series();
        let b = CoordinateBuilder::new(&s);
        let coords = b.pattern_range(2, 4, "Morning Star", BULLISH_COLOR);
        match coords {
            Coordinates::PatternRange {
                start_index,
                end_index,
                pattern_high,
                pattern_low,
                ..
            } => {
                assert_eq!(start_index, 2);
                assert_eq!(end_index, 4);
                assert_eq!(pattern_high, 106.0);
                assert_eq!(pattern_low, 100.0);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_pattern_range_clamps_out_of_bounds() {
        let s = series();
        let b = CoordinateBuilder::new(&s);
        let coords = b.pattern_range(8, 99, "Doji", NEUTRAL_COLOR);
        match coords {
            Coordinates::PatternRange { end_index, .. } => assert_eq!(end_index, 9),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_candlestick_highlight_carries_ohlc() {
        let s = series();
        let coords = CoordinateBuilder::new(&s).candlestick_highlight(3);
        match coords {
            Coordinates::CandlestickHighlight {
                index, open, close, ..
            } => {
                assert_eq!(index, 3);
                assert_eq!(open, 103.0);
                assert_eq!(close, 104.0);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_volume_color_defaults_for_unknown_key() {
        assert_eq!(volume_color("spike"), "#FF6B6B");
        assert_eq!(volume_color("not-a-pattern"), DEFAULT_COLOR);
    }

    #[test]
    fn test_candle_color_by_name() {
        assert_eq!(candle_color("Hammer"), BULLISH_COLOR);
        assert_eq!(candle_color("Shooting Star"), BEARISH_COLOR);
        assert_eq!(candle_color("Doji"), NEUTRAL_COLOR);
    }

    #[test]
    fn test_serde_tag_shapes() {
        let s = series();
        let coords = CoordinateBuilder::new(&s).horizontal_line(98.0, 0, 9);
        let json = serde_json::to_value(&coords).unwrap();
        assert_eq!(json["type"], "horizontal_line");
        assert_eq!(json["level"], 98.0);
    }
}
