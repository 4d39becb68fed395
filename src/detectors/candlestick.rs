//! Candlestick-family detectors.
//!
//! Each detector scans the whole series and reports the most recent
//! occurrence of its shape. Single-bar reversal shapes (hammer family) also
//! require the prior 5-bar close trend to point the right way; pure shape
//! patterns (doji variants, marubozu, spinning top) do not.

use crate::coords::{candle_color, CoordinateBuilder};
use crate::detectors::helpers::{
    prior_close_trend, DOJI_BODY_RATIO, LONG_WICK_RANGE_RATIO, MARUBOZU_BODY_RATIO,
    SPINNING_TOP_BODY_RATIO, STAR_BODY_RATIO, WICK_DOMINANT_RATIO,
};
use crate::series::{Candle, CandleSeries};
use crate::{Category, Detector, Direction, PatternMatch};

/// Trailing window for the prior-trend context of reversal shapes.
const TREND_CONTEXT: usize = 5;

impl_with_defaults!(
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
);

fn single_bar_match(
    series: &CandleSeries,
    name: &'static str,
    confidence: u8,
    direction: Direction,
    index: usize,
    description: String,
) -> PatternMatch {
    PatternMatch {
        name: name.into(),
        category: Category::Candle,
        confidence,
        direction,
        index,
        coordinates: CoordinateBuilder::new(series).candlestick_highlight(index),
        description,
    }
}

fn multi_bar_match(
    series: &CandleSeries,
    name: &'static str,
    confidence: u8,
    direction: Direction,
    start: usize,
    end: usize,
    description: String,
) -> PatternMatch {
    let coords = CoordinateBuilder::new(series).pattern_range(start, end, name, candle_color(name));
    PatternMatch {
        name: name.into(),
        category: Category::Candle,
        confidence,
        direction,
        index: end,
        coordinates: coords,
        description,
    }
}

/// Latest-occurrence scan: walks backward and keeps the first hit.
fn scan_latest(
    series: &CandleSeries,
    bars: usize,
    mut at: impl FnMut(usize) -> Option<PatternMatch>,
) -> Vec<PatternMatch> {
    if series.len() < bars {
        return vec![];
    }
    ((bars - 1)..series.len())
        .rev()
        .find_map(|i| at(i))
        .into_iter()
        .collect()
}

// ============================================================
// SHAPE PREDICATES
// ============================================================

fn is_doji(c: &Candle) -> bool {
    c.range() > 0.0 && c.body() <= DOJI_BODY_RATIO * c.range()
}

/// Hammer-family shape: one wick at least twice the body, the other no
/// larger than the body.
fn wick_dominant_shape(c: &Candle, long_lower: bool) -> bool {
    let body = c.body();
    if body <= 0.0 || c.range() <= 0.0 {
        return false;
    }
    let (long, short) = if long_lower {
        (c.lower_wick(), c.upper_wick())
    } else {
        (c.upper_wick(), c.lower_wick())
    };
    long >= WICK_DOMINANT_RATIO * body && short <= body
}

fn body_midpoint(c: &Candle) -> f64 {
    (c.open + c.close) / 2.0
}

fn body_engulfs(outer: &Candle, inner: &Candle) -> bool {
    outer.open.max(outer.close) > inner.open.max(inner.close)
        && outer.open.min(outer.close) < inner.open.min(inner.close)
}

// ============================================================
// DOJI FAMILY
// ============================================================

/// Doji: body at most 10% of the bar's range. Indecision, neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct DojiDetector;

impl Detector for DojiDetector {
    fn name(&self) -> &'static str {
        "Doji"
    }

    fn min_len(&self) -> usize {
        1
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 1, |i| {
            let c = &series.candles()[i];
            is_doji(c).then(|| {
                single_bar_match(
                    series,
                    self.name(),
                    70,
                    Direction::Neutral,
                    i,
                    "Open and close nearly equal, market undecided".to_string(),
                )
            })
        }))
    }
}

/// Dragonfly Doji: doji with a long lower wick and almost no upper wick.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragonflyDojiDetector;

impl Detector for DragonflyDojiDetector {
    fn name(&self) -> &'static str {
        "Dragonfly Doji"
    }

    fn min_len(&self) -> usize {
        1
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 1, |i| {
            let c = &series.candles()[i];
            let shape = is_doji(c)
                && c.lower_wick() >= LONG_WICK_RANGE_RATIO * c.range()
                && c.upper_wick() <= DOJI_BODY_RATIO * c.range();
            shape.then(|| {
                single_bar_match(
                    series,
                    self.name(),
                    80,
                    Direction::Bullish,
                    i,
                    "Sellers pushed down and were fully absorbed".to_string(),
                )
            })
        }))
    }
}

/// Gravestone Doji: doji with a long upper wick and almost no lower wick.
#[derive(Debug, Clone, Copy, Default)]
pub struct GravestoneDojiDetector;

impl Detector for GravestoneDojiDetector {
    fn name(&self) -> &'static str {
        "Gravestone Doji"
    }

    fn min_len(&self) -> usize {
        1
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 1, |i| {
            let c = &series.candles()[i];
            let shape = is_doji(c)
                && c.upper_wick() >= LONG_WICK_RANGE_RATIO * c.range()
                && c.lower_wick() <= DOJI_BODY_RATIO * c.range();
            shape.then(|| {
                single_bar_match(
                    series,
                    self.name(),
                    80,
                    Direction::Bearish,
                    i,
                    "Buyers pushed up and were fully rejected".to_string(),
                )
            })
        }))
    }
}

// ============================================================
// HAMMER FAMILY (shape + prior trend context)
// ============================================================

macro_rules! hammer_family {
    ($detector:ident, $name:literal, $confidence:literal, $direction:expr,
     $long_lower:literal, $downtrend:literal, $description:literal) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $detector;

        impl Detector for $detector {
            fn name(&self) -> &'static str {
                $name
            }

            fn min_len(&self) -> usize {
                3
            }

            fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
                Ok(scan_latest(series, 3, |i| {
                    let c = &series.candles()[i];
                    if !wick_dominant_shape(c, $long_lower) {
                        return None;
                    }
                    let trend = prior_close_trend(series, i, TREND_CONTEXT);
                    let in_context = if $downtrend { trend < 0.0 } else { trend > 0.0 };
                    in_context.then(|| {
                        single_bar_match(
                            series,
                            $name,
                            $confidence,
                            $direction,
                            i,
                            $description.to_string(),
                        )
                    })
                }))
            }
        }
    };
}

hammer_family!(
    HammerDetector,
    "Hammer",
    75,
    Direction::Bullish,
    true,
    true,
    "Long lower wick after a decline"
);
hammer_family!(
    HangingManDetector,
    "Hanging Man",
    75,
    Direction::Bearish,
    true,
    false,
    "Hammer shape after an advance"
);
hammer_family!(
    InvertedHammerDetector,
    "Inverted Hammer",
    72,
    Direction::Bullish,
    false,
    true,
    "Long upper wick after a decline"
);
hammer_family!(
    ShootingStarDetector,
    "Shooting Star",
    80,
    Direction::Bearish,
    false,
    false,
    "Long upper wick after an advance"
);

// ============================================================
// OTHER SINGLE-BAR SHAPES
// ============================================================

/// Marubozu: body covering at least 95% of the range. Conviction in the
/// body's direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarubozuDetector;

impl Detector for MarubozuDetector {
    fn name(&self) -> &'static str {
        "Marubozu"
    }

    fn min_len(&self) -> usize {
        1
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 1, |i| {
            let c = &series.candles()[i];
            let shape = c.range() > 0.0 && c.body() >= MARUBOZU_BODY_RATIO * c.range();
            shape.then(|| {
                let direction = if c.is_bullish() {
                    Direction::Bullish
                } else {
                    Direction::Bearish
                };
                single_bar_match(
                    series,
                    self.name(),
                    85,
                    direction,
                    i,
                    "Full-body bar with no meaningful wicks".to_string(),
                )
            })
        }))
    }
}

/// Spinning Top: small body with wicks on both sides, but not a doji.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinningTopDetector;

impl Detector for SpinningTopDetector {
    fn name(&self) -> &'static str {
        "Spinning Top"
    }

    fn min_len(&self) -> usize {
        1
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 1, |i| {
            let c = &series.candles()[i];
            let body = c.body();
            let shape = c.range() > 0.0
                && !is_doji(c)
                && body <= SPINNING_TOP_BODY_RATIO * c.range()
                && c.upper_wick() > body
                && c.lower_wick() > body;
            shape.then(|| {
                single_bar_match(
                    series,
                    self.name(),
                    65,
                    Direction::Neutral,
                    i,
                    "Small body, wicks both sides".to_string(),
                )
            })
        }))
    }
}

// ============================================================
// TWO-BAR PATTERNS
// ============================================================

/// Engulfing: a bar whose body fully contains the previous opposite-color
/// body. Emits "Bullish Engulfing" or "Bearish Engulfing".
#[derive(Debug, Clone, Copy, Default)]
pub struct EngulfingDetector;

impl Detector for EngulfingDetector {
    fn name(&self) -> &'static str {
        "Engulfing"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 2, |i| {
            let prev = &series.candles()[i - 1];
            let cur = &series.candles()[i];
            if !body_engulfs(cur, prev) {
                return None;
            }
            let (name, direction) = if prev.is_bearish() && cur.is_bullish() {
                ("Bullish Engulfing", Direction::Bullish)
            } else if prev.is_bullish() && cur.is_bearish() {
                ("Bearish Engulfing", Direction::Bearish)
            } else {
                return None;
            };
            Some(multi_bar_match(
                series,
                name,
                85,
                direction,
                i - 1,
                i,
                "Body fully engulfing the prior bar".to_string(),
            ))
        }))
    }
}

/// Harami: a small body contained inside the previous opposite-color body.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaramiDetector;

impl Detector for HaramiDetector {
    fn name(&self) -> &'static str {
        "Harami Pattern"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 2, |i| {
            let prev = &series.candles()[i - 1];
            let cur = &series.candles()[i];
            if !body_engulfs(prev, cur) {
                return None;
            }
            let direction = if prev.is_bearish() && cur.is_bullish() {
                Direction::Bullish
            } else if prev.is_bullish() && cur.is_bearish() {
                Direction::Bearish
            } else {
                return None;
            };
            Some(multi_bar_match(
                series,
                self.name(),
                70,
                direction,
                i - 1,
                i,
                "Small body inside the prior bar".to_string(),
            ))
        }))
    }
}

/// Piercing Pattern: bullish bar opening below a bearish bar's close and
/// closing above its body midpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiercingDetector;

impl Detector for PiercingDetector {
    fn name(&self) -> &'static str {
        "Piercing Pattern"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 2, |i| {
            let prev = &series.candles()[i - 1];
            let cur = &series.candles()[i];
            let shape = prev.is_bearish()
                && cur.is_bullish()
                && cur.open < prev.close
                && cur.close > body_midpoint(prev)
                && cur.close < prev.open;
            shape.then(|| {
                multi_bar_match(
                    series,
                    self.name(),
                    80,
                    Direction::Bullish,
                    i - 1,
                    i,
                    "Gap down reclaimed past the prior midpoint".to_string(),
                )
            })
        }))
    }
}

/// Dark Cloud Cover: bearish mirror of the piercing pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkCloudCoverDetector;

impl Detector for DarkCloudCoverDetector {
    fn name(&self) -> &'static str {
        "Dark Cloud Cover"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 2, |i| {
            let prev = &series.candles()[i - 1];
            let cur = &series.candles()[i];
            let shape = prev.is_bullish()
                && cur.is_bearish()
                && cur.open > prev.close
                && cur.close < body_midpoint(prev)
                && cur.close > prev.open;
            shape.then(|| {
                multi_bar_match(
                    series,
                    self.name(),
                    80,
                    Direction::Bearish,
                    i - 1,
                    i,
                    "Gap up sold down past the prior midpoint".to_string(),
                )
            })
        }))
    }
}

// ============================================================
// THREE-BAR PATTERNS
// ============================================================

fn star_shape(a: &Candle, b: &Candle, c: &Candle, bullish: bool) -> bool {
    let first_ok = if bullish { a.is_bearish() } else { a.is_bullish() };
    let third_ok = if bullish { c.is_bullish() } else { c.is_bearish() };
    if !first_ok || !third_ok || a.body() <= 0.0 {
        return false;
    }
    if b.body() > STAR_BODY_RATIO * a.body() {
        return false;
    }
    if bullish {
        c.close > body_midpoint(a)
    } else {
        c.close < body_midpoint(a)
    }
}

/// Morning Star: long bearish bar, small-bodied star, bullish bar closing
/// above the first bar's midpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct MorningStarDetector;

impl Detector for MorningStarDetector {
    fn name(&self) -> &'static str {
        "Morning Star"
    }

    fn min_len(&self) -> usize {
        3
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 3, |i| {
            let c = series.candles();
            star_shape(&c[i - 2], &c[i - 1], &c[i], true).then(|| {
                multi_bar_match(
                    series,
                    self.name(),
                    90,
                    Direction::Bullish,
                    i - 2,
                    i,
                    "Decline, pause, strong recovery".to_string(),
                )
            })
        }))
    }
}

/// Evening Star: bearish mirror of the morning star.
#[derive(Debug, Clone, Copy, Default)]
pub struct EveningStarDetector;

impl Detector for EveningStarDetector {
    fn name(&self) -> &'static str {
        "Evening Star"
    }

    fn min_len(&self) -> usize {
        3
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 3, |i| {
            let c = series.candles();
            star_shape(&c[i - 2], &c[i - 1], &c[i], false).then(|| {
                multi_bar_match(
                    series,
                    self.name(),
                    90,
                    Direction::Bearish,
                    i - 2,
                    i,
                    "Advance, pause, strong selloff".to_string(),
                )
            })
        }))
    }
}

fn three_in_a_row(c: &[Candle], i: usize, bullish: bool) -> bool {
    let bars = [&c[i - 2], &c[i - 1], &c[i]];
    for bar in bars {
        let color_ok = if bullish { bar.is_bullish() } else { bar.is_bearish() };
        if !color_ok || bar.range() <= 0.0 || bar.body() < 0.5 * bar.range() {
            return false;
        }
    }
    for pair in bars.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let progressing = if bullish { b.close > a.close } else { b.close < a.close };
        let opens_inside = b.open > a.open.min(a.close) && b.open < a.open.max(a.close);
        if !progressing || !opens_inside {
            return false;
        }
    }
    true
}

/// Three White Soldiers: three solid bullish bars, each opening inside the
/// prior body and closing higher.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeWhiteSoldiersDetector;

impl Detector for ThreeWhiteSoldiersDetector {
    fn name(&self) -> &'static str {
        "Three White Soldiers"
    }

    fn min_len(&self) -> usize {
        3
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 3, |i| {
            three_in_a_row(series.candles(), i, true).then(|| {
                multi_bar_match(
                    series,
                    self.name(),
                    85,
                    Direction::Bullish,
                    i - 2,
                    i,
                    "Three consecutive solid advances".to_string(),
                )
            })
        }))
    }
}

/// Three Black Crows: bearish mirror of the three white soldiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreeBlackCrowsDetector;

impl Detector for ThreeBlackCrowsDetector {
    fn name(&self) -> &'static str {
        "Three Black Crows"
    }

    fn min_len(&self) -> usize {
        3
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        Ok(scan_latest(series, 3, |i| {
            three_in_a_row(series.candles(), i, false).then(|| {
                multi_bar_match(
                    series,
                    self.name(),
                    85,
                    Direction::Bearish,
                    i - 2,
                    i,
                    "Three consecutive solid declines".to_string(),
                )
            })
        }))
    }
}

// ============================================================
// TESTS
// ============================================================
