//! Volume-family detectors.
//!
//! Every rule reads the latest bar (or a short trailing window) against the
//! series' rolling volume statistics. Thresholds and confidence constants are
//! part of the crate contract and documented on each detector.

use crate::coords::{volume_color, CoordinateBuilder};
use crate::detectors::helpers::{
    accumulation_distribution, close_trend, confidence, mean_volume, on_balance_volume,
    trailing_trend, volume_price_trend, volume_trend,
};
use crate::series::CandleSeries;
use crate::{Category, Detector, Direction, PatternMatch};

/// Rolling window for the volume moving average and extrema.
pub const VOLUME_WINDOW: usize = 20;

impl_with_defaults!(
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
);

fn direction_of(pct: f64) -> Direction {
    if pct > 0.0 {
        Direction::Bullish
    } else if pct < 0.0 {
        Direction::Bearish
    } else {
        Direction::Neutral
    }
}

fn volume_match(
    series: &CandleSeries,
    name: &'static str,
    slug: &str,
    confidence: u8,
    direction: Direction,
    start: usize,
    end: usize,
    description: String,
) -> PatternMatch {
    let coords = CoordinateBuilder::new(series).pattern_range(start, end, name, volume_color(slug));
    PatternMatch {
        name: name.into(),
        category: Category::Volume,
        confidence,
        direction,
        index: end,
        coordinates: coords,
        description,
    }
}

// ============================================================
// SINGLE-BAR RULES
// ============================================================

/// Volume Spike: latest volume more than `ratio_threshold` times its 20-bar
/// rolling mean. Confidence scales with the ratio, capped at 85.
#[derive(Debug, Clone, Copy)]
pub struct VolumeSpikeDetector {
    pub ratio_threshold: f64,
}

impl Default for VolumeSpikeDetector {
    fn default() -> Self {
        Self { ratio_threshold: 2.0 }
    }
}

impl Detector for VolumeSpikeDetector {
    fn name(&self) -> &'static str {
        "Volume Spike"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let i = series.len() - 1;
        let vma = series.rolling_volume_mean(VOLUME_WINDOW)[i];
        if vma <= 0.0 {
            return Ok(vec![]);
        }
        let ratio = series.last().volume / vma;
        if ratio <= self.ratio_threshold {
            return Ok(vec![]);
        }
        let pct = series.percent_change()[i];
        Ok(vec![volume_match(
            series,
            self.name(),
            "spike",
            confidence((ratio * 30.0).min(85.0)),
            direction_of(pct),
            i,
            i,
            format!("Volume {ratio:.1}x its {VOLUME_WINDOW}-bar average"),
        )])
    }
}

/// Volume Breakout: close at or within 1% of the 20-bar high on volume more
/// than 1.5x the rolling mean.
#[derive(Debug, Clone, Copy)]
pub struct VolumeBreakoutDetector {
    pub high_fraction: f64,
    pub volume_ratio: f64,
}

impl Default for VolumeBreakoutDetector {
    fn default() -> Self {
        Self {
            high_fraction: 0.99,
            volume_ratio: 1.5,
        }
    }
}

impl Detector for VolumeBreakoutDetector {
    fn name(&self) -> &'static str {
        "Volume Breakout"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let i = series.len() - 1;
        let last = series.last();
        let hi = series.rolling_high_max(VOLUME_WINDOW)[i];
        let vma = series.rolling_volume_mean(VOLUME_WINDOW)[i];
        if vma <= 0.0 || last.close < self.high_fraction * hi || last.volume <= self.volume_ratio * vma
        {
            return Ok(vec![]);
        }
        Ok(vec![volume_match(
            series,
            self.name(),
            "breakout",
            80,
            Direction::Bullish,
            i,
            i,
            format!("Close at the {VOLUME_WINDOW}-bar high on elevated volume"),
        )])
    }
}

/// Volume Climax: latest volume at (or within 5% of) the 20-bar maximum while
/// the close moves more than 3%. Read as exhaustion, so the direction is the
/// reverse of the move.
#[derive(Debug, Clone, Copy)]
pub struct VolumeClimaxDetector {
    pub max_fraction: f64,
    pub min_move: f64,
}

impl Default for VolumeClimaxDetector {
    fn default() -> Self {
        Self {
            max_fraction: 0.95,
            min_move: 0.03,
        }
    }
}

impl Detector for VolumeClimaxDetector {
    fn name(&self) -> &'static str {
        "Volume Climax"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let i = series.len() - 1;
        let vmax = series.rolling_volume_max(VOLUME_WINDOW)[i];
        let pct = series.percent_change()[i];
        if series.last().volume < self.max_fraction * vmax || pct.abs() <= self.min_move {
            return Ok(vec![]);
        }
        let direction = match direction_of(pct) {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
            other => other,
        };
        Ok(vec![volume_match(
            series,
            self.name(),
            "climax",
            82,
            direction,
            i,
            i,
            format!("Peak volume with a {:.1}% move, likely exhaustion", pct * 100.0),
        )])
    }
}

/// Volume Thrust: more than 2.5x average volume with a close up more than 4%.
#[derive(Debug, Clone, Copy)]
pub struct VolumeThrustDetector {
    pub volume_ratio: f64,
    pub min_gain: f64,
}

impl Default for VolumeThrustDetector {
    fn default() -> Self {
        Self {
            volume_ratio: 2.5,
            min_gain: 0.04,
        }
    }
}

impl Detector for VolumeThrustDetector {
    fn name(&self) -> &'static str {
        "Volume Thrust"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let i = series.len() - 1;
        let vma = series.rolling_volume_mean(VOLUME_WINDOW)[i];
        let pct = series.percent_change()[i];
        if vma <= 0.0 || series.last().volume <= self.volume_ratio * vma || pct <= self.min_gain {
            return Ok(vec![]);
        }
        Ok(vec![volume_match(
            series,
            self.name(),
            "thrust",
            88,
            Direction::Bullish,
            i,
            i,
            format!("Strong upward thrust: +{:.1}% on heavy volume", pct * 100.0),
        )])
    }
}

/// High Volume Reversal: heavy volume on a bar whose percent change flips
/// sign against the previous bar with magnitude above 2%.
#[derive(Debug, Clone, Copy)]
pub struct HighVolumeReversalDetector {
    pub volume_ratio: f64,
    pub min_move: f64,
}

impl Default for HighVolumeReversalDetector {
    fn default() -> Self {
        Self {
            volume_ratio: 1.8,
            min_move: 0.02,
        }
    }
}

impl Detector for HighVolumeReversalDetector {
    fn name(&self) -> &'static str {
        "High Volume Reversal"
    }

    fn min_len(&self) -> usize {
        3
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let i = series.len() - 1;
        let vma = series.rolling_volume_mean(VOLUME_WINDOW)[i];
        let pct = series.percent_change();
        let (cur, prev) = (pct[i], pct[i - 1]);
        let flipped = cur * prev < 0.0;
        if vma <= 0.0
            || series.last().volume <= self.volume_ratio * vma
            || !flipped
            || cur.abs() <= self.min_move
        {
            return Ok(vec![]);
        }
        Ok(vec![volume_match(
            series,
            self.name(),
            "reversal",
            85,
            direction_of(cur),
            i,
            i,
            format!("Direction flip to {:+.1}% on heavy volume", cur * 100.0),
        )])
    }
}

/// Heavy Volume Rejection: heavy volume on a bar dominated by one wick,
/// reading as a rejected probe. Upper wick rejects higher prices (bearish),
/// lower wick rejects lower prices (bullish).
#[derive(Debug, Clone, Copy)]
pub struct HeavyVolumeRejectionDetector {
    pub volume_ratio: f64,
    pub wick_body_ratio: f64,
}

impl Default for HeavyVolumeRejectionDetector {
    fn default() -> Self {
        Self {
            volume_ratio: 1.5,
            wick_body_ratio: 2.0,
        }
    }
}

impl Detector for HeavyVolumeRejectionDetector {
    fn name(&self) -> &'static str {
        "Heavy Volume Rejection"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let i = series.len() - 1;
        let last = series.last();
        let vma = series.rolling_volume_mean(VOLUME_WINDOW)[i];
        if vma <= 0.0 || last.volume <= self.volume_ratio * vma {
            return Ok(vec![]);
        }
        let body = last.body();
        let (upper, lower) = (last.upper_wick(), last.lower_wick());
        let dominant = upper.max(lower);
        if dominant <= self.wick_body_ratio * body {
            return Ok(vec![]);
        }
        let (direction, side) = if upper >= lower {
            (Direction::Bearish, "upper")
        } else {
            (Direction::Bullish, "lower")
        };
        Ok(vec![volume_match(
            series,
            self.name(),
            "rejection",
            80,
            direction,
            i,
            i,
            format!("Long {side} wick on heavy volume"),
        )])
    }
}

// ============================================================
// SHORT-WINDOW RULES
// ============================================================

/// Volume Confirmation: rising volume over the last 3 bars while price is
/// trending in either direction. Confirms the price move.
#[derive(Debug, Clone, Copy)]
pub struct VolumeConfirmationDetector {
    pub window: usize,
}

impl Default for VolumeConfirmationDetector {
    fn default() -> Self {
        Self { window: 3 }
    }
}

impl Detector for VolumeConfirmationDetector {
    fn name(&self) -> &'static str {
        "Volume Confirmation"
    }

    fn min_len(&self) -> usize {
        4
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let price = close_trend(series, self.window);
        let volume = volume_trend(series, self.window);
        if volume <= 0.0 || price == 0.0 {
            return Ok(vec![]);
        }
        let i = series.len() - 1;
        Ok(vec![volume_match(
            series,
            self.name(),
            "confirmation",
            78,
            direction_of(price),
            (i + 1).saturating_sub(self.window),
            i,
            "Rising volume confirming the price move".to_string(),
        )])
    }
}

/// Low Volume Pullback: price and volume both falling over 5 bars with the
/// latest volume well below average. A shallow dip, not distribution.
#[derive(Debug, Clone, Copy)]
pub struct LowVolumePullbackDetector {
    pub window: usize,
    pub volume_ratio: f64,
}

impl Default for LowVolumePullbackDetector {
    fn default() -> Self {
        Self {
            window: 5,
            volume_ratio: 0.7,
        }
    }
}

impl Detector for LowVolumePullbackDetector {
    fn name(&self) -> &'static str {
        "Low Volume Pullback"
    }

    fn min_len(&self) -> usize {
        6
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let i = series.len() - 1;
        let vma = series.rolling_volume_mean(VOLUME_WINDOW)[i];
        let price = close_trend(series, self.window);
        let volume = volume_trend(series, self.window);
        if price >= 0.0 || volume >= 0.0 || vma <= 0.0 || series.last().volume >= self.volume_ratio * vma
        {
            return Ok(vec![]);
        }
        Ok(vec![volume_match(
            series,
            self.name(),
            "pullback",
            70,
            Direction::Bullish,
            (i + 1).saturating_sub(self.window),
            i,
            "Price drifting lower on fading volume".to_string(),
        )])
    }
}

/// Volume Divergence: 5-bar price and volume trends point in opposite
/// directions. The move lacks participation, so the expected resolution is
/// against the price trend.
#[derive(Debug, Clone, Copy)]
pub struct VolumeDivergenceDetector {
    pub window: usize,
}

impl Default for VolumeDivergenceDetector {
    fn default() -> Self {
        Self { window: 5 }
    }
}

impl Detector for VolumeDivergenceDetector {
    fn name(&self) -> &'static str {
        "Volume Divergence"
    }

    fn min_len(&self) -> usize {
        10
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let price = close_trend(series, self.window);
        let volume = volume_trend(series, self.window);
        if price * volume >= 0.0 {
            return Ok(vec![]);
        }
        let direction = match direction_of(price) {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
            other => other,
        };
        let i = series.len() - 1;
        Ok(vec![volume_match(
            series,
            self.name(),
            "divergence",
            72,
            direction,
            (i + 1).saturating_sub(self.window),
            i,
            "Price and volume trends disagree".to_string(),
        )])
    }
}

// ============================================================
// VOLUME-REGIME RULES
// ============================================================

/// Volume Drying Up: mean volume of the last 5 bars below 60% of the mean of
/// the 15 bars before them.
#[derive(Debug, Clone, Copy)]
pub struct VolumeDryingUpDetector {
    pub recent: usize,
    pub ratio: f64,
}

impl Default for VolumeDryingUpDetector {
    fn default() -> Self {
        Self {
            recent: 5,
            ratio: 0.6,
        }
    }
}

impl Detector for VolumeDryingUpDetector {
    fn name(&self) -> &'static str {
        "Volume Drying Up"
    }

    fn min_len(&self) -> usize {
        10
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let n = series.len();
        let split = n.saturating_sub(self.recent);
        let prior_start = n.saturating_sub(VOLUME_WINDOW).min(split);
        let recent = mean_volume(&series.candles()[split..]);
        let prior = mean_volume(&series.candles()[prior_start..split]);
        if prior <= 0.0 || recent >= self.ratio * prior {
            return Ok(vec![]);
        }
        Ok(vec![volume_match(
            series,
            self.name(),
            "drying",
            68,
            Direction::Neutral,
            split,
            n - 1,
            "Participation fading ahead of a potential break".to_string(),
        )])
    }
}

/// Volume Expansion: mean volume of the last 5 bars above 140% of the mean of
/// the 15 bars before them. Direction follows the 5-bar price trend.
#[derive(Debug, Clone, Copy)]
pub struct VolumeExpansionDetector {
    pub recent: usize,
    pub ratio: f64,
}

impl Default for VolumeExpansionDetector {
    fn default() -> Self {
        Self {
            recent: 5,
            ratio: 1.4,
        }
    }
}

impl Detector for VolumeExpansionDetector {
    fn name(&self) -> &'static str {
        "Volume Expansion"
    }

    fn min_len(&self) -> usize {
        10
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let n = series.len();
        let split = n.saturating_sub(self.recent);
        let prior_start = n.saturating_sub(VOLUME_WINDOW).min(split);
        let recent = mean_volume(&series.candles()[split..]);
        let prior = mean_volume(&series.candles()[prior_start..split]);
        if prior <= 0.0 || recent <= self.ratio * prior {
            return Ok(vec![]);
        }
        Ok(vec![volume_match(
            series,
            self.name(),
            "expansion",
            75,
            direction_of(close_trend(series, self.recent)),
            split,
            n - 1,
            "Participation expanding into the move".to_string(),
        )])
    }
}

/// Volume Contraction: the last 5 volumes form a non-increasing sequence.
#[derive(Debug, Clone, Copy)]
pub struct VolumeContractionDetector {
    pub window: usize,
}

impl Default for VolumeContractionDetector {
    fn default() -> Self {
        Self { window: 5 }
    }
}

impl Detector for VolumeContractionDetector {
    fn name(&self) -> &'static str {
        "Volume Contraction"
    }

    fn min_len(&self) -> usize {
        10
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let n = series.len();
        let start = n.saturating_sub(self.window);
        let tail = &series.candles()[start..];
        if tail.len() < 2 || tail.windows(2).any(|p| p[1].volume > p[0].volume) {
            return Ok(vec![]);
        }
        Ok(vec![volume_match(
            series,
            self.name(),
            "contraction",
            65,
            Direction::Neutral,
            start,
            n - 1,
            "Volume contracting bar over bar".to_string(),
        )])
    }
}

// ============================================================
// CUMULATIVE-INDICATOR RULES
// ============================================================

/// Accumulation/Distribution: the A/D line's 5-bar trend agrees with the
/// price trend. Agreement up emits "Accumulation Pattern", agreement down
/// "Distribution Pattern".
#[derive(Debug, Clone, Copy)]
pub struct AccumulationDistributionDetector {
    pub window: usize,
}

impl Default for AccumulationDistributionDetector {
    fn default() -> Self {
        Self { window: 5 }
    }
}

impl Detector for AccumulationDistributionDetector {
    fn name(&self) -> &'static str {
        "Accumulation/Distribution"
    }

    fn min_len(&self) -> usize {
        10
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let ad = accumulation_distribution(series);
        let ad_trend = trailing_trend(&ad, self.window);
        let price = close_trend(series, self.window);
        let i = series.len() - 1;
        let start = (i + 1).saturating_sub(self.window);

        let (name, slug, direction) = if ad_trend > 0.0 && price > 0.0 {
            ("Accumulation Pattern", "accumulation", Direction::Bullish)
        } else if ad_trend < 0.0 && price < 0.0 {
            ("Distribution Pattern", "distribution", Direction::Bearish)
        } else {
            return Ok(vec![]);
        };
        Ok(vec![volume_match(
            series,
            name,
            slug,
            75,
            direction,
            start,
            i,
            "Money flow agreeing with the price trend".to_string(),
        )])
    }
}

/// OBV trend: on-balance volume's 10-bar trend agrees with the price trend.
#[derive(Debug, Clone, Copy)]
pub struct ObvTrendDetector {
    pub window: usize,
}

impl Default for ObvTrendDetector {
    fn default() -> Self {
        Self { window: 10 }
    }
}

impl Detector for ObvTrendDetector {
    fn name(&self) -> &'static str {
        "OBV Trend"
    }

    fn min_len(&self) -> usize {
        15
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let obv = on_balance_volume(series);
        let obv_trend = trailing_trend(&obv, self.window);
        let price = close_trend(series, self.window);
        let i = series.len() - 1;
        let start = (i + 1).saturating_sub(self.window);

        let (name, direction) = if obv_trend > 0.0 && price > 0.0 {
            ("OBV Bullish Trend", Direction::Bullish)
        } else if obv_trend < 0.0 && price < 0.0 {
            ("OBV Bearish Trend", Direction::Bearish)
        } else {
            return Ok(vec![]);
        };
        Ok(vec![volume_match(
            series,
            name,
            "obv_trend",
            77,
            direction,
            start,
            i,
            "On-balance volume tracking the price trend".to_string(),
        )])
    }
}

/// VPT Confirmation: volume-price trend's 10-bar trend agrees with the price
/// trend in either direction.
#[derive(Debug, Clone, Copy)]
pub struct VptConfirmationDetector {
    pub window: usize,
}

impl Default for VptConfirmationDetector {
    fn default() -> Self {
        Self { window: 10 }
    }
}

impl Detector for VptConfirmationDetector {
    fn name(&self) -> &'static str {
        "VPT Confirmation"
    }

    fn min_len(&self) -> usize {
        15
    }

    fn detect(&self, series: &CandleSeries) -> crate::Result<Vec<PatternMatch>> {
        let vpt = volume_price_trend(series);
        let vpt_trend = trailing_trend(&vpt, self.window);
        let price = close_trend(series, self.window);
        if vpt_trend * price <= 0.0 {
            return Ok(vec![]);
        }
        let i = series.len() - 1;
        Ok(vec![volume_match(
            series,
            self.name(),
            "vpt",
            73,
            direction_of(price),
            (i + 1).saturating_sub(self.window),
            i,
            "Volume-price trend confirming the move".to_string(),
        )])
    }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{Candle, Timeframe};
    use chrono::{TimeZone, Utc};

    fn build(bars: Vec<(f64, f64)>) -> CandleSeries {
        let candles = bars
            .into_iter()
            .enumerate()
            .map(|(i, (close, volume))| {
                let ts = Utc.timestamp_opt(1_700_000_000 + i as i64 * 86_400, 0).unwrap();
                // Close sits in the upper half of the bar so money flow is positive.
                Candle::new(ts, close * 0.995, close * 1.005, close * 0.99, close, volume)
            })
            .collect();
        CandleSeries::build(candles, Timeframe::D1).unwrap()
    }

    fn flat_market(n: usize) -> Vec<(f64, f64)> {
        (0..n).map(|_| (100.0, 1000.0)).collect()
    }

    #[test]
    fn test_volume_spike_fires_on_triple_volume() {
        let mut bars = flat_market(29);
        bars.push((104.0, 3000.0));
        let matches = VolumeSpikeDetector::with_defaults().detect(&build(bars)).unwrap();
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.name, "Volume Spike");
        assert_eq!(m.direction, Direction::Bullish);
        assert!(m.confidence >= 50);
        assert_eq!(m.index, 29);
    }

    #[test]
    fn test_volume_spike_quiet_market_is_silent() {
        let matches = VolumeSpikeDetector::with_defaults()
            .detect(&build(flat_market(30)))
            .unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_volume_spike_confidence_caps_at_85() {
        let mut bars = flat_market(29);
        bars.push((104.0, 50_000.0));
        let matches = VolumeSpikeDetector::with_defaults().detect(&build(bars)).unwrap();
        assert_eq!(matches[0].confidence, 85);
    }

    #[test]
    fn test_volume_breakout_at_rolling_high() {
        let mut bars = flat_market(29);
        bars.push((102.0, 2000.0));
        let matches = VolumeBreakoutDetector::with_defaults().detect(&build(bars)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, Direction::Bullish);
        assert_eq!(matches[0].confidence, 80);
    }

    #[test]
    fn test_volume_climax_reverses_direction() {
        let mut bars = flat_market(29);
        bars.push((105.0, 4000.0));
        let matches = VolumeClimaxDetector::with_defaults().detect(&build(bars)).unwrap();
        assert_eq!(matches.len(), 1);
        // +5% on climactic volume reads bearish.
        assert_eq!(matches[0].direction, Direction::Bearish);
    }

    #[test]
    fn test_high_volume_reversal_needs_sign_flip() {
        let mut bars = flat_market(27);
        bars.push((97.0, 1000.0));
        bars.push((94.0, 1000.0));
        bars.push((97.5, 4000.0));
        let matches = HighVolumeReversalDetector::with_defaults()
            .detect(&build(bars))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, Direction::Bullish);
    }

    #[test]
    fn test_volume_drying_up() {
        let mut bars: Vec<(f64, f64)> = (0..15).map(|_| (100.0, 2000.0)).collect();
        bars.extend((0..5).map(|_| (100.0, 500.0)));
        let matches = VolumeDryingUpDetector::with_defaults().detect(&build(bars)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, Direction::Neutral);
        assert_eq!(matches[0].confidence, 68);
    }

    #[test]
    fn test_volume_contraction_non_increasing_tail() {
        let mut bars = flat_market(10);
        for v in [900.0, 800.0, 800.0, 700.0, 600.0] {
            bars.push((100.0, v));
        }
        let matches = VolumeContractionDetector::with_defaults()
            .detect(&build(bars))
            .unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_volume_contraction_fires_on_constant_volume() {
        // Constant volume is a non-increasing sequence and counts.
        let matches = VolumeContractionDetector::with_defaults()
            .detect(&build(flat_market(12)))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Volume Contraction");
        assert_eq!(matches[0].direction, Direction::Neutral);
    }

    #[test]
    fn test_custom_window_larger_than_series() {
        // Oversized windows fall back to the bars available instead of
        // underflowing the start index.
        let bars: Vec<(f64, f64)> = (0..6)
            .map(|i| (100.0 + i as f64, 1000.0 + 100.0 * i as f64))
            .collect();
        let detector = VolumeConfirmationDetector { window: 10 };
        let matches = detector.detect(&build(bars)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].index, 5);

        let quiet: Vec<(f64, f64)> = (0..12).map(|_| (100.0, 1000.0)).collect();
        let drying = VolumeDryingUpDetector {
            recent: 25,
            ratio: 0.6,
        };
        assert!(drying.detect(&build(quiet)).unwrap().is_empty());
    }

    #[test]
    fn test_heavy_volume_rejection_upper_wick() {
        let mut candles: Vec<Candle> = build(flat_market(29)).candles().to_vec();
        let ts = Utc.timestamp_opt(1_800_000_000, 0).unwrap();
        // Probe above, slammed back: tall upper wick, tiny body.
        candles.push(Candle::new(ts, 100.0, 112.0, 99.5, 100.5, 3000.0));
        let series = CandleSeries::build(candles, Timeframe::D1).unwrap();

        let matches = HeavyVolumeRejectionDetector::with_defaults().detect(&series).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, Direction::Bearish);
    }

    #[test]
    fn test_divergence_price_up_volume_down() {
        let mut bars: Vec<(f64, f64)> = (0..10).map(|_| (100.0, 1000.0)).collect();
        for i in 0..5 {
            bars.push((101.0 + i as f64, 900.0 - 100.0 * i as f64));
        }
        let matches = VolumeDivergenceDetector::with_defaults().detect(&build(bars)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, Direction::Bearish);
    }

    #[test]
    fn test_obv_bullish_trend() {
        let bars: Vec<(f64, f64)> = (0..20)
            .map(|i| (100.0 + i as f64, 1000.0 + 50.0 * i as f64))
            .collect();
        let matches = ObvTrendDetector::with_defaults().detect(&build(bars)).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "OBV Bullish Trend");
        assert_eq!(matches[0].direction, Direction::Bullish);
    }

    #[test]
    fn test_accumulation_needs_agreement() {
        // Price rising steadily; closes sit near bar highs so money flow is positive.
        let bars: Vec<(f64, f64)> = (0..12).map(|i| (100.0 + i as f64, 1000.0)).collect();
        let matches = AccumulationDistributionDetector::with_defaults()
            .detect(&build(bars))
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Accumulation Pattern");
    }
}
