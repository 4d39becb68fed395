//! Candle synthesis and repair.
//!
//! When the upstream feed returns one sample per period, every bar collapses
//! to open == high == low == close and the chart renders as a scatterplot.
//! The synthesizer rebuilds intraday variation for those bars — and can
//! fabricate a whole series when the feed returns nothing — while keeping the
//! OHLC ordering invariant exact. No economic signal is claimed; only shape
//! constraints are guaranteed.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::series::{Candle, CandleSeries, Timeframe};
use crate::{InvalidSeriesError, SynthesisConfigError};

/// Floor for synthesized and backfilled volume.
pub const DEFAULT_VOLUME: f64 = 1000.0;

/// Hard cap on per-bar volatility so a bar's full range stays under ~20%
/// of its close even on long timeframes.
const MAX_BAR_VOLATILITY: f64 = 0.09;

/// One raw upstream sample awaiting candle synthesis.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: Option<f64>,
}

/// Symbol-specific synthesis configuration.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SynthesisConfig {
    /// Price level the synthesized walk anchors to.
    pub base_price: f64,
    /// Per-bar volatility as a fraction of price, before timeframe scaling.
    pub volatility_fraction: f64,
    /// Number of candles full synthesis produces.
    pub target_count: usize,
    /// Seed for reproducible output; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_price: 100.0,
            volatility_fraction: 0.02,
            target_count: 30,
            seed: None,
        }
    }
}

/// Synthesizes or repairs candle series for one timeframe.
///
/// Random draws come from a per-call generator, so concurrent synthesis
/// never shares mutable state.
#[derive(Debug, Clone)]
pub struct CandleSynthesizer {
    timeframe: Timeframe,
    config: SynthesisConfig,
    bar_volatility: f64,
}

impl CandleSynthesizer {
    pub fn new(
        timeframe: Timeframe,
        config: SynthesisConfig,
    ) -> Result<Self, SynthesisConfigError> {
        if config.target_count < 1 {
            return Err(SynthesisConfigError::TargetCount(config.target_count));
        }
        if !(config.volatility_fraction > 0.0) || !config.volatility_fraction.is_finite() {
            return Err(SynthesisConfigError::Volatility(config.volatility_fraction));
        }
        if !(config.base_price > 0.0) || !config.base_price.is_finite() {
            return Err(SynthesisConfigError::BasePrice(config.base_price));
        }
        let bar_volatility =
            (config.volatility_fraction * timeframe.volatility_scale()).min(MAX_BAR_VOLATILITY);
        Ok(Self {
            timeframe,
            config,
            bar_volatility,
        })
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Per-bar volatility after timeframe scaling and capping.
    pub fn bar_volatility(&self) -> f64 {
        self.bar_volatility
    }

    /// Full synthesis: `target_count` candles ending now.
    pub fn synthesize(&self) -> CandleSeries {
        self.synthesize_ending_at(Utc::now())
    }

    /// Full synthesis anchored so the last candle's timestamp is `end`.
    ///
    /// A bounded random walk starts at the configured base price; each open
    /// is offset from the prior close by a small signed gap, and a mild pull
    /// toward the base price keeps the walk from drifting off into
    /// implausible territory.
    pub fn synthesize_ending_at(&self, end: DateTime<Utc>) -> CandleSeries {
        let mut rng = self.rng();
        let count = self.config.target_count;
        let base = self.config.base_price;
        let v = self.bar_volatility;
        let step_span = self.timeframe.duration();

        let mut candles = Vec::with_capacity(count);
        let mut prev_close = base;
        for i in 0..count {
            let timestamp = end - step_span * ((count - 1 - i) as i32);

            let gap: f64 = rng.gen_range(-0.4 * v..=0.4 * v);
            let open = prev_close * (1.0 + gap);

            let mut step: f64 = rng.gen_range(-0.6 * v..=0.6 * v);
            // Mean reversion toward the anchor price.
            step -= 0.1 * (prev_close / base - 1.0);
            let close = (prev_close * (1.0 + step)).max(base * 0.01);

            let (high, low) = self.bar_spread(open, close, &mut rng);
            let volume =
                fallback_volume(high - low, close, i) * rng.gen_range(0.8..=1.4);

            candles.push(Candle::new(timestamp, open, high, low, close, volume));
            prev_close = close;
        }

        tracing::debug!(
            timeframe = %self.timeframe,
            count,
            base_price = base,
            "synthesized full candle series"
        );
        CandleSeries::from_synthesized(candles, self.timeframe)
    }

    /// Repairs a candle sequence: flat bars get synthesized intraday
    /// variation, non-flat bars pass through untouched, and missing volume
    /// is backfilled with a deterministic positive magnitude.
    ///
    /// Fails only if the input is too short or out of timestamp order.
    pub fn repair(&self, candles: Vec<Candle>) -> Result<CandleSeries, InvalidSeriesError> {
        let mut rng = self.rng();
        let v = self.bar_volatility;
        let mut repaired = 0usize;
        let mut out = Vec::with_capacity(candles.len());
        let mut prev_close: Option<f64> = None;

        for (i, original) in candles.into_iter().enumerate() {
            let mut candle = original;
            if candle.is_flat() && candle.close > 0.0 {
                let close = candle.close;
                let gap: f64 = rng.gen_range(-0.4 * v..=0.4 * v);
                // Open gaps off the previous candle's close, not the current
                // one, so repaired bars connect like a real session.
                let open = match prev_close {
                    Some(prev) => prev * (1.0 + gap),
                    None => close * (1.0 + gap),
                };
                let (high, low) = self.bar_spread(open, close, &mut rng);
                candle = Candle::new(candle.timestamp, open, high, low, close, candle.volume);
                repaired += 1;
            }
            if candle.volume <= 0.0 {
                candle.volume = fallback_volume(candle.range(), candle.close, i);
            }
            prev_close = Some(candle.close);
            out.push(candle);
        }

        if repaired > 0 {
            tracing::debug!(
                timeframe = %self.timeframe,
                repaired,
                total = out.len(),
                "repaired degenerate candles"
            );
        }
        CandleSeries::build(out, self.timeframe)
    }

    /// Lifts raw `(timestamp, price[, volume])` samples to flat candles and
    /// repairs them into a fully shaped series.
    pub fn repair_points(
        &self,
        points: &[PricePoint],
    ) -> Result<CandleSeries, InvalidSeriesError> {
        let flats = points
            .iter()
            .map(|p| {
                Candle::new(
                    p.timestamp,
                    p.price,
                    p.price,
                    p.price,
                    p.price,
                    p.volume.unwrap_or(0.0),
                )
            })
            .collect();
        self.repair(flats)
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Draws the high/low spread around `close`, then re-clamps so the OHLC
    /// ordering invariant holds exactly. With positive volatility and a
    /// positive close the result always has `high > low`.
    fn bar_spread(&self, open: f64, close: f64, rng: &mut StdRng) -> (f64, f64) {
        let v = self.bar_volatility;
        let up: f64 = rng.gen_range(0.2 * v..=v);
        let down: f64 = rng.gen_range(0.2 * v..=v);
        let high = (close * (1.0 + up)).max(open).max(close);
        let low = (close * (1.0 - down)).min(open).min(close).max(0.0);
        (high, low)
    }
}

/// Deterministic volume derived from a bar's shape, floored at
/// [`DEFAULT_VOLUME`]; the variation term keeps consecutive bars from
/// sharing identical volume.
fn fallback_volume(range: f64, close: f64, index: usize) -> f64 {
    let base = range * close * 0.1;
    let volume = base * (1.0 + 0.5 * (index % 10) as f64 / 10.0);
    volume.max(DEFAULT_VOLUME)
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn synth(timeframe: Timeframe, config: SynthesisConfig) -> CandleSynthesizer {
        CandleSynthesizer::new(timeframe, config).unwrap()
    }

    fn seeded(timeframe: Timeframe) -> CandleSynthesizer {
        synth(
            timeframe,
            SynthesisConfig {
                base_price: 45_000.0,
                volatility_fraction: 0.05,
                target_count: 90,
                seed: Some(7),
            },
        )
    }

    #[test]
    fn test_config_rejects_zero_count() {
        let err = CandleSynthesizer::new(
            Timeframe::D1,
            SynthesisConfig {
                target_count: 0,
                ..SynthesisConfig::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, SynthesisConfigError::TargetCount(0)));
    }

    #[test]
    fn test_config_rejects_non_positive_volatility() {
        for bad in [0.0, -0.5, f64::NAN] {
            let err = CandleSynthesizer::new(
                Timeframe::D1,
                SynthesisConfig {
                    volatility_fraction: bad,
                    ..SynthesisConfig::default()
                },
            )
            .unwrap_err();
            assert!(matches!(err, SynthesisConfigError::Volatility(_)));
        }
    }

    #[test]
    fn test_config_rejects_bad_base_price() {
        for bad in [0.0, -100.0, f64::NAN, f64::INFINITY] {
            let err = CandleSynthesizer::new(
                Timeframe::D1,
                SynthesisConfig {
                    base_price: bad,
                    ..SynthesisConfig::default()
                },
            )
            .unwrap_err();
            assert!(matches!(err, SynthesisConfigError::BasePrice(_)), "{bad} accepted");
        }
    }

    #[test]
    fn test_fallback_volume_floors_small_bars() {
        // A tight bar on a cheap asset still gets a chartable volume.
        assert_eq!(fallback_volume(0.01, 1.0, 0), DEFAULT_VOLUME);
        // Larger bars pass through unfloored.
        assert_eq!(fallback_volume(2000.0, 45_000.0, 0), 9_000_000.0);
    }

    #[test]
    fn test_full_synthesis_count_and_invariants() {
        let series = seeded(Timeframe::W1).synthesize();
        assert_eq!(series.len(), 90);
        for c in series.candles() {
            assert!(c.is_valid(), "invalid candle: {c:?}");
            assert!(c.high > c.low);
            assert!(c.volume > 0.0);
            // Full range bounded relative to close.
            assert!((c.high - c.low) / c.close <= 0.25);
        }
    }

    #[test]
    fn test_full_synthesis_no_identical_consecutive_bars() {
        let series = seeded(Timeframe::W1).synthesize();
        for pair in series.candles().windows(2) {
            let same = pair[0].open == pair[1].open
                && pair[0].high == pair[1].high
                && pair[0].low == pair[1].low
                && pair[0].close == pair[1].close;
            assert!(!same, "identical consecutive bars: {pair:?}");
        }
    }

    #[test]
    fn test_full_synthesis_bounded_gaps() {
        let series = seeded(Timeframe::D1).synthesize();
        for pair in series.candles().windows(2) {
            let gap = (pair[1].open - pair[0].close).abs() / pair[0].close;
            assert!(gap <= 0.1, "excessive gap: {gap}");
        }
    }

    #[test]
    fn test_seeded_synthesis_is_deterministic() {
        let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let a = seeded(Timeframe::D1).synthesize_ending_at(end);
        let b = seeded(Timeframe::D1).synthesize_ending_at(end);
        assert_eq!(a.candles(), b.candles());
    }

    #[test]
    fn test_synthesis_timestamps_step_by_timeframe() {
        let end = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let series = seeded(Timeframe::W1).synthesize_ending_at(end);
        assert_eq!(series.last().timestamp, end);
        for pair in series.candles().windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Timeframe::W1.duration());
        }
    }

    #[test]
    fn test_walk_stays_near_anchor() {
        let series = seeded(Timeframe::D1).synthesize();
        for c in series.candles() {
            assert!(c.close > 45_000.0 * 0.3 && c.close < 45_000.0 * 3.0);
        }
    }

    #[test]
    fn test_repair_flat_candles() {
        let synth = synth(
            Timeframe::D1,
            SynthesisConfig {
                base_price: 100.0,
                volatility_fraction: 0.02,
                target_count: 10,
                seed: Some(3),
            },
        );
        let flats: Vec<Candle> = (0..10)
            .map(|i| {
                let ts = Utc.timestamp_opt(1_700_000_000 + i * 86_400, 0).unwrap();
                let p = 100.0 + i as f64;
                Candle::new(ts, p, p, p, p, 0.0)
            })
            .collect();

        let series = synth.repair(flats).unwrap();
        for (i, c) in series.candles().iter().enumerate() {
            assert!(c.is_valid());
            assert!(!c.is_flat(), "bar {i} still flat");
            assert!(c.high > c.low);
            assert!(c.volume > 0.0);
            // Repair must preserve the observed close.
            assert_eq!(c.close, 100.0 + i as f64);
        }
    }

    #[test]
    fn test_repair_leaves_well_formed_candles_untouched() {
        let synth = synth(Timeframe::D1, SynthesisConfig::default());
        let ts0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ts1 = Utc.timestamp_opt(1_700_086_400, 0).unwrap();
        let good = vec![
            Candle::new(ts0, 100.0, 105.0, 98.0, 103.0, 5000.0),
            Candle::new(ts1, 103.0, 108.0, 101.0, 106.0, 6000.0),
        ];
        let series = synth.repair(good.clone()).unwrap();
        assert_eq!(series.candles(), good.as_slice());
    }

    #[test]
    fn test_repair_points_builds_shaped_series() {
        let synth = synth(
            Timeframe::H1,
            SynthesisConfig {
                seed: Some(11),
                ..SynthesisConfig::default()
            },
        );
        let points: Vec<PricePoint> = (0..24)
            .map(|i| PricePoint {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i * 3600, 0).unwrap(),
                price: 100.0 + (i as f64 * 0.3).sin(),
                volume: None,
            })
            .collect();

        let series = synth.repair_points(&points).unwrap();
        assert_eq!(series.len(), 24);
        assert!(!series.has_flat_candles());
        assert!(series.candles().iter().all(|c| c.volume > 0.0));
    }

    #[test]
    fn test_repair_rejects_single_point() {
        let synth = synth(Timeframe::D1, SynthesisConfig::default());
        let points = [PricePoint {
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            price: 100.0,
            volume: None,
        }];
        assert!(matches!(
            synth.repair_points(&points),
            Err(InvalidSeriesError::TooShort { .. })
        ));
    }
}
