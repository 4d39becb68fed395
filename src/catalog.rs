//! Pattern-type reference metadata.
//!
//! This table mirrors the external catalog collaborator: category, typical
//! duration in candles, a reliability score, and reversal/continuation flags
//! for every pattern this crate can emit. It is used for enrichment and
//! labeling only — never by detection logic.

use crate::Category;

/// Reference metadata for one pattern type.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PatternMeta {
    pub name: &'static str,
    pub category: Category,
    pub typical_duration: usize,
    pub reliability_score: u8,
    pub is_reversal: bool,
    pub is_continuation: bool,
}

const fn meta(
    name: &'static str,
    category: Category,
    typical_duration: usize,
    reliability_score: u8,
    is_reversal: bool,
    is_continuation: bool,
) -> PatternMeta {
    PatternMeta {
        name,
        category,
        typical_duration,
        reliability_score,
        is_reversal,
        is_continuation,
    }
}

static PATTERN_TYPES: &[PatternMeta] = &[
    // Candlestick patterns
    meta("Doji", Category::Candle, 1, 70, true, false),
    meta("Hammer", Category::Candle, 1, 80, true, false),
    meta("Hanging Man", Category::Candle, 1, 75, true, false),
    meta("Shooting Star", Category::Candle, 1, 80, true, false),
    meta("Inverted Hammer", Category::Candle, 1, 70, true, false),
    meta("Dragonfly Doji", Category::Candle, 1, 80, true, false),
    meta("Gravestone Doji", Category::Candle, 1, 80, true, false),
    meta("Marubozu", Category::Candle, 1, 85, false, true),
    meta("Spinning Top", Category::Candle, 1, 65, true, false),
    meta("Engulfing Pattern", Category::Candle, 2, 85, true, false),
    meta("Harami Pattern", Category::Candle, 2, 70, true, false),
    meta("Piercing Pattern", Category::Candle, 2, 80, true, false),
    meta("Dark Cloud Cover", Category::Candle, 2, 80, true, false),
    meta("Morning Star", Category::Candle, 3, 90, true, false),
    meta("Evening Star", Category::Candle, 3, 90, true, false),
    meta("Three White Soldiers", Category::Candle, 3, 85, true, true),
    meta("Three Black Crows", Category::Candle, 3, 85, true, true),
    // Price-action / chart patterns
    meta("Support Level Test", Category::PriceAction, 5, 80, true, false),
    meta("Resistance Level Test", Category::PriceAction, 5, 80, true, false),
    meta("Bullish Trend", Category::Chart, 20, 85, false, true),
    meta("Bearish Trend", Category::Chart, 20, 85, false, true),
    // Volume-based patterns
    meta("Volume Spike", Category::Volume, 1, 80, true, true),
    meta("Volume Breakout", Category::Volume, 1, 90, false, true),
    meta("Accumulation Pattern", Category::Volume, 10, 85, true, false),
    meta("Distribution Pattern", Category::Volume, 10, 85, true, false),
    meta("Volume Climax", Category::Volume, 1, 90, true, false),
    meta("Low Volume Pullback", Category::Volume, 3, 80, false, true),
    meta("Volume Confirmation", Category::Volume, 5, 85, false, true),
    meta("Volume Divergence", Category::Volume, 5, 75, true, false),
    meta("High Volume Reversal", Category::Volume, 1, 90, true, false),
    meta("Volume Thrust", Category::Volume, 1, 85, false, true),
    meta("Volume Drying Up", Category::Volume, 5, 70, true, false),
    meta("Volume Expansion", Category::Volume, 3, 80, false, true),
    meta("Volume Contraction", Category::Volume, 3, 65, true, false),
    meta("OBV Bullish Trend", Category::Volume, 10, 85, false, true),
    meta("OBV Bearish Trend", Category::Volume, 10, 85, false, true),
    meta("VPT Confirmation", Category::Volume, 5, 80, false, true),
    meta("Heavy Volume Rejection", Category::Volume, 1, 90, true, false),
];

/// Looks up reference metadata by pattern name.
pub fn lookup(name: &str) -> Option<&'static PatternMeta> {
    PATTERN_TYPES.iter().find(|m| m.name == name)
}

/// All known pattern types, in catalog order.
pub fn all() -> &'static [PatternMeta] {
    PATTERN_TYPES
}
