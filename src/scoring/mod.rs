//! Continuous Market Scoring
//!
//! Scores a keyword's market on a bounded 0-100 scale by normalizing each
//! observed metric against the marketplace's ideal targets.
//!
//! # Scoring Formula
//!
//! ```text
//! Total = clamp(Volume + Competitors + Price + Royalties + Traffic + Structure - Risk, 0, 100)
//!
//! Where, with r = observed / ideal:
//!   Volume      = 30 × min(r, 1)
//!   Competitors = 25 × clamp(2 - r, 0, 1)    (0 when search volume is 0)
//!   Price       = 15 × min(r, 1)
//!   Royalties   = 15 × min(r, 1)
//!   Traffic     = amazon 15, mixed 10, external 5, unknown 0
//!   Structure   = 2 per checked item, max 12
//!   Risk        = low 0, medium 2, high 5
//! ```
//!
//! # Levels
//!
//! - **Excellent**: 70 and up
//! - **Regular**: 40 to 69
//! - **Low**: below 40
//!
//! # Example
//!
//! A US keyword observed exactly at the US anchors (600 searches,
//! 3000 competitors, 12.00 price, 4.00 royalties) with unknown traffic and
//! low risk scores 30 + 25 + 15 + 15 = 85. The same keyword with Amazon
//! traffic reaches 100.

mod level;
mod market_scorer;

pub use level::{
    market_score_bg_color, market_score_color, market_score_info, market_score_level,
    MarketScoreInfo, MarketScoreLevel, EXCELLENT_THRESHOLD, REGULAR_THRESHOLD,
};
pub use market_scorer::{
    default_market_data, explain, score_with_targets, BreakdownLine, Factor, LineKind,
    MarketScorer, RawValue, ScoreBreakdown, ScoreComponent, COMPETITORS_WEIGHT, DEFAULT_PRICE,
    DEFAULT_ROYALTIES, MAX_RISK_PENALTY, MAX_SCORE, PRICE_WEIGHT, ROYALTIES_WEIGHT,
    STRUCTURE_MAX_POINTS, STRUCTURE_POINTS_PER_CHECK, TOTAL_MAX_POINTS, TRAFFIC_WEIGHT,
    VOLUME_WEIGHT,
};
