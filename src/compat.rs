//! Compatibility with bucket-based keyword records
//!
//! Older records carried coarse categories (competition level, price and
//! royalties buckets, a review-count bucket) and a free-text competitor
//! note instead of numbers. This module upgrades them to
//! [`MarketObservation`] and maps scores onto the four-level relevance enum
//! still read by older display paths.

use crate::models::{
    non_negative, BrandRisk, CompetitionLevel, KeywordMarketData, KeywordRecord,
    LegacyMarketData, MarketObservation, ParseCategoryError, PriceBucket, ReviewCountBucket,
    RoyaltiesBucket,
};
use crate::scoring::{DEFAULT_PRICE, DEFAULT_ROYALTIES};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

/// Coarse relevance used by older display paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelevanceLevel {
    VeryHigh,
    High,
    Low,
    None,
}

impl RelevanceLevel {
    pub const ALL: [RelevanceLevel; 4] = [
        RelevanceLevel::VeryHigh,
        RelevanceLevel::High,
        RelevanceLevel::Low,
        RelevanceLevel::None,
    ];
}

impl fmt::Display for RelevanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelevanceLevel::VeryHigh => write!(f, "very-high"),
            RelevanceLevel::High => write!(f, "high"),
            RelevanceLevel::Low => write!(f, "low"),
            RelevanceLevel::None => write!(f, "none"),
        }
    }
}

impl FromStr for RelevanceLevel {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "very-high" | "veryhigh" => Ok(RelevanceLevel::VeryHigh),
            "high" => Ok(RelevanceLevel::High),
            "low" => Ok(RelevanceLevel::Low),
            "none" => Ok(RelevanceLevel::None),
            other => Err(ParseCategoryError {
                kind: "relevance level",
                value: other.to_string(),
            }),
        }
    }
}

/// Relevance bucket for a score (inclusive lower bounds 70, 50, 30)
pub fn score_to_relevance_level(score: f64) -> RelevanceLevel {
    if score >= 70.0 {
        RelevanceLevel::VeryHigh
    } else if score >= 50.0 {
        RelevanceLevel::High
    } else if score >= 30.0 {
        RelevanceLevel::Low
    } else {
        RelevanceLevel::None
    }
}

/// Representative score for a relevance bucket.
///
/// Display-only: this is a lookup table, not the inverse of
/// [`score_to_relevance_level`]. Only the bucket survives a round trip.
pub fn relevance_level_to_score(level: RelevanceLevel) -> u32 {
    match level {
        RelevanceLevel::VeryHigh => 85,
        RelevanceLevel::High => 60,
        RelevanceLevel::Low => 40,
        RelevanceLevel::None => 15,
    }
}

/// Representative competitor count for a legacy competition level
pub fn competition_estimate(level: CompetitionLevel) -> u64 {
    match level {
        CompetitionLevel::Low => 500,
        CompetitionLevel::Medium => 3000,
        CompetitionLevel::High => 15000,
    }
}

pub fn price_bucket_midpoint(bucket: PriceBucket) -> f64 {
    match bucket {
        PriceBucket::Under5 => 2.5,
        PriceBucket::From5To10 => 7.5,
        PriceBucket::From10To15 => 12.5,
        PriceBucket::Over15 => 17.5,
    }
}

pub fn royalties_bucket_midpoint(bucket: RoyaltiesBucket) -> f64 {
    match bucket {
        RoyaltiesBucket::Under2 => 1.0,
        RoyaltiesBucket::From2To4 => 3.0,
        RoyaltiesBucket::Over4 => 5.0,
    }
}

/// Brand risk implied by how many top results carry huge review counts
pub fn review_bucket_risk(bucket: ReviewCountBucket) -> BrandRisk {
    match bucket {
        ReviewCountBucket::None => BrandRisk::Low,
        ReviewCountBucket::Few => BrandRisk::Medium,
        ReviewCountBucket::Many => BrandRisk::High,
    }
}

static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();

fn number_pattern() -> Option<&'static Regex> {
    NUMBER
        .get_or_init(|| Regex::new(r"\d(?:[\d.,]*\d)?").ok())
        .as_ref()
}

/// Extract the first number from a free-text competitor note.
///
/// Dots and commas inside the number are read as thousands separators, so
/// "about 2,400 results" and "2.400" both give 2400.
pub fn parse_competitor_note(note: &str) -> Option<u64> {
    let found = number_pattern()?.find(note)?;
    let digits: String = found
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Build an observation from a legacy record.
///
/// Competitors come from the note when it holds a number, else from the
/// competition level, else 0. Price and royalties prefer a recorded number,
/// then the bucket midpoint, then the engine defaults.
pub fn legacy_to_observation(legacy: &LegacyMarketData) -> MarketObservation {
    let competitors = legacy
        .competitors_note
        .as_deref()
        .and_then(parse_competitor_note)
        .or_else(|| legacy.competition.map(competition_estimate))
        .unwrap_or(0);

    let price = legacy
        .price
        .map(non_negative)
        .or_else(|| legacy.price_bucket.map(price_bucket_midpoint))
        .unwrap_or(DEFAULT_PRICE);

    let royalties = legacy
        .royalties
        .map(non_negative)
        .or_else(|| legacy.royalties_bucket.map(royalties_bucket_midpoint))
        .unwrap_or(DEFAULT_ROYALTIES);

    let review_risk = legacy
        .high_review_count_bucket
        .map(review_bucket_risk)
        .unwrap_or_default();
    let brand_risk = legacy.brand_risk.unwrap_or_default().max(review_risk);

    MarketObservation {
        search_volume: legacy.search_volume,
        competitors,
        price,
        royalties,
        brand_risk,
        traffic_source: legacy.traffic_source,
    }
}

/// Observation for either record version
pub fn migrate(data: &KeywordMarketData) -> MarketObservation {
    match data {
        KeywordMarketData::Legacy(legacy) => legacy_to_observation(legacy),
        KeywordMarketData::Continuous(observation) => observation.clone(),
    }
}

/// Upgrade a record to the continuous shape in place of its legacy data.
///
/// The cached score is dropped when the data changes shape, since it was
/// computed by the bucket model.
pub fn migrate_record(mut record: KeywordRecord) -> KeywordRecord {
    if record.market.is_legacy() {
        debug!("Migrating legacy market data for '{}'", record.keyword);
        record.market = KeywordMarketData::Continuous(migrate(&record.market));
        record.market_score = None;
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrafficSource;

    #[test]
    fn test_relevance_thresholds() {
        assert_eq!(score_to_relevance_level(100.0), RelevanceLevel::VeryHigh);
        assert_eq!(score_to_relevance_level(70.0), RelevanceLevel::VeryHigh);
        assert_eq!(score_to_relevance_level(69.0), RelevanceLevel::High);
        assert_eq!(score_to_relevance_level(50.0), RelevanceLevel::High);
        assert_eq!(score_to_relevance_level(49.0), RelevanceLevel::Low);
        assert_eq!(score_to_relevance_level(30.0), RelevanceLevel::Low);
        assert_eq!(score_to_relevance_level(29.0), RelevanceLevel::None);
        assert_eq!(score_to_relevance_level(f64::NAN), RelevanceLevel::None);
    }

    #[test]
    fn test_relevance_bucket_round_trip() {
        for level in RelevanceLevel::ALL {
            let score = relevance_level_to_score(level);
            assert_eq!(score_to_relevance_level(f64::from(score)), level);
        }
    }

    #[test]
    fn test_relevance_serde_names() {
        let json = serde_json::to_string(&RelevanceLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"very-high\"");
        assert_eq!("NONE".parse::<RelevanceLevel>().unwrap(), RelevanceLevel::None);
    }

    #[test]
    fn test_parse_competitor_note() {
        assert_eq!(parse_competitor_note("about 2,400 results"), Some(2400));
        assert_eq!(parse_competitor_note("1.234.567"), Some(1234567));
        assert_eq!(parse_competitor_note("800"), Some(800));
        assert_eq!(parse_competitor_note("roughly 15000, maybe 20000"), Some(15000));
        assert_eq!(parse_competitor_note("lots"), None);
        assert_eq!(parse_competitor_note(""), None);
        assert_eq!(parse_competitor_note("99999999999999999999999"), None);
    }

    #[test]
    fn test_note_beats_competition_level() {
        let legacy = LegacyMarketData {
            competition: Some(CompetitionLevel::High),
            competitors_note: Some("about 1,200".to_string()),
            ..Default::default()
        };
        assert_eq!(legacy_to_observation(&legacy).competitors, 1200);
    }

    #[test]
    fn test_competition_level_estimates() {
        let obs = |level| {
            legacy_to_observation(&LegacyMarketData {
                competition: Some(level),
                competitors_note: Some("n/a".to_string()),
                ..Default::default()
            })
            .competitors
        };
        assert_eq!(obs(CompetitionLevel::Low), 500);
        assert_eq!(obs(CompetitionLevel::Medium), 3000);
        assert_eq!(obs(CompetitionLevel::High), 15000);
        assert_eq!(legacy_to_observation(&LegacyMarketData::default()).competitors, 0);
    }

    #[test]
    fn test_missing_price_uses_engine_defaults() {
        let obs = legacy_to_observation(&LegacyMarketData::default());
        assert_eq!(obs.price, DEFAULT_PRICE);
        assert_eq!(obs.royalties, DEFAULT_ROYALTIES);
    }

    #[test]
    fn test_buckets_fill_missing_amounts() {
        let legacy = LegacyMarketData {
            price: None,
            price_bucket: Some(PriceBucket::From10To15),
            royalties: Some(4.2),
            royalties_bucket: Some(RoyaltiesBucket::Under2),
            ..Default::default()
        };
        let obs = legacy_to_observation(&legacy);
        assert_eq!(obs.price, 12.5);
        assert_eq!(obs.royalties, 4.2);
    }

    #[test]
    fn test_review_bucket_raises_risk() {
        let legacy = LegacyMarketData {
            brand_risk: Some(BrandRisk::Medium),
            high_review_count_bucket: Some(ReviewCountBucket::Many),
            ..Default::default()
        };
        assert_eq!(legacy_to_observation(&legacy).brand_risk, BrandRisk::High);

        let legacy = LegacyMarketData {
            brand_risk: Some(BrandRisk::High),
            high_review_count_bucket: Some(ReviewCountBucket::None),
            ..Default::default()
        };
        assert_eq!(legacy_to_observation(&legacy).brand_risk, BrandRisk::High);
    }

    #[test]
    fn test_migrate_continuous_is_identity() {
        let obs = MarketObservation {
            search_volume: 10,
            competitors: 20,
            price: 5.0,
            royalties: 1.0,
            brand_risk: BrandRisk::Medium,
            traffic_source: TrafficSource::Mixed,
        };
        assert_eq!(migrate(&KeywordMarketData::Continuous(obs.clone())), obs);
    }

    #[test]
    fn test_migrate_record_from_json() {
        let json = r#"{
            "keyword": "cozy mystery",
            "market": {
                "version": "legacy",
                "searchVolume": 450,
                "competition": "medium",
                "priceBucket": "5-10",
                "highReviewCountBucket": "few"
            },
            "marketScore": 55
        }"#;
        let record: KeywordRecord = serde_json::from_str(json).unwrap();
        let migrated = migrate_record(record);
        assert!(!migrated.market.is_legacy());
        assert_eq!(migrated.market_score, None);
        match migrated.market {
            KeywordMarketData::Continuous(obs) => {
                assert_eq!(obs.search_volume, 450);
                assert_eq!(obs.competitors, 3000);
                assert_eq!(obs.price, 7.5);
                assert_eq!(obs.royalties, DEFAULT_ROYALTIES);
                assert_eq!(obs.brand_risk, BrandRisk::Medium);
            }
            KeywordMarketData::Legacy(_) => panic!("record was not migrated"),
        }
    }

    #[test]
    fn test_migrate_record_keeps_continuous_score() {
        let record = KeywordRecord {
            keyword: "dragons".to_string(),
            marketplace: Some("uk".to_string()),
            market: KeywordMarketData::Continuous(MarketObservation::default()),
            structure: None,
            market_score: Some(12),
        };
        assert_eq!(migrate_record(record.clone()), record);
    }
}
