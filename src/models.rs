//! Core data models for marketscore
//!
//! These models describe the raw market observations that get scored,
//! the qualitative structure checklist, and the legacy bucket-based
//! records that predate continuous scoring.
//!
//! Numeric fields are deserialized leniently: missing, null, non-numeric,
//! NaN, infinite, or negative values all become 0 instead of failing the
//! whole record.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Clamp a raw amount to a finite, non-negative number (anything else is 0)
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn lenient_number(value: &serde_json::Value) -> f64 {
    let raw = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    non_negative(raw)
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(lenient_number(&value).floor() as u64)
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(lenient_number(&value))
}

fn lenient_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        other => Some(lenient_number(&other)),
    })
}

fn lenient_enum<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_optional_enum<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Error returned when parsing one of the categorical enums from a string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseCategoryError {
    pub kind: &'static str,
    pub value: String,
}

/// Dominant-brand presence signal for a keyword
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum BrandRisk {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for BrandRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrandRisk::Low => write!(f, "low"),
            BrandRisk::Medium => write!(f, "medium"),
            BrandRisk::High => write!(f, "high"),
        }
    }
}

impl FromStr for BrandRisk {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(BrandRisk::Low),
            "medium" => Ok(BrandRisk::Medium),
            "high" => Ok(BrandRisk::High),
            other => Err(ParseCategoryError {
                kind: "brand risk",
                value: other.to_string(),
            }),
        }
    }
}

/// Where the demand for a keyword originates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrafficSource {
    Amazon,
    Mixed,
    External,
    /// Not recorded (older records, or the operator didn't say)
    #[default]
    Unknown,
}

impl fmt::Display for TrafficSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrafficSource::Amazon => write!(f, "amazon"),
            TrafficSource::Mixed => write!(f, "mixed"),
            TrafficSource::External => write!(f, "external"),
            TrafficSource::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for TrafficSource {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amazon" => Ok(TrafficSource::Amazon),
            "mixed" => Ok(TrafficSource::Mixed),
            "external" => Ok(TrafficSource::External),
            "unknown" => Ok(TrafficSource::Unknown),
            other => Err(ParseCategoryError {
                kind: "traffic source",
                value: other.to_string(),
            }),
        }
    }
}

/// Raw market metrics for one keyword at scoring time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarketObservation {
    /// Monthly query estimate
    #[serde(default, deserialize_with = "lenient_count")]
    pub search_volume: u64,
    /// Count of competing listings
    #[serde(default, deserialize_with = "lenient_count")]
    pub competitors: u64,
    /// List price of the book
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: f64,
    /// Net proceeds per sale
    #[serde(default, deserialize_with = "lenient_amount")]
    pub royalties: f64,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub brand_risk: BrandRisk,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub traffic_source: TrafficSource,
}

/// One of the six qualitative market structure checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureCheck {
    IntentClear,
    AmazonSuggests,
    ProfitableBooksRank,
    IndieAuthorsCompete,
    GenreMatch,
    PhraseVariants,
}

impl StructureCheck {
    pub const ALL: [StructureCheck; 6] = [
        StructureCheck::IntentClear,
        StructureCheck::AmazonSuggests,
        StructureCheck::ProfitableBooksRank,
        StructureCheck::IndieAuthorsCompete,
        StructureCheck::GenreMatch,
        StructureCheck::PhraseVariants,
    ];

    /// Short key used on the command line
    pub fn key(&self) -> &'static str {
        match self {
            StructureCheck::IntentClear => "intent",
            StructureCheck::AmazonSuggests => "suggested",
            StructureCheck::ProfitableBooksRank => "profitable",
            StructureCheck::IndieAuthorsCompete => "indie",
            StructureCheck::GenreMatch => "genre",
            StructureCheck::PhraseVariants => "variants",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StructureCheck::IntentClear => "Keyword intent is understandable",
            StructureCheck::AmazonSuggests => "Amazon suggests it",
            StructureCheck::ProfitableBooksRank => "Profitable books already rank for it",
            StructureCheck::IndieAuthorsCompete => "Independent authors compete successfully",
            StructureCheck::GenreMatch => "Intent matches the book's genre",
            StructureCheck::PhraseVariants => "Meaningful phrase variants exist",
        }
    }
}

impl FromStr for StructureCheck {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        StructureCheck::ALL
            .into_iter()
            .find(|check| check.key() == key)
            .ok_or(ParseCategoryError {
                kind: "structure check",
                value: key,
            })
    }
}

/// Six independent yes/no checks about the shape of the market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MarketStructureChecklist {
    #[serde(default)]
    pub intent_clear: bool,
    #[serde(default)]
    pub amazon_suggests: bool,
    #[serde(default)]
    pub profitable_books_rank: bool,
    #[serde(default)]
    pub indie_authors_compete: bool,
    #[serde(default)]
    pub genre_match: bool,
    #[serde(default)]
    pub phrase_variants: bool,
}

impl MarketStructureChecklist {
    /// A checklist with every check satisfied
    pub fn all_checked() -> Self {
        Self {
            intent_clear: true,
            amazon_suggests: true,
            profitable_books_rank: true,
            indie_authors_compete: true,
            genre_match: true,
            phrase_variants: true,
        }
    }

    pub fn is_checked(&self, check: StructureCheck) -> bool {
        match check {
            StructureCheck::IntentClear => self.intent_clear,
            StructureCheck::AmazonSuggests => self.amazon_suggests,
            StructureCheck::ProfitableBooksRank => self.profitable_books_rank,
            StructureCheck::IndieAuthorsCompete => self.indie_authors_compete,
            StructureCheck::GenreMatch => self.genre_match,
            StructureCheck::PhraseVariants => self.phrase_variants,
        }
    }

    pub fn set(&mut self, check: StructureCheck, value: bool) {
        let slot = match check {
            StructureCheck::IntentClear => &mut self.intent_clear,
            StructureCheck::AmazonSuggests => &mut self.amazon_suggests,
            StructureCheck::ProfitableBooksRank => &mut self.profitable_books_rank,
            StructureCheck::IndieAuthorsCompete => &mut self.indie_authors_compete,
            StructureCheck::GenreMatch => &mut self.genre_match,
            StructureCheck::PhraseVariants => &mut self.phrase_variants,
        };
        *slot = value;
    }

    /// Number of satisfied checks (0-6)
    pub fn checked_count(&self) -> usize {
        StructureCheck::ALL
            .iter()
            .filter(|check| self.is_checked(**check))
            .count()
    }
}

impl FromIterator<StructureCheck> for MarketStructureChecklist {
    fn from_iter<I: IntoIterator<Item = StructureCheck>>(iter: I) -> Self {
        let mut checklist = Self::default();
        for check in iter {
            checklist.set(check, true);
        }
        checklist
    }
}

/// Legacy three-level competition estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

/// Legacy price bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceBucket {
    #[serde(rename = "under-5")]
    Under5,
    #[serde(rename = "5-10")]
    From5To10,
    #[serde(rename = "10-15")]
    From10To15,
    #[serde(rename = "over-15")]
    Over15,
}

/// Legacy royalties bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoyaltiesBucket {
    #[serde(rename = "under-2")]
    Under2,
    #[serde(rename = "2-4")]
    From2To4,
    #[serde(rename = "over-4")]
    Over4,
}

/// Legacy count of top results carrying a very large number of reviews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewCountBucket {
    None,
    Few,
    Many,
}

/// Market data as recorded before continuous scoring existed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMarketData {
    #[serde(default, deserialize_with = "lenient_count")]
    pub search_volume: u64,
    #[serde(default, deserialize_with = "lenient_optional_enum")]
    pub competition: Option<CompetitionLevel>,
    /// Free-text note, e.g. "about 2,400 results"
    #[serde(default)]
    pub competitors_note: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_optional_amount")]
    pub royalties: Option<f64>,
    #[serde(default, deserialize_with = "lenient_optional_enum")]
    pub price_bucket: Option<PriceBucket>,
    #[serde(default, deserialize_with = "lenient_optional_enum")]
    pub royalties_bucket: Option<RoyaltiesBucket>,
    #[serde(default, deserialize_with = "lenient_optional_enum")]
    pub high_review_count_bucket: Option<ReviewCountBucket>,
    #[serde(default, deserialize_with = "lenient_optional_enum")]
    pub brand_risk: Option<BrandRisk>,
    #[serde(default, deserialize_with = "lenient_enum")]
    pub traffic_source: TrafficSource,
}

/// Market data on a keyword record, tagged by the model that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "lowercase")]
pub enum KeywordMarketData {
    Legacy(LegacyMarketData),
    Continuous(MarketObservation),
}

impl KeywordMarketData {
    pub fn is_legacy(&self) -> bool {
        matches!(self, KeywordMarketData::Legacy(_))
    }
}

impl From<MarketObservation> for KeywordMarketData {
    fn from(observation: MarketObservation) -> Self {
        KeywordMarketData::Continuous(observation)
    }
}

/// A keyword as handed over by the keyword-record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRecord {
    pub keyword: String,
    /// Marketplace id; the caller's default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace: Option<String>,
    pub market: KeywordMarketData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<MarketStructureChecklist>,
    /// Last computed total, cached by the owner of the record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_score: Option<u32>,
}
