//! Quality tiers derived from a market score

use crate::models::ParseCategoryError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Scores at or above this are excellent
pub const EXCELLENT_THRESHOLD: f64 = 70.0;
/// Scores at or above this (and below excellent) are regular
pub const REGULAR_THRESHOLD: f64 = 40.0;

/// Discrete quality tier of a market score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketScoreLevel {
    Low,
    Regular,
    Excellent,
}

impl MarketScoreLevel {
    pub fn label(&self) -> &'static str {
        match self {
            MarketScoreLevel::Excellent => "Excellent",
            MarketScoreLevel::Regular => "Regular",
            MarketScoreLevel::Low => "Low",
        }
    }

    /// Foreground color token
    pub fn color(&self) -> &'static str {
        match self {
            MarketScoreLevel::Excellent => "text-green-600",
            MarketScoreLevel::Regular => "text-yellow-600",
            MarketScoreLevel::Low => "text-red-600",
        }
    }

    /// Background color token
    pub fn bg_color(&self) -> &'static str {
        match self {
            MarketScoreLevel::Excellent => "bg-green-100",
            MarketScoreLevel::Regular => "bg-yellow-100",
            MarketScoreLevel::Low => "bg-red-100",
        }
    }

    pub fn info(&self) -> MarketScoreInfo {
        MarketScoreInfo {
            level: *self,
            label: self.label(),
            color: self.color(),
            bg_color: self.bg_color(),
        }
    }
}

impl fmt::Display for MarketScoreLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketScoreLevel::Excellent => write!(f, "excellent"),
            MarketScoreLevel::Regular => write!(f, "regular"),
            MarketScoreLevel::Low => write!(f, "low"),
        }
    }
}

impl FromStr for MarketScoreLevel {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "excellent" => Ok(MarketScoreLevel::Excellent),
            "regular" => Ok(MarketScoreLevel::Regular),
            "low" => Ok(MarketScoreLevel::Low),
            other => Err(ParseCategoryError {
                kind: "market score level",
                value: other.to_string(),
            }),
        }
    }
}

/// Tier plus display metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketScoreInfo {
    pub level: MarketScoreLevel,
    pub label: &'static str,
    pub color: &'static str,
    pub bg_color: &'static str,
}

/// Tier for a score (boundaries inclusive: 70 is excellent, 40 is regular)
pub fn market_score_level(score: f64) -> MarketScoreLevel {
    if score >= EXCELLENT_THRESHOLD {
        MarketScoreLevel::Excellent
    } else if score >= REGULAR_THRESHOLD {
        MarketScoreLevel::Regular
    } else {
        // NaN lands here too
        MarketScoreLevel::Low
    }
}

pub fn market_score_info(score: f64) -> MarketScoreInfo {
    market_score_level(score).info()
}

pub fn market_score_color(score: f64) -> &'static str {
    market_score_info(score).color
}

pub fn market_score_bg_color(score: f64) -> &'static str {
    market_score_info(score).bg_color
}
