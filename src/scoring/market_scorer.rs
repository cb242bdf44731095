//! Market scorer
//!
//! Turns one observation plus the resolved ideal targets into a bounded
//! score with a per-factor breakdown.

use super::level::{market_score_level, MarketScoreLevel};
use crate::config::{
    normalize_marketplace_id, ConfigStore, IdealTargets, KeyValueStore,
    GLOBAL_DEFAULT_MARKETPLACE,
};
use crate::models::{
    non_negative, BrandRisk, MarketObservation, MarketStructureChecklist, TrafficSource,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Maximum points for each factor
pub const VOLUME_WEIGHT: f64 = 30.0;
pub const COMPETITORS_WEIGHT: f64 = 25.0;
pub const PRICE_WEIGHT: f64 = 15.0;
pub const ROYALTIES_WEIGHT: f64 = 15.0;
pub const TRAFFIC_WEIGHT: f64 = 15.0;

pub const STRUCTURE_POINTS_PER_CHECK: f64 = 2.0;
pub const STRUCTURE_MAX_POINTS: f64 = 12.0;

pub const MAX_RISK_PENALTY: f64 = 5.0;
pub const MAX_SCORE: f64 = 100.0;

/// Sum of every component's max points, whatever the input
pub const TOTAL_MAX_POINTS: f64 = VOLUME_WEIGHT
    + COMPETITORS_WEIGHT
    + PRICE_WEIGHT
    + ROYALTIES_WEIGHT
    + TRAFFIC_WEIGHT
    + STRUCTURE_MAX_POINTS;

/// Price assumed when a record carries none
pub const DEFAULT_PRICE: f64 = 9.99;
/// Royalties assumed when a record carries none
pub const DEFAULT_ROYALTIES: f64 = 3.49;

/// Baseline observation for newly created keywords
pub fn default_market_data() -> MarketObservation {
    MarketObservation {
        search_volume: 0,
        competitors: 0,
        price: DEFAULT_PRICE,
        royalties: DEFAULT_ROYALTIES,
        brand_risk: BrandRisk::Low,
        traffic_source: TrafficSource::Unknown,
    }
}

/// Which input a component scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Factor {
    Volume,
    Competitors,
    Price,
    Royalties,
    TrafficSource,
    Structure,
}

impl Factor {
    pub fn label(&self) -> &'static str {
        match self {
            Factor::Volume => "Search volume",
            Factor::Competitors => "Competitors",
            Factor::Price => "Price",
            Factor::Royalties => "Royalties",
            Factor::TrafficSource => "Traffic source",
            Factor::Structure => "Market structure",
        }
    }
}

/// Observed value behind a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) if n.fract() == 0.0 => write!(f, "{n:.0}"),
            RawValue::Number(n) => write!(f, "{n:.2}"),
            RawValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One line of the breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub factor: Factor,
    pub label: String,
    pub raw_value: RawValue,
    /// Always within `[0, max_points]`
    pub points: f64,
    pub max_points: f64,
}

impl ScoreComponent {
    fn new(factor: Factor, raw_value: RawValue, fraction: f64, max_points: f64) -> Self {
        Self {
            factor,
            label: factor.label().to_string(),
            raw_value,
            points: (fraction.clamp(0.0, 1.0) * max_points).clamp(0.0, max_points),
            max_points,
        }
    }
}

/// What a display line stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    Component(Factor),
    RiskPenalty,
    /// Adjustment that brings the sum back into 0-100
    RangeLimit,
}

/// One row of a displayed breakdown. Deductions carry negative points;
/// the rows of a breakdown always add up to its total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownLine {
    pub kind: LineKind,
    pub label: String,
    pub raw_value: RawValue,
    pub points: f64,
    pub max_points: f64,
}

/// Complete score breakdown for transparency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Marketplace whose targets were used
    pub marketplace: String,
    /// Anchors the observation was normalized against
    pub targets: IdealTargets,
    /// Volume, competitors, price, royalties, traffic source, structure
    pub components: Vec<ScoreComponent>,
    pub brand_risk: BrandRisk,
    /// Deduction from brand risk (0-5)
    pub risk_penalty: f64,
    /// Whether a structure checklist was supplied
    pub structure_applied: bool,
    /// Final score, clamped to 0-100
    pub total: u32,
}

impl ScoreBreakdown {
    pub fn component(&self, factor: Factor) -> Option<&ScoreComponent> {
        self.components.iter().find(|c| c.factor == factor)
    }

    /// Sum of component points before the penalty and the clamp
    pub fn raw_sum(&self) -> f64 {
        self.components.iter().map(|c| c.points).sum()
    }

    pub fn max_points(&self) -> f64 {
        self.components.iter().map(|c| c.max_points).sum()
    }

    pub fn level(&self) -> MarketScoreLevel {
        market_score_level(f64::from(self.total))
    }

    /// Rows for display: every component, then the brand-risk deduction
    /// and any range adjustment, so the rows sum to `total` (before
    /// rounding).
    pub fn lines(&self) -> Vec<BreakdownLine> {
        let mut lines: Vec<BreakdownLine> = self
            .components
            .iter()
            .map(|c| BreakdownLine {
                kind: LineKind::Component(c.factor),
                label: c.label.clone(),
                raw_value: c.raw_value.clone(),
                points: c.points,
                max_points: c.max_points,
            })
            .collect();

        if self.risk_penalty > 0.0 {
            lines.push(BreakdownLine {
                kind: LineKind::RiskPenalty,
                label: "Brand risk".to_string(),
                raw_value: RawValue::Text(self.brand_risk.to_string()),
                points: -self.risk_penalty,
                max_points: 0.0,
            });
        }

        let net = self.raw_sum() - self.risk_penalty;
        let adjustment = net.clamp(0.0, MAX_SCORE) - net;
        if adjustment != 0.0 {
            lines.push(BreakdownLine {
                kind: LineKind::RangeLimit,
                label: "Range limit (0-100)".to_string(),
                raw_value: RawValue::Number(net),
                points: adjustment,
                max_points: 0.0,
            });
        }
        lines
    }
}

/// Fraction earned by a "more is better" input: linear up to the anchor,
/// flat beyond it.
fn ramp_fraction(observed: f64, ideal: f64) -> f64 {
    let observed = non_negative(observed);
    let ideal = non_negative(ideal);
    if ideal <= 0.0 {
        return if observed > 0.0 { 1.0 } else { 0.0 };
    }
    (observed / ideal).clamp(0.0, 1.0)
}

/// Fraction earned by the competitor count: full at or below the anchor,
/// falling linearly to nothing at twice the anchor.
fn competitors_fraction(competitors: f64, ideal: f64) -> f64 {
    let competitors = non_negative(competitors);
    let ideal = non_negative(ideal);
    if competitors <= 0.0 {
        return 1.0;
    }
    if ideal <= 0.0 {
        return 0.0;
    }
    (2.0 - competitors / ideal).clamp(0.0, 1.0)
}

fn traffic_fraction(source: TrafficSource) -> f64 {
    match source {
        TrafficSource::Amazon => 1.0,
        TrafficSource::Mixed => 10.0 / TRAFFIC_WEIGHT,
        TrafficSource::External => 5.0 / TRAFFIC_WEIGHT,
        TrafficSource::Unknown => 0.0,
    }
}

fn risk_penalty(risk: BrandRisk) -> f64 {
    match risk {
        BrandRisk::Low => 0.0,
        BrandRisk::Medium => 2.0,
        BrandRisk::High => MAX_RISK_PENALTY,
    }
}

/// Score an observation against explicit targets.
///
/// Competition only counts once there is demand: with zero search volume
/// the competitors component scores nothing.
pub fn score_with_targets(
    observation: &MarketObservation,
    marketplace: &str,
    targets: &IdealTargets,
    structure: Option<&MarketStructureChecklist>,
) -> ScoreBreakdown {
    let volume = observation.search_volume as f64;
    let competitors = observation.competitors as f64;
    let price = non_negative(observation.price);
    let royalties = non_negative(observation.royalties);

    let competitors_share = if volume > 0.0 {
        competitors_fraction(competitors, targets.competitors)
    } else {
        0.0
    };

    let checked = structure.map(|s| s.checked_count()).unwrap_or(0);
    let structure_points = (checked as f64 * STRUCTURE_POINTS_PER_CHECK).min(STRUCTURE_MAX_POINTS);

    let components = vec![
        ScoreComponent::new(
            Factor::Volume,
            RawValue::Number(volume),
            ramp_fraction(volume, targets.search_volume),
            VOLUME_WEIGHT,
        ),
        ScoreComponent::new(
            Factor::Competitors,
            RawValue::Number(competitors),
            competitors_share,
            COMPETITORS_WEIGHT,
        ),
        ScoreComponent::new(
            Factor::Price,
            RawValue::Number(price),
            ramp_fraction(price, targets.price),
            PRICE_WEIGHT,
        ),
        ScoreComponent::new(
            Factor::Royalties,
            RawValue::Number(royalties),
            ramp_fraction(royalties, targets.royalties),
            ROYALTIES_WEIGHT,
        ),
        ScoreComponent::new(
            Factor::TrafficSource,
            RawValue::Text(observation.traffic_source.to_string()),
            traffic_fraction(observation.traffic_source),
            TRAFFIC_WEIGHT,
        ),
        ScoreComponent::new(
            Factor::Structure,
            RawValue::Number(checked as f64),
            structure_points / STRUCTURE_MAX_POINTS,
            STRUCTURE_MAX_POINTS,
        ),
    ];

    let penalty = risk_penalty(observation.brand_risk);
    let sum: f64 = components.iter().map(|c| c.points).sum();
    let total = (sum - penalty).clamp(0.0, MAX_SCORE).round() as u32;

    debug!(
        "Market score for '{}': {} (sum {:.1}, risk penalty {:.1})",
        marketplace, total, sum, penalty
    );

    ScoreBreakdown {
        marketplace: marketplace.to_string(),
        targets: *targets,
        components,
        brand_risk: observation.brand_risk,
        risk_penalty: penalty,
        structure_applied: structure.is_some(),
        total,
    }
}

/// Market scorer bound to a config store
pub struct MarketScorer<'a, S: KeyValueStore> {
    store: &'a ConfigStore<S>,
    default_marketplace: String,
}

impl<'a, S: KeyValueStore> MarketScorer<'a, S> {
    pub fn new(store: &'a ConfigStore<S>) -> Self {
        Self {
            store,
            default_marketplace: GLOBAL_DEFAULT_MARKETPLACE.to_string(),
        }
    }

    /// Marketplace used when a call doesn't name one
    pub fn with_default_marketplace(mut self, marketplace: &str) -> Self {
        let id = normalize_marketplace_id(marketplace);
        if !id.is_empty() {
            self.default_marketplace = id;
        }
        self
    }

    fn resolve_marketplace(&self, marketplace: Option<&str>) -> String {
        marketplace
            .map(normalize_marketplace_id)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| self.default_marketplace.clone())
    }

    /// Calculate the complete score with breakdown
    pub fn calculate(
        &self,
        observation: &MarketObservation,
        marketplace: Option<&str>,
        structure: Option<&MarketStructureChecklist>,
    ) -> ScoreBreakdown {
        let marketplace = self.resolve_marketplace(marketplace);
        let targets = self.store.config(&marketplace);
        score_with_targets(observation, &marketplace, &targets, structure)
    }

    /// Just the total
    pub fn total(&self, observation: &MarketObservation, marketplace: Option<&str>) -> u32 {
        self.calculate(observation, marketplace, None).total
    }

    /// Display rows, deductions included; they add up to the total
    pub fn breakdown(
        &self,
        observation: &MarketObservation,
        marketplace: Option<&str>,
        structure: Option<&MarketStructureChecklist>,
    ) -> Vec<BreakdownLine> {
        self.calculate(observation, marketplace, structure).lines()
    }
}

/// Generate human-readable explanation of the score
pub fn explain(breakdown: &ScoreBreakdown) -> String {
    let mut lines = Vec::new();
    let level = breakdown.level();

    lines.push(format!(
        "# Market Score: {} ({})\n",
        breakdown.total,
        level.label()
    ));

    lines.push("## Scoring Formula\n".to_string());
    lines.push("```".to_string());
    lines.push(
        "Total = clamp(Volume + Competitors + Price + Royalties + Traffic + Structure - Risk, 0, 100)"
            .to_string(),
    );
    lines.push("Volume/Price/Royalties = weight x min(observed / ideal, 1)".to_string());
    lines.push("Competitors = weight x clamp(2 - observed / ideal, 0, 1)".to_string());
    lines.push("```\n".to_string());

    let t = &breakdown.targets;
    lines.push(format!("## Ideal Targets ({})\n", breakdown.marketplace));
    lines.push(format!("- **Search volume**: {}", t.search_volume));
    lines.push(format!("- **Competitors**: {}", t.competitors));
    lines.push(format!("- **Price**: {:.2}", t.price));
    lines.push(format!("- **Royalties**: {:.2}\n", t.royalties));

    lines.push("## Factors\n".to_string());
    for component in &breakdown.components {
        if component.factor == Factor::Structure && !breakdown.structure_applied {
            lines.push(format!(
                "- {}: not assessed (0 / {:.0})",
                component.label, component.max_points
            ));
            continue;
        }
        lines.push(format!(
            "- {}: {} -> {:.1} / {:.0}",
            component.label, component.raw_value, component.points, component.max_points
        ));
    }
    if breakdown.risk_penalty > 0.0 {
        lines.push(format!(
            "- Brand risk ({}): -{:.1}",
            breakdown.brand_risk, breakdown.risk_penalty
        ));
    }

    lines.join("\n")
}
