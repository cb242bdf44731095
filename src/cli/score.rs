//! Score command - score one observation from flags

use super::{styled_level, Context};
use anyhow::{Context as _, Result};
use console::style;
use marketscore::compat::score_to_relevance_level;
use marketscore::models::{MarketObservation, MarketStructureChecklist, StructureCheck};
use marketscore::scoring::{
    default_market_data, explain, market_score_info, BreakdownLine, Factor, LineKind,
    MarketScoreInfo, MarketScorer, ScoreBreakdown,
};
use serde::Serialize;

pub(crate) struct ScoreArgs {
    pub volume: u64,
    pub competitors: u64,
    pub price: Option<f64>,
    pub royalties: Option<f64>,
    pub brand_risk: String,
    pub traffic: String,
    pub checks: Vec<StructureCheck>,
}

impl ScoreArgs {
    fn observation(&self) -> Result<MarketObservation> {
        let defaults = default_market_data();
        Ok(MarketObservation {
            search_volume: self.volume,
            competitors: self.competitors,
            price: self.price.unwrap_or(defaults.price),
            royalties: self.royalties.unwrap_or(defaults.royalties),
            brand_risk: self.brand_risk.parse()?,
            traffic_source: self.traffic.parse()?,
        })
    }

    fn structure(&self) -> Option<MarketStructureChecklist> {
        if self.checks.is_empty() {
            None
        } else {
            Some(self.checks.iter().copied().collect())
        }
    }
}

/// JSON shape of a scored observation
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreReport<'a> {
    #[serde(flatten)]
    breakdown: &'a ScoreBreakdown,
    info: MarketScoreInfo,
    relevance: String,
    /// Display rows, deductions included
    lines: Vec<BreakdownLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
}

impl<'a> ScoreReport<'a> {
    fn new(breakdown: &'a ScoreBreakdown, with_explanation: bool) -> Self {
        let total = f64::from(breakdown.total);
        Self {
            breakdown,
            info: market_score_info(total),
            relevance: score_to_relevance_level(total).to_string(),
            lines: breakdown.lines(),
            explanation: with_explanation.then(|| explain(breakdown)),
        }
    }
}

pub(crate) fn run(ctx: &Context, args: ScoreArgs, format: &str, show_explain: bool) -> Result<()> {
    let observation = args.observation()?;
    let structure = args.structure();

    let scorer = MarketScorer::new(&ctx.store).with_default_marketplace(&ctx.marketplace);
    let breakdown = scorer.calculate(&observation, None, structure.as_ref());

    if format == "json" {
        let report = ScoreReport::new(&breakdown, show_explain);
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize score")?;
        println!("{}", json);
        return Ok(());
    }

    if show_explain {
        println!("{}", explain(&breakdown));
        return Ok(());
    }

    print_breakdown(&breakdown);
    Ok(())
}

fn print_breakdown(breakdown: &ScoreBreakdown) {
    let level = breakdown.level();
    println!(
        "\n{} {}  {}",
        style("Market Score").bold(),
        styled_level(level, format!("{}/100", breakdown.total)),
        styled_level(level, level.label().to_string()),
    );
    println!(
        "{}",
        style(format!("Marketplace: {}", breakdown.marketplace)).dim()
    );
    println!();

    for line in breakdown.lines() {
        match line.kind {
            LineKind::Component(factor) => {
                let value = if factor == Factor::Structure && !breakdown.structure_applied {
                    "-".to_string()
                } else {
                    line.raw_value.to_string()
                };
                println!(
                    "  {:<20} {:>10}  {:>5.1} / {:<3.0}",
                    line.label, value, line.points, line.max_points
                );
            }
            LineKind::RiskPenalty | LineKind::RangeLimit => {
                println!(
                    "  {:<20} {:>10}  {}",
                    line.label,
                    line.raw_value.to_string(),
                    style(format!("{:>+5.1}", line.points)).red()
                );
            }
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketscore::models::{BrandRisk, TrafficSource};

    fn args() -> ScoreArgs {
        ScoreArgs {
            volume: 600,
            competitors: 3000,
            price: None,
            royalties: Some(4.0),
            brand_risk: "medium".to_string(),
            traffic: "amazon".to_string(),
            checks: vec![],
        }
    }

    #[test]
    fn test_observation_fills_defaults() {
        let obs = args().observation().unwrap();
        assert_eq!(obs.price, default_market_data().price);
        assert_eq!(obs.royalties, 4.0);
        assert_eq!(obs.brand_risk, BrandRisk::Medium);
        assert_eq!(obs.traffic_source, TrafficSource::Amazon);
    }

    #[test]
    fn test_json_report_carries_explanation_on_request() {
        let breakdown = marketscore::scoring::score_with_targets(
            &args().observation().unwrap(),
            "us",
            &marketscore::config::default_targets("us"),
            None,
        );

        let plain = serde_json::to_value(ScoreReport::new(&breakdown, false)).unwrap();
        assert!(plain.get("explanation").is_none());

        let explained = serde_json::to_value(ScoreReport::new(&breakdown, true)).unwrap();
        let text = explained["explanation"].as_str().unwrap_or_default();
        assert!(text.contains("Scoring Formula"));
        assert_eq!(explained["total"], breakdown.total);
    }

    #[test]
    fn test_json_report_lines_include_risk_deduction() {
        let breakdown = marketscore::scoring::score_with_targets(
            &args().observation().unwrap(),
            "us",
            &marketscore::config::default_targets("us"),
            None,
        );
        let report = serde_json::to_value(ScoreReport::new(&breakdown, false)).unwrap();
        let lines = report["lines"].as_array().cloned().unwrap_or_default();
        let sum: f64 = lines.iter().filter_map(|l| l["points"].as_f64()).sum();
        assert_eq!(sum.round() as u32, breakdown.total);
        assert!(lines.iter().any(|l| l["label"] == "Brand risk"));
    }

    #[test]
    fn test_structure_only_when_checks_given() {
        assert!(args().structure().is_none());
        let with_checks = ScoreArgs {
            checks: vec![StructureCheck::GenreMatch, StructureCheck::IntentClear],
            ..args()
        };
        assert_eq!(with_checks.structure().map(|s| s.checked_count()), Some(2));
    }
}
