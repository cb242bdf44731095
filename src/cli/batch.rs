//! Batch command - score a keyword export and rank it

use super::{styled_level, Context};
use anyhow::{Context as _, Result};
use console::style;
use marketscore::compat::{migrate, migrate_record, score_to_relevance_level};
use marketscore::config::{ConfigStore, KeyValueStore};
use marketscore::models::KeywordRecord;
use marketscore::scoring::{market_score_level, MarketScoreLevel, MarketScorer};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read keyword records from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))
}

/// Score every record, caching the total back onto it, and return them
/// best first. Records below `min_level` are dropped.
pub(crate) fn score_records<S: KeyValueStore>(
    store: &ConfigStore<S>,
    default_marketplace: &str,
    records: Vec<KeywordRecord>,
    min_level: Option<MarketScoreLevel>,
    upgrade: bool,
) -> Vec<KeywordRecord> {
    let scorer = MarketScorer::new(store).with_default_marketplace(default_marketplace);

    let mut scored: Vec<KeywordRecord> = records
        .into_iter()
        .map(|record| {
            let record = if upgrade { migrate_record(record) } else { record };
            let observation = migrate(&record.market);
            let total = scorer
                .calculate(
                    &observation,
                    record.marketplace.as_deref(),
                    record.structure.as_ref(),
                )
                .total;
            KeywordRecord {
                market_score: Some(total),
                ..record
            }
        })
        .filter(|record| match (min_level, record.market_score) {
            (Some(min), Some(total)) => market_score_level(f64::from(total)) >= min,
            _ => true,
        })
        .collect();

    scored.sort_by(|a, b| {
        b.market_score
            .cmp(&a.market_score)
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
    scored
}

pub(crate) fn run(
    ctx: &Context,
    input: &Path,
    format: &str,
    min_level: Option<&str>,
    upgrade: bool,
    output: Option<&Path>,
) -> Result<()> {
    let raw = read_input(input)?;
    let records: Vec<KeywordRecord> =
        serde_json::from_str(&raw).context("Input must be a JSON array of keyword records")?;
    let total_records = records.len();
    let legacy = records.iter().filter(|r| r.market.is_legacy()).count();
    debug!("Loaded {} records ({} legacy)", total_records, legacy);

    let min_level = min_level
        .map(|l| l.parse::<MarketScoreLevel>())
        .transpose()?;

    let scored = score_records(&ctx.store, &ctx.marketplace, records, min_level, upgrade);
    info!("Scored {} of {} records", scored.len(), total_records);

    let rendered = if format == "json" {
        serde_json::to_string_pretty(&scored).context("Failed to serialize records")?
    } else {
        render_table(&scored)
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} record(s) to {}",
                style("✓").green(),
                scored.len(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn render_table(records: &[KeywordRecord]) -> String {
    if records.is_empty() {
        return format!("{}", style("No keywords matched.").dim());
    }

    let mut lines = vec![format!(
        "{:>4}  {:<32} {:<4} {:>5}  {:<10} {}",
        "#", "Keyword", "Mkt", "Score", "Level", "Relevance"
    )];
    for (rank, record) in records.iter().enumerate() {
        let total = record.market_score.unwrap_or(0);
        let level = market_score_level(f64::from(total));
        lines.push(format!(
            "{:>4}  {:<32} {:<4} {:>5}  {:<10} {}",
            rank + 1,
            truncate(&record.keyword, 32),
            record.marketplace.as_deref().unwrap_or("-"),
            styled_level(level, total.to_string()),
            level.label(),
            score_to_relevance_level(f64::from(total)),
        ));
    }
    lines.join("\n")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
