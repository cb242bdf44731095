//! Targets command - inspect and override ideal targets

use super::Context;
use anyhow::{Context as _, Result};
use console::style;
use marketscore::config::{
    is_supported_marketplace, normalize_marketplace_id, supported_marketplaces, IdealTargets,
};
use serde::Serialize;

/// Fields given on the command line; the rest keep their active value
pub(crate) struct TargetChanges {
    pub search_volume: Option<f64>,
    pub competitors: Option<f64>,
    pub price: Option<f64>,
    pub royalties: Option<f64>,
}

impl TargetChanges {
    fn is_empty(&self) -> bool {
        self.search_volume.is_none()
            && self.competitors.is_none()
            && self.price.is_none()
            && self.royalties.is_none()
    }

    /// Complete target set built on top of `current`
    fn apply(&self, current: IdealTargets) -> IdealTargets {
        IdealTargets {
            search_volume: self.search_volume.unwrap_or(current.search_volume),
            competitors: self.competitors.unwrap_or(current.competitors),
            price: self.price.unwrap_or(current.price),
            royalties: self.royalties.unwrap_or(current.royalties),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TargetsReport {
    marketplace: String,
    supported: bool,
    overridden: bool,
    active: IdealTargets,
    default: IdealTargets,
}

fn report(ctx: &Context, id: &str) -> TargetsReport {
    TargetsReport {
        marketplace: id.to_string(),
        supported: is_supported_marketplace(id),
        overridden: ctx.store.has_override(id),
        active: ctx.store.config(id),
        default: ctx.store.default_config(id),
    }
}

fn require_supported(marketplace: &str) -> Result<String> {
    let id = normalize_marketplace_id(marketplace);
    if !is_supported_marketplace(&id) {
        let known: Vec<&str> = supported_marketplaces().collect();
        anyhow::bail!(
            "Unsupported marketplace '{}' (supported: {})",
            id,
            known.join(", ")
        );
    }
    Ok(id)
}

fn print_targets(targets: &IdealTargets) {
    println!("  Search volume  {:>10}", targets.search_volume);
    println!("  Competitors    {:>10}", targets.competitors);
    println!("  Price          {:>10.2}", targets.price);
    println!("  Royalties      {:>10.2}", targets.royalties);
}

pub(crate) fn show(ctx: &Context, marketplace: Option<&str>, format: &str) -> Result<()> {
    let id = normalize_marketplace_id(marketplace.unwrap_or(&ctx.marketplace));
    let report = report(ctx, &id);

    if format == "json" {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize targets")?;
        println!("{}", json);
        return Ok(());
    }

    let source = if report.overridden {
        style("override").yellow()
    } else {
        style("default").dim()
    };
    println!("\n{} {} ({})", style("Ideal targets").bold(), style(&id).cyan(), source);
    if !report.supported {
        println!(
            "  {}",
            style("Unsupported marketplace, global defaults apply").dim()
        );
    }
    print_targets(&report.active);
    println!();
    Ok(())
}

pub(crate) fn set(ctx: &Context, marketplace: &str, changes: TargetChanges) -> Result<()> {
    let id = require_supported(marketplace)?;
    if changes.is_empty() {
        anyhow::bail!("Nothing to change: pass at least one of --volume, --competitors, --price, --royalties");
    }

    let targets = changes.apply(ctx.store.config(&id));
    if let Err(e) = ctx.store.set_override(&id, targets) {
        eprintln!("{} Targets for {} were not saved: {}", style("⚠").yellow(), id, e);
        return Err(e).context("Failed to save ideal-target override");
    }

    println!("{} Saved targets for {}", style("✓").green(), style(&id).cyan());
    print_targets(&targets);
    Ok(())
}

pub(crate) fn restore(ctx: &Context, marketplace: &str) -> Result<()> {
    let id = require_supported(marketplace)?;
    let had_override = ctx.store.has_override(&id);

    if let Err(e) = ctx.store.restore_default(&id) {
        eprintln!("{} Defaults for {} were not restored: {}", style("⚠").yellow(), id, e);
        return Err(e).context("Failed to restore default ideal targets");
    }

    if had_override {
        println!("{} Restored default targets for {}", style("✓").green(), style(&id).cyan());
    } else {
        println!("{} {} already uses default targets", style("✓").green(), style(&id).cyan());
    }
    Ok(())
}

pub(crate) fn list(ctx: &Context) -> Result<()> {
    let overrides = ctx.store.load_overrides();

    println!(
        "\n{:<4} {:>8} {:>12} {:>8} {:>10}  {}",
        "Mkt", "Volume", "Competitors", "Price", "Royalties", "Source"
    );
    for id in supported_marketplaces() {
        let (targets, source) = match overrides.get(id) {
            Some(t) => (*t, style("override").yellow()),
            None => (ctx.store.default_config(id), style("default").dim()),
        };
        let marker = if id == ctx.marketplace { "*" } else { " " };
        println!(
            "{:<4} {:>8} {:>12} {:>8.2} {:>10.2}  {}",
            format!("{}{}", id, marker),
            targets.search_volume,
            targets.competitors,
            targets.price,
            targets.royalties,
            source
        );
    }
    println!();
    Ok(())
}
