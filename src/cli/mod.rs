//! CLI command definitions and handlers

mod batch;
mod init;
mod score;
mod targets;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use marketscore::config::{ConfigStore, FileStore, UserConfig};
use marketscore::models::StructureCheck;
use marketscore::scoring::MarketScoreLevel;
use std::path::PathBuf;
use tracing::debug;

/// Parse a non-negative, finite amount
fn parse_amount(s: &str) -> Result<f64, String> {
    let n: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !n.is_finite() || n < 0.0 {
        Err("value must be a non-negative number".to_string())
    } else {
        Ok(n)
    }
}

fn parse_check(s: &str) -> Result<StructureCheck, String> {
    s.parse::<StructureCheck>().map_err(|e| {
        let keys: Vec<&str> = StructureCheck::ALL.iter().map(|c| c.key()).collect();
        format!("{} (expected one of: {})", e, keys.join(", "))
    })
}

/// Marketscore - keyword market opportunity scoring
#[derive(Parser, Debug)]
#[command(name = "marketscore")]
#[command(
    version,
    about = "Score book keyword markets (0-100) against per-marketplace ideal targets",
    after_help = "\
Examples:
  marketscore score --volume 600 --competitors 3000 --price 12 --royalties 4
  marketscore score --volume 450 --competitors 900 --check intent,genre --explain
  marketscore batch keywords.json --min-level regular
  marketscore targets set es --volume 250 --competitors 900
  marketscore targets restore es"
)]
pub struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Directory holding ideal-target overrides
    #[arg(long, global = true, env = "MARKETSCORE_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Marketplace to score against (default from user config, else "us")
    #[arg(long, short = 'm', global = true)]
    pub marketplace: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create ~/.config/marketscore/config.toml with example settings
    Init,

    /// Score a single observation
    Score {
        /// Monthly search volume
        #[arg(long, default_value = "0")]
        volume: u64,

        /// Number of competing listings
        #[arg(long, default_value = "0")]
        competitors: u64,

        /// Book price
        #[arg(long, value_parser = parse_amount)]
        price: Option<f64>,

        /// Net royalties per sale
        #[arg(long, value_parser = parse_amount)]
        royalties: Option<f64>,

        /// Dominant-brand presence
        #[arg(long, default_value = "low", value_parser = ["low", "medium", "high"])]
        brand_risk: String,

        /// Where the demand comes from
        #[arg(long, default_value = "unknown", value_parser = ["amazon", "mixed", "external", "unknown"])]
        traffic: String,

        /// Satisfied structure checks (intent, suggested, profitable, indie, genre, variants)
        #[arg(long, value_delimiter = ',', value_parser = parse_check)]
        check: Vec<StructureCheck>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Explain the scoring formula with full breakdown
        #[arg(long)]
        explain: bool,
    },

    /// Score every record in a JSON keyword export (legacy or continuous)
    Batch {
        /// JSON array of keyword records ("-" reads stdin)
        input: PathBuf,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Only keep keywords at or above this level
        #[arg(long, value_parser = ["low", "regular", "excellent"])]
        min_level: Option<String>,

        /// Upgrade legacy records to continuous market data in the output
        #[arg(long)]
        migrate: bool,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show or change ideal targets
    Targets {
        #[command(subcommand)]
        action: TargetsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum TargetsAction {
    /// Show active targets for a marketplace
    Show {
        /// Marketplace id (default: --marketplace or user config)
        #[arg(value_name = "MARKETPLACE")]
        id: Option<String>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Override targets for a marketplace (unset fields keep their active value)
    Set {
        #[arg(value_name = "MARKETPLACE")]
        id: String,

        #[arg(long, value_parser = parse_amount)]
        volume: Option<f64>,

        #[arg(long, value_parser = parse_amount)]
        competitors: Option<f64>,

        #[arg(long, value_parser = parse_amount)]
        price: Option<f64>,

        #[arg(long, value_parser = parse_amount)]
        royalties: Option<f64>,
    },

    /// Drop the override for a marketplace
    Restore {
        #[arg(value_name = "MARKETPLACE")]
        id: String,
    },

    /// List supported marketplaces and their active targets
    List,
}

/// Settings shared by every command
pub(crate) struct Context {
    pub store: ConfigStore<FileStore>,
    pub marketplace: String,
}

impl Context {
    fn load(config_dir: Option<&PathBuf>, marketplace: Option<&str>) -> Result<Self> {
        let user_config = UserConfig::load()?;
        let dir = config_dir
            .cloned()
            .unwrap_or_else(|| user_config.storage_dir());
        let marketplace = marketplace
            .map(str::to_string)
            .unwrap_or_else(|| user_config.default_marketplace());
        debug!("Using override storage at {}", dir.display());

        Ok(Self {
            store: ConfigStore::new(FileStore::new(dir)),
            marketplace,
        })
    }
}

/// Style a string with the color of a score level
pub(crate) fn styled_level(level: MarketScoreLevel, text: String) -> console::StyledObject<String> {
    match level {
        MarketScoreLevel::Excellent => style(text).green().bold(),
        MarketScoreLevel::Regular => style(text).yellow().bold(),
        MarketScoreLevel::Low => style(text).red().bold(),
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let Cli {
        config_dir,
        marketplace,
        command,
        ..
    } = cli;
    let context = || Context::load(config_dir.as_ref(), marketplace.as_deref());

    match command {
        Commands::Init => init::run(),

        Commands::Score {
            volume,
            competitors,
            price,
            royalties,
            brand_risk,
            traffic,
            check,
            format,
            explain,
        } => score::run(
            &context()?,
            score::ScoreArgs {
                volume,
                competitors,
                price,
                royalties,
                brand_risk,
                traffic,
                checks: check,
            },
            &format,
            explain,
        ),

        Commands::Batch {
            input,
            format,
            min_level,
            migrate,
            output,
        } => batch::run(
            &context()?,
            &input,
            &format,
            min_level.as_deref(),
            migrate,
            output.as_deref(),
        ),

        Commands::Targets { action } => match action {
            TargetsAction::Show { id, format } => {
                targets::show(&context()?, id.as_deref(), &format)
            }
            TargetsAction::Set {
                id,
                volume,
                competitors,
                price,
                royalties,
            } => targets::set(
                &context()?,
                &id,
                targets::TargetChanges {
                    search_volume: volume,
                    competitors,
                    price,
                    royalties,
                },
            ),
            TargetsAction::Restore { id } => targets::restore(&context()?, &id),
            TargetsAction::List => targets::list(&context()?),
        },
    }
}
