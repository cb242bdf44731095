//! Init command - create the user config file

use anyhow::{Context, Result};
use console::style;
use marketscore::config::UserConfig;

/// Run the init command
pub fn run() -> Result<()> {
    let existed = UserConfig::user_config_path().is_some_and(|p| p.exists());
    let config_path =
        UserConfig::init_user_config().context("Failed to create user config file")?;

    if existed {
        println!(
            "{} Already initialized at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    } else {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    }

    println!("\n{}", style("Next steps:").bold());
    println!("  1. Set your default marketplace in the config file");
    println!("  2. Run {}", style("marketscore targets list").cyan());
    Ok(())
}
