//! Inspect or initialize the detection pattern configuration.

use std::path::Path;

use anyhow::Context;
use clap::Args;

use tickscan_core::{PatternConfig, PatternManager};

#[derive(Args)]
pub struct PatternsArgs {
    /// Write the built-in default set to the configuration path
    #[arg(long)]
    pub init: bool,

    /// Emit the pattern sets as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PatternsArgs, patterns_path: Option<&Path>) -> anyhow::Result<()> {
    let path = super::patterns_path(patterns_path);

    if args.init {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        PatternConfig::builtin().save(&path)?;
        println!("Wrote built-in patterns to {}", path.display());
        return Ok(());
    }

    let manager = PatternManager::open(&path);
    let amount = manager.amount_patterns();
    let payment = manager.payment_patterns();

    if args.json {
        let combined = serde_json::json!({
            "amount": amount,
            "payment": payment,
        });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }

    println!("Amount patterns:");
    for pattern in &amount {
        let matcher = match &pattern.regex {
            Some(re) => format!("regex {re:?}"),
            None => format!("{:?}", pattern.marker),
        };
        println!("  [{:>2}] {:<20} {matcher}", pattern.rank, pattern.name);
    }

    println!("Payment patterns:");
    for pattern in &payment {
        println!("  [{:>2}] {:<20} {:?}", pattern.rank, pattern.name, pattern.marker);
    }

    Ok(())
}
