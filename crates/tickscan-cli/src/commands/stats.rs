//! Show or rebuild the aggregate scan statistics.

use std::path::Path;

use clap::Args;

use tickscan_core::ScanHistory;

#[derive(Args)]
pub struct StatsArgs {
    /// Recompute both projections from the scan log before printing
    #[arg(long)]
    pub rebuild: bool,

    /// Emit the statistics as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: StatsArgs, history_dir: Option<&Path>) -> anyhow::Result<()> {
    let history = ScanHistory::open(super::history_dir(history_dir))?;

    if args.rebuild {
        history.rebuild_stats()?;
        eprintln!("Rebuilt statistics from the scan log.");
    }

    let performance = history.performance_stats()?;
    let patterns = history.pattern_stats()?;

    if args.json {
        let combined = serde_json::json!({
            "performance": performance,
            "patterns": patterns,
        });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }

    if performance.is_empty() {
        println!("No scans recorded yet.");
        return Ok(());
    }

    println!("Scan performance:");
    for (kind, stats) in &performance {
        println!(
            "  {kind:<14} {:>5} scans  {:>5.1}% success  {:>5.1}% corrected",
            stats.scans,
            stats.success_rate() * 100.0,
            stats.correction_rate() * 100.0
        );
    }

    if !patterns.is_empty() {
        println!("Pattern reliability:");
        for (name, stat) in &patterns {
            println!(
                "  {name:<20} {:>5} hits  score {:.2}",
                stat.hits,
                stat.reliability_score()
            );
        }
    }

    Ok(())
}
