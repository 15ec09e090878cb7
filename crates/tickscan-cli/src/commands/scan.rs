//! Parse a recognized-text file and report the structured result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Args;

use tickscan_core::{
    determine_success_level, DocumentKind, ParserDispatch, PatternManager, ScanHistory,
    ScanLogEntry,
};

#[derive(Args)]
pub struct ScanArgs {
    /// Recognized-text file to parse
    pub file: PathBuf,

    /// Document kind: ticket, ride or payslip
    #[arg(short, long, default_value = "ticket")]
    pub kind: DocumentKind,

    /// Emit the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not record the scan in the history
    #[arg(long)]
    pub no_log: bool,
}

pub fn run(
    args: ScanArgs,
    patterns_path: Option<&Path>,
    history_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;

    let manager = Arc::new(PatternManager::open(super::patterns_path(patterns_path)));
    let dispatch = ParserDispatch::new(manager);
    let result = dispatch.parse(args.kind, &text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let mut amount = result.amount;
        amount.rescale(2);

        if result.has_amount() {
            println!("Amount:   {amount}");
        } else {
            println!("No amount detected; please enter it manually.");
        }
        if let Some(date) = result.date {
            println!("Date:     {date}");
        }
        println!("Method:   {}", result.detection_method);
        println!("Reliable: {}", if result.reliable { "yes" } else { "no" });
        if let Some(payment) = &result.payment_method {
            println!("Payment:  {payment}");
        }
        if result.candidates.len() > 1 {
            println!("Candidates:");
            for candidate in &result.candidates {
                println!("  {:>10}  {} ({})", candidate.value, candidate.pattern, candidate.line);
            }
        }
    }

    if !args.no_log {
        let history = ScanHistory::open(super::history_dir(history_dir))?;
        history.log_scan(&ScanLogEntry {
            timestamp: Utc::now(),
            document_kind: args.kind,
            detected_amount: result.amount,
            corrected_amount: None,
            detection_method: result.detection_method.clone(),
            reliable: result.reliable,
            success: determine_success_level(result.amount, None, false),
        })?;
    }

    Ok(())
}
