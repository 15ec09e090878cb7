//! Analyze a user correction against the original recognized text.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;

use tickscan_core::models::scan::METHOD_NONE;
use tickscan_core::{
    determine_success_level, CorrectionAnalyzer, DocumentKind, PatternManager, ScanHistory,
    ScanLogEntry,
};

#[derive(Args)]
pub struct CorrectArgs {
    /// Recognized-text file the correction applies to
    pub file: PathBuf,

    /// Amount the extractor originally reported
    #[arg(long)]
    pub detected: Decimal,

    /// Amount the user confirmed
    #[arg(long)]
    pub corrected: Decimal,

    /// Detection method(s) recorded for the original scan
    #[arg(short, long = "method")]
    pub methods: Vec<String>,

    /// Document kind: ticket, ride or payslip
    #[arg(short, long, default_value = "ticket")]
    pub kind: DocumentKind,

    /// Persist the suggested pattern into the configuration
    #[arg(long)]
    pub learn: bool,

    /// Record the corrected outcome in the scan history
    #[arg(long)]
    pub log: bool,

    /// Emit the analysis as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(
    args: CorrectArgs,
    patterns_path: Option<&Path>,
    history_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;

    let analysis =
        CorrectionAnalyzer::new().analyze(&text, args.detected, args.corrected, &args.methods);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else if analysis.already_detected {
        println!("Already detected; nothing to learn.");
    } else if analysis.found_in_text {
        println!(
            "Corrected amount found in the text as {:?}.",
            analysis.matched_variant.as_deref().unwrap_or_default()
        );
        for line in &analysis.context_lines {
            println!("  | {line}");
        }
        match &analysis.suggested_pattern {
            Some(marker) => println!("Suggested pattern: {marker:?}"),
            None => println!("No usable label found next to the amount."),
        }
    } else {
        println!("Scan error: the corrected amount never appears in the recognized text.");
    }

    if args.learn {
        if let Some(pattern) = analysis.to_learned_pattern() {
            let manager = PatternManager::open(super::patterns_path(patterns_path));
            manager.learn(pattern);
            manager.save()?;
            println!("Pattern saved to {}", manager.config_path().display());
        }
    }

    if args.log {
        let history = ScanHistory::open(super::history_dir(history_dir))?;
        history.log_scan(&ScanLogEntry {
            timestamp: Utc::now(),
            document_kind: args.kind,
            detected_amount: args.detected,
            corrected_amount: Some(args.corrected),
            detection_method: args
                .methods
                .first()
                .cloned()
                .unwrap_or_else(|| METHOD_NONE.to_string()),
            reliable: false,
            success: determine_success_level(
                args.detected,
                Some(args.corrected),
                analysis.scan_error,
            ),
        })?;
    }

    Ok(())
}
