//! Document parser strategies and cross-validation.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::{DetectionPattern, PatternCategory};
use crate::models::scan::{
    CandidateAmount, DocumentKind, ExtractionResult, METHOD_CROSS_VALIDATED, METHOD_NONE,
};
use crate::patterns::PatternManager;

use super::normalize::normalize;
use super::rules::{extract_candidates, DateExtractor};

/// Strategy interface shared by all document parsers.
pub trait DocumentParser {
    /// Document kind this parser handles.
    fn kind(&self) -> DocumentKind;

    /// Parse recognized text into a structured result. Pure over the
    /// text and the pattern set captured at construction; never fails.
    fn parse(&self, text: &str) -> ExtractionResult;
}

/// Shared extraction pipeline: normalize, collect amount candidates,
/// cross-validate, extract date and payment method.
pub struct ExtractionEngine {
    amount_patterns: Vec<DetectionPattern>,
    payment_patterns: Vec<DetectionPattern>,
}

impl ExtractionEngine {
    /// Build an engine over rank-ordered copies of the given sets.
    pub fn new(
        mut amount_patterns: Vec<DetectionPattern>,
        mut payment_patterns: Vec<DetectionPattern>,
    ) -> Self {
        amount_patterns.sort_by_key(|p| p.rank);
        payment_patterns.sort_by_key(|p| p.rank);
        Self {
            amount_patterns,
            payment_patterns,
        }
    }

    /// Run the pipeline over one document's text.
    pub fn run(&self, text: &str) -> ExtractionResult {
        let lines = normalize(text);

        let candidates = extract_candidates(&lines, &self.amount_patterns);
        let (amount, detection_method, reliable) = cross_validate(&candidates);

        let date = DateExtractor::new().extract(&lines.join("\n"));
        let payment_method = self.detect_payment(&lines);

        debug!(
            "extracted amount {amount} via {detection_method} (reliable: {reliable}, {} candidates)",
            candidates.len()
        );

        ExtractionResult {
            amount,
            date,
            detection_method,
            reliable,
            candidates,
            payment_method,
        }
    }

    fn detect_payment(&self, lines: &[String]) -> Option<String> {
        for pattern in &self.payment_patterns {
            let regex = pattern.compiled_regex();
            let marker_upper = pattern.marker.to_uppercase();

            for line in lines {
                let matched = match &regex {
                    Some(re) => re.is_match(line),
                    None => line.to_uppercase().contains(&marker_upper),
                };
                if matched {
                    return Some(pattern.name.clone());
                }
            }
        }
        None
    }
}

/// Reconcile candidate amounts into one value with a reliability flag.
///
/// Two or more distinct patterns agreeing on a value (after 2-dp
/// rounding) make it reliable regardless of which pattern triggered.
/// Otherwise the highest-ranked candidate wins and is reliable only
/// when exactly one pattern fired at all.
fn cross_validate(candidates: &[CandidateAmount]) -> (Decimal, String, bool) {
    if candidates.is_empty() {
        return (Decimal::ZERO, METHOD_NONE.to_string(), false);
    }

    let mut patterns_by_value: HashMap<Decimal, BTreeSet<&str>> = HashMap::new();
    for candidate in candidates {
        patterns_by_value
            .entry(candidate.value)
            .or_default()
            .insert(candidate.pattern.as_str());
    }

    // Candidates are in rank order, so the first agreed value is also
    // the best-ranked one.
    for candidate in candidates {
        if patterns_by_value[&candidate.value].len() >= 2 {
            return (candidate.value, METHOD_CROSS_VALIDATED.to_string(), true);
        }
    }

    let distinct: BTreeSet<&str> = candidates.iter().map(|c| c.pattern.as_str()).collect();
    let top = &candidates[0];
    (top.value, top.pattern.clone(), distinct.len() == 1)
}

fn engine_with_priority_markers(
    manager: &PatternManager,
    extras: &[(&str, &str)],
) -> ExtractionEngine {
    let mut amount: Vec<DetectionPattern> = extras
        .iter()
        .map(|(name, marker)| DetectionPattern::marker(name, marker, 0, PatternCategory::Amount))
        .collect();
    amount.extend(manager.amount_patterns());
    ExtractionEngine::new(amount, manager.payment_patterns())
}

/// Parser for generic store/restaurant receipts.
pub struct TicketParser {
    engine: ExtractionEngine,
}

impl TicketParser {
    pub fn new(manager: &PatternManager) -> Self {
        Self {
            engine: ExtractionEngine::new(manager.amount_patterns(), manager.payment_patterns()),
        }
    }
}

impl DocumentParser for TicketParser {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Ticket
    }

    fn parse(&self, text: &str) -> ExtractionResult {
        self.engine.run(text)
    }
}

/// Parser for ride-hailing and taxi receipts, which label the amount
/// as a fare rather than a register total.
pub struct RideReceiptParser {
    engine: ExtractionEngine,
}

impl RideReceiptParser {
    const PRIORITY_MARKERS: &'static [(&'static str, &'static str)] = &[
        ("PRIX_COURSE", "PRIX DE LA COURSE"),
        ("TARIF", "TARIF"),
        ("COURSE", "COURSE"),
    ];

    pub fn new(manager: &PatternManager) -> Self {
        Self {
            engine: engine_with_priority_markers(manager, Self::PRIORITY_MARKERS),
        }
    }
}

impl DocumentParser for RideReceiptParser {
    fn kind(&self) -> DocumentKind {
        DocumentKind::RideReceipt
    }

    fn parse(&self, text: &str) -> ExtractionResult {
        self.engine.run(text)
    }
}

/// Parser for salary payslips, which print the net payable amount.
pub struct PayslipParser {
    engine: ExtractionEngine,
}

impl PayslipParser {
    const PRIORITY_MARKERS: &'static [(&'static str, &'static str)] = &[
        ("SALAIRE_NET", "SALAIRE NET"),
        ("NET_VERSE", "NET VERSE"),
    ];

    pub fn new(manager: &PatternManager) -> Self {
        Self {
            engine: engine_with_priority_markers(manager, Self::PRIORITY_MARKERS),
        }
    }
}

impl DocumentParser for PayslipParser {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Payslip
    }

    fn parse(&self, text: &str) -> ExtractionResult {
        self.engine.run(text)
    }
}

/// Selects the parser strategy for a document kind.
///
/// Parsers are built per call from the manager's current pattern set,
/// so learned patterns take effect on the next parse.
pub struct ParserDispatch {
    manager: Arc<PatternManager>,
}

impl ParserDispatch {
    pub fn new(manager: Arc<PatternManager>) -> Self {
        Self { manager }
    }

    /// Build the strategy for a document kind.
    pub fn parser_for(&self, kind: DocumentKind) -> Box<dyn DocumentParser> {
        match kind {
            DocumentKind::Ticket => Box::new(TicketParser::new(&self.manager)),
            DocumentKind::RideReceipt => Box::new(RideReceiptParser::new(&self.manager)),
            DocumentKind::Payslip => Box::new(PayslipParser::new(&self.manager)),
        }
    }

    /// Parse text as the given document kind.
    pub fn parse(&self, kind: DocumentKind, text: &str) -> ExtractionResult {
        self.parser_for(kind).parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn dispatch() -> ParserDispatch {
        ParserDispatch::new(Arc::new(PatternManager::builtin()))
    }

    #[test]
    fn test_parse_receipt_with_total_and_date() {
        let result = dispatch().parse(DocumentKind::Ticket, "TOTAL TTC: 25.80€\nDate: 19/12/2024");

        assert_eq!(result.amount, dec("25.80"));
        assert_eq!(result.date, NaiveDate::from_ymd_opt(2024, 12, 19));
        assert!(result.reliable);
        assert_eq!(result.detection_method, METHOD_CROSS_VALIDATED);
        assert!(!result.candidates.is_empty());
    }

    #[test]
    fn test_no_amount_found() {
        let result = dispatch().parse(DocumentKind::Ticket, "RESTAURANT XYZ\nMerci");

        assert_eq!(result.amount, Decimal::ZERO);
        assert_eq!(result.detection_method, METHOD_NONE);
        assert!(!result.reliable);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_single_pattern_is_reliable() {
        let result = dispatch().parse(DocumentKind::Ticket, "MONTANT 4,30");

        assert_eq!(result.amount, dec("4.30"));
        assert_eq!(result.detection_method, "MONTANT");
        assert!(result.reliable);
    }

    #[test]
    fn test_disagreeing_patterns_pick_rank_and_flag_unreliable() {
        let result = dispatch().parse(DocumentKind::Ticket, "MONTANT 4.30\nSOMME 9.99");

        // MONTANT outranks SOMME in the built-in set.
        assert_eq!(result.amount, dec("4.30"));
        assert_eq!(result.detection_method, "MONTANT");
        assert!(!result.reliable);
        assert_eq!(result.candidates.len(), 2);
    }

    #[test]
    fn test_cross_validation_over_separator_styles() {
        let result = dispatch().parse(DocumentKind::Ticket, "TOTAL 25,80\nMONTANT 25.80");

        assert_eq!(result.amount, dec("25.80"));
        assert!(result.reliable);
        assert_eq!(result.detection_method, METHOD_CROSS_VALIDATED);
    }

    #[test]
    fn test_payment_method_detected() {
        let result = dispatch().parse(DocumentKind::Ticket, "TOTAL 12.00\nCARTE BANCAIRE");

        assert_eq!(result.payment_method.as_deref(), Some("CARTE_BANCAIRE"));
    }

    #[test]
    fn test_ride_receipt_prefers_fare_marker() {
        let result = dispatch().parse(DocumentKind::RideReceipt, "TARIF 12,50\nMerci d'avoir voyagé");

        assert_eq!(result.amount, dec("12.50"));
        assert_eq!(result.detection_method, "TARIF");
        assert!(result.reliable);
    }

    #[test]
    fn test_ride_receipt_fare_markers_cross_validate() {
        let result = dispatch().parse(DocumentKind::RideReceipt, "PRIX DE LA COURSE 12,50");

        assert_eq!(result.amount, dec("12.50"));
        assert_eq!(result.detection_method, METHOD_CROSS_VALIDATED);
        assert!(result.reliable);
    }

    #[test]
    fn test_payslip_prefers_net_pay_marker() {
        let result = dispatch().parse(
            DocumentKind::Payslip,
            "SALAIRE BRUT 3 100,00\nSALAIRE NET 2 345,67",
        );

        assert_eq!(result.amount, dec("2345.67"));
        assert_eq!(result.detection_method, "SALAIRE_NET");
    }

    #[test]
    fn test_dispatch_kinds() {
        let dispatch = dispatch();
        for kind in [DocumentKind::Ticket, DocumentKind::RideReceipt, DocumentKind::Payslip] {
            assert_eq!(dispatch.parser_for(kind).kind(), kind);
        }
    }
}
