//! Correction learning: turn user corrections into new detection
//! patterns.
//!
//! When a user fixes a detected amount, the original text either
//! contained the correct value under some numeric rendering (a
//! detection-pattern gap we can learn from) or it never did (an
//! optical recognition failure nothing can be learned from). The two
//! cases call for different remedies, so the analysis keeps them
//! strictly apart.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::config::{DetectionPattern, PatternCategory};

/// Comparison tolerance for monetary amounts: 0.01 currency units,
/// the smallest representable difference at two decimal places.
pub fn amount_epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// Result of comparing a detected amount against a user-confirmed one
/// for a single document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CorrectionAnalysis {
    /// The original detection already matched; nothing to learn.
    pub already_detected: bool,

    /// The confirmed value appears in the text under some variant.
    pub found_in_text: bool,

    /// The confirmed value appears nowhere in the text: an optical
    /// recognition failure, not a pattern gap.
    pub scan_error: bool,

    /// The numeric rendering under which the value was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_variant: Option<String>,

    /// Lines surrounding the match.
    pub context_lines: Vec<String>,

    /// Marker synthesized from the words adjacent to the match, a
    /// candidate for the pattern set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_pattern: Option<String>,
}

impl CorrectionAnalysis {
    /// Convert the suggestion into a detection pattern. The rank is a
    /// placeholder; [`PatternManager::learn`](crate::patterns::PatternManager::learn)
    /// assigns the effective one on append.
    pub fn to_learned_pattern(&self) -> Option<DetectionPattern> {
        let marker = self.suggested_pattern.as_ref()?;
        let name: String = marker
            .to_uppercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();

        Some(DetectionPattern {
            name,
            marker: marker.clone(),
            regex: None,
            rank: 0,
            category: PatternCategory::Amount,
        })
    }
}

/// Analyzes user corrections against the original recognized text.
pub struct CorrectionAnalyzer {
    epsilon: Decimal,
    context_window: usize,
}

impl CorrectionAnalyzer {
    pub fn new() -> Self {
        Self {
            epsilon: amount_epsilon(),
            context_window: 1,
        }
    }

    /// Set the amount comparison tolerance.
    pub fn with_epsilon(mut self, epsilon: Decimal) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set how many lines around a match are captured as context.
    pub fn with_context_window(mut self, lines: usize) -> Self {
        self.context_window = lines;
        self
    }

    /// Analyze one correction event. Pure with respect to external
    /// state; every input combination yields a well-defined analysis.
    pub fn analyze(
        &self,
        ocr_text: &str,
        detected_amount: Decimal,
        corrected_amount: Decimal,
        detection_methods: &[String],
    ) -> CorrectionAnalysis {
        let mut analysis = CorrectionAnalysis::default();

        if (detected_amount - corrected_amount).abs() <= self.epsilon
            && !detection_methods.is_empty()
        {
            debug!("correction to {corrected_amount} already detected, nothing to learn");
            analysis.already_detected = true;
            return analysis;
        }

        let lines: Vec<&str> = ocr_text.lines().map(str::trim).collect();

        for variant in generate_amount_variants(corrected_amount) {
            let Some(index) = lines.iter().position(|l| l.contains(variant.as_str())) else {
                continue;
            };

            let start = index.saturating_sub(self.context_window);
            let end = (index + self.context_window + 1).min(lines.len());
            analysis.context_lines = lines[start..end]
                .iter()
                .filter(|l| !l.is_empty())
                .map(|l| l.to_string())
                .collect();

            analysis.found_in_text = true;
            analysis.suggested_pattern =
                suggest_pattern_from_context(&analysis.context_lines, &variant);
            debug!(
                "corrected amount found as {variant:?}, suggesting pattern {:?}",
                analysis.suggested_pattern
            );
            analysis.matched_variant = Some(variant);
            return analysis;
        }

        debug!("corrected amount {corrected_amount} absent from text: scan error");
        analysis.scan_error = true;
        analysis
    }
}

impl Default for CorrectionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric renderings a receipt may use for an amount: dot decimal,
/// comma decimal, currency-suffixed copies of both, the bare integer
/// for whole amounts, and the no-separator cents form. At least 5
/// variants for any amount.
pub fn generate_amount_variants(amount: Decimal) -> Vec<String> {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);

    let dot_form = rounded.to_string();
    let comma_form = dot_form.replace('.', ",");
    let cents_form = (rounded * Decimal::ONE_HUNDRED).normalize().to_string();

    let mut variants = vec![
        dot_form.clone(),
        comma_form.clone(),
        format!("{dot_form}€"),
        format!("{comma_form}€"),
    ];

    if rounded.fract().is_zero() {
        let whole = rounded.normalize().to_string();
        variants.push(format!("{whole}€"));
        variants.push(whole);
    }

    // The cents form matches aggressively (any digit run), keep it as
    // the last resort.
    variants.push(cents_form);

    variants.dedup();
    variants
}

/// Synthesize a marker from the words adjacent to a matched amount.
/// ALL-CAPS tokens (receipt labels like "TOTAL", "PRICE") are
/// preferred; lowercase labels are promoted as a fallback.
pub fn suggest_pattern_from_context(context_lines: &[String], variant: &str) -> Option<String> {
    let anchor = context_lines.iter().position(|l| l.contains(variant))?;

    let line = &context_lines[anchor];
    let prefix = &line[..line.find(variant).unwrap_or(line.len())];
    if let Some(marker) = marker_from_tokens(prefix) {
        return Some(marker);
    }

    // Nearest surrounding lines next: the label may sit on its own
    // line above the amount.
    let before = context_lines[..anchor].iter().rev();
    let after = context_lines[anchor + 1..].iter();
    before.chain(after).find_map(|l| marker_from_tokens(l))
}

fn marker_from_tokens(text: &str) -> Option<String> {
    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect();

    let is_caps = |t: &str| t.len() >= 2 && t.chars().all(|c| c.is_alphabetic() && c.is_uppercase());

    // Trailing run of ALL-CAPS tokens, nearest the amount; two words
    // are enough to make a distinctive marker.
    let run: Vec<&String> = tokens
        .iter()
        .rev()
        .take_while(|t| is_caps(t))
        .collect();
    if !run.is_empty() {
        let marker: Vec<&str> = run.iter().rev().map(|t| t.as_str()).collect();
        let start = marker.len().saturating_sub(2);
        return Some(marker[start..].join(" "));
    }

    tokens
        .iter()
        .rev()
        .find(|t| t.len() >= 3 && t.chars().all(char::is_alphabetic))
        .map(|t| t.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_variants_for_cents_amount() {
        let variants = generate_amount_variants(dec("25.80"));

        for expected in ["25.80", "25,80", "2580", "25.80€", "25,80€"] {
            assert!(variants.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(variants.len() >= 5);
    }

    #[test]
    fn test_variants_for_whole_amount() {
        let variants = generate_amount_variants(dec("26"));

        for expected in ["26.00", "26,00", "26", "26€", "2600"] {
            assert!(variants.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn test_already_detected_short_circuits() {
        let analysis = CorrectionAnalyzer::new().analyze(
            "TOTAL 25.80",
            dec("25.80"),
            dec("25.80"),
            &["TOTAL".to_string()],
        );

        assert!(analysis.already_detected);
        assert!(!analysis.found_in_text);
        assert!(!analysis.scan_error);
        assert!(analysis.suggested_pattern.is_none());
    }

    #[test]
    fn test_tolerance_covers_rounding_noise() {
        let analysis = CorrectionAnalyzer::new().analyze(
            "TOTAL 25.80",
            dec("25.80"),
            dec("25.81"),
            &["TOTAL".to_string()],
        );

        assert!(analysis.already_detected);
    }

    #[test]
    fn test_no_detection_method_is_not_already_detected() {
        let analysis = CorrectionAnalyzer::new().analyze(
            "TOTAL 25.80",
            dec("25.80"),
            dec("25.80"),
            &[],
        );

        assert!(!analysis.already_detected);
        assert!(analysis.found_in_text);
    }

    #[test]
    fn test_found_variant_suggests_adjacent_label() {
        let analysis = CorrectionAnalyzer::new().analyze(
            "PRICE FINAL: 25.80€\nDate: 19/12/2024",
            Decimal::ZERO,
            dec("25.80"),
            &[],
        );

        assert!(analysis.found_in_text);
        assert!(!analysis.scan_error);
        assert!(!analysis.context_lines.is_empty());

        let suggested = analysis.suggested_pattern.expect("a pattern suggestion");
        assert!(
            suggested.contains("PRICE") || suggested.contains("FINAL"),
            "unexpected suggestion: {suggested}"
        );
    }

    #[test]
    fn test_absent_value_is_scan_error() {
        let analysis = CorrectionAnalyzer::new().analyze(
            "RESTAURANT XYZ\nMerci",
            Decimal::ZERO,
            dec("25.80"),
            &[],
        );

        assert!(analysis.scan_error);
        assert!(!analysis.found_in_text);
        assert!(analysis.suggested_pattern.is_none());
    }

    #[test]
    fn test_comma_variant_found() {
        let analysis = CorrectionAnalyzer::new().analyze(
            "SOMME DUE 25,80 EUR",
            Decimal::ZERO,
            dec("25.80"),
            &[],
        );

        assert!(analysis.found_in_text);
        assert_eq!(analysis.matched_variant.as_deref(), Some("25,80"));
    }

    #[test]
    fn test_label_on_previous_line() {
        let analysis = CorrectionAnalyzer::new().analyze(
            "MONTANT DU\n25.80\nMerci",
            Decimal::ZERO,
            dec("25.80"),
            &[],
        );

        assert!(analysis.found_in_text);
        let suggested = analysis.suggested_pattern.expect("a pattern suggestion");
        assert!(suggested.contains("MONTANT") || suggested.contains("DU"));
    }

    #[test]
    fn test_lowercase_label_promoted() {
        let analysis = CorrectionAnalyzer::new().analyze(
            "total 25.80",
            Decimal::ZERO,
            dec("25.80"),
            &[],
        );

        assert_eq!(analysis.suggested_pattern.as_deref(), Some("TOTAL"));
    }

    #[test]
    fn test_learned_pattern_from_suggestion() {
        let analysis = CorrectionAnalysis {
            suggested_pattern: Some("PRICE FINAL".to_string()),
            found_in_text: true,
            ..Default::default()
        };

        let pattern = analysis.to_learned_pattern().unwrap();
        assert_eq!(pattern.marker, "PRICE FINAL");
        assert_eq!(pattern.name, "PRICE_FINAL");
        assert_eq!(pattern.category, PatternCategory::Amount);
    }
}
