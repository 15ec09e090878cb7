//! Amount token parsing and marker-driven candidate collection.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::models::config::DetectionPattern;
use crate::models::scan::CandidateAmount;

use super::patterns::{AMOUNT_TOKEN, DECIMAL_SUFFIX};

/// Parse a monetary token supporting both European (`1.234,56`) and US
/// (`1,234.56`) conventions.
///
/// Currency symbols, quotes and spaces are stripped first. The
/// right-most `,` or `.` is taken as the decimal separator and every
/// other separator occurrence is dropped; a lone comma therefore acts
/// as a decimal point and a lone dot is kept as one. The result is
/// rounded to 2 decimal places. Unparseable input returns `default`
/// and is logged, never raised.
pub fn parse_amount(raw: &str, default: Decimal) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        debug!("no digits in amount token {raw:?}, using default");
        return default;
    }

    let decimal_pos = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(c), Some(d)) => Some(c.max(d)),
        (Some(c), None) => Some(c),
        (None, Some(d)) => Some(d),
        (None, None) => None,
    };

    let mut normalized: String = cleaned
        .char_indices()
        .filter_map(|(i, ch)| {
            if ch.is_ascii_digit() || ch == '-' {
                Some(ch)
            } else if Some(i) == decimal_pos {
                Some('.')
            } else {
                None
            }
        })
        .collect();

    // A trailing separator carries no fractional digits.
    if normalized.ends_with('.') {
        normalized.pop();
    }

    match Decimal::from_str(&normalized) {
        Ok(value) => value.round_dp(2),
        Err(e) => {
            debug!("could not parse amount token {raw:?} ({normalized:?}): {e}, using default");
            default
        }
    }
}

/// Pick the amount token on a line, preferring the last token that
/// carries a decimal part; receipts print the amount after the label
/// and cents after the units.
pub fn amount_token(line: &str) -> Option<&str> {
    let mut last_any = None;
    let mut last_decimal = None;

    for m in AMOUNT_TOKEN.find_iter(line) {
        let token = m.as_str();
        last_any = Some(token);
        if DECIMAL_SUFFIX.is_match(token) {
            last_decimal = Some(token);
        }
    }

    last_decimal.or(last_any)
}

/// Scan normalized lines with a ranked pattern set and collect every
/// line-level amount candidate. Patterns must already be rank-ordered;
/// the output preserves that order.
pub fn extract_candidates(
    lines: &[String],
    patterns: &[DetectionPattern],
) -> Vec<CandidateAmount> {
    let mut candidates = Vec::new();

    for pattern in patterns {
        let regex = pattern.compiled_regex();
        let marker_upper = pattern.marker.to_uppercase();

        for line in lines {
            let matched = match &regex {
                Some(re) => re.is_match(line),
                None => line.to_uppercase().contains(&marker_upper),
            };
            if !matched {
                continue;
            }

            let Some(token) = amount_token(line) else {
                continue;
            };

            let value = parse_amount(token, Decimal::ZERO);
            if value.is_zero() {
                // Zero doubles as the "not found" sentinel; a zero
                // candidate carries no signal either way.
                continue;
            }

            candidates.push(CandidateAmount {
                value,
                pattern: pattern.name.clone(),
                line: line.clone(),
            });
        }
    }

    candidates
}
