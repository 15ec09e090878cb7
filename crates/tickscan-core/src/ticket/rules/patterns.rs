//! Common regex patterns for receipt field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Numeric tokens. Alternation order matters: grouped-thousands
    // forms first, then plain decimals, then bare integers.
    pub static ref AMOUNT_TOKEN: Regex = Regex::new(
        r"\d{1,3}(?:[\s\u{00a0}.,]\d{3})+(?:[.,]\d{1,2})?|\d+[.,]\d{1,2}|\d+"
    ).unwrap();

    // A token ending in a decimal part, e.g. 25.80 or 1 234,56.
    pub static ref DECIMAL_SUFFIX: Regex = Regex::new(
        r"[.,]\d{1,2}$"
    ).unwrap();

    // Date patterns
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})[./\-](\d{1,2})[./\-](\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_YMD: Regex = Regex::new(
        r"\b(\d{4})[./\-](\d{1,2})[./\-](\d{1,2})\b"
    ).unwrap();

    pub static ref DATE_FRENCH_LONG: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:er)?\s+(janvier|f[ée]vrier|mars|avril|mai|juin|juillet|ao[ûu]t|septembre|octobre|novembre|d[ée]cembre)\s+(\d{4})"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_token_forms() {
        let cases = [
            ("TOTAL TTC: 25.80€", "25.80"),
            ("Razem 1 234,56", "1 234,56"),
            ("1.234,56 EUR", "1.234,56"),
            ("1,234.56 USD", "1,234.56"),
            ("CB 2580", "2580"),
        ];
        for (line, expected) in cases {
            let found = AMOUNT_TOKEN.find(line).map(|m| m.as_str());
            assert_eq!(found, Some(expected), "line: {line}");
        }
    }

    #[test]
    fn test_amount_token_does_not_merge_neighbors() {
        let tokens: Vec<&str> = AMOUNT_TOKEN
            .find_iter("TOTAL 25.80 TVA 4.30")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tokens, vec!["25.80", "4.30"]);
    }

    #[test]
    fn test_date_patterns() {
        assert!(DATE_DMY.is_match("19/12/2024"));
        assert!(DATE_DMY.is_match("19.12.24"));
        assert!(DATE_YMD.is_match("2024-12-19"));
        assert!(DATE_FRENCH_LONG.is_match("19 décembre 2024"));
        assert!(DATE_FRENCH_LONG.is_match("1er janvier 2025"));
    }
}
