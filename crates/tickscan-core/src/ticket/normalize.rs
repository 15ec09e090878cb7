//! Raw OCR text normalization.
//!
//! Recognized receipt text arrives with uneven spacing and the usual
//! optical confusions between letters and digits. Normalization turns
//! it into a clean line sequence without ever corrupting the textual
//! markers the extractor searches for.

/// Keywords that must survive normalization intact. A confusion fix
/// whose result loses one of these from a line is discarded for that
/// line.
pub const PROTECTED_KEYWORDS: &[&str] = &[
    "MONTANT", "TOTAL", "TICKET", "SOMME", "PAYER", "TTC", "CARTE", "ESPECES", "CHEQUE",
    "VIREMENT", "SALAIRE", "TARIF", "DATE",
];

/// Normalize raw recognized text into a canonical line sequence.
///
/// Lines are trimmed, interior whitespace runs collapsed, and empty
/// lines dropped. An entirely empty input yields exactly one empty
/// line. Total and idempotent; never fails.
pub fn normalize(raw: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for line in raw.lines() {
        let collapsed = collapse_whitespace(line);
        if collapsed.is_empty() {
            continue;
        }

        let fixed = fix_confusions(&collapsed);
        if corrupts_keyword(&collapsed, &fixed) {
            lines.push(collapsed);
        } else {
            lines.push(fixed);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fix common optical letter/digit confusions, but only where at least
/// one neighbor is a digit. Keyword letters never sit next to digits,
/// which keeps markers like "MONTANT" out of reach of these fixes.
fn fix_confusions(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());

    for (i, &c) in chars.iter().enumerate() {
        let prev_digit = i > 0 && chars[i - 1].is_ascii_digit();
        let next_digit = i + 1 < chars.len() && chars[i + 1].is_ascii_digit();

        let fixed = match c {
            'O' | 'o' if prev_digit || next_digit => '0',
            'l' | 'I' | '|' if prev_digit || next_digit => '1',
            'B' if prev_digit && next_digit => '8',
            'S' if prev_digit && next_digit => '5',
            _ => c,
        };
        out.push(fixed);
    }

    out
}

fn corrupts_keyword(original: &str, fixed: &str) -> bool {
    let original_upper = original.to_uppercase();
    let fixed_upper = fixed.to_uppercase();

    PROTECTED_KEYWORDS
        .iter()
        .any(|kw| original_upper.contains(kw) && !fixed_upper.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines_trimmed_and_blank_dropped() {
        let lines = normalize("  TOTAL TTC: 25.80€  \n\n   \nMerci\n");
        assert_eq!(lines, vec!["TOTAL TTC: 25.80€", "Merci"]);
    }

    #[test]
    fn test_empty_input_single_empty_line() {
        assert_eq!(normalize(""), vec![String::new()]);
        assert_eq!(normalize("   \n  \n"), vec![String::new()]);
    }

    #[test]
    fn test_digit_context_confusions_fixed() {
        let lines = normalize("TOTAL 25.8O\nREF 1l2");
        assert_eq!(lines, vec!["TOTAL 25.80", "REF 112"]);
    }

    #[test]
    fn test_montant_never_corrupted() {
        let inputs = [
            "MONTANT: 25,80",
            "MONTANT TTC 1O2.50",
            "  MONTANT   25.8O €",
        ];
        for input in inputs {
            let joined = normalize(input).join("\n");
            assert!(joined.contains("MONTANT"), "corrupted: {joined}");
            assert!(!joined.contains("M0NTANT"), "corrupted: {joined}");
        }
    }

    #[test]
    fn test_keyword_adjacent_to_digit_reverts_fix() {
        // The trailing 'l' of a marker glued to a digit would become
        // '1' and destroy the keyword; the line must stay unmodified.
        let lines = normalize("TOTAl5.00");
        assert_eq!(lines, vec!["TOTAl5.00"]);
    }

    #[test]
    fn test_idempotent() {
        let raw = "TOTAL TTC: 25.8O€\n  Date : 19/12/2024 \n\nMerci de votre visite";
        let once = normalize(raw);
        let twice = normalize(&once.join("\n"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_interior_whitespace_collapsed() {
        assert_eq!(normalize("TOTAL    TTC\t25.80"), vec!["TOTAL TTC 25.80"]);
    }
}
