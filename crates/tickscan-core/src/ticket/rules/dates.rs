//! Date extraction from receipt text.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DATE_FRENCH_LONG, DATE_YMD};

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// First recognizable date in the text, if any. Absence of a
    /// parseable date is not an error.
    pub fn extract(&self, text: &str) -> Option<NaiveDate> {
        self.extract_all(text).into_iter().next()
    }

    /// All recognizable dates, deduplicated, in match order.
    pub fn extract_all(&self, text: &str) -> Vec<NaiveDate> {
        let mut results = Vec::new();

        // DD/MM/YYYY, DD.MM.YYYY, DD-MM-YYYY; month-first input is
        // recovered by swapping when day/month is out of range.
        for caps in DATE_DMY.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let year = parse_year(&caps[3]);

            let date = NaiveDate::from_ymd_opt(year, month, day)
                .or_else(|| NaiveDate::from_ymd_opt(year, day, month));

            if let Some(date) = date {
                if !results.contains(&date) {
                    results.push(date);
                }
            }
        }

        // YYYY-MM-DD or YYYY/MM/DD
        for caps in DATE_YMD.captures_iter(text) {
            let year: i32 = caps[1].parse().unwrap_or(0);
            let month: u32 = caps[2].parse().unwrap_or(0);
            let day: u32 = caps[3].parse().unwrap_or(0);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                if !results.contains(&date) {
                    results.push(date);
                }
            }
        }

        // French long format: "19 décembre 2024"
        for caps in DATE_FRENCH_LONG.captures_iter(text) {
            let day: u32 = caps[1].parse().unwrap_or(0);
            let month = french_month_to_number(&caps[2]);
            let year: i32 = caps[3].parse().unwrap_or(0);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                if !results.contains(&date) {
                    results.push(date);
                }
            }
        }

        results
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: 00-50 maps to the 2000s, 51-99 to the 1900s.
        if year <= 50 {
            2000 + year
        } else {
            1900 + year
        }
    } else {
        year
    }
}

fn french_month_to_number(month: &str) -> u32 {
    match month.to_lowercase().as_str() {
        "janvier" => 1,
        "février" | "fevrier" => 2,
        "mars" => 3,
        "avril" => 4,
        "mai" => 5,
        "juin" => 6,
        "juillet" => 7,
        "août" | "aout" => 8,
        "septembre" => 9,
        "octobre" => 10,
        "novembre" => 11,
        "décembre" | "decembre" => 12,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_date_dmy() {
        let extractor = DateExtractor::new();

        let result = extractor.extract("Date: 19/12/2024");
        assert_eq!(result, NaiveDate::from_ymd_opt(2024, 12, 19));
    }

    #[test]
    fn test_extract_date_month_first_recovered() {
        let extractor = DateExtractor::new();

        let result = extractor.extract("12/19/2024");
        assert_eq!(result, NaiveDate::from_ymd_opt(2024, 12, 19));
    }

    #[test]
    fn test_extract_date_ymd() {
        let extractor = DateExtractor::new();

        let result = extractor.extract("2024-12-19");
        assert_eq!(result, NaiveDate::from_ymd_opt(2024, 12, 19));
    }

    #[test]
    fn test_extract_date_french_long() {
        let extractor = DateExtractor::new();

        let result = extractor.extract("Paris, le 19 décembre 2024");
        assert_eq!(result, NaiveDate::from_ymd_opt(2024, 12, 19));

        let result = extractor.extract("1er janvier 2025");
        assert_eq!(result, NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn test_two_digit_year() {
        let extractor = DateExtractor::new();

        let result = extractor.extract("19.12.24");
        assert_eq!(result, NaiveDate::from_ymd_opt(2024, 12, 19));
    }

    #[test]
    fn test_no_date_is_none() {
        let extractor = DateExtractor::new();
        assert_eq!(extractor.extract("TOTAL TTC 25.80"), None);
    }
}
