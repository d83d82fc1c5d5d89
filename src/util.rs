// Utility helpers for parsing and formatting.
//
// This module centralizes all the "dirty" CSV/number/month-label handling so
// the rest of the code can assume clean, typed values. A value that cannot be
// parsed becomes `None`, never a silently-wrong zero.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use regex::Regex;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues common in Korean real-estate CSV exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace; an empty string is `None`.
/// - Strips thousands separators (`,`) and a percent sign (`%`).
/// - Returns `None` for anything that does not parse to a finite number,
///   so "Infinity"/"NaN" text never leaks into the engine.
pub fn coerce_number(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| *c != ',' && *c != '%').collect();
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => None,
    }
}

static MONTH_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})\s*년\s*(\d{1,2})\s*월").unwrap());

static MONTH_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}$").unwrap());

/// Convert a localized month label like `"2008년 1월"` into the canonical
/// `"2008-01"` sort key.
///
/// Labels already in `YYYY-MM` form pass through via [`is_month_key`] at the
/// call site. Anything that does not contain a `YYYY년 M월` pattern, or whose
/// month is not a real calendar month, is returned unchanged so the caller
/// can reject it by format validation instead of a thrown failure.
pub fn parse_month_key(s: &str) -> String {
    let s = s.trim();
    let Some(caps) = MONTH_LABEL.captures(s) else {
        return s.to_string();
    };
    let year: i32 = match caps[1].parse() {
        Ok(y) => y,
        Err(_) => return s.to_string(),
    };
    let month: u32 = match caps[2].parse() {
        Ok(m) => m,
        Err(_) => return s.to_string(),
    };
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return s.to_string();
    }
    format!("{:04}-{:02}", year, month)
}

/// `true` iff the string is a canonical `YYYY-MM` key. Lexicographic order on
/// such keys equals chronological order, which the windowing code relies on.
pub fn is_month_key(s: &str) -> bool {
    MONTH_KEY.is_match(s)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values, used for
    // counts in console messages (e.g., `1,234 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Render an optional count-like value (`rooms`, `households`, minutes)
/// rounded to a whole number with thousands separators, or `"N/A"`.
pub fn format_opt_int(n: Option<f64>) -> String {
    match n {
        Some(v) => format_int(v.round() as i64),
        None => "N/A".to_string(),
    }
}

/// Render a price in 만원 (ten-thousand-won units), e.g. `82,000만원`.
pub fn format_money(n: Option<f64>) -> String {
    match n {
        Some(v) => format!("{}만원", format_int(v.round() as i64)),
        None => "N/A".to_string(),
    }
}

/// Render an optional value with one decimal place, `"—"` when missing.
pub fn format_opt1(n: Option<f64>) -> String {
    match n {
        Some(v) => format!("{:.1}", v),
        None => "—".to_string(),
    }
}

/// Like [`format_opt1`] but with an explicit `+` sign on positive deltas.
pub fn format_delta(n: Option<f64>) -> String {
    match n {
        Some(v) if v > 0.0 => format!("+{:.1}", v),
        Some(v) => format!("{:.1}", v),
        None => "—".to_string(),
    }
}

/// Signed percentage with one decimal place, `"—"` when missing.
pub fn format_pct1(n: Option<f64>) -> String {
    match n {
        Some(v) if v > 0.0 => format!("+{:.1}%", v),
        Some(v) => format!("{:.1}%", v),
        None => "—".to_string(),
    }
}

/// Signed whole-number percentage (the peak-deviation value is rounded before
/// classification, so it is always a whole number here).
pub fn format_pct0(n: Option<f64>) -> String {
    match n {
        Some(v) if v > 0.0 => format!("+{:.0}%", v),
        Some(v) => format!("{:.0}%", v),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_handles_separators_and_percent() {
        assert_eq!(coerce_number(Some("82,000")), Some(82000.0));
        assert_eq!(coerce_number(Some("-12%")), Some(-12.0));
        assert_eq!(coerce_number(Some(" 1,234.5 ")), Some(1234.5));
    }

    #[test]
    fn coerce_matches_comma_stripped_input() {
        for s in ["1,000", "12,345,678", "9,999.25"] {
            let stripped = s.replace(',', "");
            assert_eq!(coerce_number(Some(s)), coerce_number(Some(&stripped)));
        }
    }

    #[test]
    fn coerce_rejects_missing_and_non_finite() {
        assert_eq!(coerce_number(None), None);
        assert_eq!(coerce_number(Some("")), None);
        assert_eq!(coerce_number(Some("   ")), None);
        assert_eq!(coerce_number(Some("N/A")), None);
        assert_eq!(coerce_number(Some("inf")), None);
        assert_eq!(coerce_number(Some("NaN")), None);
    }

    #[test]
    fn month_label_parses_to_sort_key() {
        assert_eq!(parse_month_key("2008년 1월"), "2008-01");
        assert_eq!(parse_month_key("2024년 12월"), "2024-12");
        assert_eq!(parse_month_key("  2013년  7월 "), "2013-07");
    }

    #[test]
    fn month_label_passthrough_on_mismatch() {
        assert_eq!(parse_month_key("2008-01"), "2008-01");
        assert_eq!(parse_month_key("garbage"), "garbage");
        // month 13 is not a calendar month; returned unchanged so the
        // caller's format validation rejects the row
        assert_eq!(parse_month_key("2008년 13월"), "2008년 13월");
    }

    #[test]
    fn month_key_format_check() {
        assert!(is_month_key("2008-01"));
        assert!(!is_month_key("2008-1"));
        assert!(!is_month_key("2008년 1월"));
        assert!(!is_month_key(""));
    }

    #[test]
    fn money_and_pct_rendering() {
        assert_eq!(format_money(Some(82000.0)), "82,000만원");
        assert_eq!(format_money(None), "N/A");
        assert_eq!(format_pct0(Some(-20.0)), "-20%");
        assert_eq!(format_pct0(Some(12.0)), "+12%");
        assert_eq!(format_pct1(None), "—");
    }
}
