// Parsing and small numeric helpers shared by the loader and the
// aggregation code. All the forgiving CSV/number/date handling lives
// here so the rest of the crate works with clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while tolerating the formatting
/// quirks common in exported spreadsheets (thousands separators, stray
/// whitespace).
///
/// Returns `None` for empty input, values containing letters, or anything
/// that does not parse after separator stripping.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Day-first date formats tried in order. ISO is accepted as a fallback so
/// exports from other tools still load.
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

pub fn parse_date_dayfirst(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Round to 2 decimal places. Every derived ratio passes through this
/// before being returned, so displayed and compared values agree.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Median of a list of numbers. Takes the `Vec` by value so it can sort
/// in place. Returns `None` for an empty input instead of a sentinel.
pub fn median(mut v: Vec<f64>) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = v.len() / 2;
    Some(if v.len() % 2 == 1 {
        v[mid]
    } else {
        (v[mid - 1] + v[mid]) / 2.0
    })
}

/// Format a floating-point value with fixed decimals and thousands
/// separators (`1,234,567.89`) for console output.
pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Thousands-separated integers for console counts (`9,855 rows loaded`).
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_parsing_tolerates_separators() {
        assert_eq!(parse_f64_safe(Some("1,234.50")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("  42 ")), Some(42.0));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn dates_parse_day_first() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        assert_eq!(parse_date_dayfirst(Some("15/02/2024")), Some(d));
        assert_eq!(parse_date_dayfirst(Some("15-02-2024")), Some(d));
        assert_eq!(parse_date_dayfirst(Some("2024-02-15")), Some(d));
        assert_eq!(parse_date_dayfirst(Some("not a date")), None);
    }

    #[test]
    fn median_handles_odd_even_empty() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(vec![]), None);
    }

    #[test]
    fn rounding_is_two_decimals() {
        assert_eq!(round2(0.148), 0.15);
        assert_eq!(round2(6.004), 6.0);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.5, 2), "-42.50");
        assert_eq!(format_number(0.0, 0), "0");
    }
}
