use crate::models::summary::{Distribution, MonthlyCounts};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Counts non-blank values. Keys are trimmed; ordering is count descending,
/// ties in first-seen order.
pub fn value_counts<'a, I>(values: I) -> Distribution
where
    I: IntoIterator<Item = &'a str>,
{
    let mut entries: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for value in values {
        let key = value.trim();
        if key.is_empty() {
            continue;
        }
        match index.get(key) {
            Some(&slot) => entries[slot].1 += 1,
            None => {
                index.insert(key, entries.len());
                entries.push((key.to_string(), 1));
            }
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    Distribution { entries }
}

/// Same as [`value_counts`] over optional cells; `None` counts as blank.
pub fn option_counts<'a, I>(values: I) -> Distribution
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    value_counts(values.into_iter().flatten())
}

/// Percentage rounded to one decimal; zero denominator yields 0.0.
pub fn percent(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    round1(numerator as f64 * 100.0 / denominator as f64)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn monthly_in_year<I>(dates: I, year: i32) -> MonthlyCounts
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    let mut monthly = MonthlyCounts::default();
    for date in dates.into_iter().flatten() {
        if date.year() == year {
            monthly.counts[date.month0() as usize] += 1;
        }
    }
    monthly
}

/// Month-of-year buckets regardless of year.
pub fn monthly_any_year<I>(dates: I) -> MonthlyCounts
where
    I: IntoIterator<Item = Option<NaiveDate>>,
{
    let mut monthly = MonthlyCounts::default();
    for date in dates.into_iter().flatten() {
        monthly.counts[date.month0() as usize] += 1;
    }
    monthly
}

/// First `max` characters of `text`, with `...` appended when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn value_counts_orders_by_count_then_first_seen() {
        let dist = value_counts(["研发", " 测试 ", "", "产品", "测试", "研发", "  "]);
        assert_eq!(
            dist.entries,
            vec![("研发".to_string(), 2), ("测试".to_string(), 2), ("产品".to_string(), 1)]
        );
        assert_eq!(dist.total(), 5);
        assert_eq!(dist.get("产品"), 1);
        assert_eq!(dist.get("运维"), 0);
    }

    #[test]
    fn value_counts_scales_to_many_distinct_keys() {
        let keys: Vec<String> = (0..5000).map(|i| format!("客户{i}")).collect();
        let values = keys.iter().chain(keys.iter().skip(4990)).map(String::as_str);
        let dist = value_counts(values);

        assert_eq!(dist.entries.len(), 5000);
        assert_eq!(dist.total(), 5010);
        assert_eq!(dist.entries[0], ("客户4990".to_string(), 2));
        assert_eq!(dist.entries[9], ("客户4999".to_string(), 2));
        assert_eq!(dist.entries[10], ("客户0".to_string(), 1));
    }

    #[test]
    fn option_counts_skips_missing() {
        let dist = option_counts([Some("A"), None, Some("A")]);
        assert_eq!(dist.entries, vec![("A".to_string(), 2)]);
    }

    #[test]
    fn percent_handles_zero_denominator() {
        assert_eq!(percent(3, 0), 0.0);
        assert_eq!(percent(1, 3), 33.3);
        assert_eq!(percent(2, 3), 66.7);
        assert_eq!(percent(4, 4), 100.0);
    }

    #[test]
    fn monthly_buckets_filter_by_year() {
        let dates = [date(2025, 1, 3), date(2025, 1, 20), date(2024, 1, 9), None, date(2025, 12, 31)];
        let in_year = monthly_in_year(dates, 2025);
        assert_eq!(in_year.get(1), 2);
        assert_eq!(in_year.get(12), 1);
        assert_eq!(in_year.total(), 3);
        assert_eq!(in_year.quarter(1), 2);
        assert_eq!(in_year.quarter(4), 1);

        let any = monthly_any_year(dates);
        assert_eq!(any.get(1), 3);
        assert_eq!(any.active_months().collect::<Vec<_>>(), vec![(1, 3), (12, 1)]);
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("滴滴文档同步", 4), "滴滴文档...");
        assert_eq!(truncate_chars("短", 4), "短");
    }
}
