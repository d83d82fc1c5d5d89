use crate::types::{DeviationPoint, GuIndexDataset, IndexRow, SeriesSummary};
use std::cmp::Ordering;

/// Districts pre-selected when the index view opens, filtered to those
/// actually present in the dataset; falls back to the first eight districts.
const DEFAULT_DISTRICTS: [&str; 5] = ["강남구", "서초구", "송파구", "마포구", "용산구"];

pub fn default_selection(districts: &[String]) -> Vec<String> {
    let picked: Vec<String> = DEFAULT_DISTRICTS
        .iter()
        .filter(|d| districts.iter().any(|g| g == *d))
        .map(|d| d.to_string())
        .collect();
    if picked.is_empty() {
        districts.iter().take(8).cloned().collect()
    } else {
        picked
    }
}

/// The computed trend view: sampled periods, deviation points for the
/// selected districts, and per-district summaries ordered by latest
/// deviation.
#[derive(Debug, Clone)]
pub struct TrendView {
    pub sampled_yms: Vec<String>,
    pub deviations: Vec<DeviationPoint>,
    pub summaries: Vec<SeriesSummary>,
}

/// Retain rows inside the closed `[start, end]` window. Keys are fixed-width
/// `YYYY-MM`, so lexicographic comparison is chronological. The caller
/// clamps an inverted window before getting here.
fn window<'a>(rows: &'a [IndexRow], start: &str, end: &str) -> Vec<&'a IndexRow> {
    rows.iter()
        .filter(|r| r.ym.as_str() >= start && r.ym.as_str() <= end)
        .collect()
}

/// Keep every `stride`-th row by position within the windowed slice. The
/// stride is positional, not time-based: stride 3 on monthly data is
/// quarterly only when no months are missing from the source.
fn sample<'a>(rows: Vec<&'a IndexRow>, stride: usize) -> Vec<&'a IndexRow> {
    let stride = stride.max(1);
    rows.into_iter().step_by(stride).collect()
}

fn summarize(sampled: &[&IndexRow], gu: &str) -> SeriesSummary {
    let deviations: Vec<Option<f64>> = sampled
        .iter()
        .map(|r| match (r.district(gu), r.reference) {
            (Some(v), Some(seoul)) => Some(v - seoul),
            _ => None,
        })
        .collect();

    let diff_start = deviations.first().copied().flatten();
    let diff_end = deviations.last().copied().flatten();
    let diff_delta = match (diff_start, diff_end) {
        (Some(s), Some(e)) => Some(e - s),
        _ => None,
    };
    let available: Vec<f64> = deviations.iter().filter_map(|d| *d).collect();
    let diff_min = available.iter().copied().fold(None, |m: Option<f64>, v| {
        Some(m.map_or(v, |m| m.min(v)))
    });
    let diff_max = available.iter().copied().fold(None, |m: Option<f64>, v| {
        Some(m.map_or(v, |m| m.max(v)))
    });

    let raw_start = sampled.first().and_then(|r| r.district(gu));
    let raw_end = sampled.last().and_then(|r| r.district(gu));
    let raw_delta = match (raw_start, raw_end) {
        (Some(s), Some(e)) => Some(e - s),
        _ => None,
    };
    // Percent change is only meaningful on raw index values; deviations can
    // be zero or negative, which would distort or sign-invert a percentage.
    let raw_pct = match (raw_start, raw_end) {
        (Some(s), Some(e)) if s != 0.0 => Some(((e / s) - 1.0) * 100.0),
        _ => None,
    };

    SeriesSummary {
        gu: gu.to_string(),
        diff_start,
        diff_end,
        diff_delta,
        diff_min,
        diff_max,
        raw_start,
        raw_end,
        raw_delta,
        raw_pct,
    }
}

/// Window, sample, and derive deviation series plus per-district summaries.
/// Only the selected districts are ever consulted, keeping the cost linear
/// in `selected × sampled periods`.
pub fn build_trend(
    data: &GuIndexDataset,
    start: &str,
    end: &str,
    stride: usize,
    selected: &[String],
) -> TrendView {
    let sampled = sample(window(&data.rows, start, end), stride);

    let sampled_yms: Vec<String> = sampled.iter().map(|r| r.ym.clone()).collect();

    let mut deviations: Vec<DeviationPoint> = Vec::with_capacity(sampled.len() * selected.len());
    for row in &sampled {
        for gu in selected {
            let deviation = match (row.district(gu), row.reference) {
                (Some(v), Some(seoul)) => Some(v - seoul),
                _ => None,
            };
            deviations.push(DeviationPoint {
                ym: row.ym.clone(),
                gu: gu.clone(),
                deviation,
            });
        }
    }

    let mut summaries: Vec<SeriesSummary> =
        selected.iter().map(|gu| summarize(&sampled, gu)).collect();
    // Latest deviation first; districts with no usable end point sink to
    // the bottom.
    summaries.sort_by(|a, b| {
        let av = a.diff_end.unwrap_or(f64::NEG_INFINITY);
        let bv = b.diff_end.unwrap_or(f64::NEG_INFINITY);
        bv.partial_cmp(&av).unwrap_or(Ordering::Equal)
    });

    TrendView {
        sampled_yms,
        deviations,
        summaries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(ym: &str, reference: Option<f64>, values: &[(&str, f64)]) -> IndexRow {
        let mut map = HashMap::new();
        for (gu, v) in values {
            map.insert(gu.to_string(), *v);
        }
        if let Some(seoul) = reference {
            map.insert("서울특별시".to_string(), seoul);
        }
        IndexRow {
            ym: ym.to_string(),
            reference,
            values: map,
        }
    }

    fn dataset(rows: Vec<IndexRow>) -> GuIndexDataset {
        GuIndexDataset {
            rows,
            districts: vec!["강남구".to_string(), "마포구".to_string()],
        }
    }

    fn selected(gus: &[&str]) -> Vec<String> {
        gus.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn deviation_and_summary_over_three_months() {
        // city index [100, 102, 105], district [110, 108, 107]
        let data = dataset(vec![
            row("2023-01", Some(100.0), &[("강남구", 110.0)]),
            row("2023-02", Some(102.0), &[("강남구", 108.0)]),
            row("2023-03", Some(105.0), &[("강남구", 107.0)]),
        ]);
        let view = build_trend(&data, "2023-01", "2023-03", 1, &selected(&["강남구"]));

        let devs: Vec<f64> = view.deviations.iter().map(|p| p.deviation.unwrap()).collect();
        assert_eq!(devs, vec![10.0, 6.0, 2.0]);

        let s = &view.summaries[0];
        assert_eq!(s.diff_start, Some(10.0));
        assert_eq!(s.diff_end, Some(2.0));
        assert_eq!(s.diff_delta, Some(-8.0));
        assert_eq!(s.diff_min, Some(2.0));
        assert_eq!(s.diff_max, Some(10.0));
        assert_eq!(s.raw_start, Some(110.0));
        assert_eq!(s.raw_end, Some(107.0));
        assert!((s.raw_pct.unwrap() - (((107.0 / 110.0) - 1.0) * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn window_is_closed_on_both_ends() {
        let data = dataset(vec![
            row("2023-01", Some(100.0), &[("강남구", 110.0)]),
            row("2023-02", Some(100.0), &[("강남구", 111.0)]),
            row("2023-03", Some(100.0), &[("강남구", 112.0)]),
            row("2023-04", Some(100.0), &[("강남구", 113.0)]),
        ]);
        let view = build_trend(&data, "2023-02", "2023-03", 1, &selected(&["강남구"]));
        assert_eq!(view.sampled_yms, vec!["2023-02", "2023-03"]);
    }

    #[test]
    fn stride_keeps_every_nth_position() {
        let data = dataset(
            (1..=6)
                .map(|m| row(&format!("2023-{:02}", m), Some(100.0), &[("강남구", 100.0 + m as f64)]))
                .collect(),
        );
        let view = build_trend(&data, "2023-01", "2023-06", 3, &selected(&["강남구"]));
        assert_eq!(view.sampled_yms, vec!["2023-01", "2023-04"]);
    }

    #[test]
    fn larger_stride_never_yields_more_points() {
        let data = dataset(
            (1..=12)
                .map(|m| row(&format!("2023-{:02}", m), Some(100.0), &[("강남구", 100.0)]))
                .collect(),
        );
        let mut last = usize::MAX;
        for stride in 1..=6 {
            let view = build_trend(&data, "2023-01", "2023-12", stride, &selected(&["강남구"]));
            assert!(view.sampled_yms.len() <= last);
            last = view.sampled_yms.len();
        }
    }

    #[test]
    fn missing_operands_propagate_not_available() {
        let data = dataset(vec![
            row("2023-01", None, &[("강남구", 110.0)]),
            row("2023-02", Some(102.0), &[]),
            row("2023-03", Some(105.0), &[("강남구", 107.0)]),
        ]);
        let view = build_trend(&data, "2023-01", "2023-03", 1, &selected(&["강남구"]));
        let devs: Vec<Option<f64>> = view.deviations.iter().map(|p| p.deviation).collect();
        assert_eq!(devs, vec![None, None, Some(2.0)]);

        let s = &view.summaries[0];
        assert_eq!(s.diff_start, None);
        assert_eq!(s.diff_end, Some(2.0));
        assert_eq!(s.diff_delta, None);
        assert_eq!(s.diff_min, Some(2.0));
        assert_eq!(s.diff_max, Some(2.0));
        // raw start exists even though the reference was missing that month
        assert_eq!(s.raw_start, Some(110.0));
    }

    #[test]
    fn raw_pct_ignores_deviation_sign() {
        // deviations are negative throughout, but the raw series rose 20%
        let data = dataset(vec![
            row("2023-01", Some(150.0), &[("강남구", 100.0)]),
            row("2023-02", Some(150.0), &[("강남구", 120.0)]),
        ]);
        let view = build_trend(&data, "2023-01", "2023-02", 1, &selected(&["강남구"]));
        let s = &view.summaries[0];
        assert!(s.diff_start.unwrap() < 0.0 && s.diff_end.unwrap() < 0.0);
        assert!((s.raw_pct.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn zero_raw_start_gives_no_percent() {
        let data = dataset(vec![
            row("2023-01", Some(100.0), &[("강남구", 0.0)]),
            row("2023-02", Some(100.0), &[("강남구", 120.0)]),
        ]);
        let view = build_trend(&data, "2023-01", "2023-02", 1, &selected(&["강남구"]));
        assert_eq!(view.summaries[0].raw_pct, None);
        assert_eq!(view.summaries[0].raw_delta, Some(120.0));
    }

    #[test]
    fn summaries_order_by_latest_deviation_descending() {
        let data = dataset(vec![
            row("2023-01", Some(100.0), &[("강남구", 110.0), ("마포구", 95.0)]),
            row("2023-02", Some(100.0), &[("강남구", 112.0), ("마포구", 96.0)]),
        ]);
        let view = build_trend(
            &data,
            "2023-01",
            "2023-02",
            1,
            &selected(&["마포구", "강남구"]),
        );
        let order: Vec<&str> = view.summaries.iter().map(|s| s.gu.as_str()).collect();
        assert_eq!(order, vec!["강남구", "마포구"]);
    }

    #[test]
    fn unselected_districts_are_never_computed() {
        let data = dataset(vec![row(
            "2023-01",
            Some(100.0),
            &[("강남구", 110.0), ("마포구", 95.0)],
        )]);
        let view = build_trend(&data, "2023-01", "2023-01", 1, &selected(&["강남구"]));
        assert_eq!(view.deviations.len(), 1);
        assert_eq!(view.summaries.len(), 1);
        assert!(view.deviations.iter().all(|p| p.gu == "강남구"));
    }

    #[test]
    fn default_selection_prefers_known_districts() {
        let districts: Vec<String> = ["강남구", "관악구", "마포구"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(default_selection(&districts), vec!["강남구", "마포구"]);

        let other: Vec<String> = (0..10).map(|i| format!("구{}", i)).collect();
        assert_eq!(default_selection(&other).len(), 8);
    }
}
