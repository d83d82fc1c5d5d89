use crate::types::ApartmentRecord;
use std::cmp::Ordering;

/// Percent of current price relative to the historical peak, rounded to a
/// whole number: `round(((current / peak) - 1) * 100)`.
///
/// `None` when either input is missing or the peak is zero; a zero peak is a
/// deliberate not-available, never an infinite value. Rounding happens here,
/// once, so the displayed percentage and the tier boundary check can never
/// disagree.
pub fn pct_from_peak(current: Option<f64>, peak: Option<f64>) -> Option<f64> {
    let current = current?;
    let peak = peak?;
    if peak == 0.0 {
        return None;
    }
    Some((((current / peak) - 1.0) * 100.0).round())
}

/// Advisory tier for a peak-relative percentage. Thresholds are checked in
/// order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTier {
    /// `pct <= 0`: below the historical peak.
    ActiveInterest,
    /// `0 < pct <= 15`: early recovery toward the peak.
    Interest,
    /// `15 < pct <= 25`: approaching the peak.
    Caution,
    /// `pct > 25`: above-peak territory.
    PeakZone,
    NotAvailable,
}

impl PriceTier {
    pub fn classify(pct: Option<f64>) -> PriceTier {
        let Some(pct) = pct else {
            return PriceTier::NotAvailable;
        };
        if pct <= 0.0 {
            PriceTier::ActiveInterest
        } else if pct <= 15.0 {
            PriceTier::Interest
        } else if pct <= 25.0 {
            PriceTier::Caution
        } else {
            PriceTier::PeakZone
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceTier::ActiveInterest => "적극 관심",
            PriceTier::Interest => "관심",
            PriceTier::Caution => "주의",
            PriceTier::PeakZone => "고점 구간",
            PriceTier::NotAvailable => "N/A",
        }
    }

    /// One advisory sentence shown alongside each classified row.
    pub fn interpretation(self) -> &'static str {
        match self {
            PriceTier::ActiveInterest => "전고점 대비 조정 구간(0% 이하)으로 적극 관심 구간입니다.",
            PriceTier::Interest => "전고점 회복 초기(0~15%)로 관심 구간입니다.",
            PriceTier::Caution => "전고점 근접(15~25%)으로 주의 구간입니다.",
            PriceTier::PeakZone => "전고점 대비 높은 수준(25% 이상)으로 고점 구간입니다.",
            PriceTier::NotAvailable => "전고점 대비 수준을 판단할 수 없습니다.",
        }
    }
}

/// Sort direction for the price-level listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSort {
    /// Largest drop from the peak first (percent ascending).
    MostDrop,
    /// Closest to (or furthest above) the peak first (percent descending).
    ClosestPeak,
}

/// Optional listing filters. A zero minimum disables that filter entirely;
/// when enabled, a record missing the filtered field is disqualified.
#[derive(Debug, Clone, Default)]
pub struct PriceLevelFilter {
    /// Exact district (구) match; `None` means all districts.
    pub gu: Option<String>,
    pub min_households: f64,
    pub min_year_built: f64,
}

/// One classified listing entry.
#[derive(Debug, Clone)]
pub struct PriceLevelItem {
    pub record: ApartmentRecord,
    pub pct: Option<f64>,
    pub tier: PriceTier,
}

/// Distinct districts present in the record set, sorted, for the filter
/// prompt.
pub fn district_options(records: &[ApartmentRecord]) -> Vec<String> {
    let mut gus: Vec<String> = records
        .iter()
        .map(|r| r.gu.clone())
        .filter(|g| !g.is_empty())
        .collect();
    gus.sort();
    gus.dedup();
    gus
}

/// Build the price-level listing: recompute percent-from-peak per record,
/// keep only rows where both prices are available, apply the optional
/// filters, then sort by percentage in the requested direction (missing
/// percentages sort last either way).
pub fn build_price_levels(
    records: &[ApartmentRecord],
    filter: &PriceLevelFilter,
    sort: PriceSort,
) -> Vec<PriceLevelItem> {
    let mut items: Vec<PriceLevelItem> = records
        .iter()
        .filter(|r| r.current_price.is_some() && r.peak_price.is_some())
        .filter(|r| match &filter.gu {
            Some(gu) => r.gu == *gu,
            None => true,
        })
        .filter(|r| {
            if filter.min_households > 0.0 {
                match r.households {
                    Some(h) if h >= filter.min_households => {}
                    _ => return false,
                }
            }
            if filter.min_year_built > 0.0 {
                match r.year_built {
                    Some(y) if y >= filter.min_year_built => {}
                    _ => return false,
                }
            }
            true
        })
        .map(|r| {
            let pct = pct_from_peak(r.current_price, r.peak_price);
            PriceLevelItem {
                record: r.clone(),
                tier: PriceTier::classify(pct),
                pct,
            }
        })
        .collect();

    items.sort_by(|a, b| {
        let (av, bv) = match sort {
            PriceSort::MostDrop => (
                a.pct.unwrap_or(f64::INFINITY),
                b.pct.unwrap_or(f64::INFINITY),
            ),
            PriceSort::ClosestPeak => (
                b.pct.unwrap_or(f64::NEG_INFINITY),
                a.pct.unwrap_or(f64::NEG_INFINITY),
            ),
        };
        av.partial_cmp(&bv).unwrap_or(Ordering::Equal)
    });
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, gu: &str, current: Option<f64>, peak: Option<f64>) -> ApartmentRecord {
        ApartmentRecord {
            complex_name: name.to_string(),
            gu: gu.to_string(),
            dong: String::new(),
            school_name: String::new(),
            current_price: current,
            peak_price: peak,
            drop_from_peak_pct: None,
            year_built: None,
            pyeong: None,
            households: None,
            rooms: None,
            bathrooms: None,
            school_walk_min: None,
            time_gangnam: None,
            time_yeouido: None,
            time_cityhall: None,
        }
    }

    #[test]
    fn pct_below_peak_is_negative() {
        // 800 against a 1,000 peak is a 20% discount
        assert_eq!(pct_from_peak(Some(800.0), Some(1000.0)), Some(-20.0));
        assert_eq!(
            PriceTier::classify(Some(-20.0)),
            PriceTier::ActiveInterest
        );
    }

    #[test]
    fn pct_at_peak_is_zero_and_active_interest() {
        for p in [1.0, 500.0, 82000.0] {
            assert_eq!(pct_from_peak(Some(p), Some(p)), Some(0.0));
        }
        assert_eq!(PriceTier::classify(Some(0.0)), PriceTier::ActiveInterest);
    }

    #[test]
    fn zero_peak_is_not_available() {
        assert_eq!(pct_from_peak(Some(500.0), Some(0.0)), None);
        assert_eq!(pct_from_peak(Some(0.0), Some(0.0)), None);
        assert_eq!(pct_from_peak(None, Some(1000.0)), None);
        assert_eq!(pct_from_peak(Some(1000.0), None), None);
        assert_eq!(PriceTier::classify(None), PriceTier::NotAvailable);
    }

    #[test]
    fn tier_boundaries_first_match_wins() {
        assert_eq!(PriceTier::classify(Some(-5.0)), PriceTier::ActiveInterest);
        assert_eq!(PriceTier::classify(Some(15.0)), PriceTier::Interest);
        assert_eq!(PriceTier::classify(Some(16.0)), PriceTier::Caution);
        assert_eq!(PriceTier::classify(Some(25.0)), PriceTier::Caution);
        assert_eq!(PriceTier::classify(Some(26.0)), PriceTier::PeakZone);
    }

    #[test]
    fn rounding_happens_before_classification() {
        // 15.4% rounds to 15 and stays in the 관심 tier; 15.6% rounds to 16
        // and crosses into 주의.
        let pct = pct_from_peak(Some(1154.0), Some(1000.0));
        assert_eq!(pct, Some(15.0));
        assert_eq!(PriceTier::classify(pct), PriceTier::Interest);

        let pct = pct_from_peak(Some(1156.0), Some(1000.0));
        assert_eq!(pct, Some(16.0));
        assert_eq!(PriceTier::classify(pct), PriceTier::Caution);
    }

    #[test]
    fn listing_requires_both_prices() {
        let records = vec![
            record("both", "강남구", Some(800.0), Some(1000.0)),
            record("no_peak", "강남구", Some(800.0), None),
            record("no_current", "강남구", None, Some(1000.0)),
        ];
        let items = build_price_levels(&records, &PriceLevelFilter::default(), PriceSort::MostDrop);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].record.complex_name, "both");
    }

    #[test]
    fn listing_sorts_by_percent_both_directions() {
        let records = vec![
            record("flat", "강남구", Some(1000.0), Some(1000.0)),
            record("down", "강남구", Some(700.0), Some(1000.0)),
            record("up", "강남구", Some(1200.0), Some(1000.0)),
        ];
        let most_drop =
            build_price_levels(&records, &PriceLevelFilter::default(), PriceSort::MostDrop);
        let names: Vec<&str> = most_drop
            .iter()
            .map(|i| i.record.complex_name.as_str())
            .collect();
        assert_eq!(names, vec!["down", "flat", "up"]);

        let closest =
            build_price_levels(&records, &PriceLevelFilter::default(), PriceSort::ClosestPeak);
        let names: Vec<&str> = closest
            .iter()
            .map(|i| i.record.complex_name.as_str())
            .collect();
        assert_eq!(names, vec!["up", "flat", "down"]);
    }

    #[test]
    fn listing_optional_filters_follow_zero_sentinel() {
        let mut big = record("big", "강남구", Some(800.0), Some(1000.0));
        big.households = Some(2000.0);
        let mut small = record("small", "강남구", Some(900.0), Some(1000.0));
        small.households = Some(300.0);
        let unknown = record("unknown", "강남구", Some(950.0), Some(1000.0));

        // disabled filter keeps everything, including unknown households
        let all = build_price_levels(
            &[big.clone(), small.clone(), unknown.clone()],
            &PriceLevelFilter::default(),
            PriceSort::MostDrop,
        );
        assert_eq!(all.len(), 3);

        // enabled filter is fail-closed on the unknown
        let filter = PriceLevelFilter {
            min_households: 500.0,
            ..Default::default()
        };
        let filtered = build_price_levels(&[big, small, unknown], &filter, PriceSort::MostDrop);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].record.complex_name, "big");
    }

    #[test]
    fn listing_district_filter_is_exact() {
        let records = vec![
            record("a", "강남구", Some(800.0), Some(1000.0)),
            record("b", "마포구", Some(900.0), Some(1000.0)),
        ];
        let filter = PriceLevelFilter {
            gu: Some("마포구".to_string()),
            ..Default::default()
        };
        let items = build_price_levels(&records, &filter, PriceSort::MostDrop);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].record.complex_name, "b");

        assert_eq!(district_options(&records), vec!["강남구", "마포구"]);
    }
}
