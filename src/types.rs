use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabled::Tabled;

/// One line of `apartments.csv` exactly as it appears on disk. Every field is
/// optional text; numeric coercion happens in the normalizer so a malformed
/// column degrades that one field instead of rejecting the row.
#[derive(Debug, Deserialize)]
pub struct RawApartmentRow {
    pub complex_name: Option<String>,
    pub gu: Option<String>,
    pub dong: Option<String>,
    pub current_price: Option<String>,
    pub peak_price: Option<String>,
    pub drop_from_peak_pct: Option<String>,
    pub year_built: Option<String>,
    pub pyeong: Option<String>,
    pub households: Option<String>,
    pub rooms: Option<String>,
    pub bathrooms: Option<String>,
    pub school_walk_min: Option<String>,
    pub school_name: Option<String>,
    pub time_gangnam: Option<String>,
    pub time_yeouido: Option<String>,
    pub time_cityhall: Option<String>,
}

/// Typed apartment record after normalization. Numeric fields are `None`
/// when the source column was absent or unparseable; comparators and filters
/// decide explicitly what `None` means, it is never a stand-in zero.
#[derive(Debug, Clone)]
pub struct ApartmentRecord {
    pub complex_name: String,
    pub gu: String,
    pub dong: String,
    pub school_name: String,
    pub current_price: Option<f64>,
    pub peak_price: Option<f64>,
    pub drop_from_peak_pct: Option<f64>,
    pub year_built: Option<f64>,
    pub pyeong: Option<f64>,
    pub households: Option<f64>,
    pub rooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub school_walk_min: Option<f64>,
    pub time_gangnam: Option<f64>,
    pub time_yeouido: Option<f64>,
    pub time_cityhall: Option<f64>,
}

/// The three workplaces the commute filter can target. Gangnam doubles as
/// the fixed reference workplace for ranking regardless of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workplace {
    Gangnam,
    Yeouido,
    CityHall,
}

impl Workplace {
    pub fn label(self) -> &'static str {
        match self {
            Workplace::Gangnam => "강남",
            Workplace::Yeouido => "여의도",
            Workplace::CityHall => "시청",
        }
    }

    /// Commute minutes from a record to this workplace.
    pub fn commute_minutes(self, r: &ApartmentRecord) -> Option<f64> {
        match self {
            Workplace::Gangnam => r.time_gangnam,
            Workplace::Yeouido => r.time_yeouido,
            Workplace::CityHall => r.time_cityhall,
        }
    }
}

/// An [`ApartmentRecord`] plus the two commute fields the ranking pipeline
/// keys on. Built fresh for every recommendation run and discarded after.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    pub record: ApartmentRecord,
    /// Minutes to the user-selected workplace (filter key).
    pub commute_selected: Option<f64>,
    /// Minutes to 강남, the fixed reference workplace (primary sort key).
    pub commute_gangnam: Option<f64>,
}

/// One calendar month of the regional index dataset. `reference` is the
/// mandatory city-wide ("서울특별시") index; `values` holds whatever district
/// columns parsed to a finite number for that month.
#[derive(Debug, Clone)]
pub struct IndexRow {
    pub ym: String,
    pub reference: Option<f64>,
    pub values: HashMap<String, f64>,
}

impl IndexRow {
    pub fn district(&self, gu: &str) -> Option<f64> {
        self.values.get(gu).copied()
    }
}

/// The loaded regional index dataset: rows sorted ascending by `ym` with
/// unique keys, plus the selectable district list (reference and nationwide
/// aggregate columns excluded).
#[derive(Debug, Clone)]
pub struct GuIndexDataset {
    pub rows: Vec<IndexRow>,
    pub districts: Vec<String>,
}

impl GuIndexDataset {
    pub fn first_ym(&self) -> Option<&str> {
        self.rows.first().map(|r| r.ym.as_str())
    }

    pub fn last_ym(&self) -> Option<&str> {
        self.rows.last().map(|r| r.ym.as_str())
    }
}

/// One deviation sample: district index minus the city-wide index for the
/// same period, `None` when either side is missing.
#[derive(Debug, Clone)]
pub struct DeviationPoint {
    pub ym: String,
    pub gu: String,
    pub deviation: Option<f64>,
}

/// Per-district summary statistics over the windowed/sampled point set.
///
/// The `diff_*` fields describe the deviation series; `raw_*` fields describe
/// the district's own index values. Percent change is only ever derived from
/// raw values since deviations can be zero or negative.
#[derive(Debug, Clone)]
pub struct SeriesSummary {
    pub gu: String,
    pub diff_start: Option<f64>,
    pub diff_end: Option<f64>,
    pub diff_delta: Option<f64>,
    pub diff_min: Option<f64>,
    pub diff_max: Option<f64>,
    pub raw_start: Option<f64>,
    pub raw_end: Option<f64>,
    pub raw_delta: Option<f64>,
    pub raw_pct: Option<f64>,
}

/// Rendered recommendation row for console preview and CSV export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CandidateRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Complex")]
    #[tabled(rename = "Complex")]
    pub complex_name: String,
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Price")]
    #[tabled(rename = "Price")]
    pub price: String,
    #[serde(rename = "CommuteSelected")]
    #[tabled(rename = "CommuteSelected")]
    pub commute_selected: String,
    #[serde(rename = "CommuteGangnam")]
    #[tabled(rename = "CommuteGangnam")]
    pub commute_gangnam: String,
    #[serde(rename = "YearBuilt")]
    #[tabled(rename = "YearBuilt")]
    pub year_built: String,
    #[serde(rename = "Pyeong")]
    #[tabled(rename = "Pyeong")]
    pub pyeong: String,
    #[serde(rename = "Households")]
    #[tabled(rename = "Households")]
    pub households: String,
    #[serde(rename = "School")]
    #[tabled(rename = "School")]
    pub school: String,
}

/// Rendered price-level row for console preview and CSV export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PriceLevelRow {
    #[serde(rename = "Complex")]
    #[tabled(rename = "Complex")]
    pub complex_name: String,
    #[serde(rename = "District")]
    #[tabled(rename = "District")]
    pub district: String,
    #[serde(rename = "Current")]
    #[tabled(rename = "Current")]
    pub current: String,
    #[serde(rename = "Peak")]
    #[tabled(rename = "Peak")]
    pub peak: String,
    #[serde(rename = "FromPeak")]
    #[tabled(rename = "FromPeak")]
    pub from_peak: String,
    #[serde(rename = "Tier")]
    #[tabled(rename = "Tier")]
    pub tier: String,
    #[serde(rename = "YearBuilt")]
    #[tabled(rename = "YearBuilt")]
    pub year_built: String,
    #[serde(rename = "Households")]
    #[tabled(rename = "Households")]
    pub households: String,
}

/// Rendered per-district index summary for console preview and CSV export.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendSummaryRow {
    #[serde(rename = "Gu")]
    #[tabled(rename = "Gu")]
    pub gu: String,
    #[serde(rename = "DiffStart")]
    #[tabled(rename = "DiffStart")]
    pub diff_start: String,
    #[serde(rename = "DiffEnd")]
    #[tabled(rename = "DiffEnd")]
    pub diff_end: String,
    #[serde(rename = "DiffDelta")]
    #[tabled(rename = "DiffDelta")]
    pub diff_delta: String,
    #[serde(rename = "DiffRange")]
    #[tabled(rename = "DiffRange")]
    pub diff_range: String,
    #[serde(rename = "RawStart")]
    #[tabled(rename = "RawStart")]
    pub raw_start: String,
    #[serde(rename = "RawEnd")]
    #[tabled(rename = "RawEnd")]
    pub raw_end: String,
    #[serde(rename = "RawDelta")]
    #[tabled(rename = "RawDelta")]
    pub raw_delta: String,
    #[serde(rename = "RawPct")]
    #[tabled(rename = "RawPct")]
    pub raw_pct: String,
}

/// JSON run summary written next to the exported CSV files.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub apartments_loaded: usize,
    pub index_months_loaded: usize,
    pub candidates_matched: usize,
    pub price_levels_matched: usize,
    pub districts_compared: usize,
}
