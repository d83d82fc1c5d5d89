use crate::types::{ApartmentRecord, GuIndexDataset, IndexRow, RawApartmentRow};
use crate::util::{coerce_number, is_month_key, parse_month_key};
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fs;

/// City-wide reference column. The index view cannot compute deviations
/// without it, so its absence is a fatal load error.
pub const REFERENCE_COLUMN: &str = "서울특별시";

/// Nationwide aggregate column, excluded from the selectable district list.
const NATIONWIDE_COLUMN: &str = "전국";

#[derive(Debug, Clone)]
pub struct ApartmentLoadReport {
    pub total_rows: usize,
    pub parse_errors: usize,
    pub rows_without_price: usize,
}

#[derive(Debug, Clone)]
pub struct IndexLoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub bad_month_keys: usize,
    pub duplicate_keys: usize,
}

/// Korean spreadsheet tools commonly prepend a UTF-8 BOM; strip it before
/// the header row is interpreted.
fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

fn clean_text(s: Option<String>) -> String {
    s.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Map one raw CSV row into a typed record. Each numeric field coerces
/// independently; a malformed column degrades that one field to `None` and
/// never rejects the row.
fn normalize_apartment(raw: RawApartmentRow) -> ApartmentRecord {
    ApartmentRecord {
        current_price: coerce_number(raw.current_price.as_deref()),
        peak_price: coerce_number(raw.peak_price.as_deref()),
        drop_from_peak_pct: coerce_number(raw.drop_from_peak_pct.as_deref()),
        year_built: coerce_number(raw.year_built.as_deref()),
        pyeong: coerce_number(raw.pyeong.as_deref()),
        households: coerce_number(raw.households.as_deref()),
        rooms: coerce_number(raw.rooms.as_deref()),
        bathrooms: coerce_number(raw.bathrooms.as_deref()),
        school_walk_min: coerce_number(raw.school_walk_min.as_deref()),
        time_gangnam: coerce_number(raw.time_gangnam.as_deref()),
        time_yeouido: coerce_number(raw.time_yeouido.as_deref()),
        time_cityhall: coerce_number(raw.time_cityhall.as_deref()),
        complex_name: clean_text(raw.complex_name),
        gu: clean_text(raw.gu),
        dong: clean_text(raw.dong),
        school_name: clean_text(raw.school_name),
    }
}

pub fn load_apartments(
    path: &str,
) -> Result<(Vec<ApartmentRecord>, ApartmentLoadReport), Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    parse_apartments(&text)
}

pub fn parse_apartments(
    text: &str,
) -> Result<(Vec<ApartmentRecord>, ApartmentLoadReport), Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(text).as_bytes());

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut records: Vec<ApartmentRecord> = Vec::new();

    for result in rdr.deserialize::<RawApartmentRow>() {
        total_rows += 1;
        match result {
            Ok(raw) => records.push(normalize_apartment(raw)),
            Err(_) => parse_errors += 1,
        }
    }

    let rows_without_price = records.iter().filter(|r| r.current_price.is_none()).count();
    let report = ApartmentLoadReport {
        total_rows,
        parse_errors,
        rows_without_price,
    };
    Ok((records, report))
}

pub fn load_gu_index(path: &str) -> Result<(GuIndexDataset, IndexLoadReport), Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    parse_gu_index(&text)
}

/// Parse the regional index CSV. The column set is discovered from the
/// header row: the month column is a literal `ym` header if present, else
/// the first header containing `월`, else the first column. Every other
/// column is a per-district index series.
pub fn parse_gu_index(text: &str) -> Result<(GuIndexDataset, IndexLoadReport), Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(strip_bom(text).as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.is_empty() {
        return Err("gu_index.csv has no header row".into());
    }

    let ym_idx = headers
        .iter()
        .position(|h| h == "ym")
        .or_else(|| headers.iter().position(|h| h.contains('월')))
        .unwrap_or(0);

    if !headers.iter().any(|h| h == REFERENCE_COLUMN) {
        return Err(format!(
            "gu_index.csv is missing the \"{}\" column required as the deviation reference",
            REFERENCE_COLUMN
        )
        .into());
    }

    let districts: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| {
            *i != ym_idx
                && h.as_str() != "ym"
                && h.as_str() != REFERENCE_COLUMN
                && h.as_str() != NATIONWIDE_COLUMN
                && !h.is_empty()
        })
        .map(|(_, h)| h.clone())
        .collect();

    let mut total_rows = 0usize;
    let mut bad_month_keys = 0usize;
    let mut duplicate_keys = 0usize;
    let mut seen: HashSet<String> = HashSet::new();
    let mut rows: Vec<IndexRow> = Vec::new();

    for result in rdr.records() {
        total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                bad_month_keys += 1;
                continue;
            }
        };

        let label = record.get(ym_idx).unwrap_or("").trim();
        let ym = if is_month_key(label) {
            label.to_string()
        } else {
            parse_month_key(label)
        };
        if !is_month_key(&ym) {
            bad_month_keys += 1;
            continue;
        }
        // First occurrence of a month wins.
        if !seen.insert(ym.clone()) {
            duplicate_keys += 1;
            continue;
        }

        let mut values: HashMap<String, f64> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if i == ym_idx || header.is_empty() {
                continue;
            }
            if let Some(v) = coerce_number(record.get(i)) {
                values.insert(header.clone(), v);
            }
        }
        let reference = values.get(REFERENCE_COLUMN).copied();
        rows.push(IndexRow { ym, reference, values });
    }

    if rows.is_empty() {
        return Err("gu_index.csv contains no rows with a parseable YYYY-MM month key".into());
    }

    rows.sort_by(|a, b| a.ym.cmp(&b.ym));

    let kept_rows = rows.len();
    let report = IndexLoadReport {
        total_rows,
        kept_rows,
        bad_month_keys,
        duplicate_keys,
    };
    Ok((GuIndexDataset { rows, districts }, report))
}
