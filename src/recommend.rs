use crate::types::{ApartmentRecord, CandidateRecord, Workplace};
use std::cmp::Ordering;

/// User-entered recommendation criteria. `min_year_built == 0` means the age
/// filter is disabled; it is never interpreted as a literal minimum year.
#[derive(Debug, Clone)]
pub struct Criteria {
    pub budget_min: f64,
    pub budget_max: f64,
    pub workplace: Workplace,
    pub max_commute: f64,
    pub min_year_built: f64,
}

/// Reject invalid criteria before any computation runs, with a specific
/// message per violated constraint. The engine never silently coerces bad
/// parameters.
pub fn validate(c: &Criteria) -> Result<(), String> {
    if c.budget_max <= 0.0 {
        return Err("예산 최대값을 입력해주세요. (예: 100000)".to_string());
    }
    if c.budget_min < 0.0 {
        return Err("예산 최소값은 0 이상이어야 해요.".to_string());
    }
    if c.budget_min > c.budget_max {
        return Err("예산 최소값이 최대값보다 클 수 없어요.".to_string());
    }
    if c.max_commute <= 0.0 {
        return Err("최대 통근 시간을 입력해주세요. (예: 60)".to_string());
    }
    Ok(())
}

/// A candidate passes only when every required field is present and within
/// range. A missing required field disqualifies the record rather than
/// matching as a wildcard.
fn passes(c: &CandidateRecord, criteria: &Criteria) -> bool {
    let Some(price) = c.record.current_price else {
        return false;
    };
    let Some(commute) = c.commute_selected else {
        return false;
    };
    if commute > criteria.max_commute {
        return false;
    }
    if price < criteria.budget_min || price > criteria.budget_max {
        return false;
    }
    if criteria.min_year_built > 0.0 {
        let Some(year) = c.record.year_built else {
            return false;
        };
        if year < criteria.min_year_built {
            return false;
        }
    }
    true
}

/// Filter and rank the full record set against the given criteria.
///
/// Ranking is a stable three-key sort: commute to 강남 ascending (missing
/// last), year built descending (missing last), then price ascending. There
/// is no fourth key; ties keep their input order so identical inputs always
/// produce identical output.
pub fn build_candidates(records: &[ApartmentRecord], criteria: &Criteria) -> Vec<CandidateRecord> {
    let mut candidates: Vec<CandidateRecord> = records
        .iter()
        .map(|r| CandidateRecord {
            commute_selected: criteria.workplace.commute_minutes(r),
            commute_gangnam: r.time_gangnam,
            record: r.clone(),
        })
        .filter(|c| passes(c, criteria))
        .collect();
    rank(&mut candidates);
    candidates
}

pub fn rank(candidates: &mut [CandidateRecord]) {
    candidates.sort_by(|a, b| {
        let ag = a.commute_gangnam.unwrap_or(f64::INFINITY);
        let bg = b.commute_gangnam.unwrap_or(f64::INFINITY);
        let ay = a.record.year_built.unwrap_or(f64::NEG_INFINITY);
        let by = b.record.year_built.unwrap_or(f64::NEG_INFINITY);
        let ap = a.record.current_price.unwrap_or(f64::INFINITY);
        let bp = b.record.current_price.unwrap_or(f64::INFINITY);
        ag.partial_cmp(&bg)
            .unwrap_or(Ordering::Equal)
            .then(by.partial_cmp(&ay).unwrap_or(Ordering::Equal))
            .then(ap.partial_cmp(&bp).unwrap_or(Ordering::Equal))
    });
}

/// Cyclic pagination over an already-finalized ordering: a page index at or
/// past the end wraps to page 0 so a "next" control can loop forever.
/// Returns the page slice and the resolved page index.
pub fn paginate<T>(items: &[T], page_size: usize, page_index: usize) -> (&[T], usize) {
    if items.is_empty() || page_size == 0 {
        return (&[], 0);
    }
    let total_pages = items.len().div_ceil(page_size);
    let page = if page_index >= total_pages { 0 } else { page_index };
    let start = page * page_size;
    let end = (start + page_size).min(items.len());
    (&items[start..end], page)
}

pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        len.div_ceil(page_size)
    }
}
