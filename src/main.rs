// Entry point and high-level CLI flow.
//
// - Option [1] loads both CSV snapshots, printing diagnostics.
// - Option [2] filters and ranks apartment candidates (추천).
// - Option [3] lists complexes by price level relative to their peak.
// - Option [4] compares district index deviations against the Seoul average.
// Every view recomputes from the loaded snapshots; nothing is cached across
// runs of a view.
mod index_trend;
mod loader;
mod output;
mod price_level;
mod recommend;
mod types;
mod util;

use once_cell::sync::Lazy;
use price_level::{PriceLevelFilter, PriceLevelItem, PriceSort};
use recommend::Criteria;
use std::io::{self, Write};
use std::sync::Mutex;
use types::{
    ApartmentRecord, CandidateRecord, CandidateRow, GuIndexDataset, PriceLevelRow, RunSummary,
    SeriesSummary, TrendSummaryRow, Workplace,
};
use util::{
    format_delta, format_int, format_money, format_opt1, format_opt_int, format_pct0, format_pct1,
};

const APARTMENTS_CSV: &str = "apartments.csv";
const GU_INDEX_CSV: &str = "gu_index.csv";
const PAGE_SIZE: usize = 3;

// Simple in-memory app state so we load the CSVs once but can run each view
// any number of times in a single session.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        apartments: None,
        gu_index: None,
        candidates_matched: 0,
        price_levels_matched: 0,
        districts_compared: 0,
    })
});

struct AppState {
    apartments: Option<Vec<ApartmentRecord>>,
    gu_index: Option<GuIndexDataset>,
    candidates_matched: usize,
    price_levels_matched: usize,
    districts_compared: usize,
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    prompt("Enter choice: ")
}

/// Read a number with a fallback used for blank input. Non-numeric text
/// falls back too; range errors are left to criteria validation so the user
/// sees the specific message.
fn read_f64(label: &str, default: f64) -> f64 {
    let s = prompt(label);
    if s.is_empty() {
        return default;
    }
    s.parse::<f64>().unwrap_or(default)
}

fn read_usize(label: &str, default: usize) -> usize {
    let s = prompt(label);
    if s.is_empty() {
        return default;
    }
    s.parse::<usize>().unwrap_or(default)
}

/// Handle option [1]: load both snapshots. Each dataset fails independently;
/// a broken index file leaves the apartment views usable and vice versa.
fn handle_load() {
    let mut state = APP_STATE.lock().unwrap();

    match loader::load_apartments(APARTMENTS_CSV) {
        Ok((records, report)) => {
            println!(
                "apartments.csv: {} rows loaded ({} deserialize errors, {} without a current price)",
                format_int(records.len() as i64),
                format_int(report.parse_errors as i64),
                format_int(report.rows_without_price as i64)
            );
            state.apartments = Some(records);
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", APARTMENTS_CSV, e);
        }
    }

    match loader::load_gu_index(GU_INDEX_CSV) {
        Ok((data, report)) => {
            println!(
                "gu_index.csv: {} months kept of {} rows ({} bad month keys, {} duplicates), {} districts",
                format_int(report.kept_rows as i64),
                format_int(report.total_rows as i64),
                format_int(report.bad_month_keys as i64),
                format_int(report.duplicate_keys as i64),
                format_int(data.districts.len() as i64)
            );
            state.gu_index = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load {}: {}", GU_INDEX_CSV, e);
        }
    }
    println!();
}

fn candidate_rows(page: &[CandidateRecord], first_rank: usize) -> Vec<CandidateRow> {
    page.iter()
        .enumerate()
        .map(|(i, c)| CandidateRow {
            rank: first_rank + i + 1,
            complex_name: c.record.complex_name.clone(),
            district: format!("{} {}", c.record.gu, c.record.dong).trim().to_string(),
            price: format_money(c.record.current_price),
            commute_selected: format!("{}분", format_opt_int(c.commute_selected)),
            commute_gangnam: format!("{}분", format_opt_int(c.commute_gangnam)),
            year_built: format_opt_int(c.record.year_built),
            pyeong: format_opt_int(c.record.pyeong),
            households: format_opt_int(c.record.households),
            school: c.record.school_name.clone(),
        })
        .collect()
}

/// Handle option [2]: the candidate recommender.
fn handle_recommend() {
    let records = {
        let state = APP_STATE.lock().unwrap();
        state.apartments.clone()
    };
    let Some(records) = records else {
        println!("Error: No data loaded. Please load the CSV files first (option 1).\n");
        return;
    };

    let budget_min = read_f64("예산 최소 (만원, 기본 0): ", 0.0);
    let budget_max = read_f64("예산 최대 (만원, 예: 100000): ", 0.0);
    let workplace = match prompt("직장 위치 [1] 강남 [2] 여의도 [3] 시청 (기본 1): ").as_str() {
        "2" => Workplace::Yeouido,
        "3" => Workplace::CityHall,
        _ => Workplace::Gangnam,
    };
    let max_commute = read_f64("최대 통근 시간 (분, 기본 60): ", 60.0);
    let min_year_built = read_f64("최소 준공년도 (0이면 미사용): ", 0.0);

    let criteria = Criteria {
        budget_min,
        budget_max,
        workplace,
        max_commute,
        min_year_built,
    };
    if let Err(msg) = recommend::validate(&criteria) {
        println!("{}\n", msg);
        return;
    }

    let candidates = recommend::build_candidates(&records, &criteria);
    if candidates.is_empty() {
        println!("조건에 맞는 아파트가 없어요. 조건을 완화해보세요.\n");
        return;
    }
    APP_STATE.lock().unwrap().candidates_matched = candidates.len();

    println!(
        "\n{} matches · 정렬: 강남 → 신축 → 저렴 (필터: {} {}분 이내)\n",
        format_int(candidates.len() as i64),
        criteria.workplace.label(),
        criteria.max_commute
    );

    let total = recommend::total_pages(candidates.len(), PAGE_SIZE);
    let mut page = 0usize;
    loop {
        let (slice, resolved) = recommend::paginate(&candidates, PAGE_SIZE, page);
        page = resolved;
        println!("추천 결과 (Top {}) — {}/{}", PAGE_SIZE, page + 1, total);
        output::preview_table(&candidate_rows(slice, page * PAGE_SIZE));

        match prompt("[N]ext, [P]rev, [E]xport CSV, [B]ack: ").to_uppercase().as_str() {
            "N" => {
                if page + 1 >= total {
                    println!("마지막 추천까지 다 봤어요. (처음으로 돌아갑니다)");
                }
                page += 1;
            }
            "P" => page = page.saturating_sub(1),
            "E" => {
                let rows = candidate_rows(&candidates, 0);
                export_rows("candidates.csv", &rows);
            }
            "B" => break,
            _ => println!("Invalid choice. Please enter N, P, E or B."),
        }
    }
    println!();
}

fn price_rows(items: &[PriceLevelItem]) -> Vec<PriceLevelRow> {
    items
        .iter()
        .map(|i| PriceLevelRow {
            complex_name: i.record.complex_name.clone(),
            district: format!("{} {}", i.record.gu, i.record.dong).trim().to_string(),
            current: format_money(i.record.current_price),
            peak: format_money(i.record.peak_price),
            from_peak: format_pct0(i.pct),
            tier: i.tier.label().to_string(),
            year_built: format_opt_int(i.record.year_built),
            households: format_opt_int(i.record.households),
        })
        .collect()
}

/// Handle option [3]: the price-level listing.
fn handle_price_level() {
    let records = {
        let state = APP_STATE.lock().unwrap();
        state.apartments.clone()
    };
    let Some(records) = records else {
        println!("Error: No data loaded. Please load the CSV files first (option 1).\n");
        return;
    };

    let options = price_level::district_options(&records);
    if !options.is_empty() {
        println!("구 목록: {}", options.join(", "));
    }
    let gu = prompt("구 (빈칸이면 전체): ");
    let gu = if gu.is_empty() { None } else { Some(gu) };
    let sort = match prompt("정렬 [1] 하락 큰 순 [2] 전고점 가까운 순 (기본 1): ").as_str() {
        "2" => PriceSort::ClosestPeak,
        _ => PriceSort::MostDrop,
    };
    let min_households = read_f64("최소 세대수 (0이면 미사용): ", 0.0);
    let min_year_built = read_f64("최소 준공년도 (0이면 미사용): ", 0.0);

    let filter = PriceLevelFilter {
        gu,
        min_households,
        min_year_built,
    };
    let items = price_level::build_price_levels(&records, &filter, sort);
    if items.is_empty() {
        println!("조건에 맞는 단지가 없습니다. 필터를 완화해보세요.\n");
        return;
    }
    APP_STATE.lock().unwrap().price_levels_matched = items.len();

    println!(
        "\n{} matches · 기준: 0%이하 적극 관심 / ~15% 관심 / ~25% 주의 / 25%초과 고점 구간\n",
        format_int(items.len() as i64)
    );

    let total = recommend::total_pages(items.len(), PAGE_SIZE);
    let mut page = 0usize;
    loop {
        let (slice, resolved) = recommend::paginate(&items, PAGE_SIZE, page);
        page = resolved;
        println!("가격 수준 — {}/{}", page + 1, total);
        output::preview_table(&price_rows(slice));
        for item in slice {
            println!("- {}: {}", item.record.complex_name, item.tier.interpretation());
        }
        println!();

        match prompt("[N]ext, [P]rev, [E]xport CSV, [B]ack: ").to_uppercase().as_str() {
            "N" => {
                if page + 1 >= total {
                    println!("마지막 결과까지 다 봤어요. (처음으로 돌아갑니다)");
                }
                page += 1;
            }
            "P" => page = page.saturating_sub(1),
            "E" => {
                let rows = price_rows(&items);
                export_rows("price_levels.csv", &rows);
            }
            "B" => break,
            _ => println!("Invalid choice. Please enter N, P, E or B."),
        }
    }
    println!();
}

fn summary_rows(summaries: &[SeriesSummary]) -> Vec<TrendSummaryRow> {
    summaries
        .iter()
        .map(|s| TrendSummaryRow {
            gu: s.gu.clone(),
            diff_start: format_opt1(s.diff_start),
            diff_end: format_opt1(s.diff_end),
            diff_delta: format_delta(s.diff_delta),
            diff_range: match (s.diff_min, s.diff_max) {
                (Some(lo), Some(hi)) => format!("{:.1} ~ {:.1}", lo, hi),
                _ => "—".to_string(),
            },
            raw_start: format_opt1(s.raw_start),
            raw_end: format_opt1(s.raw_end),
            raw_delta: format_delta(s.raw_delta),
            raw_pct: format_pct1(s.raw_pct),
        })
        .collect()
}

/// Handle option [4]: district index deviations against the Seoul average.
fn handle_index_trend() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.gu_index.clone()
    };
    let Some(data) = data else {
        println!("Error: No index data loaded. Please load the CSV files first (option 1).\n");
        return;
    };

    let first = data.first_ym().unwrap_or("").to_string();
    let last = data.last_ym().unwrap_or("").to_string();
    println!("기간: {} ~ {}", first, last);

    let mut start = prompt(&format!("시작 YYYY-MM (기본 {}): ", first));
    if start.is_empty() {
        start = first.clone();
    }
    let mut end = prompt(&format!("끝 YYYY-MM (기본 {}): ", last));
    if end.is_empty() {
        end = last.clone();
    }
    // inverted windows are clamped here, before the pipeline runs
    if end < start {
        println!("끝이 시작보다 빠를 수 없어 {}로 맞췄어요.", start);
        end = start.clone();
    }
    let stride = read_usize("표시 간격 [1] 월간 [3] 분기 [6] 반기 (기본 1): ", 1).max(1);

    println!("구 목록: {}", data.districts.join(", "));
    let picked = prompt("비교할 구 (쉼표 구분, 빈칸이면 기본 선택): ");
    let selected: Vec<String> = if picked.is_empty() {
        index_trend::default_selection(&data.districts)
    } else {
        let requested: Vec<String> = picked
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let known: Vec<String> = requested
            .iter()
            .filter(|g| data.districts.contains(*g))
            .cloned()
            .collect();
        for g in &requested {
            if !data.districts.contains(g) {
                println!("무시: \"{}\"는 데이터에 없는 구입니다.", g);
            }
        }
        known
    };
    if selected.is_empty() {
        println!("최소 1개 구는 선택해야 표가 표시돼요.\n");
        return;
    }

    let view = index_trend::build_trend(&data, &start, &end, stride, &selected);
    if view.sampled_yms.is_empty() {
        println!("선택한 기간에 데이터가 없습니다.\n");
        return;
    }
    APP_STATE.lock().unwrap().districts_compared = selected.len();

    println!("\n편차 = (구 지수 - 서울특별시 지수), 원지수 기준\n");
    output::preview_deviation_matrix(&view.sampled_yms, &selected, &view.deviations);

    println!("요약 (최근 편차 높은 순) · 변화율은 원지수 기준");
    let rows = summary_rows(&view.summaries);
    output::preview_table(&rows);

    if prompt("Export CSV (Y/N): ").to_uppercase() == "Y" {
        export_rows("index_summary.csv", &rows);
    }
    println!();
}

fn export_rows<T: serde::Serialize>(path: &str, rows: &[T]) {
    if let Err(e) = output::write_csv(path, rows) {
        eprintln!("Write error: {}", e);
        return;
    }
    println!("(Exported to {})", path);

    let state = APP_STATE.lock().unwrap();
    let summary = RunSummary {
        apartments_loaded: state.apartments.as_ref().map_or(0, |a| a.len()),
        index_months_loaded: state.gu_index.as_ref().map_or(0, |d| d.rows.len()),
        candidates_matched: state.candidates_matched,
        price_levels_matched: state.price_levels_matched,
        districts_compared: state.districts_compared,
    };
    if let Err(e) = output::write_json("summary.json", &summary) {
        eprintln!("Write error: {}", e);
    }
}

fn main() {
    loop {
        println!("서울 아파트 리포트");
        println!("[1] Load the CSV files");
        println!("[2] 아파트 추천");
        println!("[3] 가격 수준 파악");
        println!("[4] 구별 지수 추이");
        println!("[5] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(),
            "2" => handle_recommend(),
            "3" => handle_price_level(),
            "4" => handle_index_trend(),
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1-5.\n"),
        }
    }
}
