use crate::types::DeviationPoint;
use crate::util::format_opt1;
use serde::Serialize;
use std::error::Error;
use tabled::builder::Builder;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Print rows as a markdown table, or a placeholder when there is nothing
/// to show.
pub fn preview_table<T>(rows: &[T])
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Print the deviation matrix: one row per sampled month, one column per
/// selected district. The district columns are only known at runtime, so
/// this goes through the table builder instead of a derived row type.
pub fn preview_deviation_matrix(yms: &[String], districts: &[String], points: &[DeviationPoint]) {
    if yms.is_empty() || districts.is_empty() {
        println!("(no rows)\n");
        return;
    }

    let mut builder = Builder::default();
    let mut header = vec!["ym".to_string()];
    header.extend(districts.iter().cloned());
    builder.push_record(header);

    for ym in yms {
        let mut row = vec![ym.clone()];
        for gu in districts {
            let dev = points
                .iter()
                .find(|p| &p.ym == ym && &p.gu == gu)
                .and_then(|p| p.deviation);
            row.push(format_opt1(dev));
        }
        builder.push_record(row);
    }

    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
