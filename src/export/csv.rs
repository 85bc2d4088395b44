use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::engine::derive::derive_row;
use crate::export::{ExportError, format_number};
use crate::model::row::RatingRow;
use crate::model::settings::Settings;

/// Writes the derived sheet as CSV: one header row, then per item the label,
/// raw/equivalent-rate pairs per rater for both categories, the category
/// totals, the grand total, and the overall label. CRLF line endings and
/// RFC-style quoting.
pub fn write_csv(settings: &Settings, rows: &[RatingRow], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_csv_to(settings, rows, file)
}

pub fn write_csv_to<W: Write>(
    settings: &Settings,
    rows: &[RatingRow],
    writer: W,
) -> Result<(), ExportError> {
    let mut w = ::csv::WriterBuilder::new()
        .terminator(::csv::Terminator::CRLF)
        .from_writer(writer);

    let n = settings.raters;

    let mut header = Vec::with_capacity(4 * n + 5);
    header.push("Item".to_string());
    for i in 1..=n {
        header.push(format!("Behavioral Rater {i} Raw"));
        header.push("Behavioral Eq. Rate".to_string());
    }
    header.push("Behavioral TOTAL".to_string());
    for i in 1..=n {
        header.push(format!("Competency Rater {i} Raw"));
        header.push("Competency Eq. Rate".to_string());
    }
    header.push("Competency TOTAL".to_string());
    header.push("GRAND TOTAL (Behavioral + Competency)".to_string());
    header.push("OVER-ALL SCORE".to_string());
    w.write_record(&header)?;

    for row in rows {
        let d = derive_row(row, settings);
        let mut record = Vec::with_capacity(header.len());
        record.push(row.label.clone());
        for i in 0..n {
            record.push(format_number(value_at(&row.behavioral_raw_by_rater, i)));
            record.push(format_number(value_at(&d.eq_behavioral_by_rater, i)));
        }
        record.push(format_number(d.behavioral_total));
        for i in 0..n {
            record.push(format_number(value_at(&row.competency_raw_by_rater, i)));
            record.push(format_number(value_at(&d.eq_competency_by_rater, i)));
        }
        record.push(format_number(d.competency_total));
        record.push(format_number(d.grand_total));
        record.push(d.overall_label.clone());
        w.write_record(&record)?;
    }

    w.flush()?;
    Ok(())
}

fn value_at(values: &[f64], index: usize) -> f64 {
    values.get(index).copied().unwrap_or(0.0)
}
