use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Behavioral,
    Competency,
}

/// One scored item. The per-rater arrays are kept at `settings.raters`
/// entries by [`reshape`] at every read/write boundary; storage is never
/// trusted to already satisfy that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRow {
    pub id: String,
    pub label: String,
    pub behavioral_raw_by_rater: Vec<f64>,
    pub competency_raw_by_rater: Vec<f64>,
}

impl RatingRow {
    pub fn new(id: String, label: String, raters: usize) -> Self {
        Self {
            id,
            label,
            behavioral_raw_by_rater: vec![0.0; raters],
            competency_raw_by_rater: vec![0.0; raters],
        }
    }

    /// Zeroes both arrays in place, keeping id and label.
    pub fn reset(&mut self) {
        self.behavioral_raw_by_rater.fill(0.0);
        self.competency_raw_by_rater.fill(0.0);
    }
}

static NEXT_ROW_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn new_row_id() -> String {
    let seq = NEXT_ROW_SEQ.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("row-{seq}-{nanos:x}")
}

/// Truncates from the tail or appends zeros until `values.len() == target`.
/// Existing entries keep their index, so a rater's score never shifts into
/// another rater's slot.
pub fn resize_values(values: &[f64], target: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    if out.len() > target {
        out.truncate(target);
    } else {
        out.resize(target, 0.0);
    }
    out
}

pub fn reshape(row: &RatingRow, raters: usize) -> RatingRow {
    RatingRow {
        id: row.id.clone(),
        label: row.label.clone(),
        behavioral_raw_by_rater: resize_values(&row.behavioral_raw_by_rater, raters),
        competency_raw_by_rater: resize_values(&row.competency_raw_by_rater, raters),
    }
}
