use serde::Serialize;

use crate::model::row::{RatingRow, new_row_id};
use crate::model::settings::Settings;

pub const STATE_VERSION: u32 = 1;

/// The persisted unit: version tag, settings, and the ordered rows.
/// `rows.len() == settings.rows_count` holds after every reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetState {
    pub version: u32,
    pub settings: Settings,
    pub rows: Vec<RatingRow>,
}

impl SheetState {
    pub fn default_state() -> Self {
        let settings = Settings::default_v1();
        let rows = empty_rows(settings.rows_count, settings.raters, 0);
        Self {
            version: STATE_VERSION,
            settings,
            rows,
        }
    }

    /// Deterministic demo sheet: every cell filled with a small arithmetic
    /// pattern so exports have something to show.
    pub fn sample_state() -> Self {
        let mut state = Self::default_state();
        for (idx, row) in state.rows.iter_mut().enumerate() {
            let base_b = 8.0 + idx as f64 * 2.0;
            let base_c = 10.0 + idx as f64 * 2.0;
            for (r_idx, v) in row.behavioral_raw_by_rater.iter_mut().enumerate() {
                *v = (base_b + ((r_idx % 3) as f64 - 1.0) * 3.0).max(0.0);
            }
            for (r_idx, v) in row.competency_raw_by_rater.iter_mut().enumerate() {
                *v = (base_c + ((r_idx % 4) as f64 - 1.0) * 4.0).max(0.0);
            }
        }
        state
    }
}

/// Zero-filled rows labelled `Item {n}`, 1-based from `first_index`.
pub fn empty_rows(count: usize, raters: usize, first_index: usize) -> Vec<RatingRow> {
    (0..count)
        .map(|i| {
            let n = first_index + i + 1;
            RatingRow::new(new_row_id(), format!("Item {n}"), raters)
        })
        .collect()
}
