use crate::model::row::{RatingRow, Section, new_row_id, reshape, resize_values};
use crate::model::settings::{RawSettings, finite_or_zero, sanitize_settings};
use crate::model::state::{STATE_VERSION, SheetState, empty_rows};
use crate::store::PersistedState;

/// Applies a settings change and reconciles the row collection with it:
/// sanitize, reshape every surviving row to the new rater count, truncate
/// extra rows from the tail, append factory rows for growth.
pub fn apply_settings(state: &SheetState, raw: &RawSettings) -> SheetState {
    let settings = sanitize_settings(raw);

    let mut rows: Vec<RatingRow> = state
        .rows
        .iter()
        .take(settings.rows_count)
        .enumerate()
        .map(|(idx, r)| {
            let mut next = reshape(r, settings.raters);
            if next.label.is_empty() {
                next.label = format!("Item {}", idx + 1);
            }
            next
        })
        .collect();

    if rows.len() < settings.rows_count {
        let missing = settings.rows_count - rows.len();
        rows.extend(empty_rows(missing, settings.raters, rows.len()));
    }

    SheetState {
        version: STATE_VERSION,
        settings,
        rows,
    }
}

/// Sets a single raw score. The rater index is clamped into range, non-finite
/// values become 0, and every other row and slot is carried over untouched.
pub fn set_raw_cell(
    state: &SheetState,
    row_id: &str,
    section: Section,
    rater_index: usize,
    value: f64,
) -> SheetState {
    let idx = rater_index.min(state.settings.raters.saturating_sub(1));
    let value = finite_or_zero(value);

    let rows = state
        .rows
        .iter()
        .map(|r| {
            if r.id != row_id {
                return r.clone();
            }
            let mut next = reshape(r, state.settings.raters);
            let slots = match section {
                Section::Behavioral => &mut next.behavioral_raw_by_rater,
                Section::Competency => &mut next.competency_raw_by_rater,
            };
            if let Some(slot) = slots.get_mut(idx) {
                *slot = value;
            }
            next
        })
        .collect();

    SheetState {
        version: state.version,
        settings: state.settings.clone(),
        rows,
    }
}

pub fn set_row_label(state: &SheetState, row_id: &str, label: &str) -> SheetState {
    let rows = state
        .rows
        .iter()
        .map(|r| {
            let mut next = r.clone();
            if next.id == row_id {
                next.label = label.to_string();
            }
            next
        })
        .collect();
    SheetState {
        version: state.version,
        settings: state.settings.clone(),
        rows,
    }
}

pub fn reset_row(state: &SheetState, row_id: &str) -> SheetState {
    let rows = state
        .rows
        .iter()
        .map(|r| {
            let mut next = r.clone();
            if next.id == row_id {
                next.reset();
            }
            next
        })
        .collect();
    SheetState {
        version: state.version,
        settings: state.settings.clone(),
        rows,
    }
}

/// Turns a loaded blob (or its absence) into a consistent state: settings
/// merged over defaults and sanitized, rows truncated or extended to
/// `rows_count`, each row reshaped, missing fields defaulted.
pub fn normalize_loaded(loaded: Option<PersistedState>) -> SheetState {
    let Some(loaded) = loaded else {
        return SheetState::default_state();
    };

    let settings = sanitize_settings(&loaded.settings);

    let mut rows: Vec<RatingRow> = loaded
        .rows
        .into_iter()
        .take(settings.rows_count)
        .enumerate()
        .map(|(idx, raw)| RatingRow {
            id: raw.id.unwrap_or_else(new_row_id),
            label: raw.label.unwrap_or_else(|| format!("Item {}", idx + 1)),
            behavioral_raw_by_rater: scrub_values(&raw.behavioral_raw_by_rater, settings.raters),
            competency_raw_by_rater: scrub_values(&raw.competency_raw_by_rater, settings.raters),
        })
        .collect();

    if rows.len() < settings.rows_count {
        let missing = settings.rows_count - rows.len();
        rows.extend(empty_rows(missing, settings.raters, rows.len()));
    }

    SheetState {
        version: STATE_VERSION,
        settings,
        rows,
    }
}

fn scrub_values(values: &[f64], raters: usize) -> Vec<f64> {
    let cleaned: Vec<f64> = values.iter().map(|&v| finite_or_zero(v)).collect();
    resize_values(&cleaned, raters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RawRow;

    fn sample() -> SheetState {
        SheetState::sample_state()
    }

    fn raw_with(f: impl FnOnce(&mut RawSettings)) -> RawSettings {
        let mut raw = RawSettings::default();
        f(&mut raw);
        raw
    }

    #[test]
    fn test_growing_rows_appends_labelled_factory_rows() {
        let state = sample();
        let next = apply_settings(&state, &raw_with(|r| r.rows_count = 9.0));
        assert_eq!(next.rows.len(), 9);
        assert_eq!(next.rows[7].label, "Item 8");
        assert_eq!(next.rows[8].label, "Item 9");
        assert_eq!(next.rows[8].behavioral_raw_by_rater, vec![0.0; 6]);
        // surviving rows keep identity and values
        assert_eq!(next.rows[0].id, state.rows[0].id);
        assert_eq!(
            next.rows[0].behavioral_raw_by_rater,
            state.rows[0].behavioral_raw_by_rater
        );
    }

    #[test]
    fn test_shrinking_rows_drops_the_tail() {
        let state = sample();
        let next = apply_settings(&state, &raw_with(|r| r.rows_count = 3.0));
        assert_eq!(next.rows.len(), 3);
        let kept: Vec<&str> = next.rows.iter().map(|r| r.id.as_str()).collect();
        let expected: Vec<&str> = state.rows[..3].iter().map(|r| r.id.as_str()).collect();
        assert_eq!(kept, expected);
    }

    #[test]
    fn test_rater_change_reshapes_every_row() {
        let state = sample();
        let grown = apply_settings(&state, &raw_with(|r| r.raters = 8.0));
        for (row, old) in grown.rows.iter().zip(&state.rows) {
            assert_eq!(row.behavioral_raw_by_rater.len(), 8);
            assert_eq!(row.behavioral_raw_by_rater[..6], old.behavioral_raw_by_rater[..]);
            assert_eq!(row.behavioral_raw_by_rater[6..], [0.0, 0.0]);
        }
        let shrunk = apply_settings(&grown, &raw_with(|r| r.raters = 2.0));
        for (row, old) in shrunk.rows.iter().zip(&state.rows) {
            assert_eq!(row.competency_raw_by_rater[..], old.competency_raw_by_rater[..2]);
        }
    }

    #[test]
    fn test_set_raw_cell_changes_exactly_one_slot() {
        let state = sample();
        let id = state.rows[2].id.clone();
        let next = set_raw_cell(&state, &id, Section::Behavioral, 1, 17.0);
        assert_eq!(next.rows[2].behavioral_raw_by_rater[1], 17.0);
        for (i, (row, old)) in next.rows.iter().zip(&state.rows).enumerate() {
            assert_eq!(row.competency_raw_by_rater, old.competency_raw_by_rater);
            if i != 2 {
                assert_eq!(row, old);
            } else {
                for (j, (v, o)) in row
                    .behavioral_raw_by_rater
                    .iter()
                    .zip(&old.behavioral_raw_by_rater)
                    .enumerate()
                {
                    if j != 1 {
                        assert_eq!(v, o);
                    }
                }
            }
        }
    }

    #[test]
    fn test_set_raw_cell_clamps_index_and_value() {
        let state = sample();
        let id = state.rows[0].id.clone();
        let next = set_raw_cell(&state, &id, Section::Competency, 99, f64::NAN);
        // clamped to the last rater slot, NaN coerced to 0
        assert_eq!(next.rows[0].competency_raw_by_rater[5], 0.0);
        assert_eq!(
            next.rows[0].competency_raw_by_rater[..5],
            state.rows[0].competency_raw_by_rater[..5]
        );
    }

    #[test]
    fn test_set_raw_cell_unknown_id_is_a_no_op() {
        let state = sample();
        let next = set_raw_cell(&state, "no-such-row", Section::Behavioral, 0, 9.0);
        assert_eq!(next.rows, state.rows);
    }

    #[test]
    fn test_reset_row_preserves_identity() {
        let state = sample();
        let id = state.rows[1].id.clone();
        let next = reset_row(&state, &id);
        assert_eq!(next.rows[1].id, id);
        assert_eq!(next.rows[1].label, state.rows[1].label);
        assert_eq!(next.rows[1].behavioral_raw_by_rater, vec![0.0; 6]);
        assert_eq!(next.rows[0], state.rows[0]);
    }

    #[test]
    fn test_set_row_label() {
        let state = sample();
        let id = state.rows[4].id.clone();
        let next = set_row_label(&state, &id, "Communication");
        assert_eq!(next.rows[4].label, "Communication");
        assert_eq!(next.rows[4].behavioral_raw_by_rater, state.rows[4].behavioral_raw_by_rater);
    }

    #[test]
    fn test_normalize_loaded_none_yields_defaults() {
        let state = normalize_loaded(None);
        assert_eq!(state.version, STATE_VERSION);
        assert_eq!(state.rows.len(), 7);
        assert_eq!(state.settings.raters, 6);
        assert!((state.settings.behavioral_weight - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_loaded_defaults_missing_row_fields() {
        let loaded = PersistedState {
            version: 1,
            settings: RawSettings::default(),
            rows: vec![RawRow {
                id: None,
                label: None,
                behavioral_raw_by_rater: vec![1.0, f64::NAN],
                competency_raw_by_rater: Vec::new(),
            }],
        };
        let state = normalize_loaded(Some(loaded));
        assert_eq!(state.rows.len(), 7);
        assert!(!state.rows[0].id.is_empty());
        assert_eq!(state.rows[0].label, "Item 1");
        assert_eq!(state.rows[0].behavioral_raw_by_rater.len(), 6);
        assert_eq!(state.rows[0].behavioral_raw_by_rater[0], 1.0);
        assert_eq!(state.rows[0].behavioral_raw_by_rater[1], 0.0);
        assert_eq!(state.rows[0].competency_raw_by_rater, vec![0.0; 6]);
        assert_eq!(state.rows[1].label, "Item 2");
    }

    #[test]
    fn test_normalize_loaded_truncates_extra_rows() {
        let mut settings = RawSettings::default();
        settings.rows_count = 2.0;
        let rows = (0..5)
            .map(|i| RawRow {
                id: Some(format!("keep-{i}")),
                label: Some(format!("Item {}", i + 1)),
                behavioral_raw_by_rater: vec![i as f64; 6],
                competency_raw_by_rater: vec![i as f64; 6],
            })
            .collect();
        let state = normalize_loaded(Some(PersistedState {
            version: 1,
            settings,
            rows,
        }));
        assert_eq!(state.rows.len(), 2);
        assert_eq!(state.rows[0].id, "keep-0");
        assert_eq!(state.rows[1].id, "keep-1");
    }

    #[test]
    fn test_invariant_rows_match_rows_count_after_any_change() {
        let state = sample();
        for count in [1.0, 4.0, 12.0] {
            let next = apply_settings(&state, &raw_with(|r| r.rows_count = count));
            assert_eq!(next.rows.len(), next.settings.rows_count);
        }
    }
}
