use crate::engine::bands::band_label_for;
use crate::model::row::{RatingRow, reshape};
use crate::model::settings::{Settings, finite_or_zero, normalize_weights};

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub eq_behavioral_by_rater: Vec<f64>,
    pub eq_competency_by_rater: Vec<f64>,
    pub behavioral_total: f64,
    pub competency_total: f64,
    pub grand_total: f64,
    pub overall_label: String,
}

/// Pure derivation of one row: per-rater equivalent rates, category means,
/// grand total, band label. Re-normalizes the weights and re-shapes the row
/// itself rather than trusting upstream to have done either. Total; non-finite
/// raw inputs count as 0.
pub fn derive_row(row: &RatingRow, settings: &Settings) -> DerivedRow {
    let (bw, cw) = normalize_weights(settings.behavioral_weight, settings.competency_weight);
    let shaped = reshape(row, settings.raters.max(1));

    let eq_behavioral_by_rater: Vec<f64> = shaped
        .behavioral_raw_by_rater
        .iter()
        .map(|&raw| equivalent_rate(raw, settings.behavioral_columns, bw))
        .collect();
    let eq_competency_by_rater: Vec<f64> = shaped
        .competency_raw_by_rater
        .iter()
        .map(|&raw| equivalent_rate(raw, settings.competency_columns, cw))
        .collect();

    let behavioral_total = mean(&eq_behavioral_by_rater);
    let competency_total = mean(&eq_competency_by_rater);
    let grand_total = behavioral_total + competency_total;

    DerivedRow {
        overall_label: band_label_for(&settings.bands, grand_total),
        eq_behavioral_by_rater,
        eq_competency_by_rater,
        behavioral_total,
        competency_total,
        grand_total,
    }
}

/// `raw / divisor * weight`, with a divisor floor of 1 so a division by zero
/// is impossible even if sanitization was bypassed.
pub fn equivalent_rate(raw: f64, columns: u32, weight: f64) -> f64 {
    finite_or_zero(raw) / f64::from(columns.max(1)) * weight
}

/// Arithmetic mean; empty input is defined as 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
