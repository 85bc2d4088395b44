use crate::model::settings::Band;

/// Ordered scan over the bands, returning the label of the first one whose
/// inclusive `[min, max]` range contains the score. Overlaps are legal and
/// resolved by list order; no match yields the empty string. A non-finite
/// score is classified as 0.
pub fn band_label_for(bands: &[Band], score: f64) -> String {
    let s = if score.is_finite() { score } else { 0.0 };
    bands
        .iter()
        .find(|b| s >= b.min && s <= b.max)
        .map(|b| b.label.clone())
        .unwrap_or_default()
}
