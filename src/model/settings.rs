use serde::{Deserialize, Serialize};

pub const MIN_RATERS: usize = 1;
pub const MAX_RATERS: usize = 20;

pub const DEFAULT_BEHAVIORAL_WEIGHT: f64 = 0.3;
pub const DEFAULT_COMPETENCY_WEIGHT: f64 = 0.7;

/// One inclusive score range and the label it maps to. Bands may overlap;
/// list order decides which one wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    pub label: String,
}

/// Sheet-wide configuration after sanitization. Weights always sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub raters: usize,
    pub rows_count: usize,
    pub behavioral_columns: u32,
    pub competency_columns: u32,
    pub behavioral_weight: f64,
    pub competency_weight: f64,
    pub bands: Vec<Band>,
}

/// Untrusted twin of [`Settings`]: every numeric field is a plain f64 so that
/// fractional, negative, or non-finite input reaches the sanitizer instead of
/// failing at the type boundary. Missing fields deserialize to the defaults,
/// which is what merges a partial persisted settings block over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSettings {
    #[serde(default = "default_raters")]
    pub raters: f64,
    #[serde(default = "default_rows_count")]
    pub rows_count: f64,
    #[serde(default = "default_behavioral_columns")]
    pub behavioral_columns: f64,
    #[serde(default = "default_competency_columns")]
    pub competency_columns: f64,
    #[serde(default = "default_behavioral_weight")]
    pub behavioral_weight: f64,
    #[serde(default = "default_competency_weight")]
    pub competency_weight: f64,
    #[serde(default = "default_bands")]
    pub bands: Vec<Band>,
}

fn default_raters() -> f64 {
    6.0
}

fn default_rows_count() -> f64 {
    7.0
}

fn default_behavioral_columns() -> f64 {
    4.0
}

fn default_competency_columns() -> f64 {
    7.0
}

fn default_behavioral_weight() -> f64 {
    DEFAULT_BEHAVIORAL_WEIGHT
}

fn default_competency_weight() -> f64 {
    DEFAULT_COMPETENCY_WEIGHT
}

pub fn default_bands() -> Vec<Band> {
    vec![
        Band {
            min: 0.0,
            max: 0.59,
            label: "Needs Improvement".to_string(),
        },
        Band {
            min: 0.6,
            max: 0.79,
            label: "Meets Expectations".to_string(),
        },
        Band {
            min: 0.8,
            max: 1.0,
            label: "Exceeds Expectations".to_string(),
        },
    ]
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            raters: default_raters(),
            rows_count: default_rows_count(),
            behavioral_columns: default_behavioral_columns(),
            competency_columns: default_competency_columns(),
            behavioral_weight: default_behavioral_weight(),
            competency_weight: default_competency_weight(),
            bands: default_bands(),
        }
    }
}

impl Settings {
    pub fn default_v1() -> Self {
        sanitize_settings(&RawSettings::default())
    }
}

impl From<&Settings> for RawSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            raters: settings.raters as f64,
            rows_count: settings.rows_count as f64,
            behavioral_columns: f64::from(settings.behavioral_columns),
            competency_columns: f64::from(settings.competency_columns),
            behavioral_weight: settings.behavioral_weight,
            competency_weight: settings.competency_weight,
            bands: settings.bands.clone(),
        }
    }
}

/// Total sanitizer: integer part + clamp for counts, non-negative clamp plus
/// normalization for weights, finite coercion for band edges. Never fails.
pub fn sanitize_settings(raw: &RawSettings) -> Settings {
    let raters = int_in_range(raw.raters, MIN_RATERS, MAX_RATERS);
    let rows_count = int_at_least(raw.rows_count, 1);
    let behavioral_columns = int_at_least(raw.behavioral_columns, 1) as u32;
    let competency_columns = int_at_least(raw.competency_columns, 1) as u32;

    let (behavioral_weight, competency_weight) =
        normalize_weights(raw.behavioral_weight, raw.competency_weight);

    let bands = raw
        .bands
        .iter()
        .map(|b| Band {
            min: finite_or_zero(b.min),
            max: finite_or_zero(b.max),
            label: b.label.clone(),
        })
        .collect();

    Settings {
        raters,
        rows_count,
        behavioral_columns,
        competency_columns,
        behavioral_weight,
        competency_weight,
        bands,
    }
}

/// Clamps both weights to >= 0 and rescales them to sum to 1.0. A
/// non-positive sum falls back to the fixed defaults so the caller can never
/// zero out both categories. Idempotent within floating-point tolerance.
pub fn normalize_weights(behavioral: f64, competency: f64) -> (f64, f64) {
    let bw = finite_or_zero(behavioral).max(0.0);
    let cw = finite_or_zero(competency).max(0.0);
    let sum = bw + cw;
    if sum <= 0.0 {
        return (DEFAULT_BEHAVIORAL_WEIGHT, DEFAULT_COMPETENCY_WEIGHT);
    }
    (bw / sum, cw / sum)
}

pub fn finite_or_zero(n: f64) -> f64 {
    if n.is_finite() { n } else { 0.0 }
}

fn int_in_range(n: f64, min: usize, max: usize) -> usize {
    if !n.is_finite() {
        return min;
    }
    let v = n.floor();
    if v < min as f64 {
        min
    } else if v > max as f64 {
        max
    } else {
        v as usize
    }
}

fn int_at_least(n: f64, min: usize) -> usize {
    if !n.is_finite() {
        return min;
    }
    let v = n.floor();
    if v < min as f64 {
        min
    } else if v > u32::MAX as f64 {
        u32::MAX as usize
    } else {
        v as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_raters() {
        let mut raw = RawSettings::default();
        raw.raters = 25.0;
        assert_eq!(sanitize_settings(&raw).raters, 20);
        raw.raters = 0.0;
        assert_eq!(sanitize_settings(&raw).raters, 1);
        raw.raters = -3.7;
        assert_eq!(sanitize_settings(&raw).raters, 1);
        raw.raters = f64::NAN;
        assert_eq!(sanitize_settings(&raw).raters, 1);
        raw.raters = 6.9;
        assert_eq!(sanitize_settings(&raw).raters, 6);
    }

    #[test]
    fn test_sanitize_floors_counts() {
        let mut raw = RawSettings::default();
        raw.rows_count = 0.0;
        raw.behavioral_columns = -2.0;
        raw.competency_columns = f64::INFINITY;
        let s = sanitize_settings(&raw);
        assert_eq!(s.rows_count, 1);
        assert_eq!(s.behavioral_columns, 1);
        assert_eq!(s.competency_columns, 1);
    }

    #[test]
    fn test_normalize_weights_sum_to_one() {
        let (bw, cw) = normalize_weights(2.0, 6.0);
        assert!((bw + cw - 1.0).abs() < 1e-12);
        // original ratio preserved
        assert!((cw / bw - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_weights_nonpositive_falls_back() {
        assert_eq!(normalize_weights(0.0, 0.0), (0.3, 0.7));
        assert_eq!(normalize_weights(-1.0, -2.0), (0.3, 0.7));
        assert_eq!(normalize_weights(f64::NAN, f64::NAN), (0.3, 0.7));
    }

    #[test]
    fn test_normalize_weights_idempotent() {
        let (bw, cw) = normalize_weights(0.4, 1.2);
        let (bw2, cw2) = normalize_weights(bw, cw);
        assert!((bw - bw2).abs() < 1e-12);
        assert!((cw - cw2).abs() < 1e-12);
    }

    #[test]
    fn test_sanitize_is_a_fixed_point() {
        let mut raw = RawSettings::default();
        raw.raters = 25.0;
        raw.behavioral_weight = 3.0;
        raw.competency_weight = 1.0;
        let once = sanitize_settings(&raw);
        let twice = sanitize_settings(&RawSettings::from(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sanitize_coerces_band_edges() {
        let mut raw = RawSettings::default();
        raw.bands = vec![Band {
            min: f64::NAN,
            max: f64::INFINITY,
            label: "Any".to_string(),
        }];
        let s = sanitize_settings(&raw);
        assert_eq!(s.bands[0].min, 0.0);
        assert_eq!(s.bands[0].max, 0.0);
        assert_eq!(s.bands[0].label, "Any");
    }

    #[test]
    fn test_empty_bands_stay_empty() {
        let mut raw = RawSettings::default();
        raw.bands = Vec::new();
        assert!(sanitize_settings(&raw).bands.is_empty());
    }

    #[test]
    fn test_raw_settings_merges_over_defaults() {
        let raw: RawSettings = serde_json::from_str(r#"{"raters": 3}"#).unwrap();
        assert_eq!(raw.raters, 3.0);
        assert_eq!(raw.rows_count, 7.0);
        assert_eq!(raw.competency_weight, 0.7);
        assert_eq!(raw.bands.len(), 3);
    }
}
