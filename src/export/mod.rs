pub mod csv;
pub mod xlsx;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Serialized form of a derived value: rounded to 6 decimal places with
/// trailing zeros and a trailing decimal point stripped. Non-finite values
/// serialize as the empty field.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    let text = format!("{n:.6}");
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_strips_trailing_zeros() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(0.6), "0.6");
        assert_eq!(format_number(4.25), "4.25");
        assert_eq!(format_number(0.5000000), "0.5");
    }

    #[test]
    fn test_format_number_rounds_to_six_places() {
        assert_eq!(format_number(0.123456789), "0.123457");
        assert_eq!(format_number(1.0000004), "1");
        assert_eq!(format_number(-0.0000001), "0");
    }

    #[test]
    fn test_format_number_non_finite_is_empty() {
        assert_eq!(format_number(f64::NAN), "");
        assert_eq!(format_number(f64::INFINITY), "");
    }

    #[test]
    fn test_format_number_round_trips_within_tolerance() {
        for v in [0.0, 0.3, 0.75, 3.5, 4.25, 0.123456789, 17.5, -2.25] {
            let parsed: f64 = format_number(v).parse().unwrap();
            assert!((parsed - v).abs() < 1e-6, "{v} -> {parsed}");
        }
    }
}
