use crate::engine::derive::derive_row;
use crate::export::format_number;
use crate::model::state::SheetState;

/// Plain-text rendering of the derived sheet for the `show` command.
pub fn render_sheet_text(state: &SheetState) -> String {
    let s = &state.settings;
    let mut out = String::new();

    out.push_str("Rater Sheet\n");
    out.push_str("===========\n\n");

    out.push_str(&format!(
        "Raters: {}  Rows: {}  Divisors: behavioral /{}, competency /{}\n",
        s.raters, s.rows_count, s.behavioral_columns, s.competency_columns
    ));
    out.push_str(&format!(
        "Weights: behavioral {} / competency {}\n",
        format_number(s.behavioral_weight),
        format_number(s.competency_weight)
    ));
    if s.bands.is_empty() {
        out.push_str("Bands: (none)\n\n");
    } else {
        let bands: Vec<String> = s
            .bands
            .iter()
            .map(|b| {
                format!(
                    "{}..{} {}",
                    format_number(b.min),
                    format_number(b.max),
                    b.label
                )
            })
            .collect();
        out.push_str(&format!("Bands: {}\n\n", bands.join(" | ")));
    }

    for row in &state.rows {
        let d = derive_row(row, s);
        out.push_str(&format!(
            "{}: behavioral={} competency={} grand={}",
            row.label,
            format_number(d.behavioral_total),
            format_number(d.competency_total),
            format_number(d.grand_total)
        ));
        if !d.overall_label.is_empty() {
            out.push_str(&format!(" [{}]", d.overall_label));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_every_row() {
        let state = SheetState::sample_state();
        let text = render_sheet_text(&state);
        for row in &state.rows {
            assert!(text.contains(&row.label));
        }
        assert!(text.contains("Raters: 6"));
        assert!(text.contains("Meets Expectations"));
    }

    #[test]
    fn test_render_marks_empty_bands() {
        let mut state = SheetState::default_state();
        state.settings.bands.clear();
        let text = render_sheet_text(&state);
        assert!(text.contains("Bands: (none)"));
    }
}
