use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Formula, Workbook, Worksheet};

use crate::engine::derive::derive_row;
use crate::export::{ExportError, format_number};
use crate::model::row::RatingRow;
use crate::model::settings::{Settings, normalize_weights};

// Template-like offset: the Behavioral group begins at column D.
const START_COL: u16 = 4;
const FIRST_DATA_ROW: u32 = 3;

const BLUE_PAIR: Color = Color::RGB(0xE3F4FD);
const BLUE_TOTAL: Color = Color::RGB(0xAEDCF5);
const GREEN_PAIR: Color = Color::RGB(0xE2F8F0);
const GREEN_TOTAL: Color = Color::RGB(0xA9E8D2);
const AMBER: Color = Color::RGB(0xFCEBB0);
const NEUTRAL: Color = Color::RGB(0xF2F2F2);

/// Writes the sheet as a styled workbook that stays recalculable: raw cells
/// are literal numbers, while equivalent-rate, category-total, and
/// grand-total cells are formulas referencing the raw cells and two absolute
/// divisor cells in a "Column Settings" block below the grid. Only the
/// overall score column is baked in as a literal label.
pub fn write_workbook(
    settings: &Settings,
    rows: &[RatingRow],
    path: &Path,
) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;
    build_sheet(sheet, settings, rows)?;
    workbook.save(path)?;
    Ok(())
}

struct GridLayout {
    raters: u16,
    behavioral_start: u16,
    behavioral_total_col: u16,
    competency_start: u16,
    competency_total_col: u16,
    grand_total_col: u16,
    overall_col: u16,
    block_start_row: u32,
    behavioral_div_row: u32,
    competency_div_row: u32,
}

impl GridLayout {
    // All coordinates are 1-based, matching A1 formula notation; they are
    // shifted when handed to the writer.
    fn new(settings: &Settings, rows_count: usize) -> Self {
        let raters = settings.raters.max(1) as u16;
        let behavioral_start = START_COL;
        let behavioral_total_col = behavioral_start + raters * 2;
        let competency_start = behavioral_total_col + 1;
        let competency_total_col = competency_start + raters * 2;
        let grand_total_col = competency_total_col + 1;
        let overall_col = grand_total_col + 1;

        // The settings block sits at row 21 unless the data grid would run
        // into it.
        let block_start_row = if rows_count <= 15 {
            21
        } else {
            FIRST_DATA_ROW + rows_count as u32 + 3
        };

        Self {
            raters,
            behavioral_start,
            behavioral_total_col,
            competency_start,
            competency_total_col,
            grand_total_col,
            overall_col,
            block_start_row,
            behavioral_div_row: block_start_row + 3,
            competency_div_row: block_start_row + 4,
        }
    }
}

fn build_sheet(
    sheet: &mut Worksheet,
    settings: &Settings,
    rows: &[RatingRow],
) -> Result<(), ExportError> {
    let layout = GridLayout::new(settings, rows.len());
    let (bw, cw) = normalize_weights(settings.behavioral_weight, settings.competency_weight);
    let b_div_abs = format!("$F${}", layout.behavioral_div_row);
    let c_div_abs = format!("$F${}", layout.competency_div_row);

    let group_behavioral = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_background_color(BLUE_TOTAL)
        .set_border(FormatBorder::Thin);
    let group_competency = group_behavioral.clone().set_background_color(GREEN_TOTAL);

    let header_base = Format::new()
        .set_bold()
        .set_font_size(10)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);
    let header_b = header_base.clone().set_background_color(BLUE_PAIR);
    let header_b_total = header_base.clone().set_background_color(BLUE_TOTAL);
    let header_c = header_base.clone().set_background_color(GREEN_PAIR);
    let header_c_total = header_base.clone().set_background_color(GREEN_TOTAL);
    let header_grand = header_base.clone().set_background_color(AMBER);
    let header_overall = header_base.clone().set_background_color(NEUTRAL);

    let raw_fmt = Format::new()
        .set_num_format("0.0")
        .set_align(FormatAlign::Right)
        .set_border(FormatBorder::Thin);
    let derived_fmt = Format::new()
        .set_num_format("0.000000")
        .set_align(FormatAlign::Right)
        .set_border(FormatBorder::Thin);
    let label_fmt = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let block_title_fmt = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_background_color(NEUTRAL)
        .set_border(FormatBorder::Thin);
    let block_label_fmt = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    for col in 0..3u16 {
        sheet.set_column_width(col, 3)?;
    }
    for col in layout.behavioral_start..=layout.overall_col {
        sheet.set_column_width(col - 1, 13)?;
    }
    sheet.set_column_width(layout.overall_col - 1, 52)?;
    sheet.set_freeze_panes(2, 0)?;

    // Row 1: merged group bands.
    sheet.merge_range(
        0,
        layout.behavioral_start - 1,
        0,
        layout.behavioral_total_col - 1,
        "Behavioral",
        &group_behavioral,
    )?;
    sheet.merge_range(
        0,
        layout.competency_start - 1,
        0,
        layout.competency_total_col - 1,
        "Competency",
        &group_competency,
    )?;

    // Row 2: per-column headers.
    let eq_b_text = format!("Eq. Rate ({})", pct_label(bw));
    let eq_c_text = format!("Eq. Rate ({})", pct_label(cw));
    for i in 0..layout.raters {
        let raw_col = layout.behavioral_start + i * 2;
        sheet.write_string_with_format(1, raw_col - 1, format!("Rater {}", i + 1), &header_b)?;
        sheet.write_string_with_format(1, raw_col, eq_b_text.as_str(), &header_b)?;
    }
    sheet.write_string_with_format(1, layout.behavioral_total_col - 1, "TOTAL", &header_b_total)?;
    for i in 0..layout.raters {
        let raw_col = layout.competency_start + i * 2;
        sheet.write_string_with_format(1, raw_col - 1, format!("Rater {}", i + 1), &header_c)?;
        sheet.write_string_with_format(1, raw_col, eq_c_text.as_str(), &header_c)?;
    }
    sheet.write_string_with_format(1, layout.competency_total_col - 1, "TOTAL", &header_c_total)?;
    sheet.write_string_with_format(
        1,
        layout.grand_total_col - 1,
        "GRAND TOTAL (Behavioral + Competency)",
        &header_grand,
    )?;
    sheet.write_string_with_format(
        1,
        layout.overall_col - 1,
        "OVER-ALL SCORE (PERSONAL CHARACTERISTICS AND PERSONALITY TRAITS) Please refer to table",
        &header_overall,
    )?;

    // Data rows: literal raws, formulas for everything derived.
    let bw_text = format_number(bw);
    let cw_text = format_number(cw);
    for (r_idx, row) in rows.iter().enumerate() {
        let excel_row = FIRST_DATA_ROW + r_idx as u32;
        let d = derive_row(row, settings);

        let mut eq_addrs = Vec::with_capacity(layout.raters as usize);
        for i in 0..layout.raters {
            let raw_col = layout.behavioral_start + i * 2;
            let eq_col = raw_col + 1;
            let raw = value_at(&row.behavioral_raw_by_rater, i as usize);
            sheet.write_number_with_format(excel_row - 1, raw_col - 1, raw, &raw_fmt)?;
            let formula = Formula::new(format!(
                "SUM({}/{})*{}",
                addr(excel_row, raw_col),
                b_div_abs,
                bw_text
            ))
            .set_result(format_number(value_at(&d.eq_behavioral_by_rater, i as usize)));
            sheet.write_formula_with_format(excel_row - 1, eq_col - 1, formula, &derived_fmt)?;
            eq_addrs.push(addr(excel_row, eq_col));
        }
        let behavioral_total = Formula::new(format!(
            "SUM({})/{}",
            eq_addrs.join("+"),
            layout.raters
        ))
        .set_result(format_number(d.behavioral_total));
        sheet.write_formula_with_format(
            excel_row - 1,
            layout.behavioral_total_col - 1,
            behavioral_total,
            &derived_fmt,
        )?;

        eq_addrs.clear();
        for i in 0..layout.raters {
            let raw_col = layout.competency_start + i * 2;
            let eq_col = raw_col + 1;
            let raw = value_at(&row.competency_raw_by_rater, i as usize);
            sheet.write_number_with_format(excel_row - 1, raw_col - 1, raw, &raw_fmt)?;
            let formula = Formula::new(format!(
                "SUM({}/{})*{}",
                addr(excel_row, raw_col),
                c_div_abs,
                cw_text
            ))
            .set_result(format_number(value_at(&d.eq_competency_by_rater, i as usize)));
            sheet.write_formula_with_format(excel_row - 1, eq_col - 1, formula, &derived_fmt)?;
            eq_addrs.push(addr(excel_row, eq_col));
        }
        let competency_total = Formula::new(format!(
            "SUM({})/{}",
            eq_addrs.join("+"),
            layout.raters
        ))
        .set_result(format_number(d.competency_total));
        sheet.write_formula_with_format(
            excel_row - 1,
            layout.competency_total_col - 1,
            competency_total,
            &derived_fmt,
        )?;

        let grand = Formula::new(format!(
            "SUM({}+{})",
            addr(excel_row, layout.competency_total_col),
            addr(excel_row, layout.behavioral_total_col)
        ))
        .set_result(format_number(d.grand_total));
        sheet.write_formula_with_format(
            excel_row - 1,
            layout.grand_total_col - 1,
            grand,
            &derived_fmt,
        )?;

        // Band logic cannot be recomputed by the spreadsheet; write the label.
        sheet.write_string_with_format(
            excel_row - 1,
            layout.overall_col - 1,
            d.overall_label.as_str(),
            &label_fmt,
        )?;
    }

    // Column Settings block with the two absolute divisor cells at F.
    let bsr = layout.block_start_row;
    sheet.merge_range(bsr - 1, 3, bsr, 6, "Column Settings", &block_title_fmt)?;
    sheet.merge_range(bsr + 1, 5, bsr + 1, 6, "Number of Columns", &block_title_fmt)?;
    sheet.merge_range(
        bsr + 2,
        3,
        bsr + 2,
        4,
        &format!("Behavioral ({})", pct_label(bw)),
        &block_label_fmt,
    )?;
    sheet.write_number_with_format(
        bsr + 2,
        5,
        f64::from(settings.behavioral_columns),
        &raw_fmt,
    )?;
    sheet.merge_range(
        bsr + 3,
        3,
        bsr + 3,
        4,
        &format!("Competency ({})", pct_label(cw)),
        &block_label_fmt,
    )?;
    sheet.write_number_with_format(
        bsr + 3,
        5,
        f64::from(settings.competency_columns),
        &raw_fmt,
    )?;

    Ok(())
}

fn value_at(values: &[f64], index: usize) -> f64 {
    values.get(index).copied().unwrap_or(0.0)
}

fn pct_label(weight: f64) -> String {
    format!("{}%", (weight * 100.0).round() as i64)
}

fn col_letter(col: u16) -> String {
    let mut n = u32::from(col);
    let mut out = String::new();
    while n > 0 {
        let r = (n - 1) % 26;
        out.insert(0, char::from(b'A' + r as u8));
        n = (n - 1) / 26;
    }
    out
}

fn addr(row: u32, col: u16) -> String {
    format!("{}{row}", col_letter(col))
}
