mod engine;
mod export;
mod model;
mod report;
mod store;
mod telemetry;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::{error, info};

use crate::engine::reconcile;
use crate::model::row::Section;
use crate::model::settings::{Band, RawSettings};
use crate::model::state::SheetState;

#[derive(Debug, Parser)]
#[command(
    name = "rater-sheet",
    version,
    about = "Weighted multi-rater scoring sheets with CSV and workbook export"
)]
struct Cli {
    /// Path of the sheet state file.
    #[arg(long, global = true, default_value = store::DEFAULT_STATE_FILE)]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a summary of the derived sheet.
    Show,
    /// Replace the sheet with the bundled sample data.
    Sample,
    /// Reset the sheet to the default configuration.
    Reset,
    /// Zero out one row's scores, keeping its label.
    ResetRow {
        /// Row position, 1-based.
        #[arg(long)]
        row: usize,
    },
    /// Set a single raw score cell.
    SetCell {
        /// Row position, 1-based.
        #[arg(long)]
        row: usize,
        #[arg(long, value_enum)]
        section: SectionArg,
        /// Rater position, 1-based.
        #[arg(long)]
        rater: usize,
        #[arg(long)]
        value: f64,
    },
    /// Rename a row.
    SetLabel {
        /// Row position, 1-based.
        #[arg(long)]
        row: usize,
        #[arg(long)]
        label: String,
    },
    /// Change sheet-wide settings; omitted options keep their current value.
    Config {
        #[arg(long)]
        raters: Option<f64>,
        #[arg(long)]
        rows: Option<f64>,
        #[arg(long)]
        behavioral_columns: Option<f64>,
        #[arg(long)]
        competency_columns: Option<f64>,
        #[arg(long)]
        behavioral_weight: Option<f64>,
        #[arg(long)]
        competency_weight: Option<f64>,
    },
    /// Replace the score bands. Repeatable; order decides overlaps.
    SetBands {
        /// Band as "min:max:label".
        #[arg(long = "band", required = true)]
        bands: Vec<String>,
    },
    /// Export the derived sheet as CSV.
    ExportCsv {
        #[arg(long)]
        out: PathBuf,
    },
    /// Export the derived sheet as a recalculable XLSX workbook.
    ExportXlsx {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SectionArg {
    Behavioral,
    Competency,
}

impl From<SectionArg> for Section {
    fn from(value: SectionArg) -> Self {
        match value {
            SectionArg::Behavioral => Section::Behavioral,
            SectionArg::Competency => Section::Competency,
        }
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Store(#[from] store::StoreError),
    #[error(transparent)]
    Export(#[from] export::ExportError),
    #[error("row {0} is out of range (sheet has {1} rows)")]
    RowOutOfRange(usize, usize),
    #[error("invalid band '{0}': expected min:max:label")]
    InvalidBand(String),
}

fn main() {
    telemetry::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let state = reconcile::normalize_loaded(store::load_state(&cli.state));

    match cli.command {
        Command::Show => {
            print!("{}", report::render_sheet_text(&state));
            Ok(())
        }
        Command::Sample => persist(&cli.state, &SheetState::sample_state()),
        Command::Reset => persist(&cli.state, &SheetState::default_state()),
        Command::ResetRow { row } => {
            let id = row_id_at(&state, row)?;
            persist(&cli.state, &reconcile::reset_row(&state, &id))
        }
        Command::SetCell {
            row,
            section,
            rater,
            value,
        } => {
            let id = row_id_at(&state, row)?;
            let next = reconcile::set_raw_cell(
                &state,
                &id,
                section.into(),
                rater.saturating_sub(1),
                value,
            );
            persist(&cli.state, &next)
        }
        Command::SetLabel { row, label } => {
            let id = row_id_at(&state, row)?;
            persist(&cli.state, &reconcile::set_row_label(&state, &id, &label))
        }
        Command::Config {
            raters,
            rows,
            behavioral_columns,
            competency_columns,
            behavioral_weight,
            competency_weight,
        } => {
            let mut raw = RawSettings::from(&state.settings);
            if let Some(v) = raters {
                raw.raters = v;
            }
            if let Some(v) = rows {
                raw.rows_count = v;
            }
            if let Some(v) = behavioral_columns {
                raw.behavioral_columns = v;
            }
            if let Some(v) = competency_columns {
                raw.competency_columns = v;
            }
            if let Some(v) = behavioral_weight {
                raw.behavioral_weight = v;
            }
            if let Some(v) = competency_weight {
                raw.competency_weight = v;
            }
            persist(&cli.state, &reconcile::apply_settings(&state, &raw))
        }
        Command::SetBands { bands } => {
            let mut raw = RawSettings::from(&state.settings);
            raw.bands = bands
                .iter()
                .map(|text| parse_band(text))
                .collect::<Result<Vec<_>, _>>()?;
            persist(&cli.state, &reconcile::apply_settings(&state, &raw))
        }
        Command::ExportCsv { out } => {
            export::csv::write_csv(&state.settings, &state.rows, &out)?;
            info!("wrote {}", out.display());
            Ok(())
        }
        Command::ExportXlsx { out } => {
            export::xlsx::write_workbook(&state.settings, &state.rows, &out)?;
            info!("wrote {}", out.display());
            Ok(())
        }
    }
}

fn persist(path: &Path, state: &SheetState) -> Result<(), AppError> {
    store::save_state(path, state)?;
    Ok(())
}

fn row_id_at(state: &SheetState, position: usize) -> Result<String, AppError> {
    state
        .rows
        .get(position.saturating_sub(1))
        .map(|r| r.id.clone())
        .ok_or(AppError::RowOutOfRange(position, state.rows.len()))
}

/// Parses "min:max:label". The label may contain further colons.
fn parse_band(text: &str) -> Result<Band, AppError> {
    let mut parts = text.splitn(3, ':');
    let (Some(min), Some(max), Some(label)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AppError::InvalidBand(text.to_string()));
    };
    let min: f64 = min
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidBand(text.to_string()))?;
    let max: f64 = max
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidBand(text.to_string()))?;
    Ok(Band {
        min,
        max,
        label: label.to_string(),
    })
}
