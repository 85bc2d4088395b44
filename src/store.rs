use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::settings::RawSettings;
use crate::model::state::{STATE_VERSION, SheetState};

pub const DEFAULT_STATE_FILE: &str = "rater-sheet.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write state file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk shape of the state file, read leniently: unknown versions are
/// rejected by [`load_state`], missing fields fall back to defaults, and the
/// reconciliation layer repairs whatever is left.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub settings: RawSettings,
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub behavioral_raw_by_rater: Vec<f64>,
    #[serde(default)]
    pub competency_raw_by_rater: Vec<f64>,
}

/// Loads the last saved state, or `None` when there is nothing usable: no
/// file, unparsable JSON, or a version tag other than the one we write.
/// Corruption is never an error here, only a reason to start fresh.
pub fn load_state(path: &Path) -> Option<PersistedState> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("no state file at {}", path.display());
            return None;
        }
        Err(err) => {
            warn!("could not read state file {}: {err}", path.display());
            return None;
        }
    };

    let parsed: PersistedState = match serde_json::from_str(&text) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("discarding unreadable state file {}: {err}", path.display());
            return None;
        }
    };

    // Strict version gate; this match is the dispatch point for future formats.
    if parsed.version != STATE_VERSION {
        warn!(
            "discarding state file {} with unsupported version {}",
            path.display(),
            parsed.version
        );
        return None;
    }

    Some(parsed)
}

pub fn save_state(path: &Path, state: &SheetState) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json)?;
    debug!("saved state to {}", path.display());
    Ok(())
}
