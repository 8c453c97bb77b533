//! Event record loading.
//!
//! Records are read from a JSON array in the backend's shape. Entries are
//! decoded one at a time so a single malformed entry is skipped with a
//! warning instead of dropping the whole file.

use std::fmt;
use std::path::{Path, PathBuf};

use bevy::prelude::*;
use lumen_globe::{EventRecord, GlobeMarkers};

use crate::launch_params::LaunchParams;

/// Sample records used when no file is given (WASM).
const BUNDLED_RECORDS: &str = include_str!("../assets/data/events.json");

/// Plugin that places the initial records and handles reloads.
pub struct RecordsPlugin;

impl Plugin for RecordsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RecordReload>()
            .add_systems(Startup, place_initial_records)
            .add_systems(
                Update,
                reload_records
                    .run_if(|reload: Res<RecordReload>| reload.requested)
                    .before(lumen_globe::GlobeSystems::Input),
            );
    }
}

/// Set `requested` to re-read the record source on the next frame.
#[derive(Resource, Debug, Default)]
pub struct RecordReload {
    pub requested: bool,
}

/// Why a record file could not be read.
#[derive(Debug)]
pub enum RecordsError {
    Io { path: PathBuf, source: std::io::Error },
    Json(serde_json::Error),
}

impl fmt::Display for RecordsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Json(err) => write!(f, "record file is not a JSON array: {err}"),
        }
    }
}

impl std::error::Error for RecordsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
        }
    }
}

/// Decode a JSON array of records, skipping entries that do not decode.
pub fn parse_records(json: &str) -> Result<Vec<EventRecord>, RecordsError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json).map_err(RecordsError::Json)?;
    let total = values.len();
    let records: Vec<EventRecord> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(index, "Skipping malformed event record: {err}");
                None
            }
        })
        .collect();
    tracing::debug!(decoded = records.len(), total, "Decoded event records");
    Ok(records)
}

/// Read and decode a record file.
pub fn load_records(path: &Path) -> Result<Vec<EventRecord>, RecordsError> {
    let json = std::fs::read_to_string(path).map_err(|source| RecordsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&json)
}

fn read_source(params: &LaunchParams) -> Result<Vec<EventRecord>, RecordsError> {
    match &params.records {
        Some(path) => load_records(path),
        None => parse_records(BUNDLED_RECORDS),
    }
}

fn place(markers: &mut GlobeMarkers, params: &LaunchParams) {
    match read_source(params) {
        Ok(records) => {
            let total = records.len();
            let placed = markers.replace_event_markers(records);
            tracing::info!(placed, total, "Placed event markers");
        }
        Err(err) => tracing::error!("Could not load event records: {err}"),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn place_initial_records(mut markers: GlobeMarkers, params: Res<LaunchParams>) {
    place(&mut markers, &params);
}

#[allow(clippy::needless_pass_by_value)]
fn reload_records(
    mut markers: GlobeMarkers,
    params: Res<LaunchParams>,
    mut reload: ResMut<RecordReload>,
) {
    reload.requested = false;
    place(&mut markers, &params);
}
