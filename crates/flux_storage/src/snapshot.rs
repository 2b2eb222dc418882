use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::record::SimulationRecord;

/// Save a record to disk as bincode, creating parent directories.
pub fn save_snapshot(record: &SimulationRecord, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = bincode::serialize(record)?;
    fs::write(path, &data)?;
    info!(
        path = %path.display(),
        bytes = data.len(),
        particles = record.particles.len(),
        tick = record.tick,
        "saved snapshot"
    );
    Ok(())
}

/// Load a record written by [`save_snapshot`].
///
/// The record is only decoded here; pass it to [`crate::import`] to
/// validate it and rebuild a simulation.
pub fn load_snapshot(path: &Path) -> Result<SimulationRecord> {
    let data = fs::read(path)?;
    let record: SimulationRecord = bincode::deserialize(&data)?;
    info!(
        path = %path.display(),
        particles = record.particles.len(),
        tick = record.tick,
        "loaded snapshot"
    );
    Ok(record)
}

pub fn to_json(record: &SimulationRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(record)?)
}

pub fn from_json(json: &str) -> Result<SimulationRecord> {
    Ok(serde_json::from_str(json)?)
}
