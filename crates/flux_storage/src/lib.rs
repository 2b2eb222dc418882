//! Persistence for simulations: a plain export record, plus bincode
//! snapshot files and JSON around it.

pub mod error;
pub mod record;
pub mod snapshot;

pub use error::{Result, StorageError};
pub use record::{
    FORMAT_VERSION, Imported, ParticleRecord, RejectedEntry, SimulationRecord, export, import,
};
pub use snapshot::{from_json, load_snapshot, save_snapshot, to_json};
