pub mod bounds;
pub mod config;
pub mod constants;
pub mod error;
pub mod store;
pub mod types;

pub use bounds::Aabb;
pub use config::{DragModel, ScenarioConfig, SimConfig};
pub use constants::*;
pub use error::{Result, SimError};
pub use store::ParticleStore;
pub use types::*;
