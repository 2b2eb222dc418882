pub mod frame;
pub mod pipeline;
pub mod simulation;

pub use frame::Frame;
pub use pipeline::{TickReport, run_tick};
pub use simulation::{Phase, SimStatus, Simulation};
