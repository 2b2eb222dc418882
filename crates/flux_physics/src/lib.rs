//! Physics for the flux particle simulator: spatial index, body forces,
//! collision resolution, Verlet integration and scenario generation.

pub mod collision;
pub mod diagnostics;
pub mod forces;
pub mod integrator;
pub mod procgen;
pub mod quadtree;

pub use collision::{ResolveReport, contain, resolve, settle};
pub use integrator::{FixedStep, IntegrationReport, integrate, integrate_all};
pub use quadtree::{QuadTree, TreeStats};
