// Simulation units are arbitrary but consistent: 1 unit of length,
// 1 unit of mass, seconds for time. Defaults target a 100 x 100 world
// with particle radii around 0.5.

/// Default fixed integration step (seconds). Two sub-steps per 60 Hz frame.
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 120.0;

/// Default cap on sub-steps run for a single `step` call.
pub const DEFAULT_MAX_SUBSTEPS: u32 = 8;

/// Standard gravity, pointing down the y axis.
pub const STANDARD_GRAVITY: f32 = -9.81;

/// Default quadtree depth cutoff.
pub const DEFAULT_QUADTREE_MAX_DEPTH: u32 = 8;

/// Default quadtree leaf capacity before a split is attempted.
pub const DEFAULT_QUADTREE_LEAF_CAPACITY: usize = 8;

/// Hard ceiling on the configurable quadtree depth.
pub const MAX_QUADTREE_DEPTH: u32 = 24;

/// Default side length of the square world.
pub const DEFAULT_WORLD_SIZE: f32 = 100.0;

/// Distance at which two surfaces count as touching for the impulse phase.
pub const CONTACT_SLOP: f32 = 1.0e-4;

/// Center distances below this use the fallback normal.
pub const COINCIDENT_EPSILON: f32 = 1.0e-6;

/// Contact normal used when two centers coincide.
pub const FALLBACK_NORMAL: glam::Vec2 = glam::Vec2::X;
