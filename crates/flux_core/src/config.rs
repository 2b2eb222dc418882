use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::constants::*;
use crate::error::{Result, SimError};

/// Air-resistance model applied to every particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragModel {
    /// `F = -k * v`
    #[default]
    Linear,
    /// `F = -k * |v| * v`
    Quadratic,
}

/// Simulation configuration.
///
/// Immutable for the duration of a tick. Swapped as a whole between ticks
/// through `Simulation::set_config`, which validates it first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Uniform gravitational acceleration
    pub gravity: Vec2,
    /// Drag coefficient (>= 0)
    pub air_resistance: f32,
    pub drag_model: DragModel,
    /// Coefficient of restitution in [0, 1]: 0 = fully inelastic, 1 = fully elastic
    #[serde(alias = "collision_damping")]
    pub restitution: f32,
    /// Push overlapping particles apart in addition to the impulse
    pub positional_correction: bool,
    /// Fixed integration step in seconds
    pub time_step: f32,
    /// Most sub-steps a single `step` call may run; surplus time is dropped
    pub max_substeps: u32,
    pub quadtree_max_depth: u32,
    pub quadtree_leaf_capacity: usize,
    /// World boundary
    pub world: Aabb,
    /// Reflect particles off the world boundary
    pub walls: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, STANDARD_GRAVITY),
            air_resistance: 0.01,
            drag_model: DragModel::Linear,
            restitution: 0.8,
            positional_correction: true,
            time_step: DEFAULT_TIME_STEP,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
            quadtree_max_depth: DEFAULT_QUADTREE_MAX_DEPTH,
            quadtree_leaf_capacity: DEFAULT_QUADTREE_LEAF_CAPACITY,
            world: Aabb::default(),
            walls: true,
        }
    }
}

impl SimConfig {
    /// Zero gravity, no drag, fully elastic. Handy for conservation checks.
    pub fn frictionless() -> Self {
        Self {
            gravity: Vec2::ZERO,
            air_resistance: 0.0,
            restitution: 1.0,
            ..Self::default()
        }
    }

    /// Check every field, returning `InvalidConfig` on the first violation.
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(SimError::invalid_config("gravity must be finite"));
        }
        if !self.air_resistance.is_finite() || self.air_resistance < 0.0 {
            return Err(SimError::invalid_config(
                "air_resistance must be finite and >= 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimError::invalid_config("restitution must be in [0, 1]"));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(SimError::invalid_config("time_step must be finite and > 0"));
        }
        if self.max_substeps == 0 {
            return Err(SimError::invalid_config("max_substeps must be >= 1"));
        }
        if self.quadtree_max_depth > MAX_QUADTREE_DEPTH {
            return Err(SimError::invalid_config(format!(
                "quadtree_max_depth must be <= {MAX_QUADTREE_DEPTH}"
            )));
        }
        if self.quadtree_leaf_capacity == 0 {
            return Err(SimError::invalid_config(
                "quadtree_leaf_capacity must be >= 1",
            ));
        }
        if !self.world.has_area() {
            return Err(SimError::invalid_config(
                "world must be finite with min < max on both axes",
            ));
        }
        Ok(())
    }
}

/// Parameters for procedurally generated particle fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub particle_count: u32,
    /// Random seed for deterministic generation
    pub seed: u64,
    pub min_radius: f32,
    pub max_radius: f32,
    pub min_mass: f32,
    pub max_mass: f32,
    /// Initial speeds are drawn from [0, max_speed)
    pub max_speed: f32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            seed: 42,
            min_radius: 0.3,
            max_radius: 0.6,
            min_mass: 0.5,
            max_mass: 2.0,
            max_speed: 5.0,
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_radius >= 0.0 && self.min_radius <= self.max_radius) {
            return Err(SimError::invalid_config(
                "radius range must satisfy 0 <= min_radius <= max_radius",
            ));
        }
        if !(self.min_mass > 0.0 && self.min_mass <= self.max_mass) {
            return Err(SimError::invalid_config(
                "mass range must satisfy 0 < min_mass <= max_mass",
            ));
        }
        if !self.max_speed.is_finite() || self.max_speed < 0.0 {
            return Err(SimError::invalid_config("max_speed must be finite and >= 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
        assert!(SimConfig::frictionless().validate().is_ok());
        assert!(ScenarioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_time_step() {
        let config = SimConfig {
            time_step: 0.0,
            ..SimConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, SimError::InvalidConfig(_)));
        assert!(err.to_string().contains("time_step"));
    }

    #[test]
    fn test_rejects_out_of_range_restitution() {
        for restitution in [-0.1, 1.5, f32::NAN] {
            let config = SimConfig {
                restitution,
                ..SimConfig::default()
            };
            assert!(config.validate().is_err(), "accepted {restitution}");
        }
    }

    #[test]
    fn test_rejects_degenerate_world() {
        let config = SimConfig {
            world: Aabb::new(Vec2::ZERO, Vec2::new(10.0, 0.0)),
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_leaf_capacity_and_deep_trees() {
        let config = SimConfig {
            quadtree_leaf_capacity: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
        let config = SimConfig {
            quadtree_max_depth: MAX_QUADTREE_DEPTH + 1,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
