use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SimError};

/// Stable particle identifier: the particle's slot in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticleId(pub u32);

impl ParticleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Caller-facing description of a particle to add.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSpec {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Must be finite and > 0
    pub mass: f32,
    /// Must be finite and >= 0; zero-radius particles never collide
    pub radius: f32,
}

impl ParticleSpec {
    pub fn new(position: Vec2, velocity: Vec2, mass: f32, radius: f32) -> Self {
        Self {
            position,
            velocity,
            mass,
            radius,
        }
    }

    /// A particle at rest.
    pub fn at_rest(position: Vec2, mass: f32, radius: f32) -> Self {
        Self::new(position, Vec2::ZERO, mass, radius)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(SimError::invalid_config("mass must be finite and > 0"));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(SimError::invalid_config("radius must be finite and >= 0"));
        }
        if !self.position.is_finite() {
            return Err(SimError::invalid_config("position must be finite"));
        }
        if !self.velocity.is_finite() {
            return Err(SimError::invalid_config("velocity must be finite"));
        }
        Ok(())
    }
}

/// Particle state advanced by position Verlet.
///
/// Velocity is implicit: `(position - previous) / dt`. Anything that needs
/// to change a velocity does so by moving `previous`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub id: ParticleId,
    pub position: Vec2,
    /// Position at the start of the previous step
    pub previous: Vec2,
    /// Net force accumulated for the current step, reset every tick
    pub force: Vec2,
    pub mass: f32,
    pub radius: f32,
}

impl Particle {
    /// Build a particle from a validated spec, seeding `previous` so the
    /// implied velocity at step `dt` equals `spec.velocity`.
    pub fn from_spec(id: ParticleId, spec: &ParticleSpec, dt: f32) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            id,
            position: spec.position,
            previous: spec.position - spec.velocity * dt,
            force: Vec2::ZERO,
            mass: spec.mass,
            radius: spec.radius,
        })
    }

    #[inline]
    pub fn velocity(&self, dt: f32) -> Vec2 {
        (self.position - self.previous) / dt
    }

    #[inline]
    pub fn set_velocity(&mut self, velocity: Vec2, dt: f32) {
        self.previous = self.position - velocity * dt;
    }

    /// Move the particle without changing its implied velocity.
    #[inline]
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
        self.previous += delta;
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }

    /// Whether the particle takes part in collision resolution.
    #[inline]
    pub fn collides(&self) -> bool {
        self.radius > 0.0
    }

    pub fn kinetic_energy(&self, dt: f32) -> f32 {
        0.5 * self.mass * self.velocity(dt).length_squared()
    }

    /// Round-trip back to a spec at step `dt`.
    pub fn to_spec(&self, dt: f32) -> ParticleSpec {
        ParticleSpec::new(self.position, self.velocity(dt), self.mass, self.radius)
    }
}

/// Render-facing particle representation.
/// `repr(C)` and `Pod` so the external renderer can upload a frame as-is.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub position: [f32; 2],
    pub radius: f32,
    pub id: u32,
}

impl From<&Particle> for RenderInstance {
    fn from(p: &Particle) -> Self {
        Self {
            position: p.position.to_array(),
            radius: p.radius,
            id: p.id.0,
        }
    }
}
