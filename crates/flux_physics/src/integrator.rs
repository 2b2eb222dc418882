//! Position Verlet integration and fixed-step scheduling.

use flux_core::{Particle, ParticleStore};
use glam::Vec2;
use tracing::debug;

/// Fraction of a step treated as rounding noise by `FixedStep`.
const STEP_TOLERANCE: f32 = 1.0e-3;

/// Result of advancing one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrated {
    pub particle: Particle,
    /// The step produced a non-finite position and was discarded
    pub sanitized: bool,
}

/// Advance one particle by `dt`:
/// `x' = 2x - x_prev + (F / m) dt^2`, `x_prev' = x`.
///
/// A non-finite result leaves the particle where it was, at rest.
pub fn integrate(particle: &Particle, force: Vec2, dt: f32) -> Integrated {
    let acceleration = force / particle.mass;
    let next = 2.0 * particle.position - particle.previous + acceleration * dt * dt;
    let mut out = *particle;
    if next.is_finite() {
        out.previous = particle.position;
        out.position = next;
        Integrated {
            particle: out,
            sanitized: false,
        }
    } else {
        out.previous = out.position;
        Integrated {
            particle: out,
            sanitized: true,
        }
    }
}

/// Aggregate outcome of integrating the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegrationReport {
    pub sanitized: usize,
    /// Largest distance any particle moved this step
    pub max_displacement: f32,
}

/// Integrate every live particle using its accumulated `force`.
pub fn integrate_all(store: &mut ParticleStore, dt: f32) -> IntegrationReport {
    let mut report = IntegrationReport::default();
    for p in store.iter_mut() {
        let step = integrate(p, p.force, dt);
        if step.sanitized {
            report.sanitized += 1;
        } else {
            report.max_displacement = report
                .max_displacement
                .max(step.particle.position.distance(p.position));
        }
        *p = step.particle;
    }
    report
}

/// Splits arbitrary elapsed time into fixed-size steps.
///
/// Leftover time below one step carries over to the next call. When more
/// than `max_substeps` steps are owed, the surplus is dropped so a slow host
/// cannot make the simulation fall further and further behind.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStep {
    dt: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(dt: f32, max_substeps: u32) -> Self {
        Self {
            dt,
            max_substeps,
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Unconsumed time carried into the next call. Slightly negative after
    /// a step that was rounded up.
    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    /// Change step size and cap, keeping carried-over time.
    pub fn reconfigure(&mut self, dt: f32, max_substeps: u32) {
        self.dt = dt;
        self.max_substeps = max_substeps;
        self.accumulator = self.accumulator.min(dt * max_substeps as f32);
    }

    /// Add `elapsed` seconds and return how many fixed steps to run now.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        self.accumulator += elapsed;
        // Float drift must not turn an exact multiple of dt into one step fewer.
        // A step taken early leaves a small negative balance that the next
        // call pays back.
        let owed = (self.accumulator / self.dt + STEP_TOLERANCE).floor().max(0.0) as u64;
        let steps = owed.min(self.max_substeps as u64) as u32;
        self.accumulator -= steps as f32 * self.dt;
        if owed > steps as u64 {
            let dropped = self.accumulator;
            self.accumulator = self.accumulator.rem_euclid(self.dt);
            debug!(owed, steps, dropped = dropped - self.accumulator, "sub-step budget exceeded, dropping time");
        }
        steps
    }
}
