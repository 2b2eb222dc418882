use flux_core::{DragModel, Particle, ParticleStore, SimConfig};
use glam::Vec2;

/// Per-particle body forces. Pairwise contact is not a force here: it is
/// resolved as impulses by the collision module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceKind {
    Gravity,
    Drag,
}

/// Forces applied to every particle each tick, in order.
pub const BODY_FORCES: [ForceKind; 2] = [ForceKind::Gravity, ForceKind::Drag];

impl ForceKind {
    pub fn force_on(self, particle: &Particle, velocity: Vec2, config: &SimConfig) -> Vec2 {
        match self {
            Self::Gravity => config.gravity * particle.mass,
            Self::Drag => drag_force(
                velocity,
                config.air_resistance,
                config.drag_model,
                particle.mass,
                config.time_step,
            ),
        }
    }
}

/// Air resistance opposing `velocity`, as the constant force that removes
/// the right share of velocity over one step of `dt`.
///
/// Linear drag uses the exact decay `v exp(-k dt / m)`. Quadratic drag
/// `-k |v| v` is capped so a single step can at most bring the particle to
/// rest. Either way drag never reverses or amplifies velocity, whatever the
/// coefficient.
pub fn drag_force(velocity: Vec2, coefficient: f32, model: DragModel, mass: f32, dt: f32) -> Vec2 {
    let loss = match model {
        DragModel::Linear => -(-coefficient * dt / mass).exp_m1(),
        DragModel::Quadratic => (coefficient * velocity.length() * dt / mass).min(1.0),
    };
    -velocity * (loss * mass / dt)
}

/// Net body force on one particle.
pub fn net_force(particle: &Particle, config: &SimConfig) -> Vec2 {
    let velocity = particle.velocity(config.time_step);
    BODY_FORCES
        .iter()
        .map(|kind| kind.force_on(particle, velocity, config))
        .sum()
}

/// Reset and recompute `force` on every live particle.
///
/// Non-finite results are replaced by zero; returns how many were.
pub fn accumulate(store: &mut ParticleStore, config: &SimConfig) -> usize {
    let mut sanitized = 0;
    for p in store.iter_mut() {
        let force = net_force(p, config);
        p.force = if force.is_finite() {
            force
        } else {
            sanitized += 1;
            Vec2::ZERO
        };
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::{ParticleId, ParticleSpec};

    fn particle(velocity: Vec2, mass: f32, dt: f32) -> Particle {
        let spec = ParticleSpec::new(Vec2::new(5.0, 5.0), velocity, mass, 0.5);
        Particle::from_spec(ParticleId(0), &spec, dt).unwrap()
    }

    #[test]
    fn test_gravity_scales_with_mass() {
        let config = SimConfig {
            air_resistance: 0.0,
            ..SimConfig::default()
        };
        let f = net_force(&particle(Vec2::ZERO, 3.0, config.time_step), &config);
        assert!((f - config.gravity * 3.0).length() < 1e-5);
    }

    #[test]
    fn test_linear_drag_opposes_velocity() {
        // Small k dt / m: close to the plain -k v force.
        let f = drag_force(Vec2::new(2.0, 0.0), 0.5, DragModel::Linear, 1.0, 0.001);
        assert!((f - Vec2::new(-1.0, 0.0)).length() < 1e-3, "f = {f}");
    }

    #[test]
    fn test_quadratic_drag_grows_with_speed_squared() {
        let slow = drag_force(Vec2::new(1.0, 0.0), 0.5, DragModel::Quadratic, 1.0, 0.001);
        let fast = drag_force(Vec2::new(2.0, 0.0), 0.5, DragModel::Quadratic, 1.0, 0.001);
        assert!((fast.x / slow.x - 4.0).abs() < 1e-3);
        assert!(fast.x < 0.0);
    }

    #[test]
    fn test_drag_removes_at_most_all_velocity() {
        let v = Vec2::new(3.0, -4.0);
        let (mass, dt) = (0.5, 1.0 / 120.0);
        for model in [DragModel::Linear, DragModel::Quadratic] {
            let f = drag_force(v, 500.0, model, mass, dt);
            let after = v + f / mass * dt;
            assert!(after.length() <= v.length(), "{model:?}: {after}");
            assert!(after.dot(v) >= -1e-4, "{model:?} reversed: {after}");
        }
    }

    #[test]
    fn test_strong_drag_never_adds_energy() {
        // k dt / m is far above 2, where an explicit -k v force diverges.
        for model in [DragModel::Linear, DragModel::Quadratic] {
            let config = SimConfig {
                air_resistance: 500.0,
                drag_model: model,
                ..SimConfig::frictionless()
            };
            let dt = config.time_step;
            let mut store = ParticleStore::new();
            store.add(particle(Vec2::new(1.0, 0.0), 0.5, dt));
            store.add(particle(Vec2::new(-30.0, 12.0), 2.0, dt));

            let mut energy = crate::diagnostics::kinetic_energy(&store, dt);
            for _ in 0..50 {
                assert_eq!(accumulate(&mut store, &config), 0);
                crate::integrator::integrate_all(&mut store, dt);
                let next = crate::diagnostics::kinetic_energy(&store, dt);
                assert!(next <= energy + 1e-6, "{model:?}: {energy} -> {next}");
                energy = next;
            }
            assert!(energy < 1e-3, "{model:?}: drag left {energy}");
        }
    }

    #[test]
    fn test_accumulate_sanitizes_non_finite() {
        let config = SimConfig::frictionless();
        let mut store = ParticleStore::new();
        let mut p = particle(Vec2::ZERO, 1.0, config.time_step);
        p.previous = Vec2::new(f32::NAN, 0.0);
        store.add(p);
        store.add(particle(Vec2::ZERO, 1.0, config.time_step));
        let config = SimConfig {
            air_resistance: 1.0,
            ..config
        };
        assert_eq!(accumulate(&mut store, &config), 1);
        assert!(store.iter().all(|p| p.force.is_finite()));
    }
}
