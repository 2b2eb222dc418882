use flux_core::ParticleStore;
use glam::Vec2;

/// Total linear momentum of the live particles.
pub fn total_momentum(store: &ParticleStore, dt: f32) -> Vec2 {
    store.iter().map(|p| p.velocity(dt) * p.mass).sum()
}

/// Total kinetic energy, accumulated in f64.
pub fn kinetic_energy(store: &ParticleStore, dt: f32) -> f64 {
    store.iter().map(|p| p.kinetic_energy(dt) as f64).sum()
}

/// Mass-weighted center of the live particles, `None` when empty.
pub fn center_of_mass(store: &ParticleStore) -> Option<Vec2> {
    let total: f32 = store.iter().map(|p| p.mass).sum();
    if store.is_empty() || total <= 0.0 {
        return None;
    }
    Some(store.iter().map(|p| p.position * p.mass).sum::<Vec2>() / total)
}

/// Number of overlapping pairs deeper than `tolerance`, by brute force.
/// Meant for tests and debugging, not for the tick.
pub fn count_overlaps(store: &ParticleStore, tolerance: f32) -> usize {
    let particles: Vec<_> = store.iter().filter(|p| p.collides()).collect();
    let mut count = 0;
    for (i, a) in particles.iter().enumerate() {
        for b in &particles[i + 1..] {
            if a.radius + b.radius - a.position.distance(b.position) > tolerance {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use flux_core::{Particle, ParticleId, ParticleSpec};

    fn store(dt: f32) -> ParticleStore {
        let mut store = ParticleStore::new();
        for spec in [
            ParticleSpec::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 0.0), 1.0, 0.5),
            ParticleSpec::new(Vec2::new(0.5, 0.0), Vec2::new(0.0, -1.0), 3.0, 0.5),
        ] {
            store.add(Particle::from_spec(ParticleId(0), &spec, dt).unwrap());
        }
        store
    }

    #[test]
    fn test_momentum_and_energy() {
        let dt = 0.01;
        let s = store(dt);
        assert!((total_momentum(&s, dt) - Vec2::new(2.0, -3.0)).length() < 1e-3);
        // 0.5 * 1 * 4 + 0.5 * 3 * 1
        assert!((kinetic_energy(&s, dt) - 3.5).abs() < 1e-2);
    }

    #[test]
    fn test_center_of_mass_is_weighted() {
        let s = store(0.01);
        let com = center_of_mass(&s).unwrap();
        assert!((com.x - 0.375).abs() < 1e-6);
        assert!(center_of_mass(&ParticleStore::new()).is_none());
    }

    #[test]
    fn test_overlaps_counted() {
        let s = store(0.01);
        assert_eq!(count_overlaps(&s, 0.0), 1);
        assert_eq!(count_overlaps(&s, 0.6), 0);
    }
}
