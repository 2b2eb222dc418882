use flux_core::{Aabb, ParticleSpec, Result, ScenarioConfig};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Placement attempts per particle before accepting an overlap.
const MAX_PLACEMENT_ATTEMPTS: usize = 64;

/// Scatter `scenario.particle_count` particles inside `world`.
///
/// Positions avoid overlapping earlier particles where possible; a particle
/// that cannot be placed cleanly after a bounded number of attempts is
/// placed anyway and the resolver separates it on the first tick.
/// Identical seeds yield identical fields.
pub fn scatter(scenario: &ScenarioConfig, world: &Aabb) -> Result<Vec<ParticleSpec>> {
    scenario.validate()?;
    let mut rng = ChaCha8Rng::seed_from_u64(scenario.seed);
    let n = scenario.particle_count as usize;
    let mut specs: Vec<ParticleSpec> = Vec::with_capacity(n);
    let mut forced = 0usize;

    for _ in 0..n {
        let radius = sample(&mut rng, scenario.min_radius, scenario.max_radius);
        let mass = sample(&mut rng, scenario.min_mass, scenario.max_mass);
        let inset = Vec2::splat(radius).min(world.size() * 0.5);
        let (lo, hi) = (world.min + inset, world.max - inset);

        let mut position = Vec2::ZERO;
        let mut placed = false;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            position = Vec2::new(sample(&mut rng, lo.x, hi.x), sample(&mut rng, lo.y, hi.y));
            if !specs
                .iter()
                .any(|s| s.position.distance(position) < s.radius + radius)
            {
                placed = true;
                break;
            }
        }
        if !placed {
            forced += 1;
        }

        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let speed = sample(&mut rng, 0.0, scenario.max_speed);
        let velocity = Vec2::from_angle(angle) * speed;
        specs.push(ParticleSpec::new(position, velocity, mass, radius));
    }

    if forced > 0 {
        warn!(forced, total = n, "world too crowded, some particles start overlapping");
    }
    debug!(count = n, seed = scenario.seed, "scattered particles");
    Ok(specs)
}

/// A `cols` x `rows` grid of resting particles starting at `origin`.
pub fn lattice(origin: Vec2, cols: u32, rows: u32, spacing: f32, mass: f32, radius: f32) -> Vec<ParticleSpec> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (col, row)))
        .map(|(col, row)| {
            let position = origin + Vec2::new(col as f32, row as f32) * spacing;
            ParticleSpec::at_rest(position, mass, radius)
        })
        .collect()
}

/// Uniform sample in `[lo, hi)`, or `lo` for an empty range.
fn sample(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.gen_range(lo..hi) } else { lo }
}
