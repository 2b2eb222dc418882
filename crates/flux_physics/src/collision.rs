//! Collision resolution: broad phase over the quadtree, impulse response
//! with optional positional correction, and world-boundary reflection.

use flux_core::{
    CONTACT_SLOP, COINCIDENT_EPSILON, FALLBACK_NORMAL, Particle, ParticleId, ParticleStore,
    SimConfig,
};
use glam::Vec2;
use tracing::trace;

use crate::forces;
use crate::quadtree::QuadTree;

/// Candidate pair, lower id first.
pub type Pair = (ParticleId, ParticleId);

/// Outcome of one resolved contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the first particle to the second
    pub normal: Vec2,
    /// Overlap depth before correction, zero when merely touching
    pub penetration: f32,
    /// Magnitude of the applied impulse, zero when separating
    pub impulse: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub candidates: usize,
    pub contacts: usize,
    pub impulses: usize,
    /// Non-finite forces replaced by zero
    pub sanitized: usize,
}

#[derive(Debug, Clone, Copy)]
struct Query {
    id: ParticleId,
    position: Vec2,
    radius: f32,
}

fn queries(store: &ParticleStore) -> Vec<Query> {
    store
        .iter()
        .filter(|p| p.collides())
        .map(|p| Query {
            id: p.id,
            position: p.position,
            radius: p.radius,
        })
        .collect()
}

/// Candidate pairs whose circles, grown by `margin`, may touch.
///
/// Each unordered pair appears once, lower id first, in id order. Zero-radius
/// particles never appear. The tree is only read, so with the `parallel`
/// feature the per-particle queries run on the rayon pool.
pub fn broad_phase(store: &ParticleStore, tree: &QuadTree, margin: f32) -> Vec<Pair> {
    let queries = queries(store);
    let neighbors = |query: &Query| {
        let mut out = Vec::new();
        tree.for_each_in_radius(query.position, query.radius + margin, |e| {
            if e.id > query.id && e.radius > 0.0 {
                out.push((query.id, e.id));
            }
        });
        out.sort_unstable();
        out
    };
    gather(&queries, neighbors)
}

#[cfg(feature = "parallel")]
fn gather(queries: &[Query], neighbors: impl Fn(&Query) -> Vec<Pair> + Sync) -> Vec<Pair> {
    use rayon::prelude::*;
    queries.par_iter().flat_map_iter(|p| neighbors(p)).collect()
}

#[cfg(not(feature = "parallel"))]
fn gather(queries: &[Query], neighbors: impl Fn(&Query) -> Vec<Pair>) -> Vec<Pair> {
    queries.iter().flat_map(|p| neighbors(p)).collect()
}

fn contact_normal(delta: Vec2, distance: f32) -> Vec2 {
    if distance > COINCIDENT_EPSILON {
        delta / distance
    } else {
        FALLBACK_NORMAL
    }
}

/// Narrow phase and response for one pair.
///
/// Approaching particles exchange an impulse along the contact normal,
/// `j = -(1 + e) (v_rel . n) / (1/m_a + 1/m_b)`, which conserves momentum.
/// With positional correction enabled the overlap is removed, split by
/// inverse mass, without touching velocities.
pub fn resolve_contact(a: &mut Particle, b: &mut Particle, config: &SimConfig) -> Option<Contact> {
    if !a.collides() || !b.collides() {
        return None;
    }
    let delta = b.position - a.position;
    let distance = delta.length();
    let reach = a.radius + b.radius;
    if distance >= reach + CONTACT_SLOP {
        return None;
    }

    let normal = contact_normal(delta, distance);
    let (wa, wb) = (a.inverse_mass(), b.inverse_mass());
    let w = wa + wb;
    let dt = config.time_step;

    let (va, vb) = (a.velocity(dt), b.velocity(dt));
    let approach = (vb - va).dot(normal);
    let mut impulse = 0.0;
    if approach < 0.0 {
        impulse = -(1.0 + config.restitution) * approach / w;
        a.set_velocity(va - normal * (impulse * wa), dt);
        b.set_velocity(vb + normal * (impulse * wb), dt);
    }

    let penetration = (reach - distance).max(0.0);
    if config.positional_correction && penetration > 0.0 {
        separate(a, b, normal, penetration);
    }

    Some(Contact {
        normal,
        penetration,
        impulse,
    })
}

fn separate(a: &mut Particle, b: &mut Particle, normal: Vec2, penetration: f32) {
    let (wa, wb) = (a.inverse_mass(), b.inverse_mass());
    let push = normal * (penetration / (wa + wb));
    a.translate(-push * wa);
    b.translate(push * wb);
}

/// Keep a particle inside the world, reflecting the velocity component
/// along each violated axis scaled by restitution. Returns whether a wall
/// was hit.
///
/// The particle is placed exactly on the boundary and `previous` moves with
/// it, so only the reflection changes its velocity. An outward speed below
/// two steps of gravity is resting contact: that component is zeroed rather
/// than bounced, so a particle lying on the floor comes to rest.
pub fn resolve_walls(particle: &mut Particle, config: &SimConfig) -> bool {
    if !config.walls {
        return false;
    }
    let dt = config.time_step;
    let world = config.world;
    let inset = Vec2::splat(particle.radius);
    // A particle wider than the world is pinned to its center line.
    let lo = (world.min + inset).min(world.center());
    let hi = (world.max - inset).max(world.center());
    let rest_speed = 2.0 * config.gravity.length() * dt;

    let mut velocity = particle.velocity(dt);
    let mut hit = false;
    for axis in 0..2 {
        let pos = particle.position[axis];
        let (target, outward) = if pos < lo[axis] {
            (lo[axis], -1.0)
        } else if pos > hi[axis] {
            (hi[axis], 1.0)
        } else {
            continue;
        };
        particle.previous[axis] += target - pos;
        particle.position[axis] = target;
        let speed = velocity[axis] * outward;
        if speed > 0.0 {
            velocity[axis] = if speed < rest_speed {
                0.0
            } else {
                -velocity[axis] * config.restitution
            };
        }
        hit = true;
    }
    if hit {
        particle.set_velocity(velocity, dt);
    }
    hit
}

/// Apply [`resolve_walls`] to every live particle; returns the hit count.
///
/// Runs after integration so every published position lies inside the
/// world.
pub fn contain(store: &mut ParticleStore, config: &SimConfig) -> usize {
    store
        .iter_mut()
        .map(|p| resolve_walls(p, config))
        .filter(|&hit| hit)
        .count()
}

/// One resolver pass: body forces, then pairwise contacts.
///
/// `tree` must have been built from the store's current positions.
pub fn resolve(store: &mut ParticleStore, tree: &QuadTree, config: &SimConfig) -> ResolveReport {
    let mut report = ResolveReport {
        sanitized: forces::accumulate(store, config),
        ..ResolveReport::default()
    };

    let pairs = broad_phase(store, tree, CONTACT_SLOP);
    report.candidates = pairs.len();
    for (a, b) in pairs {
        let Some((pa, pb)) = store.pair_mut(a, b) else {
            continue;
        };
        if let Some(contact) = resolve_contact(pa, pb, config) {
            report.contacts += 1;
            if contact.impulse > 0.0 {
                report.impulses += 1;
            }
        }
    }
    trace!(?report, "resolved");
    report
}

/// Remove overlaps created while integrating, positions only.
///
/// `tree` is the index built at the start of the tick; queries are widened
/// by how far particles have drifted since, so no new overlap is missed.
/// Returns the number of pairs pushed apart.
pub fn settle(store: &mut ParticleStore, tree: &QuadTree, config: &SimConfig) -> usize {
    if !config.positional_correction {
        return 0;
    }
    let margin = tree.max_drift(store) + CONTACT_SLOP;
    let mut separated = 0;
    for (a, b) in broad_phase(store, tree, margin) {
        let Some((pa, pb)) = store.pair_mut(a, b) else {
            continue;
        };
        let delta = pb.position - pa.position;
        let distance = delta.length();
        let penetration = pa.radius + pb.radius - distance;
        if penetration > 0.0 {
            separate(pa, pb, contact_normal(delta, distance), penetration);
            separated += 1;
        }
    }
    separated
}
