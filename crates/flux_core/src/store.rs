use tracing::debug;

use crate::error::{Result, SimError};
use crate::types::{Particle, ParticleId};

/// Flat particle container with stable ids.
///
/// Removal leaves a tombstone, so an id keeps naming the same particle for
/// the whole lifetime of the store and freed ids are never reused. The
/// spatial index is rebuilt from live slots every tick and only ever refers
/// to particles by id, so tombstones never reach it.
///
/// Mutate only between ticks.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    slots: Vec<Option<Particle>>,
    live: usize,
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Append a particle; its `id` field is overwritten with the assigned id.
    pub fn add(&mut self, mut particle: Particle) -> ParticleId {
        let id = ParticleId(self.slots.len() as u32);
        particle.id = id;
        self.slots.push(Some(particle));
        self.live += 1;
        id
    }

    /// Place a particle at its own `id`, growing the store with tombstones
    /// as needed. Fails with `InvalidData` when the slot is occupied.
    pub fn insert_at(&mut self, particle: Particle) -> Result<()> {
        let index = particle.id.index();
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        match &mut self.slots[index] {
            Some(_) => Err(SimError::invalid_data(format!(
                "duplicate particle id {}",
                particle.id
            ))),
            slot => {
                *slot = Some(particle);
                self.live += 1;
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, id: ParticleId) -> Result<Particle> {
        let particle = self
            .slots
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(SimError::NotFound(id))?;
        self.live -= 1;
        debug!(%id, "removed particle");
        Ok(particle)
    }

    pub fn get(&self, id: ParticleId) -> Result<&Particle> {
        self.slots
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(SimError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Result<&mut Particle> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(SimError::NotFound(id))
    }

    /// Mutable access to two distinct live particles at once.
    pub fn pair_mut(&mut self, a: ParticleId, b: ParticleId) -> Option<(&mut Particle, &mut Particle)> {
        let (ia, ib) = (a.index(), b.index());
        if ia == ib || ia.max(ib) >= self.slots.len() {
            return None;
        }
        let (lo, hi) = (ia.min(ib), ia.max(ib));
        let (head, tail) = self.slots.split_at_mut(hi);
        let (p_lo, p_hi) = (head[lo].as_mut()?, tail[0].as_mut()?);
        if ia < ib { Some((p_lo, p_hi)) } else { Some((p_hi, p_lo)) }
    }

    pub fn contains(&self, id: ParticleId) -> bool {
        self.get(id).is_ok()
    }

    /// Number of live particles.
    pub fn count(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slots ever allocated, tombstones included. Ids are always below this.
    pub fn capacity_used(&self) -> usize {
        self.slots.len()
    }

    /// Live particles in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.slots.iter_mut().flatten()
    }

    pub fn ids(&self) -> impl Iterator<Item = ParticleId> + '_ {
        self.iter().map(|p| p.id)
    }

    pub fn for_each(&self, mut f: impl FnMut(&Particle)) {
        self.iter().for_each(&mut f);
    }
}
