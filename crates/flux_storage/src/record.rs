use flux_core::{Particle, ParticleId, ParticleSpec, ParticleStore, SimConfig, SimError};
use flux_sim::Simulation;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Bumped whenever the record layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// Ids this far past the number of records are treated as corrupt rather
/// than padded out with tombstones.
const MAX_ID_GAP: usize = 1 << 20;

/// One particle as persisted. Velocity is explicit so the record does not
/// depend on the time step it was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleRecord {
    pub id: u32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub radius: f32,
}

impl ParticleRecord {
    fn spec(&self) -> ParticleSpec {
        ParticleSpec::new(self.position, self.velocity, self.mass, self.radius)
    }
}

/// Complete simulation state for save/load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub version: u32,
    pub tick: u64,
    pub config: SimConfig,
    pub particles: Vec<ParticleRecord>,
}

/// A particle record that import refused.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedEntry {
    /// Position in `SimulationRecord::particles`
    pub index: usize,
    pub id: u32,
    pub reason: SimError,
}

#[derive(Debug)]
pub struct Imported {
    pub simulation: Simulation,
    pub rejected: Vec<RejectedEntry>,
}

impl Imported {
    /// The simulation, or `InvalidData` naming the first rejected entry.
    pub fn strict(self) -> flux_core::Result<Simulation> {
        match self.rejected.first() {
            None => Ok(self.simulation),
            Some(entry) => Err(SimError::invalid_data(format!(
                "{} particle record(s) rejected, first at index {} (id {}): {}",
                self.rejected.len(),
                entry.index,
                entry.id,
                entry.reason
            ))),
        }
    }
}

/// Capture the particle store, config and tick count of `simulation`.
pub fn export(simulation: &Simulation) -> SimulationRecord {
    let dt = simulation.config().time_step;
    let particles = simulation
        .store()
        .iter()
        .map(|p| ParticleRecord {
            id: p.id.0,
            position: p.position,
            velocity: p.velocity(dt),
            mass: p.mass,
            radius: p.radius,
        })
        .collect();
    SimulationRecord {
        version: FORMAT_VERSION,
        tick: simulation.tick_count(),
        config: simulation.config().clone(),
        particles,
    }
}

/// Rebuild a simulation from a record.
///
/// A bad version or config fails the whole import with `InvalidData`.
/// Individual particle records that break mass/radius/finiteness
/// invariants, or repeat an id, are skipped and reported in
/// [`Imported::rejected`]; the rest load with their original ids.
pub fn import(record: SimulationRecord) -> flux_core::Result<Imported> {
    if record.version != FORMAT_VERSION {
        return Err(SimError::invalid_data(format!(
            "unsupported record version {} (expected {FORMAT_VERSION})",
            record.version
        )));
    }
    record
        .config
        .validate()
        .map_err(|e| SimError::invalid_data(format!("config: {e}")))?;

    let dt = record.config.time_step;
    let mut store = ParticleStore::with_capacity(record.particles.len());
    let mut rejected = Vec::new();
    let id_limit = record.particles.len() + MAX_ID_GAP;
    for (index, entry) in record.particles.iter().enumerate() {
        let loaded = if entry.id as usize >= id_limit {
            Err(SimError::invalid_data(format!("particle id {} out of range", entry.id)))
        } else {
            Particle::from_spec(ParticleId(entry.id), &entry.spec(), dt)
                .map_err(|e| SimError::invalid_data(e.to_string()))
                .and_then(|particle| store.insert_at(particle))
        };
        if let Err(reason) = loaded {
            warn!(index, id = entry.id, %reason, "rejected particle record");
            rejected.push(RejectedEntry {
                index,
                id: entry.id,
                reason,
            });
        }
    }

    debug!(
        loaded = store.count(),
        rejected = rejected.len(),
        tick = record.tick,
        "imported simulation"
    );
    let simulation = Simulation::from_parts(record.config, store, record.tick)?;
    Ok(Imported {
        simulation,
        rejected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(particles: Vec<ParticleRecord>) -> SimulationRecord {
        SimulationRecord {
            version: FORMAT_VERSION,
            tick: 7,
            config: SimConfig::default(),
            particles,
        }
    }

    fn entry(id: u32, mass: f32, radius: f32) -> ParticleRecord {
        ParticleRecord {
            id,
            position: Vec2::new(id as f32, 1.0),
            velocity: Vec2::ZERO,
            mass,
            radius,
        }
    }

    #[test]
    fn test_bad_entries_are_rejected_individually() -> flux_core::Result<()> {
        let imported = import(record(vec![
            entry(0, 1.0, 0.5),
            entry(1, -1.0, 0.5),
            entry(2, 1.0, -0.1),
            entry(0, 1.0, 0.5),
            entry(4, 1.0, 0.0),
        ]))?;
        let indices: Vec<usize> = imported.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(
            imported
                .rejected
                .iter()
                .all(|r| matches!(r.reason, SimError::InvalidData(_)))
        );

        let sim = &imported.simulation;
        assert_eq!(sim.store().count(), 2);
        assert!(sim.particle(ParticleId(4)).is_ok());
        assert_eq!(sim.particle(ParticleId(1)).err(), Some(SimError::NotFound(ParticleId(1))));
        assert_eq!(sim.tick_count(), 7);
        Ok(())
    }

    #[test]
    fn test_strict_fails_on_any_rejection() -> flux_core::Result<()> {
        let imported = import(record(vec![entry(0, 1.0, 0.5), entry(1, 0.0, 0.5)]))?;
        assert!(matches!(imported.strict(), Err(SimError::InvalidData(_))));
        let clean = import(record(vec![entry(0, 1.0, 0.5)]))?;
        assert_eq!(clean.strict()?.store().count(), 1);
        Ok(())
    }

    #[test]
    fn test_bad_config_is_invalid_data() {
        let mut bad = record(vec![entry(0, 1.0, 0.5)]);
        bad.config.time_step = -1.0;
        assert!(matches!(import(bad), Err(SimError::InvalidData(_))));
    }

    #[test]
    fn test_unknown_version_is_invalid_data() {
        let mut bad = record(Vec::new());
        bad.version = FORMAT_VERSION + 1;
        assert!(matches!(import(bad), Err(SimError::InvalidData(_))));
    }

    #[test]
    fn test_non_finite_entry_is_rejected() -> flux_core::Result<()> {
        let mut nan = entry(3, 1.0, 0.5);
        nan.velocity = Vec2::new(f32::NAN, 0.0);
        let imported = import(record(vec![nan]))?;
        assert_eq!(imported.rejected.len(), 1);
        assert!(imported.simulation.store().is_empty());
        Ok(())
    }

    #[test]
    fn test_absurd_id_is_rejected() -> flux_core::Result<()> {
        let imported = import(record(vec![entry(u32::MAX, 1.0, 0.5), entry(2, 1.0, 0.5)]))?;
        assert_eq!(imported.rejected.len(), 1);
        assert_eq!(imported.rejected[0].id, u32::MAX);
        assert_eq!(imported.simulation.store().count(), 1);
        Ok(())
    }
}
