use std::path::PathBuf;

use flux_core::{DragModel, ParticleSpec, ScenarioConfig, SimConfig};
use flux_physics::procgen::scatter;
use flux_sim::Simulation;
use flux_storage::{Result, export, from_json, import, load_snapshot, save_snapshot, to_json};
use glam::Vec2;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("flux_storage_{}", std::process::id()))
        .join(name)
}

/// A simulation that has run a while and had a particle removed.
fn running_simulation() -> Result<Simulation> {
    let config = SimConfig {
        drag_model: DragModel::Quadratic,
        restitution: 0.6,
        quadtree_leaf_capacity: 4,
        ..SimConfig::default()
    };
    let scenario = ScenarioConfig {
        particle_count: 64,
        seed: 9,
        ..ScenarioConfig::default()
    };
    let mut sim = Simulation::new(config.clone())?;
    let ids = sim.add_particles(scatter(&scenario, &config.world)?)?;
    for _ in 0..30 {
        sim.tick();
    }
    sim.remove_particle(ids[10])?;
    Ok(sim)
}

fn assert_equivalent(original: &Simulation, restored: &Simulation) {
    assert_eq!(restored.config(), original.config());
    assert_eq!(restored.tick_count(), original.tick_count());
    assert_eq!(restored.store().count(), original.store().count());
    let dt = original.config().time_step;
    for p in original.store().iter() {
        let q = restored.particle(p.id).expect("particle survives round trip");
        assert_eq!(q.position, p.position);
        assert_eq!(q.mass, p.mass);
        assert_eq!(q.radius, p.radius);
        assert!((q.velocity(dt) - p.velocity(dt)).length() < 1e-2);
    }
}

#[test]
fn export_import_restores_state() -> Result<()> {
    let sim = running_simulation()?;
    let imported = import(export(&sim))?;
    assert!(imported.rejected.is_empty());
    assert_equivalent(&sim, &imported.simulation);
    Ok(())
}

#[test]
fn removed_ids_stay_removed() -> Result<()> {
    let mut sim = Simulation::new(SimConfig::default())?;
    let a = sim.add_particle(ParticleSpec::at_rest(Vec2::new(10.0, 10.0), 1.0, 0.5))?;
    let b = sim.add_particle(ParticleSpec::at_rest(Vec2::new(20.0, 10.0), 1.0, 0.5))?;
    sim.remove_particle(a)?;

    let mut restored = import(export(&sim))?.strict()?;
    assert!(restored.particle(a).is_err());
    assert!(restored.particle(b).is_ok());
    // New particles never reuse an id seen before the export.
    let c = restored.add_particle(ParticleSpec::at_rest(Vec2::new(30.0, 10.0), 1.0, 0.5))?;
    assert!(c > b);
    Ok(())
}

#[test]
fn json_round_trip() -> Result<()> {
    let sim = running_simulation()?;
    let json = to_json(&export(&sim))?;
    assert!(json.contains("\"restitution\""));
    let restored = import(from_json(&json)?)?.strict()?;
    assert_equivalent(&sim, &restored);
    Ok(())
}

#[test]
fn snapshot_file_round_trip() -> Result<()> {
    let sim = running_simulation()?;
    let path = temp_path("snapshot_file_round_trip/state.bin");
    save_snapshot(&export(&sim), &path)?;
    let record = load_snapshot(&path)?;
    std::fs::remove_file(&path)?;

    assert_eq!(record, export(&sim));
    let restored = import(record)?.strict()?;
    assert_equivalent(&sim, &restored);
    Ok(())
}

#[test]
fn restored_simulation_keeps_running() -> Result<()> {
    let sim = running_simulation()?;
    let mut restored = import(export(&sim))?.strict()?;
    let ticks = restored.step(0.5)?;
    assert!(ticks > 0);
    assert_eq!(restored.status().tick_count, sim.tick_count() + ticks as u64);
    assert_eq!(restored.status().sanitized_count, 0);
    Ok(())
}
