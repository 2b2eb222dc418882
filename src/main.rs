//! Headless driver: scatter a scenario, run it at a fixed frame rate and
//! optionally write a snapshot when done.

mod config;
mod error;

use std::time::Instant;

use flux_physics::diagnostics;
use flux_physics::procgen;
use flux_sim::Simulation;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::error::Result;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    run(&config)
}

fn run(config: &AppConfig) -> Result<()> {
    let specs = procgen::scatter(&config.scenario, &config.sim.world)?;
    let mut sim = Simulation::new(config.sim.clone())?;
    sim.add_particles(specs)?;
    info!(
        particles = sim.store().count(),
        seed = config.scenario.seed,
        time_step = config.sim.time_step,
        frames = config.run.frames,
        "starting run"
    );

    let frame_time = 1.0 / config.run.frame_rate;
    let started = Instant::now();
    for frame in 1..=config.run.frames {
        sim.step(frame_time)?;
        if config.run.report_every > 0 && frame % config.run.report_every == 0 {
            let status = sim.status();
            let dt = sim.config().time_step;
            info!(
                frame,
                tick = status.tick_count,
                step_us = status.last_step_duration_micros,
                contacts = status.last_contact_count,
                energy = diagnostics::kinetic_energy(sim.store(), dt),
                "status"
            );
            if status.sanitized_count > 0 {
                warn!(sanitized = status.sanitized_count, "non-finite values replaced so far");
            }
        }
    }

    let status = sim.status();
    let wall = started.elapsed().as_secs_f64();
    info!(
        ticks = status.tick_count,
        particles = status.particle_count,
        wall_seconds = wall,
        ticks_per_second = status.tick_count as f64 / wall.max(f64::EPSILON),
        "run finished"
    );

    if let Some(path) = &config.run.export_path {
        flux_storage::save_snapshot(&flux_storage::export(&sim), path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use flux_core::ScenarioConfig;

    #[test]
    fn test_short_run_writes_snapshot() -> Result<()> {
        let path = std::env::temp_dir()
            .join(format!("flux_driver_{}", std::process::id()))
            .join("final.bin");
        let config = AppConfig {
            scenario: ScenarioConfig {
                particle_count: 20,
                ..ScenarioConfig::default()
            },
            run: RunConfig {
                frames: 5,
                report_every: 2,
                export_path: Some(path.clone()),
                ..RunConfig::default()
            },
            ..AppConfig::default()
        };
        run(&config)?;

        let record = flux_storage::load_snapshot(&path)?;
        std::fs::remove_file(&path).map_err(flux_storage::StorageError::from)?;
        assert_eq!(record.particles.len(), 20);
        assert!(record.tick >= 5);
        Ok(())
    }
}
