use std::sync::Arc;
use std::time::{Duration, Instant};

use flux_core::{Particle, ParticleId, ParticleSpec, ParticleStore, Result, SimConfig, SimError};
use flux_physics::FixedStep;
use glam::Vec2;
use tracing::{debug, info, warn};

use crate::frame::Frame;
use crate::pipeline::{TickReport, run_tick};

/// Where the simulation is in its step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Stepping,
}

/// Snapshot of counters for the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimStatus {
    pub tick_count: u64,
    pub particle_count: usize,
    /// Wall-clock time spent in the most recent `step` call
    pub last_step_duration_micros: u64,
    /// Non-finite values replaced since creation
    pub sanitized_count: u64,
    /// Contacts resolved in the most recent tick
    pub last_contact_count: usize,
}

/// The simulation context: one particle store, one config, one clock.
///
/// Nothing here is global. The host owns a `Simulation`, mutates it only
/// between calls to [`Simulation::step`], and reads published frames from
/// any thread.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    store: ParticleStore,
    clock: FixedStep,
    phase: Phase,
    tick_count: u64,
    sanitized_count: u64,
    last_step: Duration,
    last_report: TickReport,
    frame: Arc<Frame>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self> {
        Self::from_parts(config, ParticleStore::new(), 0)
    }

    /// Rebuild a simulation around an existing store, e.g. after import.
    pub fn from_parts(config: SimConfig, store: ParticleStore, tick_count: u64) -> Result<Self> {
        config.validate()?;
        let frame = Arc::new(Frame::capture(tick_count, &store));
        Ok(Self {
            clock: FixedStep::new(config.time_step, config.max_substeps),
            config,
            store,
            phase: Phase::Idle,
            tick_count,
            sanitized_count: 0,
            last_step: Duration::ZERO,
            last_report: TickReport::default(),
            frame,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Report from the most recent tick.
    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    pub fn add_particle(&mut self, spec: ParticleSpec) -> Result<ParticleId> {
        let particle = Particle::from_spec(ParticleId(0), &spec, self.config.time_step)?;
        let id = self.store.add(particle);
        debug!(%id, "added particle");
        Ok(id)
    }

    /// Add a batch, stopping at the first invalid spec.
    ///
    /// Particles added before the failure stay in the store.
    pub fn add_particles(&mut self, specs: impl IntoIterator<Item = ParticleSpec>) -> Result<Vec<ParticleId>> {
        specs.into_iter().map(|spec| self.add_particle(spec)).collect()
    }

    pub fn remove_particle(&mut self, id: ParticleId) -> Result<Particle> {
        self.store.remove(id)
    }

    pub fn particle(&self, id: ParticleId) -> Result<&Particle> {
        self.store.get(id)
    }

    pub fn velocity(&self, id: ParticleId) -> Result<Vec2> {
        Ok(self.store.get(id)?.velocity(self.config.time_step))
    }

    /// Overwrite a particle's velocity, keeping its position.
    pub fn set_velocity(&mut self, id: ParticleId, velocity: Vec2) -> Result<()> {
        if !velocity.is_finite() {
            return Err(SimError::invalid_config(format!("velocity {velocity} is not finite")));
        }
        let dt = self.config.time_step;
        self.store.get_mut(id)?.set_velocity(velocity, dt);
        Ok(())
    }

    /// Swap in a new config between steps.
    ///
    /// An invalid config is rejected and the current one stays in force.
    /// When the time step changes, every particle's previous position is
    /// rescaled so its velocity carries over unchanged.
    pub fn set_config(&mut self, config: SimConfig) -> Result<()> {
        config.validate()?;
        let (old_dt, new_dt) = (self.config.time_step, config.time_step);
        if old_dt != new_dt {
            for p in self.store.iter_mut() {
                let velocity = p.velocity(old_dt);
                p.set_velocity(velocity, new_dt);
            }
        }
        self.clock.reconfigure(config.time_step, config.max_substeps);
        self.config = config;
        info!(
            time_step = new_dt,
            restitution = self.config.restitution,
            max_depth = self.config.quadtree_max_depth,
            "config updated"
        );
        Ok(())
    }

    /// Advance by `elapsed` seconds of host time.
    ///
    /// Elapsed time is split into fixed `time_step` increments, at most
    /// `max_substeps` of them; remainders carry over to the next call.
    /// Returns the number of ticks run. A frame is published whenever at
    /// least one tick ran.
    pub fn step(&mut self, elapsed: f32) -> Result<u32> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(SimError::invalid_config(format!(
                "elapsed time must be finite and non-negative, got {elapsed}"
            )));
        }
        self.phase = Phase::Stepping;
        let started = Instant::now();

        let ticks = self.clock.advance(elapsed);
        for _ in 0..ticks {
            self.advance_tick();
        }
        if ticks > 0 {
            self.publish();
        }

        self.last_step = started.elapsed();
        self.phase = Phase::Idle;
        Ok(ticks)
    }

    /// Run exactly one fixed tick regardless of the clock.
    pub fn tick(&mut self) -> TickReport {
        self.phase = Phase::Stepping;
        let started = Instant::now();
        self.advance_tick();
        self.publish();
        self.last_step = started.elapsed();
        self.phase = Phase::Idle;
        self.last_report
    }

    fn advance_tick(&mut self) {
        let report = run_tick(&mut self.store, &self.config);
        self.tick_count += 1;

        let sanitized = report.sanitized();
        if sanitized > 0 {
            self.sanitized_count += sanitized as u64;
            warn!(
                tick = self.tick_count,
                sanitized,
                total = self.sanitized_count,
                "replaced non-finite values"
            );
        }
        if report.tree.max_depth >= self.config.quadtree_max_depth && report.tree.entries > 0 {
            debug!(
                tick = self.tick_count,
                occupancy = report.tree.max_leaf_occupancy,
                "quadtree hit depth limit"
            );
        }
        self.last_report = report;
    }

    fn publish(&mut self) {
        self.frame = Arc::new(Frame::capture(self.tick_count, &self.store));
    }

    /// The most recently published frame.
    pub fn frame(&self) -> Arc<Frame> {
        Arc::clone(&self.frame)
    }

    pub fn status(&self) -> SimStatus {
        SimStatus {
            tick_count: self.tick_count,
            particle_count: self.store.count(),
            last_step_duration_micros: self.last_step.as_micros() as u64,
            sanitized_count: self.sanitized_count,
            last_contact_count: self.last_report.resolve.contacts,
        }
    }
}
