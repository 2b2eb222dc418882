use std::path::{Path, PathBuf};

use flux_core::{ScenarioConfig, SimConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV: &str = "FLUX_CONFIG";

/// How long the headless run lasts and what it leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Host frames to simulate
    pub frames: u32,
    /// Host frames per second; each frame calls `step(1 / frame_rate)`
    pub frame_rate: f32,
    /// Log status every this many frames, 0 disables
    pub report_every: u32,
    /// Write a bincode snapshot here when the run ends
    pub export_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            frame_rate: 60.0,
            report_every: 60,
            export_path: None,
        }
    }
}

/// Top-level file layout: `[sim]`, `[scenario]` and `[run]` tables, each
/// optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sim: SimConfig,
    pub scenario: ScenarioConfig,
    pub run: RunConfig,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AppError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Config from `$FLUX_CONFIG` when set, defaults otherwise.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.sim.validate()?;
        self.scenario.validate()?;
        if !self.run.frame_rate.is_finite() || self.run.frame_rate <= 0.0 {
            return Err(AppError::InvalidRun("frame_rate must be finite and > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(AppConfig::from_toml("").ok(), Some(AppConfig::default()));
    }

    #[test]
    fn test_partial_tables_merge_with_defaults() -> Result<()> {
        let config = AppConfig::from_toml(
            r#"
            [sim]
            gravity = [0.0, -1.62]
            collision_damping = 0.5
            drag_model = "quadratic"

            [scenario]
            particle_count = 250

            [run]
            frames = 10
            export_path = "out/state.bin"
            "#,
        )?;
        assert_eq!(config.sim.gravity, Vec2::new(0.0, -1.62));
        assert_eq!(config.sim.restitution, 0.5);
        assert_eq!(config.sim.drag_model, flux_core::DragModel::Quadratic);
        assert_eq!(config.sim.time_step, SimConfig::default().time_step);
        assert_eq!(config.scenario.particle_count, 250);
        assert_eq!(config.scenario.seed, ScenarioConfig::default().seed);
        assert_eq!(config.run.frames, 10);
        assert_eq!(config.run.export_path, Some(PathBuf::from("out/state.bin")));
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_toml("[sim]\nrestitution = 1.5"),
            Err(AppError::Sim(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[run]\nframe_rate = 0.0"),
            Err(AppError::InvalidRun(_))
        ));
        assert!(matches!(AppConfig::from_toml("[sim"), Err(AppError::ParseConfig(_))));
    }
}
