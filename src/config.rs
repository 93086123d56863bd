//! Configuration for the ECS runtime and the sandbox scenario

use std::{fs, path::Path};

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ecs::EcsError;

fn default_max_components() -> usize {
    32
}

fn default_max_systems() -> usize {
    32
}

/// Universe sizes fixed for the lifetime of a world.
///
/// Universes of 32 or fewer use single-word bit sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcsConfig {
    #[serde(default = "default_max_components")]
    pub max_components: usize,
    #[serde(default = "default_max_systems")]
    pub max_systems: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_components: default_max_components(),
            max_systems: default_max_systems(),
        }
    }
}

impl EcsConfig {
    pub fn validate(&self) -> Result<(), EcsError> {
        if self.max_components == 0 {
            return Err(EcsError::InvalidConfig(
                "max_components must be greater than zero".into(),
            ));
        }
        if self.max_systems == 0 {
            return Err(EcsError::InvalidConfig(
                "max_systems must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_frames() -> u64 {
    600
}

fn default_frame_seconds() -> f64 {
    1.0 / 60.0
}

fn default_entities() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_colour() -> String {
    "#030".to_string()
}

/// Main configuration for a sandbox run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub name: String,
    pub seed: u64,
    #[serde(default = "default_frames")]
    pub frames: u64,
    #[serde(default = "default_frame_seconds")]
    pub frame_seconds: f64,
    #[serde(default = "default_entities")]
    pub entities: usize,
    #[serde(default)]
    pub ecs: EcsConfig,
    pub map: MapConfig,
    #[serde(default)]
    pub spawn: SpawnConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub cell_size: f32,
    /// Row-major cells; zero is open floor, anything else is a wall.
    pub cells: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub x: [f32; 2],
    pub y: [f32; 2],
    pub max_speed: f32,
    #[serde(default = "default_colour")]
    pub colour: String,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            x: [40.0, 170.0],
            y: [40.0, 150.0],
            max_speed: 100.0,
            colour: default_colour(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl SandboxConfig {
    /// Load configuration from YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read sandbox config {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid sandbox config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: SandboxConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("failed to write {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.ecs.validate()?;
        ensure!(self.map.cell_size > 0.0, "map cell_size must be positive");
        let Some(width) = self.map.cells.first().map(Vec::len) else {
            bail!("map must have at least one row");
        };
        ensure!(width > 0, "map rows must not be empty");
        if let Some(row) = self.map.cells.iter().position(|row| row.len() != width) {
            bail!("map row {row} has a different width than row 0");
        }
        ensure!(
            self.map.cells.iter().flatten().any(|cell| *cell == 0),
            "map has no open cells"
        );
        ensure!(
            self.spawn.x[0] <= self.spawn.x[1] && self.spawn.y[0] <= self.spawn.y[1],
            "spawn ranges must be ordered as [min, max]"
        );
        ensure!(self.spawn.max_speed >= 0.0, "spawn max_speed must not be negative");
        ensure!(self.frame_seconds >= 0.0, "frame_seconds must not be negative");
        Ok(())
    }

    /// Walled 9x8 arena with a 24 unit grid
    pub fn arena() -> Self {
        let mut cells = vec![vec![0; 9]; 8];
        for (y, row) in cells.iter_mut().enumerate() {
            for (x, cell) in row.iter_mut().enumerate() {
                if y == 0 || y == 7 || x == 0 || x == 8 {
                    *cell = 1;
                }
            }
        }
        Self {
            name: "arena".to_string(),
            seed: 7,
            frames: default_frames(),
            frame_seconds: default_frame_seconds(),
            entities: default_entities(),
            ecs: EcsConfig::default(),
            map: MapConfig {
                cell_size: 24.0,
                cells,
            },
            spawn: SpawnConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
