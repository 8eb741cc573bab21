use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod intersection;
pub mod vehicles;

pub use intersection::*;
pub use vehicles::*;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RandomConfig {
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub intersection: IntersectionConfig,
    #[serde(default)]
    pub vehicles: VehiclesConfig,
    #[serde(default)]
    pub random: RandomConfig,
}

impl SimulationConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The concrete roster this configuration describes.
    pub fn roster(&self) -> Result<Vec<VehicleSpec>> {
        self.vehicles.resolve(self.random.seed)
    }

    /// The seed, if the roster is actually drawn at random.
    pub fn seed_in_use(&self) -> Option<u64> {
        self.vehicles.count.and(self.random.seed)
    }
}

impl Validate for SimulationConfig {
    fn validate(&self) -> Result<()> {
        self.intersection.validate()?;
        self.vehicles.validate()?;
        Ok(())
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}
