use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Validate;
use crate::simulation::{DEFAULT_CAPACITY, MAX_CAPACITY};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IntersectionConfig {
    /// Vehicles allowed inside the critical area at once, `1..=MAX_CAPACITY`.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Pause after each drawn step so the map can be followed by eye.
    #[serde(default)]
    pub step_delay_ms: u64,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl IntersectionConfig {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            step_delay_ms: 0,
        }
    }
}

impl Validate for IntersectionConfig {
    fn validate(&self) -> Result<()> {
        if !(1..=MAX_CAPACITY).contains(&self.capacity) {
            bail!(
                "Critical area capacity must be between 1 and {MAX_CAPACITY}, got {}; \
                 a full ring of 8 cells can never drain",
                self.capacity
            );
        }
        Ok(())
    }
}
