use super::{DEFAULT_RETENTION_EPOCHS, MIN_ENTROPY_SOURCES};
use serde::{Deserialize, Serialize};

/// Engine tunables supplied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Floor applied to every finalization request. Values below
    /// [MIN_ENTROPY_SOURCES] are raised to it.
    pub min_entropy_sources: u8,
    /// Epochs a settled batch is kept before it may be closed.
    pub retention_epochs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_entropy_sources: MIN_ENTROPY_SOURCES,
            retention_epochs: DEFAULT_RETENTION_EPOCHS,
        }
    }
}

impl EngineConfig {
    /// Number of sources finalization will actually demand for `requested`.
    pub fn required_sources(&self, requested: u8) -> u8 {
        requested
            .max(self.min_entropy_sources)
            .max(MIN_ENTROPY_SOURCES)
    }
}
