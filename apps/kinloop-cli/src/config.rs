use std::path::Path;

use anyhow::Context;
use kinloop_agent::AgentConfig;
use kinloop_driver::DriverConfig;
use kinloop_kernel::WorldConfig;
use serde::{Deserialize, Serialize};

/// Everything tunable about a session, loaded from one JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub driver: DriverConfig,
    pub agent: AgentConfig,
}

impl GameConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing config {}", path.display()))
    }
}
