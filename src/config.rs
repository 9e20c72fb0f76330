use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::flow::DEFAULT_IDLE_TIMEOUT;
use crate::network::WeightTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Seconds an installed rule may sit unused before the switch evicts it.
    pub idle_timeout_secs: u16,
    pub l3_matching: bool,
    pub default_link_weight: u32,
    pub weights_file: Option<PathBuf>,
    pub notification_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT,
            l3_matching: false,
            default_link_weight: 1,
            weights_file: None,
            notification_capacity: 64,
        }
    }
}

impl ControllerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ControllerConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Weights from `weights_file`, or an empty table when none is configured.
    pub fn load_weights(&self) -> Result<WeightTable> {
        match &self.weights_file {
            Some(path) => WeightTable::load_from_file(path, self.default_link_weight)
                .with_context(|| format!("loading weights {}", path.display())),
            None => Ok(WeightTable::new(self.default_link_weight)),
        }
    }
}
