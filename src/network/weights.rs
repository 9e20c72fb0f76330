use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::SwitchId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeightsError {
    #[error("line {line}: expected `switch_a switch_b weight`, got {content:?}")]
    Malformed { line: usize, content: String },
    #[error("line {line}: invalid number {value:?}")]
    InvalidNumber { line: usize, value: String },
}

/// Static link weights loaded once at startup.
///
/// A lookup for `(a, b)` falls back to `(b, a)` and then to the default weight,
/// so a single line in the file covers both directions of a link.
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: HashMap<(SwitchId, SwitchId), u32>,
    default_weight: u32,
}

impl WeightTable {
    pub fn new(default_weight: u32) -> Self {
        Self {
            weights: HashMap::new(),
            default_weight,
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>, default_weight: u32) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let table = Self::parse(&content, default_weight)?;
        info!("Loaded {} link weights from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn parse(content: &str, default_weight: u32) -> Result<Self, WeightsError> {
        let mut table = Self::new(default_weight);

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.split('#').next().unwrap_or("").trim();
            if trimmed.is_empty() {
                continue;
            }

            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            let [a, b, weight] = fields[..] else {
                return Err(WeightsError::Malformed {
                    line,
                    content: raw.to_string(),
                });
            };

            let a = parse_number::<SwitchId>(a, line)?;
            let b = parse_number::<SwitchId>(b, line)?;
            let weight = parse_number::<u32>(weight, line)?;
            debug!("Weight s{} -> s{} = {}", a, b, weight);
            table.set(a, b, weight);
        }

        Ok(table)
    }

    pub fn set(&mut self, a: SwitchId, b: SwitchId, weight: u32) {
        self.weights.insert((a, b), weight);
    }

    pub fn weight(&self, a: SwitchId, b: SwitchId) -> u32 {
        self.weights
            .get(&(a, b))
            .or_else(|| self.weights.get(&(b, a)))
            .copied()
            .unwrap_or(self.default_weight)
    }

    pub fn default_weight(&self) -> u32 {
        self.default_weight
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::new(1)
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, line: usize) -> Result<T, WeightsError> {
    value.parse().map_err(|_| WeightsError::InvalidNumber {
        line,
        value: value.to_string(),
    })
}
