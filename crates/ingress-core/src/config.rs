use std::path::PathBuf;
use std::time::Duration;

use crate::endpoint::{Credential, Endpoint};
use crate::enumeration::FileFilter;
use crate::errors::ConfigError;
use crate::naming::NamingScheme;

/// Fully resolved settings for one load-test run.
#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    pub endpoint: Endpoint,
    pub credential: Credential,
    pub local_dir: PathBuf,
    pub remote_dir: String,
    /// Pause between consecutive batch sizes.
    pub interval: Duration,
    /// Batch multipliers, run in this order.
    pub batch_sizes: Vec<u32>,
    pub naming: NamingScheme,
    pub filter: FileFilter,
}

impl LoadTestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_sizes.is_empty() {
            return Err(ConfigError::NoBatchSizes);
        }
        if self.batch_sizes.contains(&0) {
            return Err(ConfigError::InvalidBatchSize("0".to_string()));
        }
        if !self.local_dir.exists() {
            return Err(ConfigError::MissingLocalDir(self.local_dir.clone()));
        }
        if !self.local_dir.is_dir() {
            return Err(ConfigError::NotADirectory(self.local_dir.clone()));
        }
        if self.remote_dir.trim().is_empty() {
            return Err(ConfigError::EmptyRemoteDir);
        }
        Ok(())
    }
}

/// Settings for the connectivity health monitor.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub endpoint: Endpoint,
    pub credential: Credential,
    pub interval: Duration,
}

/// Parse a batch-size list such as `1,2,5` or `1 2 5`.
pub fn parse_batch_sizes(raw: &str) -> Result<Vec<u32>, ConfigError> {
    let sizes = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(parse_batch_size)
        .collect::<Result<Vec<_>, _>>()?;
    if sizes.is_empty() {
        return Err(ConfigError::NoBatchSizes);
    }
    Ok(sizes)
}

pub fn parse_batch_size(raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidBatchSize(raw.trim().to_string())),
        Ok(size) => Ok(size),
    }
}
