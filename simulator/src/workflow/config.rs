use anyhow::Context;
use beamcore::prelude::ReaderConfig;
use beamcore::processing::ModeManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::generator::profile::StreamConfig;

/// Top-level workflow configuration: the engine options, the ordered mode
/// manager registry, and the synthetic stream to feed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub reader: ReaderConfig,
    pub managers: Vec<ModeManager>,
    pub stream: StreamConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            reader: ReaderConfig::default(),
            managers: vec![ModeManager::default()],
            stream: StreamConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(n_pulses: u64, prf: f64, n_samples: usize) -> Self {
        let mut config = WorkflowConfig::default();
        config.stream.n_pulses = n_pulses;
        config.stream.prf = prf;
        for manager in &mut config.managers {
            manager.n_samples = n_samples;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_overrides_stream_and_managers() {
        let config = WorkflowConfig::from_args(5000, 800.0, 32);
        assert_eq!(config.stream.n_pulses, 5000);
        assert_eq!(config.managers[0].n_samples, 32);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"reader:\n  min_n_samples: 16\nstream:\n  n_pulses: 123\n  prf: 500.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let config = WorkflowConfig::load(&path).unwrap();
        assert_eq!(config.reader.min_n_samples, 16);
        assert_eq!(config.stream.n_pulses, 123);
        assert_eq!(config.managers.len(), 1);
    }
}
