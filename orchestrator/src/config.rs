use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use comms::{Vector, group::Aggregator};
use machine_learning::Dataset;
use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};

/// Where the rows of a run come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetConfig {
    /// A CSV or whitespace separated text file.
    Local { path: PathBuf },
    /// Rows given in the config itself, each one `features ++ [label]`.
    Inline { rows: Vec<Vec<f64>> },
}

impl DatasetConfig {
    /// Reads or builds the dataset.
    pub fn load(&self) -> Result<Dataset> {
        let dataset = match self {
            Self::Local { path } => Dataset::load(path)?,
            Self::Inline { rows } => {
                Dataset::new(rows.iter().cloned().map(Vector::from).collect())?
            }
        };

        Ok(dataset)
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self::Local {
            path: PathBuf::from("data/yacht_hydrodynamics.csv"),
        }
    }
}

/// What every resource is requested with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceConfig {
    pub memory_mb: usize,
    pub cores: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            memory_mb: 128,
            cores: 4,
        }
    }
}

/// Everything needed to run the computation, missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub workers: usize,
    pub learning_rate: f64,
    pub iterations: usize,
    pub resources: ResourceConfig,
    pub aggregator: Aggregator,
    pub dataset: DatasetConfig,
    /// The buffer size in bytes of every in-memory link direction.
    pub link_capacity: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            learning_rate: 0.001,
            iterations: 1,
            resources: ResourceConfig::default(),
            aggregator: Aggregator::default(),
            dataset: DatasetConfig::default(),
            link_capacity: 64 * 1024,
        }
    }
}

impl RunConfig {
    /// Loads a `RunConfig` from a JSON file.
    ///
    /// # Errors
    /// Returns an `OrchestratorError` if the file can't be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Checks the values that can't be enforced by their types.
    ///
    /// # Errors
    /// `OrchestratorError::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(OrchestratorError::InvalidConfig(msg.into()));

        if self.workers == 0 {
            return invalid("workers must be at least 1");
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return invalid("learning_rate must be a positive finite number");
        }
        if self.iterations == 0 {
            return invalid("iterations must be at least 1");
        }
        if self.resources.memory_mb == 0 || self.resources.cores == 0 {
            return invalid("resources must ask for some memory and at least one core");
        }
        if self.link_capacity == 0 {
            return invalid("link_capacity must be at least 1 byte");
        }
        if matches!(&self.dataset, DatasetConfig::Inline { rows } if rows.is_empty()) {
            return invalid("inline dataset must have rows");
        }

        Ok(())
    }

    /// The iteration count, once validated.
    pub fn iterations(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.iterations)
            .ok_or_else(|| OrchestratorError::InvalidConfig("iterations must be at least 1".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_takes_every_default() {
        let config: RunConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.workers, 3);
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.resources, ResourceConfig { memory_mb: 128, cores: 4 });
        assert_eq!(config.aggregator, Aggregator::Average);
        config.validate().unwrap();
    }

    #[test]
    fn parses_every_field() {
        let json = r#"{
            "workers": 2,
            "learning_rate": 0.01,
            "iterations": 5,
            "resources": { "memory_mb": 256 },
            "aggregator": "concat",
            "dataset": { "inline": { "rows": [[1.0, 2.0], [3.0, 4.0]] } },
            "link_capacity": 4096
        }"#;

        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.iterations().unwrap().get(), 5);
        assert_eq!(config.resources.memory_mb, 256);
        assert_eq!(config.resources.cores, 4);
        assert_eq!(config.aggregator, Aggregator::Concat);
        assert_eq!(config.link_capacity, 4096);

        let dataset = config.dataset.load().unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.features(), 1);
    }

    #[test]
    fn local_dataset_path() {
        let json = r#"{ "dataset": { "local": { "path": "rows.csv" } } }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.dataset,
            DatasetConfig::Local {
                path: "rows.csv".into()
            }
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_str::<RunConfig>(r#"{ "wokers": 2 }"#).is_err());
        assert!(serde_json::from_str::<RunConfig>(r#"{ "aggregator": "median" }"#).is_err());
    }

    #[test]
    fn validate_rejects_nonsense() {
        let cases = [
            RunConfig {
                workers: 0,
                ..Default::default()
            },
            RunConfig {
                learning_rate: f64::NAN,
                ..Default::default()
            },
            RunConfig {
                learning_rate: -1.0,
                ..Default::default()
            },
            RunConfig {
                iterations: 0,
                ..Default::default()
            },
            RunConfig {
                resources: ResourceConfig {
                    memory_mb: 0,
                    cores: 4,
                },
                ..Default::default()
            },
            RunConfig {
                link_capacity: 0,
                ..Default::default()
            },
            RunConfig {
                dataset: DatasetConfig::Inline { rows: vec![] },
                ..Default::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(OrchestratorError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RunConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, OrchestratorError::Io(_)));
    }
}
