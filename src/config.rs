//! Pipeline configuration
//!
//! Everything has a default, so the binary runs with no arguments. Values can
//! be overridden from the environment:
//!
//! | Variable | Default |
//! |---|---|
//! | `IRIS_AUTOLOG_TRACKING_URI` | `./mlruns` (`memory:` for in-process) |
//! | `IRIS_AUTOLOG_EXPERIMENT` | `Default` |
//! | `IRIS_AUTOLOG_SEED` | unset (nondeterministic split) |
//! | `IRIS_AUTOLOG_TEST_SIZE` | `0.25` |
//! | `IRIS_AUTOLOG_MAX_DEPTH` | unset (unbounded) |
//! | `IRIS_AUTOLOG_CRITERION` | `gini` |
//! | `IRIS_AUTOLOG_AUTOLOG` | `true` |

use std::str::FromStr;

use crate::data::SplitConfig;
use crate::experiment::{TrackingUri, DEFAULT_EXPERIMENT_NAME};
use crate::training::{SplitCriterion, TreeParams};
use crate::{Error, Result};

/// Prefix shared by every environment variable.
pub const ENV_PREFIX: &str = "IRIS_AUTOLOG_";

/// Settings for one pipeline execution.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Where runs are recorded.
    pub tracking_uri: TrackingUri,
    /// Experiment the run belongs to.
    pub experiment_name: String,
    /// Train/test split settings.
    pub split: SplitConfig,
    /// Decision-tree hyperparameters.
    pub tree: TreeParams,
    /// Log fit params, training metrics and model summary automatically.
    pub autolog: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tracking_uri: TrackingUri::default(),
            experiment_name: DEFAULT_EXPERIMENT_NAME.to_string(),
            split: SplitConfig::default(),
            tree: TreeParams::default(),
            autolog: true,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration builder
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Read overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, which receives full variable names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a value is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut builder = Self::builder();
        if let Some(uri) = get("TRACKING_URI") {
            builder = builder.tracking_uri(TrackingUri::parse(&uri));
        }
        if let Some(name) = get("EXPERIMENT") {
            builder = builder.experiment_name(name);
        }
        if let Some(seed) = get("SEED") {
            builder = builder.seed(parse_value("SEED", &seed)?);
        }
        if let Some(test_size) = get("TEST_SIZE") {
            builder = builder.test_size(parse_value("TEST_SIZE", &test_size)?);
        }
        if let Some(depth) = get("MAX_DEPTH") {
            builder = builder.max_depth(parse_value("MAX_DEPTH", &depth)?);
        }
        if let Some(criterion) = get("CRITERION") {
            builder = builder.criterion(criterion.parse::<SplitCriterion>()?);
        }
        if let Some(autolog) = get("AUTOLOG") {
            builder = builder.autolog(parse_bool("AUTOLOG", &autolog)?);
        }

        builder.build()
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| Error::Config(format!("{ENV_PREFIX}{name}='{raw}': {e}")))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{ENV_PREFIX}{name}='{raw}': expected true or false"
        ))),
    }
}

/// Pipeline configuration builder
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the tracking location
    #[must_use]
    pub fn tracking_uri(mut self, uri: TrackingUri) -> Self {
        self.config.tracking_uri = uri;
        self
    }

    /// Set the experiment name
    #[must_use]
    pub fn experiment_name(mut self, name: impl Into<String>) -> Self {
        self.config.experiment_name = name.into();
        self
    }

    /// Fix the split seed
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.split.seed = Some(seed);
        self
    }

    /// Set the held-out fraction
    #[must_use]
    pub fn test_size(mut self, test_size: f64) -> Self {
        self.config.split.test_size = test_size;
        self
    }

    /// Bound the tree depth
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.tree.max_depth = Some(depth);
        self
    }

    /// Set the split criterion
    #[must_use]
    pub fn criterion(mut self, criterion: SplitCriterion) -> Self {
        self.config.tree.criterion = criterion;
        self
    }

    /// Enable or disable autolog
    #[must_use]
    pub fn autolog(mut self, enabled: bool) -> Self {
        self.config.autolog = enabled;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty experiment name, a test size
    /// outside (0, 1) or a zero depth bound.
    pub fn build(self) -> Result<PipelineConfig> {
        let config = self.config;
        if config.experiment_name.trim().is_empty() {
            return Err(Error::Config("experiment name must not be empty".to_string()));
        }
        if !(config.split.test_size > 0.0 && config.split.test_size < 1.0) {
            return Err(Error::Config(format!(
                "test size must be in (0, 1), got {}",
                config.split.test_size
            )));
        }
        if config.tree.max_depth == Some(0) {
            return Err(Error::Config("max depth must be at least 1".to_string()));
        }
        Ok(config)
    }
}
