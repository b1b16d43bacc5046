//! Metric Record - numeric results attached to a run

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Metric Record represents a single metric data point.
///
/// Metrics are keyed by `run_id` + `key` and ordered by `step`. Evaluation
/// metrics are logged once at step 0; nothing stops a caller from logging a
/// series.
///
/// ## Line format
///
/// The file store keeps one metric history per file, one point per line:
///
/// ```text
/// <timestamp_ms> <value> <step>
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    run_id: String,
    key: String,
    step: u64,
    value: f64,
    timestamp: DateTime<Utc>,
}

impl MetricRecord {
    /// Create a new metric record stamped with the current time.
    #[must_use]
    pub fn new(run_id: impl Into<String>, key: impl Into<String>, step: u64, value: f64) -> Self {
        Self {
            run_id: run_id.into(),
            key: key.into(),
            step,
            value,
            timestamp: Utc::now(),
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the metric key/name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the step number.
    #[must_use]
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Get the metric value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the timestamp when the metric was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Encode as a history line (without trailing newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {}",
            self.timestamp.timestamp_millis(),
            self.value,
            self.step
        )
    }

    /// Decode a history line written by [`to_line`](Self::to_line).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tracking`] if the line does not have three valid fields.
    pub fn from_line(run_id: &str, key: &str, line: &str) -> Result<Self> {
        let malformed = || Error::Tracking(format!("malformed metric line for '{key}': {line:?}"));

        let mut fields = line.split_whitespace();
        let (Some(ts), Some(value), Some(step), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed());
        };

        let ts: i64 = ts.parse().map_err(|_| malformed())?;
        let value: f64 = value.parse().map_err(|_| malformed())?;
        let step: u64 = step.parse().map_err(|_| malformed())?;
        let timestamp = Utc
            .timestamp_millis_opt(ts)
            .single()
            .ok_or_else(malformed)?;

        Ok(Self {
            run_id: run_id.to_string(),
            key: key.to_string(),
            step,
            value,
            timestamp,
        })
    }
}
