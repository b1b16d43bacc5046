//! # iris-autolog: Tracked Decision-Tree Training on Iris
//!
//! **Version**: 0.1.0
//!
//! Trains a CART decision tree on the iris dataset, records the run in an
//! experiment-tracking store and scores the model on held-out rows.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Genchi Genbutsu**: The active run is an explicit value, not hidden global state
//! - **Poka-Yoke safety**: Split, fit and evaluation validate shapes before use
//! - **Jidoka**: Any failure stops the pipeline; the run is marked failed
//! - **Kaizen**: Split seed is configurable, so results can be reproduced
//!
//! ## Example Usage
//!
//! ```rust
//! use iris_autolog::config::PipelineConfig;
//! use iris_autolog::experiment::{ExperimentStore, TrackingClient};
//!
//! let config = PipelineConfig::builder().seed(42).build()?;
//! let mut client = TrackingClient::new(ExperimentStore::new());
//!
//! let result = iris_autolog::pipeline::run(&config, &mut client)?;
//! let accuracy = result.metric("accuracy_score").unwrap_or_default();
//! assert!((0.0..=1.0).contains(&accuracy));
//! # Ok::<(), iris_autolog::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod pipeline;
pub mod training;

pub use error::{Error, Result};
