//! Train, track and evaluate a decision tree on iris, then print the metrics.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use iris_autolog::config::PipelineConfig;
use iris_autolog::experiment::TrackingClient;
use iris_autolog::pipeline;

/// Level used when `RUST_LOG` is unset, empty or unparsable.
const DEFAULT_LOG_LEVEL: &str = "info";

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

fn init_tracing() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(directives.as_deref()))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = PipelineConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        tracking_uri = %config.tracking_uri,
        experiment = %config.experiment_name,
        "starting pipeline"
    );

    let store = config
        .tracking_uri
        .open()
        .with_context(|| format!("cannot open tracking store at {}", config.tracking_uri))?;
    let mut client = TrackingClient::new(store);

    let result = pipeline::run(&config, &mut client)?;
    println!("{result}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_rust_log_overrides_default_level() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_default_level_is_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    }
}
