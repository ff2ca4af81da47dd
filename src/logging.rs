//! Tracing subscriber setup.
//!
//! Stdout in the chosen [`LogFormat`], plus a daily-rolling JSON file when a
//! log directory is configured. `RUST_LOG` overrides the default filter.

use std::path::Path;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn,tokio_tungstenite=warn";
const LOG_FILE_PREFIX: &str = "zo-gateway.log";

/// Stdout log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, with colors
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "dev" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {other}")),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the process logs.
pub fn init(format: LogFormat, log_dir: Option<&Path>) -> std::io::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .json()
                .with_filter(env_filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stdout = match format {
        LogFormat::Pretty => fmt::layer().pretty().with_filter(env_filter()).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_filter(env_filter()).boxed(),
        LogFormat::Json => fmt::layer().json().with_filter(env_filter()).boxed(),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout)
        .try_init()
        .map_err(std::io::Error::other)?;
    Ok(guard)
}
