//! Logging Infrastructure
//!
//! Structured logging setup for the demo binary and embedding applications.
//! Library code only emits `tracing` events; installing the subscriber is
//! left to the process entry point.
//!
//! - `RUST_LOG` overrides the configured level when set
//! - JSON output for production, human-readable text otherwise
//! - Optional daily-rolling file output next to the console

use std::path::Path;

use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize the logger (text, `info`, console only)
pub fn init_logger() {
    init_logger_with_file("info", false, None);
}

/// Initialize the logger with optional daily-rolling file output
///
/// # Arguments
/// * `level` - Default filter when `RUST_LOG` is unset (e.g. "info", "stock_sync=debug")
/// * `json_format` - JSON lines instead of text
/// * `log_dir` - Existing directory for `stock-sync.YYYY-MM-DD` files
///
/// A missing `log_dir` falls back to console only. Safe to call more than
/// once; later calls are ignored.
pub fn init_logger_with_file(level: &str, json_format: bool, log_dir: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers: Vec<BoxedLayer> = vec![format_layer(fmt::layer().with_target(false), json_format)];

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "stock-sync");
            let file_layer = fmt::layer().with_ansi(false).with_writer(file_appender);
            layers.push(format_layer(file_layer, json_format));
        } else {
            eprintln!("log directory {dir} not found, logging to console only");
        }
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();
}

fn format_layer<W>(layer: fmt::Layer<Registry, fmt::format::DefaultFields, fmt::format::Format, W>, json: bool) -> BoxedLayer
where
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_with_missing_dir_falls_back() {
        init_logger_with_file("debug", false, Some("/definitely/not/here"));
        // second init is a no-op
        init_logger();
        tracing::info!("logger ready");
    }

    #[test]
    fn test_init_with_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        init_logger_with_file("info", true, dir.path().to_str());
        init_logger_with_file("info", false, dir.path().to_str());
    }
}
