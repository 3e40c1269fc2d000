//! Structured logging and tracing
//!
//! Console output always; an optional daily-rotated file through
//! `tracing-appender`. `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use crate::error::{Result, SolarEdgeError};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;
mod structured;

pub use level::parse_log_level;
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Initialize logging; later calls are no-ops returning the first outcome
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let level = parse_log_level(&config.level)?;
            let filter = build_env_filter(level);
            match config.file.as_deref() {
                Some(file) if !file.trim().is_empty() => init_file_logging(config, file, filter),
                _ => {
                    init_console_logging(filter, config.json_format);
                    Ok(())
                }
            }
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(SolarEdgeError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("solaredge={level},tower_http={level},reqwest=warn,hyper=warn").into()
    })
}

fn console_layer<S>(json_format: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    // Logs go to stderr; stdout carries query results
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);
    if json_format {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

fn init_console_logging(filter: EnvFilter, json_format: bool) {
    // try_init: a subscriber installed by a test harness is not an error
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(json_format))
        .try_init();
}

fn init_file_logging(config: &LoggingConfig, file: &str, filter: EnvFilter) -> Result<()> {
    let path = Path::new(file);
    let (dir, prefix) = if path.extension().is_some() {
        (
            path.parent().unwrap_or_else(|| Path::new(".")),
            path.file_stem()
                .map_or_else(|| "solaredge".to_string(), |s| s.to_string_lossy().into_owned()),
        )
    } else {
        (path, "solaredge".to_string())
    };

    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build(dir)
        .map_err(|e| SolarEdgeError::io(format!("Failed to create log file appender: {e}")))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json().boxed()
        } else {
            base.boxed()
        }
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(config.json_format))
        .with(file_layer)
        .try_init();

    info!("Logging initialized - level: {}, file: {}", config.level, file);
    Ok(())
}
