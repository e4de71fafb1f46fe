//! Tracing configuration for walink
//!
//! ## Behavior / 行为
//!
//! - `RUST_LOG` wins when set; otherwise `logging.level` from the config
//! - stdout always; a daily rolling file under `logging.dir` when configured
//! - Line format: `2025-01-15 10:30:45.123 INFO file.rs:42 target: message`

use std::{fs, io, path::Path, sync::OnceLock};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry, EnvFilter};
use wl_core::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "walink.log";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Build the default filter directives for tracing
///
/// The configured level applies to everything; HTTP internals stay at warn
/// unless the level asks for trace.
fn build_filter_directives(level: &str) -> Vec<String> {
    let level = match level.trim() {
        "" => "info",
        other => other,
    };
    let mut directives = vec![level.to_string()];
    if level != "trace" {
        directives.push("hyper=warn".to_string());
        directives.push("hyper_util=warn".to_string());
        directives.push("reqwest=warn".to_string());
    }
    directives
}

/// Initialize the tracing subscriber
///
/// Call once from `main`, after the config is loaded and before the runtime
/// does any work.
///
/// ## Errors / 错误
///
/// - Subscriber is already registered
/// - The filter directives are invalid
pub fn init_tracing_subscriber(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(build_filter_directives(&config.level).join(","))?,
    };

    let file_writer = match config.dir.as_deref().map(build_file_writer).transpose() {
        Ok(writer) => writer,
        Err(err) => {
            eprintln!("Failed to initialize file logging, falling back to stdout: {err}");
            None
        }
    };

    let stdout_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(BoxMakeWriter::new(io::stdout));

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn build_file_writer(dir: &Path) -> anyhow::Result<NonBlocking> {
    fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}
