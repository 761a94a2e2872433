//! Tracing setup: human-readable console output plus an optional rotating JSON file.

use std::path::PathBuf;

use contextd_config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const CONSOLE_FILTER: &str =
    "contextd=info,contextd_server=info,contextd_store=info,contextd_embed=info,warn";

const VERBOSE_FILTER: &str = "contextd=debug,contextd_server=debug,contextd_store=debug,\
                              contextd_embed=debug,contextd_client=debug,contextd_config=debug,info";

const FILE_FILTER: &str = "contextd=trace,contextd_server=trace,contextd_store=trace,\
                           contextd_embed=trace,contextd_client=trace,contextd_config=trace,info";

/// Log file prefix; the appender adds the date.
const LOG_FILE_NAME: &str = "contextd.log";

/// Install the global subscriber.
///
/// Console output goes to stderr so `--json` output on stdout stays
/// parseable. `RUST_LOG` overrides the console filter. The returned guard
/// flushes the file writer and must live until exit.
pub fn init(verbose: bool, config: &LoggingConfig) -> Option<WorkerGuard> {
    let console_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::new(directives),
        _ if verbose => EnvFilter::new(VERBOSE_FILTER),
        _ => EnvFilter::new(CONSOLE_FILTER),
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file_layer, guard) = match log_dir(config) {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(FILE_FILTER));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

/// Directory for the JSON log, or `None` when file logging is off or the
/// directory cannot be created.
fn log_dir(config: &LoggingConfig) -> Option<PathBuf> {
    if !config.file {
        return None;
    }
    let dir = config
        .directory
        .clone()
        .or_else(contextd_config::default_log_dir)?;
    match std::fs::create_dir_all(&dir) {
        Ok(()) => Some(dir),
        Err(e) => {
            eprintln!(
                "warning: file logging disabled, cannot create {}: {}",
                dir.display(),
                e
            );
            None
        }
    }
}
