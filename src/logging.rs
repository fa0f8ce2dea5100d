use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup harness logging: one log file per run directory, optional console.
///
/// Harness sessions are short-lived, so logs go to a single per-run file
/// (`<prefix>.log`) rather than a rotating appender; each CI invocation
/// points `log_dir` at its own artifact directory. The filter honors
/// `RUST_LOG` and falls back to `info`.
///
/// # Returns
/// A guard that must be held for the duration of the run to keep the
/// non-blocking writer flushing.
pub fn init_logging(
    log_dir: impl AsRef<Utf8Path>,
    log_prefix: &str,
    console_output: bool,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = log_dir.as_ref();
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir))?;
    }

    let file_appender = rolling::never(log_dir, format!("{log_prefix}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log files
        .with_target(true)
        .with_thread_names(true);

    let init_result = if console_output {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .with_thread_names(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(console_layer)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .try_init()
    };

    // One global subscriber per process; a harness embedded in a larger
    // test binary may have one installed already.
    init_result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, console={}",
        log_dir,
        log_prefix,
        console_output
    );

    Ok(guard)
}
