//! Tracing setup for the command-line client.
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::ClientConfig;

/// Install the global subscriber.
///
/// Logs always go to stderr so stdout stays machine-readable JSON. When
/// `SIMULATOR_LOG_FILE` is enabled they are also written to
/// `<cache>/simulator/logs/<session>/client.log`.
pub fn setup_logging(config: &ClientConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    if !config.log_file {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
        return Ok(());
    }

    let session_id = config.session_id.clone().unwrap_or_else(default_session_id);
    let session_log_dir = log_dir().join(&session_id);
    std::fs::create_dir_all(&session_log_dir).with_context(|| {
        format!(
            "Failed to create log directory: {}",
            session_log_dir.display()
        )
    })?;

    let file_appender = tracing_appender::rolling::never(&session_log_dir, "client.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    // Leak the guard to keep the file writer alive for the whole process.
    std::mem::forget(guard);

    tracing::info!("Logging initialized: session={}", session_id);
    tracing::info!("Log file: {}/client.log", session_log_dir.display());

    Ok(())
}

/// Platform cache directory for client logs.
///
/// - macOS: `~/Library/Caches/simulator/logs`
/// - Linux: `~/.cache/simulator/logs` (or `$XDG_CACHE_HOME/simulator/logs`)
/// - Windows: `%LOCALAPPDATA%\simulator\cache\logs`
fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "simulator")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("simulator"))
        .join("logs")
}

fn default_session_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    format!("session_{}", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_logs_live_under_logs_dir() {
        assert!(log_dir().ends_with("logs"));
    }

    #[test]
    fn default_session_id_is_timestamped() {
        let id = default_session_id();
        let suffix = id.strip_prefix("session_").unwrap();
        assert!(suffix.parse::<u64>().is_ok());
    }
}
