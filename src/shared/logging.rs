use std::fs;
use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking writers flushing; drop it only on exit.
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

fn log_dir_writable(log_dir: &Path) -> bool {
    let probe = log_dir.join(".write_probe");
    fs::create_dir_all(log_dir)
        .and_then(|_| fs::File::create(&probe))
        .and_then(|_| fs::remove_file(&probe))
        .is_ok()
}

/// Console logging always; a daily-rotated `<service>.log` under `log_dir`
/// when that directory is writable. Filter comes from `RUST_LOG`, default
/// `info`.
pub fn init_service_logging(log_dir: &Path, service_name: &str) -> anyhow::Result<LogGuards> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    if !log_dir_writable(log_dir) {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(stdout_writer)
                    .with_ansi(true)
                    .with_target(false),
            )
            .try_init()?;
        info!(
            "Logging initialized - console only ({} is not writable)",
            log_dir.display()
        );
        return Ok(LogGuards {
            _guards: vec![stdout_guard],
        });
    }

    let backup = rotate_logs_on_startup(log_dir, service_name)?;

    let file_appender =
        tracing_appender::rolling::daily(log_dir, format!("{service_name}.log"));
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(
            fmt::layer()
                .with_writer(stdout_writer)
                .with_ansi(true)
                .with_target(false),
        )
        .try_init()?;

    info!(
        "Logging initialized - writing to {}/{service_name}.log",
        log_dir.display()
    );
    if let Some(backup) = backup {
        info!("Previous log file backed up to: {}", backup);
    }

    Ok(LogGuards {
        _guards: vec![file_guard, stdout_guard],
    })
}

/// Move an existing `<service>.log` aside with a timestamp suffix.
pub fn rotate_logs_on_startup(log_dir: &Path, service_name: &str) -> anyhow::Result<Option<String>> {
    let log_path = log_dir.join(format!("{service_name}.log"));
    if !log_path.exists() {
        return Ok(None);
    }

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let backup_path = log_dir.join(format!("{service_name}.{timestamp}.log"));
    fs::rename(&log_path, &backup_path)?;
    Ok(Some(backup_path.display().to_string()))
}

/// Plain stderr logging for command-line tools; quiet unless `RUST_LOG` says
/// otherwise.
pub fn init_cli_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_moves_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        assert!(rotate_logs_on_startup(dir.path(), "svc").unwrap().is_none());

        fs::write(dir.path().join("svc.log"), "old").unwrap();
        let backup = rotate_logs_on_startup(dir.path(), "svc").unwrap().unwrap();
        assert!(!dir.path().join("svc.log").exists());
        assert_eq!(fs::read_to_string(backup).unwrap(), "old");
    }

    // The only test in this binary that installs the global subscriber.
    #[test]
    fn test_service_logging_with_file_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("svc.log"), "previous run").unwrap();

        let guards = init_service_logging(dir.path(), "svc").unwrap();
        assert_eq!(guards._guards.len(), 2);
        assert!(!dir.path().join("svc.log").exists());
    }

    #[test]
    fn test_writable_probe() {
        let dir = tempfile::tempdir().unwrap();
        assert!(log_dir_writable(&dir.path().join("logs")));
        assert!(!dir.path().join("logs").join(".write_probe").exists());
    }
}
