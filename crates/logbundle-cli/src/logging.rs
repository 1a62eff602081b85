use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/logbundle.log";

/// Console output goes to stderr: stdout carries one task descriptor per line.
pub fn init_logger() -> WorkerGuard {
    let filter_layer = EnvFilter::new(
        env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string()),
    );

    let log_file = PathBuf::from(
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string()),
    );
    let (log_dir, file_name) = split_log_path(&log_file);
    let dir_created = fs::create_dir_all(&log_dir);

    let (scheduler_log, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&log_dir, file_name));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_file(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(scheduler_log)
                .with_target(true)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    match dir_created {
        Ok(()) => info!("Scheduler log: {}", log_file.display()),
        Err(err) => warn!("Cannot create log directory {}: {}", log_dir.display(), err),
    }

    guard
}

fn split_log_path(log_file: &Path) -> (PathBuf, String) {
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = log_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "logbundle.log".to_string());
    (dir, file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        assert_eq!(
            split_log_path(Path::new("./logs/logbundle.log")),
            (PathBuf::from("./logs"), "logbundle.log".to_string())
        );
        assert_eq!(
            split_log_path(Path::new("scheduler.log")),
            (PathBuf::from("."), "scheduler.log".to_string())
        );
    }
}
