use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Maps `-v` counts onto a level; `-q` silences everything.
pub fn level_for(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG`, when set, takes precedence over the verbosity flags so individual modules
/// (for example `pepforge::engine::runtime=trace`) can be traced in isolation.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !quiet && !directives.trim().is_empty() => {
            EnvFilter::try_new(directives)
                .map_err(|e| CliError::Logging(format!("bad RUST_LOG: {e}")))?
        }
        _ => EnvFilter::default().add_directive(level_for(verbosity, quiet).into()),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let subscriber = tracing_subscriber::registry().with(filter).with(stderr_layer);

    let installed = if let Some(path) = log_file {
        let file = File::create(path)?;
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_target(true);
        subscriber.with(file_layer).try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| CliError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;
    use tracing::{debug, info, warn};

    #[test]
    fn verbosity_flags_map_to_levels() {
        assert_eq!(level_for(0, false), LevelFilter::WARN);
        assert_eq!(level_for(1, false), LevelFilter::INFO);
        assert_eq!(level_for(2, false), LevelFilter::DEBUG);
        assert_eq!(level_for(9, false), LevelFilter::TRACE);
        assert_eq!(level_for(3, true), LevelFilter::OFF);
    }

    #[test]
    #[serial]
    fn file_layer_records_thread_ids_and_levels() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("pepforge.log");

        let file = File::create(&log_path).unwrap();
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true);
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            info!(stage = "scoring", "Scored 12 designs");
            debug!("Backend chain resolved");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Scored 12 designs"));
        assert!(content.contains("stage=\"scoring\""));
        assert!(content.contains("DEBUG"));
        assert!(content.contains("ThreadId"));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let invalid_path = PathBuf::from("/");
        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(&invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }

    #[test]
    #[serial]
    fn global_logger_installs_once() {
        let _ = setup_logging(3, false, None);
        warn!("logger installed");
        assert!(setup_logging(0, false, None).is_err());
    }
}
