use std::fs::File;
use std::io::Write;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use parking_lot::Mutex;

struct UvtaskLogger {
    file: Option<Mutex<File>>,
    filter: LevelFilter,
    /// At most `filter`; `Off` silences stderr while the file keeps logging
    stderr_filter: LevelFilter,
    start: Instant,
}

impl Log for UvtaskLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let max = if self.file.is_some() {
            self.filter
        } else {
            self.stderr_filter
        };
        metadata.level() <= max
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if record.level() <= self.stderr_filter {
            eprintln!("{}: {}", level_label(record.level()), record.args());
        }

        if let Some(ref file) = self.file {
            let elapsed = self.start.elapsed().as_secs_f64();
            let _ = writeln!(
                file.lock(),
                "[{elapsed:.3}s] [{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.file {
            let _ = file.lock().flush();
        }
    }
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

/// Level selected by the number of `-v` flags
#[must_use]
pub fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 | 1 => LevelFilter::Warn,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Level for stderr output: `-qq` silences it
#[must_use]
pub fn stderr_level(filter: LevelFilter, quiet: u8) -> LevelFilter {
    if quiet >= 2 { LevelFilter::Off } else { filter }
}

/// Initialize the global logger. `RUST_LOG` overrides the level picked from
/// `verbose`; `quiet` only affects stderr, never the log file.
///
/// # Errors
///
/// Returns `SetLoggerError` if a logger is already installed.
pub fn init(verbose: u8, quiet: u8, log_file: Option<File>) -> Result<(), SetLoggerError> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| level_for(verbose));
    let stderr_filter = stderr_level(filter, quiet);
    let max = if log_file.is_some() { filter } else { stderr_filter };

    let logger = UvtaskLogger {
        file: log_file.map(Mutex::new),
        filter,
        stderr_filter,
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Warn);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(3), LevelFilter::Trace);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn test_file_receives_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uvtask.log");
        let logger = UvtaskLogger {
            file: Some(Mutex::new(File::create(&path).unwrap())),
            filter: LevelFilter::Error,
            stderr_filter: LevelFilter::Error,
            start: Instant::now(),
        };
        logger.log(
            &Record::builder()
                .level(Level::Error)
                .target("uvtask")
                .args(format_args!("boom"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("uvtask")
                .args(format_args!("filtered"))
                .build(),
        );
        logger.flush();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[ERROR] uvtask: boom"));
        assert!(!contents.contains("filtered"));
    }

    #[test]
    fn test_double_quiet_silences_stderr_only() {
        assert_eq!(stderr_level(LevelFilter::Warn, 0), LevelFilter::Warn);
        assert_eq!(stderr_level(LevelFilter::Debug, 1), LevelFilter::Debug);
        assert_eq!(stderr_level(LevelFilter::Warn, 2), LevelFilter::Off);
        assert_eq!(stderr_level(LevelFilter::Trace, 3), LevelFilter::Off);
    }

    #[test]
    fn test_file_logging_survives_silenced_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uvtask.log");
        let logger = UvtaskLogger {
            file: Some(Mutex::new(File::create(&path).unwrap())),
            filter: LevelFilter::Warn,
            stderr_filter: LevelFilter::Off,
            start: Instant::now(),
        };
        let metadata = Metadata::builder().level(Level::Error).build();
        assert!(logger.enabled(&metadata));
        logger.log(
            &Record::builder()
                .level(Level::Error)
                .target("uvtask::executor")
                .args(format_args!("Unable to start 'nope'"))
                .build(),
        );
        logger.flush();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Unable to start 'nope'"));
    }

    #[test]
    fn test_silenced_stderr_without_file_disables_records() {
        let logger = UvtaskLogger {
            file: None,
            filter: LevelFilter::Warn,
            stderr_filter: LevelFilter::Off,
            start: Instant::now(),
        };
        let metadata = Metadata::builder().level(Level::Error).build();
        assert!(!logger.enabled(&metadata));
    }
}
