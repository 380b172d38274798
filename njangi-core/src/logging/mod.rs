//! Process logger
//!
//! Built on the standard `log` crate: library code only uses `log::info!` and friends,
//! and a binary calls [`init_logging`] once at startup.
//!
//! ```rust,no_run
//! use njangi_core::config::LoggingConfig;
//!
//! njangi_core::logging::init_logging(&LoggingConfig::default()).unwrap();
//! log::info!("Ledger opened");
//! ```

pub mod formatter;

pub use formatter::{LogEntry, LogFormat};

use crate::config::LoggingConfig;
use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, Once, PoisonError};

static INIT: Once = Once::new();

/// Install the process logger
///
/// Safe to call multiple times; only the first call takes effect.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = init_logging_internal(config);
    });
    result
}

fn init_logging_internal(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = config
        .level_filter()
        .with_context(|| format!("Unknown log level: {}", config.level))?;
    let logger = NjangiLogger::new(config, level)?;

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

struct NjangiLogger {
    level: log::LevelFilter,
    format: LogFormat,
    writers: Vec<Box<dyn LogWriter>>,
}

impl NjangiLogger {
    fn new(config: &LoggingConfig, level: log::LevelFilter) -> anyhow::Result<Self> {
        let mut writers: Vec<Box<dyn LogWriter>> = Vec::new();

        if config.stderr {
            writers.push(Box::new(StderrWriter));
        } else {
            writers.push(Box::new(StdoutWriter));
        }
        if config.file_enabled {
            writers.push(Box::new(FileWriter::open(&config.file_path)?));
        }

        Ok(Self { level, format: LogFormat::parse(&config.format), writers })
    }
}

impl log::Log for NjangiLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = self.format.format_entry(&LogEntry::from_record(record));
        for writer in &self.writers {
            let _ = writer.write_line(&line);
        }
    }

    fn flush(&self) {
        for writer in &self.writers {
            let _ = writer.flush();
        }
    }
}

trait LogWriter: Send + Sync {
    fn write_line(&self, line: &str) -> std::io::Result<()>;
    fn flush(&self) -> std::io::Result<()>;
}

struct StdoutWriter;

impl LogWriter for StdoutWriter {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        writeln!(std::io::stdout().lock(), "{}", line)
    }

    fn flush(&self) -> std::io::Result<()> {
        std::io::stdout().flush()
    }
}

struct StderrWriter;

impl LogWriter for StderrWriter {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        writeln!(std::io::stderr().lock(), "{}", line)
    }

    fn flush(&self) -> std::io::Result<()> {
        std::io::stderr().flush()
    }
}

struct FileWriter {
    file: Mutex<File>,
}

impl FileWriter {
    fn open(path: &str) -> anyhow::Result<Self> {
        let path = Path::new(path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self { file: Mutex::new(file) })
    }
}

impl LogWriter for FileWriter {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(file, "{}", line)
    }

    fn flush(&self) -> std::io::Result<()> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn test_file_writer_appends_formatted_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs").join("njangi.log");
        let config = LoggingConfig {
            format: "json".to_string(),
            file_enabled: true,
            file_path: path.to_string_lossy().to_string(),
            ..LoggingConfig::default()
        };

        let logger = NjangiLogger::new(&config, log::LevelFilter::Info).unwrap();
        logger.log(
            &log::Record::builder()
                .level(log::Level::Info)
                .target("njangi_core::ledger")
                .args(format_args!("Loan approved"))
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .target("njangi_core::ledger")
                .args(format_args!("filtered out"))
                .build(),
        );
        logger.flush();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["message"], "Loan approved");
    }
}
