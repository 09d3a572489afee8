//! Log writer module
//!
//! Thread-safe sink for access log lines, either stdout or an append-only
//! file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

/// Log output target
enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to file
    File(File),
}

/// Thread-safe access log writer
pub struct LogWriter {
    target: Mutex<LogTarget>,
}

impl LogWriter {
    /// Create a writer for `path`, or stdout when no path is given
    pub fn new(path: Option<&str>) -> io::Result<Self> {
        let target = match path {
            Some(path) => LogTarget::File(open_log_file(path)?),
            None => LogTarget::Stdout,
        };

        Ok(Self {
            target: Mutex::new(target),
        })
    }

    /// Write a single line
    pub fn write_line(&self, message: &str) {
        let Ok(mut target) = self.target.lock() else {
            return;
        };
        match &mut *target {
            LogTarget::Stdout => {
                println!("{message}");
            }
            LogTarget::File(file) => {
                if let Err(e) = writeln!(file, "{message}") {
                    tracing::warn!("Failed to write access log: {e}");
                }
            }
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}
