//! File-backed exit log, one JSON record per line

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::{ExitLog, LogRecord};
use crate::errors::StoreError;
use crate::Result;

/// Exit log appended to a file as JSON lines
///
/// Each append writes and flushes one line, so a crash loses at most the
/// record being written. Blank lines are skipped when reading.
#[derive(Debug)]
pub struct JsonLinesExitLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesExitLog {
    /// Opens the log at `path`, creating the file if it does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file =
            OpenOptions::new().create(true).append(true).open(&path).map_err(StoreError::from)?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    /// Returns the path of the log file
    pub fn path(&self) -> &Path { &self.path }
}

impl ExitLog for JsonLinesExitLog {
    fn append(&self, record: &LogRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|err| StoreError::Serialization { line: 0, reason: err.to_string() })?;
        line.push('\n');

        let mut file = self.file.lock();
        file.write_all(line.as_bytes()).map_err(StoreError::from)?;
        file.flush().map_err(StoreError::from)?;
        Ok(())
    }

    fn records(&self) -> Result<Vec<LogRecord>> {
        // hold the writer lock so a concurrent append is not read half-written
        let _writer = self.file.lock();
        let reader = BufReader::new(File::open(&self.path).map_err(StoreError::from)?);

        let mut records = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(StoreError::from)?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|err| {
                StoreError::Serialization { line: number + 1, reason: err.to_string() }
            })?;
            records.push(record);
        }
        Ok(records)
    }
}
