//! In-memory exit log

use parking_lot::RwLock;

use super::{ExitLog, LogRecord};
use crate::Result;

/// Exit log kept in memory, for tests and ephemeral bridges
#[derive(Debug, Default)]
pub struct InMemoryExitLog {
    records: RwLock<Vec<LogRecord>>,
}

impl InMemoryExitLog {
    /// Creates an empty log
    pub fn new() -> Self { Self::default() }

    /// Returns the number of records
    pub fn len(&self) -> usize { self.records.read().len() }

    /// Returns whether the log is empty
    pub fn is_empty(&self) -> bool { self.records.read().is_empty() }
}

impl ExitLog for InMemoryExitLog {
    fn append(&self, record: &LogRecord) -> Result<()> {
        self.records.write().push(record.clone());
        Ok(())
    }

    fn records(&self) -> Result<Vec<LogRecord>> { Ok(self.records.read().clone()) }
}
