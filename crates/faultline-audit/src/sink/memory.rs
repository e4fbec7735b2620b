// crates/faultline-audit/src/sink/memory.rs
// ============================================================================
// Module: Memory Audit Sink
// Description: In-memory append-only record store.
// Purpose: Capture the trail for tests, replay, and in-process inspection.
// Dependencies: faultline-core
// ============================================================================

//! ## Overview
//! The memory sink stores records in arrival order behind a mutex. Records
//! are cloned out for inspection so the stored trail stays append-only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use faultline_core::AuditError;
use faultline_core::AuditRecord;
use faultline_core::AuditSink;

// ============================================================================
// SECTION: Memory Sink
// ============================================================================

/// In-memory audit sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Appended records in arrival order.
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all appended records in order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the store lock is poisoned.
    pub fn records(&self) -> Result<Vec<AuditRecord>, AuditError> {
        let records = self
            .records
            .lock()
            .map_err(|_| AuditError::Unavailable("memory sink lock poisoned".to_string()))?;
        Ok(records.clone())
    }

    /// Returns the number of appended records.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the store lock is poisoned.
    pub fn len(&self) -> Result<usize, AuditError> {
        let records = self
            .records
            .lock()
            .map_err(|_| AuditError::Unavailable("memory sink lock poisoned".to_string()))?;
        Ok(records.len())
    }

    /// Returns true when no records have been appended.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, AuditError> {
        Ok(self.len()? == 0)
    }
}

impl AuditSink for MemorySink {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| AuditError::Unavailable("memory sink lock poisoned".to_string()))?;
        records.push(record.clone());
        Ok(())
    }
}
