// crates/faultline-audit/src/sink/log.rs
// ============================================================================
// Module: Log Audit Sink
// Description: JSON-lines persistence for the investigation trail.
// Purpose: Write one serialized record per line to any writer.
// Dependencies: faultline-core, serde_json
// ============================================================================

//! ## Overview
//! The log sink serializes each record as one JSON line and flushes per
//! append, so a crashed process leaves a readable prefix of the trail. The
//! writer is generic; production uses an append-mode file, tests use a
//! buffer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use faultline_core::AuditError;
use faultline_core::AuditRecord;
use faultline_core::AuditSink;

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// JSON-lines audit sink over any writer.
pub struct LogSink<W: Write + Send> {
    /// Output writer for serialized records.
    writer: Mutex<W>,
}

impl<W: Write + Send> LogSink<W> {
    /// Creates a log sink over a writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl LogSink<File> {
    /// Opens an append-mode file sink, creating the file when absent.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, AuditError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| AuditError::Unavailable(format!("audit log open failed: {err}")))?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> AuditSink for LogSink<W> {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)
            .map_err(|err| AuditError::Append(format!("record serialization failed: {err}")))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AuditError::Unavailable("log sink lock poisoned".to_string()))?;
        writeln!(writer, "{line}")
            .map_err(|err| AuditError::Append(format!("audit log write failed: {err}")))?;
        writer
            .flush()
            .map_err(|err| AuditError::Append(format!("audit log flush failed: {err}")))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use faultline_core::AuditEvent;
    use faultline_core::DEFAULT_HASH_ALGORITHM;
    use faultline_core::InvestigationId;
    use faultline_core::InvestigationPhase;
    use faultline_core::Timestamp;

    use super::*;

    fn record(seq: u64) -> AuditRecord {
        AuditRecord::build(
            seq,
            InvestigationId::new("inv-1"),
            Timestamp::Logical(seq),
            AuditEvent::PhaseChanged {
                from: InvestigationPhase::Triage,
                to: InvestigationPhase::Hypothesize,
            },
            DEFAULT_HASH_ALGORITHM,
        )
        .unwrap()
    }

    #[test]
    fn writes_one_json_line_per_record() {
        let sink = LogSink::new(Vec::new());
        sink.append(&record(0)).unwrap();
        sink.append(&record(1)).unwrap();
        let buffer = sink.writer.into_inner().unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: AuditRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.seq, 0);
        assert!(parsed.verify_hash().unwrap());
    }

    #[test]
    fn file_sink_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        {
            let sink = LogSink::open(&path).unwrap();
            sink.append(&record(0)).unwrap();
        }
        {
            let sink = LogSink::open(&path).unwrap();
            sink.append(&record(1)).unwrap();
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
