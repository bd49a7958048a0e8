//! Notification log seam.
//!
//! One record per generated notification, after fan-out completes. Agents
//! expose this as an RFC 3014 / notification-log style MIB or just keep it
//! for diagnostics.

use std::sync::Mutex;

use crate::oid::Oid;
use crate::outcome::DispatchReport;
use crate::pdu::Pdu;

/// Summary of one dispatched notification.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Trap OID carried by the notification, when present.
    pub trap_oid: Option<Oid>,
    /// Number of varbinds in the payload.
    pub varbinds: usize,
    /// Targets the notification was actually sent to.
    pub sent: usize,
    /// Targets skipped by filtering, access control, or stale config.
    pub skipped: usize,
    /// Targets where the send itself failed.
    pub failed: usize,
}

impl LogRecord {
    pub fn from_dispatch(pdu: &Pdu, report: &DispatchReport) -> Self {
        Self {
            trap_oid: pdu.notify.as_ref().map(|n| n.trap_oid.clone()),
            varbinds: pdu.varbinds.len(),
            sent: report.sent(),
            skipped: report.skipped(),
            failed: report.failed(),
        }
    }
}

/// Records dispatched notifications.
pub trait NotificationLog: Send + Sync {
    fn record(&self, record: LogRecord);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLog;

impl NotificationLog for NoopLog {
    fn record(&self, _record: LogRecord) {}
}

/// Keeps records in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded entries.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().expect("log lock").clone()
    }
}

impl NotificationLog for MemoryLog {
    fn record(&self, record: LogRecord) {
        self.records.lock().expect("log lock").push(record);
    }
}
