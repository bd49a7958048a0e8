//! Per-target dispatch outcomes.
//!
//! A notification fans out to many targets, and each target succeeds,
//! fails, or is skipped on its own. [`DispatchReport`] keeps the full
//! per-target record; its aggregate status is the last failure observed, so
//! a caller that only looks at the status still learns that something went
//! wrong.

use std::fmt;
use std::net::SocketAddr;

use bytes::Bytes;

use crate::error::Error;

/// Why a target was passed over without a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The target's notify filter profile excluded this trap OID.
    FilteredOut,
    /// Access control denied the notification's OIDs to the target's
    /// security parameters.
    AccessDenied,
    /// The target-address row names a params row that does not exist.
    UnresolvedParams,
    /// The address or params row exists but is not active.
    RowInactive,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilteredOut => f.write_str("filtered out"),
            Self::AccessDenied => f.write_str("access denied"),
            Self::UnresolvedParams => f.write_str("unresolved params"),
            Self::RowInactive => f.write_str("row not active"),
        }
    }
}

/// Terminal state of one target within a dispatch.
#[derive(Debug)]
pub enum TargetOutcome {
    /// Trap handed to the transport.
    Sent,
    /// Inform sent and acknowledged by the target.
    Acknowledged,
    /// No send attempted.
    Skipped(SkipReason),
    /// Send attempted and failed.
    Failed(Error),
}

impl TargetOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome of one target.
#[derive(Debug)]
pub struct TargetResult {
    /// Target-address row name.
    pub name: Bytes,
    /// Resolved address, when resolution got that far.
    pub addr: Option<SocketAddr>,
    pub outcome: TargetOutcome,
}

/// Aggregated result of a fan-out.
#[derive(Debug, Default)]
pub struct DispatchReport {
    results: Vec<TargetResult>,
}

impl DispatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: TargetResult) {
        self.results.push(result);
    }

    /// Per-target outcomes, in completion order.
    pub fn results(&self) -> &[TargetResult] {
        &self.results
    }

    /// Targets handed to the transport successfully (sent or acknowledged).
    pub fn sent(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, TargetOutcome::Sent | TargetOutcome::Acknowledged))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, TargetOutcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count()
    }

    /// `true` when no target failed. Skipped targets do not count as
    /// failures.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Last failure observed, if any. This is the aggregate status:
    /// earlier failures are still present in [`results`](Self::results).
    pub fn last_error(&self) -> Option<&Error> {
        self.results.iter().rev().find_map(|r| match &r.outcome {
            TargetOutcome::Failed(e) => Some(e),
            _ => None,
        })
    }
}
