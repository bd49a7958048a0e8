//! Notification fan-out.
//!
//! [`NotificationDispatcher::generate`] walks the notify table, resolves
//! every tagged target, applies per-target filtering and access control,
//! and sends concurrently. Targets are independent: one slow or failing
//! target never delays or suppresses the others.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use bytes::Bytes;
use tokio::task::JoinSet;

use crate::config::{
    NotifyKind, TagValue, TargetAddrRow, TrapDestination, TrapSecurity, DEFAULT_RETRIES,
    DEFAULT_TIMEOUT,
};
use crate::context::DispatchContext;
use crate::error::{Error, ErrorStatus, Result};
use crate::log::LogRecord;
use crate::oid::Oid;
use crate::outcome::{DispatchReport, SkipReason, TargetOutcome, TargetResult};
use crate::pdu::{Pdu, PduType};
use crate::resolve::{resolve_send_target, ResolvedTarget};
use crate::security::{SecurityLevel, Version};
use crate::transport::DispatchTransport;
use crate::varbind::VarBind;

/// Generates and fans out notifications.
pub struct NotificationDispatcher {
    ctx: DispatchContext,
    next_request_id: AtomicI32,
}

impl NotificationDispatcher {
    pub fn new(ctx: DispatchContext) -> Self {
        Self {
            ctx,
            next_request_id: AtomicI32::new(1),
        }
    }

    /// Generate a notification with the current sysUpTime and default
    /// context.
    pub async fn notify(&self, trap_oid: Oid, varbinds: Vec<VarBind>) -> Result<DispatchReport> {
        let timestamp = self.ctx.uptime.ticks();
        self.generate(trap_oid, varbinds, None, timestamp, Bytes::new())
            .await
    }

    /// Generate a notification and dispatch it to every configured target.
    ///
    /// Fails up front when the local engine has no ID yet. Per-target
    /// conditions (filtering, access denial, stale rows, send failures) are
    /// reported in the returned [`DispatchReport`], never as an `Err`.
    pub async fn generate(
        &self,
        trap_oid: Oid,
        varbinds: Vec<VarBind>,
        enterprise: Option<Oid>,
        timestamp: u32,
        context_name: Bytes,
    ) -> Result<DispatchReport> {
        let engine_id = self
            .ctx
            .engine
            .engine_id()
            .ok_or(Error::EngineNotInitialized)?;

        tracing::debug!(
            trap_oid = %trap_oid,
            varbinds = varbinds.len(),
            "generating notification"
        );

        // Snapshot both tables up front; management writes landing after
        // this point affect the next notification.
        let notify_rows = self.ctx.store.notify_snapshot();
        let addr_rows = self.ctx.store.target_addr_snapshot();

        let mut report = DispatchReport::new();
        let mut tasks: JoinSet<TargetResult> = JoinSet::new();
        let mut seen: Vec<(Bytes, NotifyKind)> = Vec::new();

        for (_, notify_row) in &notify_rows {
            for (_, addr_row) in &addr_rows {
                if !addr_row.tag_list.contains(&notify_row.tag) {
                    continue;
                }
                // A target tagged by several notify entries of the same
                // kind sends once; a trap entry and an inform entry each
                // produce their own message.
                let key = (addr_row.name.clone(), notify_row.kind);
                if seen.contains(&key) {
                    continue;
                }
                seen.push(key);

                match self.prepare(
                    addr_row,
                    notify_row.kind,
                    &trap_oid,
                    &varbinds,
                    &enterprise,
                    timestamp,
                    &engine_id,
                    &context_name,
                ) {
                    Ok((target, pdu, kind)) => {
                        let transport = Arc::clone(&self.ctx.transport);
                        tasks.spawn(async move {
                            send_to_target(transport, target, pdu, kind).await
                        });
                    }
                    Err(skip) => report.push(skip),
                }
            }
        }

        if seen.is_empty() {
            // Nothing is tagged for this notification; that is a valid
            // (if quiet) configuration, not an error.
            tracing::debug!(trap_oid = %trap_oid, "no targets matched any notify entry");
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => report.push(result),
                Err(e) => tracing::error!(error = %e, "notification send task failed"),
            }
        }

        let log_pdu = Pdu::notification(
            PduType::TrapV2,
            varbinds,
            trap_oid,
            enterprise.unwrap_or_default(),
            timestamp,
        );
        self.ctx.log.record(LogRecord::from_dispatch(&log_pdu, &report));

        Ok(report)
    }

    /// Resolve one candidate target and run the per-target gates. An `Err`
    /// here is a skip record, not a dispatch failure.
    #[allow(clippy::too_many_arguments)]
    fn prepare(
        &self,
        addr_row: &TargetAddrRow,
        kind: NotifyKind,
        trap_oid: &Oid,
        varbinds: &[VarBind],
        enterprise: &Option<Oid>,
        timestamp: u32,
        engine_id: &Bytes,
        context_name: &Bytes,
    ) -> std::result::Result<(ResolvedTarget, Pdu, NotifyKind), TargetResult> {
        let skip = |reason: SkipReason| TargetResult {
            name: addr_row.name.clone(),
            addr: Some(addr_row.addr),
            outcome: TargetOutcome::Skipped(reason),
        };

        let target = resolve_send_target(
            &self.ctx.store,
            addr_row,
            engine_id,
            engine_id,
            context_name,
        )
        .map_err(|e| {
            tracing::warn!(
                target_name = %String::from_utf8_lossy(&addr_row.name),
                error = %e,
                "skipping target with unusable configuration"
            );
            match e {
                Error::RowInactive { .. } => skip(SkipReason::RowInactive),
                _ => skip(SkipReason::UnresolvedParams),
            }
        })?;

        if !self.ctx.store.passes_filter(&target.params_name, trap_oid) {
            tracing::debug!(
                target_name = %String::from_utf8_lossy(&target.name),
                trap_oid = %trap_oid,
                "notification filtered out for target"
            );
            return Err(skip(SkipReason::FilteredOut));
        }

        let visible = self.ctx.access.allows_notify(&target.security, trap_oid)
            && varbinds
                .iter()
                .all(|vb| self.ctx.access.allows_notify(&target.security, &vb.oid));
        if !visible {
            tracing::debug!(
                target_name = %String::from_utf8_lossy(&target.name),
                security_name = %String::from_utf8_lossy(&target.security.security_name),
                "notification denied by access control for target"
            );
            return Err(skip(SkipReason::AccessDenied));
        }

        let (pdu_type, kind) = match (kind, target.security.version) {
            // v1 has no inform; downgrade to a trap rather than drop.
            (NotifyKind::Inform, Version::V1) => {
                tracing::warn!(
                    target_name = %String::from_utf8_lossy(&target.name),
                    "inform requested for an SNMPv1 target, sending a trap instead"
                );
                (PduType::TrapV1, NotifyKind::Trap)
            }
            (NotifyKind::Trap, Version::V1) => (PduType::TrapV1, NotifyKind::Trap),
            (NotifyKind::Trap, _) => (PduType::TrapV2, NotifyKind::Trap),
            (NotifyKind::Inform, _) => (PduType::InformRequest, NotifyKind::Inform),
        };

        let mut pdu = Pdu::notification(
            pdu_type,
            varbinds.to_vec(),
            trap_oid.clone(),
            enterprise.clone().unwrap_or_default(),
            timestamp,
        );
        if kind == NotifyKind::Inform {
            pdu.request_id = self.next_request_id();
        }
        Ok((target, pdu, kind))
    }

    fn next_request_id(&self) -> i32 {
        // Wrapping is fine; only uniqueness among in-flight informs matters.
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    // ------------------------------------------------------------------
    // Bootstrap helpers
    // ------------------------------------------------------------------

    /// Install an SNMPv1 trap destination.
    pub fn add_v1_trap_destination(
        &self,
        addr: std::net::SocketAddr,
        name: impl Into<Bytes>,
        tag: TagValue,
        community: impl Into<Bytes>,
    ) -> Result<()> {
        self.ctx.store.add_trap_destination(TrapDestination {
            name: name.into(),
            addr,
            tag,
            kind: NotifyKind::Trap,
            security: TrapSecurity::V1 {
                community: community.into(),
            },
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        })
    }

    /// Install an SNMPv2c trap destination.
    pub fn add_v2c_trap_destination(
        &self,
        addr: std::net::SocketAddr,
        name: impl Into<Bytes>,
        tag: TagValue,
        community: impl Into<Bytes>,
    ) -> Result<()> {
        self.ctx.store.add_trap_destination(TrapDestination {
            name: name.into(),
            addr,
            tag,
            kind: NotifyKind::Trap,
            security: TrapSecurity::V2c {
                community: community.into(),
            },
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        })
    }

    /// Install an SNMPv3 trap destination for a USM user.
    pub fn add_v3_trap_destination(
        &self,
        addr: std::net::SocketAddr,
        name: impl Into<Bytes>,
        tag: TagValue,
        security_name: impl Into<Bytes>,
        security_level: SecurityLevel,
    ) -> Result<()> {
        self.ctx.store.add_trap_destination(TrapDestination {
            name: name.into(),
            addr,
            tag,
            kind: NotifyKind::Trap,
            security: TrapSecurity::V3 {
                security_name: security_name.into(),
                security_level,
            },
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        })
    }
}

/// One target's send, run as its own task.
async fn send_to_target(
    transport: Arc<dyn DispatchTransport>,
    target: ResolvedTarget,
    pdu: Pdu,
    kind: NotifyKind,
) -> TargetResult {
    let outcome = match kind {
        NotifyKind::Trap => match transport.send(&target, &pdu).await {
            Ok(()) => TargetOutcome::Sent,
            Err(e) => TargetOutcome::Failed(e),
        },
        NotifyKind::Inform => send_inform(&*transport, &target, &pdu).await,
    };

    if let TargetOutcome::Failed(e) = &outcome {
        tracing::warn!(
            target_name = %String::from_utf8_lossy(&target.name),
            addr = %target.addr,
            error = %e,
            "notification send failed"
        );
    }

    TargetResult {
        name: target.name.clone(),
        addr: Some(target.addr),
        outcome,
    }
}

/// Inform send with acknowledgment: per-attempt timeout, `retries`
/// re-sends after the first attempt.
async fn send_inform(
    transport: &dyn DispatchTransport,
    target: &ResolvedTarget,
    pdu: &Pdu,
) -> TargetOutcome {
    let attempts = target.retries.saturating_add(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        match tokio::time::timeout(target.timeout, transport.send_and_await(target, pdu)).await {
            Ok(Ok(response)) => {
                if response.error_status == ErrorStatus::NoError {
                    return TargetOutcome::Acknowledged;
                }
                return TargetOutcome::Failed(Error::Snmp {
                    target: Some(target.addr),
                    status: response.error_status,
                    index: response.error_index,
                });
            }
            Ok(Err(e)) => {
                tracing::debug!(
                    addr = %target.addr,
                    attempt,
                    error = %e,
                    "inform attempt failed"
                );
                last_error = Some(e);
            }
            Err(_) => {
                tracing::debug!(addr = %target.addr, attempt, "inform attempt timed out");
            }
        }
    }

    TargetOutcome::Failed(last_error.unwrap_or(Error::Timeout {
        target: Some(target.addr),
        elapsed: target.timeout.saturating_mul(attempts),
        retries: target.retries,
    }))
}
