//! Proxy forwarding (RFC 2573 section 3.5).
//!
//! A [`ProxyForwarder`] is registered for a (context engine ID, PDU
//! category) pair. Requests whose context engine ID names a remote engine
//! are offered to the forwarder; if a proxy table row matches, the PDU is
//! relayed to a single downstream target (read/write) or fanned out to a
//! tagged target list (notify/inform).

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use bytes::Bytes;
use tokio::task::JoinSet;

use crate::config::{ProxyRow, TagValue};
use crate::context::DispatchContext;
use crate::error::{Error, Result};
use crate::pdu::{Pdu, PduCategory};
use crate::resolve::{resolve_send_target, ResolvedTarget};
use crate::security::{SecurityLevel, SecurityModel};
use crate::transport::DispatchTransport;

/// Registration key of a forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyKey {
    /// Remote context engine ID this forwarder relays for.
    pub context_engine_id: Bytes,
    /// PDU category this forwarder accepts.
    pub category: PduCategory,
}

/// An inbound request offered to a forwarder.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub pdu: Pdu,
    pub context_engine_id: Bytes,
    pub context_name: Bytes,
    pub security_model: SecurityModel,
    pub security_name: Bytes,
    pub security_level: SecurityLevel,
    /// Transport address the request arrived from, when known.
    pub source: Option<std::net::SocketAddr>,
}

/// Delivers response PDUs back to the request originator.
pub trait Responder: Send {
    fn respond(&mut self, pdu: Pdu);
}

/// Relays PDUs for one remote context engine.
pub struct ProxyForwarder {
    ctx: DispatchContext,
    key: ProxyKey,
    next_request_id: AtomicI32,
}

impl ProxyForwarder {
    pub fn new(
        ctx: DispatchContext,
        context_engine_id: impl Into<Bytes>,
        category: PduCategory,
    ) -> Self {
        Self {
            ctx,
            key: ProxyKey {
                context_engine_id: context_engine_id.into(),
                category,
            },
            next_request_id: AtomicI32::new(1),
        }
    }

    /// The (context engine ID, category) pair this forwarder serves.
    pub fn key(&self) -> &ProxyKey {
        &self.key
    }

    /// Offer a request to this forwarder.
    ///
    /// Returns `Ok(true)` when the request was relayed and, for read/write,
    /// answered: the downstream response is handed to `responder` with the
    /// original request ID restored. Returns `Ok(false)` when the request
    /// is not for this forwarder, no usable row matched, or the single
    /// downstream target failed terminally; the caller then answers the
    /// originator with a protocol error. Fails only on the engine-identity
    /// precondition.
    pub async fn process_request(
        &self,
        req: ProxyRequest,
        responder: &mut dyn Responder,
    ) -> Result<bool> {
        let engine_id = self
            .ctx
            .engine
            .engine_id()
            .ok_or(Error::EngineNotInitialized)?;

        let Some(category) = PduCategory::of(req.pdu.pdu_type) else {
            return Ok(false);
        };
        if !self.key.category.covers(category) || req.context_engine_id != self.key.context_engine_id
        {
            return Ok(false);
        }

        let matches = self.matching_rows(&req, category);
        if matches.is_empty() {
            tracing::debug!(
                context_engine_id = ?req.context_engine_id,
                pdu_type = ?req.pdu.pdu_type,
                "no proxy table row matches request"
            );
            return Ok(false);
        }

        if category.is_single_target() {
            self.relay_single(&req, &matches, &engine_id, responder).await
        } else {
            self.relay_multiple(&req, &matches, &engine_id, category).await
        }
    }

    /// Active proxy rows matching the request's context and security
    /// parameters, in table order.
    fn matching_rows(&self, req: &ProxyRequest, category: PduCategory) -> Vec<ProxyRow> {
        self.ctx
            .store
            .proxy_snapshot()
            .into_iter()
            .map(|(_, row)| row)
            .filter(|row| {
                row.status.is_active()
                    && row.context_engine_id == req.context_engine_id
                    && row.context_name == req.context_name
                    && row.proxy_type.covers(category)
                    && self.params_match(&row.target_params_in, req)
            })
            .collect()
    }

    /// snmpProxyTargetParamsIn check: the named params row must exist, be
    /// active, and agree with the request's security parameters.
    fn params_match(&self, params_name: &[u8], req: &ProxyRequest) -> bool {
        let Some(params) = self.ctx.store.params_by_name(params_name) else {
            return false;
        };
        params.status.is_active()
            && (params.security_model == SecurityModel::Any
                || params.security_model == req.security_model)
            && params.security_name == req.security_name
            && params.security_level <= req.security_level
    }

    async fn relay_single(
        &self,
        req: &ProxyRequest,
        matches: &[ProxyRow],
        engine_id: &Bytes,
        responder: &mut dyn Responder,
    ) -> Result<bool> {
        for row in matches {
            let Some(target) = self.resolve_out(&row.single_target_out, req, engine_id) else {
                continue;
            };

            let relayed = self.transform(&req.pdu);
            tracing::debug!(
                target_name = %String::from_utf8_lossy(&target.name),
                addr = %target.addr,
                request_id = relayed.request_id,
                "relaying request to single target"
            );

            return match send_with_retries(&*self.ctx.transport, &target, &relayed).await {
                Ok(mut response) => {
                    response.request_id = req.pdu.request_id;
                    responder.respond(response);
                    Ok(true)
                }
                Err(e) => {
                    tracing::warn!(
                        addr = %target.addr,
                        error = %e,
                        "downstream target did not answer relayed request"
                    );
                    Ok(false)
                }
            };
        }
        Ok(false)
    }

    /// Fan a notification out to every member of the tagged target lists.
    /// Member failures are logged and never affect siblings; downstream
    /// inform acks are awaited per member and discarded.
    async fn relay_multiple(
        &self,
        req: &ProxyRequest,
        matches: &[ProxyRow],
        engine_id: &Bytes,
        category: PduCategory,
    ) -> Result<bool> {
        let mut tasks: JoinSet<()> = JoinSet::new();
        let mut attempted = 0usize;

        for row in matches {
            let Some(tag) = &row.multiple_target_out else {
                continue;
            };
            for member in self.members_of(tag, req, engine_id) {
                let relayed = self.transform(&req.pdu);
                let transport = Arc::clone(&self.ctx.transport);
                let await_ack = category == PduCategory::Inform;
                attempted += 1;
                tasks.spawn(async move {
                    let result = if await_ack {
                        send_with_retries(&*transport, &member, &relayed)
                            .await
                            .map(|_| ())
                    } else {
                        transport.send(&member, &relayed).await
                    };
                    if let Err(e) = result {
                        tracing::warn!(
                            addr = %member.addr,
                            error = %e,
                            "relayed notification failed"
                        );
                    }
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "relay task failed");
            }
        }

        Ok(attempted > 0)
    }

    /// Resolve the tagged member list of snmpProxyMultipleTargetOut.
    fn members_of(
        &self,
        tag: &TagValue,
        req: &ProxyRequest,
        engine_id: &Bytes,
    ) -> Vec<ResolvedTarget> {
        self.ctx
            .store
            .targets_with_tag(tag)
            .iter()
            .filter_map(|row| {
                resolve_send_target(
                    &self.ctx.store,
                    row,
                    engine_id,
                    &req.context_engine_id,
                    &req.context_name,
                )
                .map_err(|e| {
                    tracing::debug!(
                        target_name = %String::from_utf8_lossy(&row.name),
                        error = %e,
                        "skipping unusable list member"
                    );
                })
                .ok()
            })
            .collect()
    }

    fn resolve_out(
        &self,
        target_name: &Bytes,
        req: &ProxyRequest,
        engine_id: &Bytes,
    ) -> Option<ResolvedTarget> {
        let row = self.ctx.store.addr_by_name(target_name)?;
        resolve_send_target(
            &self.ctx.store,
            &row,
            engine_id,
            &req.context_engine_id,
            &req.context_name,
        )
        .map_err(|e| {
            tracing::debug!(
                target_name = %String::from_utf8_lossy(target_name),
                error = %e,
                "skipping unusable outbound target"
            );
        })
        .ok()
    }

    /// Rewrite the PDU for the downstream leg: fresh request ID, error
    /// fields cleared. Varbinds pass through untouched.
    fn transform(&self, pdu: &Pdu) -> Pdu {
        let mut out = pdu.clone();
        out.request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        out.error_status = crate::error::ErrorStatus::NoError;
        out.error_index = 0;
        out
    }
}

/// Acknowledged send with per-attempt timeout, mirroring the target's
/// configured timeout and retry count.
async fn send_with_retries(
    transport: &dyn DispatchTransport,
    target: &ResolvedTarget,
    pdu: &Pdu,
) -> Result<Pdu> {
    let attempts = target.retries.saturating_add(1);
    let mut last_error = None;

    for _ in 0..attempts {
        match tokio::time::timeout(target.timeout, transport.send_and_await(target, pdu)).await {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(e)) => last_error = Some(e),
            Err(_) => {}
        }
    }

    Err(last_error.unwrap_or(Error::Timeout {
        target: Some(target.addr),
        elapsed: target.timeout.saturating_mul(attempts),
        retries: target.retries,
    }))
}
