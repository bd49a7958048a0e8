//! Transport seam for outgoing dispatch.
//!
//! The dispatcher and proxy forwarder never touch sockets or wire
//! encodings. They resolve a target, build a PDU and security context, and
//! hand all three to a [`DispatchTransport`]. Message encoding, transport
//! binding, and v2-to-v1 translation all live behind this trait.

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::pdu::Pdu;
use crate::resolve::ResolvedTarget;

/// Boxed future for object-safe async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends PDUs to resolved targets.
///
/// A single send attempt. Retries and acknowledgment timeouts are driven by
/// the caller from the target's configured timeout and retry count.
pub trait DispatchTransport: Send + Sync {
    /// Fire-and-forget send (traps, SNMPv1 notifications).
    fn send<'a>(&'a self, target: &'a ResolvedTarget, pdu: &'a Pdu) -> BoxFuture<'a, Result<()>>;

    /// Send and await the matching response (informs, proxied requests).
    ///
    /// Resolves once a response with the request's ID arrives. The caller
    /// wraps this in its own per-attempt timeout.
    fn send_and_await<'a>(
        &'a self,
        target: &'a ResolvedTarget,
        pdu: &'a Pdu,
    ) -> BoxFuture<'a, Result<Pdu>>;
}

/// Discards everything. Sends succeed; acknowledged sends fail as if the
/// peer never answered. For wiring tests and dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl DispatchTransport for NullTransport {
    fn send<'a>(&'a self, _target: &'a ResolvedTarget, _pdu: &'a Pdu) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn send_and_await<'a>(
        &'a self,
        target: &'a ResolvedTarget,
        _pdu: &'a Pdu,
    ) -> BoxFuture<'a, Result<Pdu>> {
        let err = crate::error::Error::Timeout {
            target: Some(target.addr),
            elapsed: target.timeout,
            retries: 0,
        };
        Box::pin(async move { Err(err) })
    }
}
