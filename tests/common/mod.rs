//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use snmp_dispatch::{
    BoxFuture, DispatchTransport, Error, ErrorStatus, Pdu, ResolvedTarget, Result, RowStatus,
    TagList, TagValue, TargetStore,
};

/// Scripted behavior of one downstream address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// `send` succeeds; `send_and_await` answers with a clean response.
    Ack,
    /// Both operations fail with an I/O error.
    Fail,
    /// `send_and_await` answers with an SNMP error response.
    ErrorStatus(ErrorStatus),
    /// `send_and_await` never resolves; only the caller's timeout ends it.
    Silent,
}

/// One PDU handed to the transport.
#[derive(Debug, Clone)]
pub struct SentPdu {
    pub target_name: Bytes,
    pub addr: SocketAddr,
    pub pdu: Pdu,
    /// Community carried by the resolved security context, when any.
    pub community: Option<Vec<u8>>,
}

/// Transport double that records every send and plays scripted answers.
#[derive(Debug, Default)]
pub struct MockTransport {
    sends: Mutex<Vec<SentPdu>>,
    behaviors: Mutex<HashMap<SocketAddr, Behavior>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, addr: SocketAddr, behavior: Behavior) {
        self.behaviors.lock().unwrap().insert(addr, behavior);
    }

    pub fn sends(&self) -> Vec<SentPdu> {
        self.sends.lock().unwrap().clone()
    }

    fn record(&self, target: &ResolvedTarget, pdu: &Pdu) {
        self.sends.lock().unwrap().push(SentPdu {
            target_name: target.name.clone(),
            addr: target.addr,
            pdu: pdu.clone(),
            community: target
                .security
                .community
                .as_ref()
                .map(|c| c.as_bytes().to_vec()),
        });
    }

    fn behavior_of(&self, addr: SocketAddr) -> Behavior {
        self.behaviors
            .lock()
            .unwrap()
            .get(&addr)
            .copied()
            .unwrap_or(Behavior::Ack)
    }
}

impl DispatchTransport for MockTransport {
    fn send<'a>(&'a self, target: &'a ResolvedTarget, pdu: &'a Pdu) -> BoxFuture<'a, Result<()>> {
        let behavior = self.behavior_of(target.addr);
        self.record(target, pdu);
        Box::pin(async move {
            match behavior {
                Behavior::Fail => Err(Error::io(
                    Some(target.addr),
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
                )),
                _ => Ok(()),
            }
        })
    }

    fn send_and_await<'a>(
        &'a self,
        target: &'a ResolvedTarget,
        pdu: &'a Pdu,
    ) -> BoxFuture<'a, Result<Pdu>> {
        let behavior = self.behavior_of(target.addr);
        self.record(target, pdu);
        Box::pin(async move {
            match behavior {
                Behavior::Ack => Ok(Pdu::response(pdu.request_id, Vec::new())),
                Behavior::ErrorStatus(status) => Ok(Pdu::error_response(pdu.request_id, status, 1)),
                Behavior::Fail => Err(Error::io(
                    Some(target.addr),
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
                )),
                Behavior::Silent => std::future::pending().await,
            }
        })
    }
}

/// Opt-in trace output for a test run, driven by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn tag(s: &'static [u8]) -> TagValue {
    TagValue::new(Bytes::from_static(s)).unwrap()
}

/// Target-address row with a 1s timeout and one retry.
pub fn addr_row(
    name: &'static [u8],
    addr: &str,
    tags: &'static [u8],
    params: &'static [u8],
) -> snmp_dispatch::config::TargetAddrRow {
    snmp_dispatch::config::TargetAddrRow {
        name: Bytes::from_static(name),
        domain: Default::default(),
        addr: addr.parse().unwrap(),
        timeout: Duration::from_secs(1),
        retries: 1,
        tag_list: TagList::parse(tags),
        params: Bytes::from_static(params),
        status: RowStatus::Active,
    }
}

pub fn v2c_params(name: &'static [u8], security_name: &'static [u8]) -> snmp_dispatch::config::TargetParamsRow {
    snmp_dispatch::config::TargetParamsRow {
        name: Bytes::from_static(name),
        mp_model: snmp_dispatch::Version::V2c,
        security_model: snmp_dispatch::SecurityModel::V2c,
        security_name: Bytes::from_static(security_name),
        security_level: snmp_dispatch::SecurityLevel::NoAuthNoPriv,
        status: RowStatus::Active,
    }
}

pub fn usm_params(
    name: &'static [u8],
    security_name: &'static [u8],
    level: snmp_dispatch::SecurityLevel,
) -> snmp_dispatch::config::TargetParamsRow {
    snmp_dispatch::config::TargetParamsRow {
        name: Bytes::from_static(name),
        mp_model: snmp_dispatch::Version::V3,
        security_model: snmp_dispatch::SecurityModel::Usm,
        security_name: Bytes::from_static(security_name),
        security_level: level,
        status: RowStatus::Active,
    }
}

pub const LOCAL_ENGINE: &[u8] = b"\x80\x00\x13\x70\x05local";

pub fn store() -> Arc<TargetStore> {
    Arc::new(TargetStore::new())
}
