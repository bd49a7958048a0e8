//! Proxy forwarder integration tests against a scripted transport.

mod common;

use std::sync::Arc;

use bytes::Bytes;

use snmp_dispatch::{
    oid, AllowAll, DispatchContext, ErrorStatus, Pdu, PduCategory, PduType, ProxyForwarder,
    ProxyRequest, Responder, RowStatus, SecurityLevel, SecurityModel, StorageType, TargetStore,
    Value, VarBind,
};

use common::{addr_row, store, tag, usm_params, v2c_params, Behavior, MockTransport, LOCAL_ENGINE};

const REMOTE_ENGINE: &[u8] = b"\x80\x00\x13\x70\x05remote";

#[derive(Default)]
struct CollectResponder(Vec<Pdu>);

impl Responder for CollectResponder {
    fn respond(&mut self, pdu: Pdu) {
        self.0.push(pdu);
    }
}

fn proxy_row(
    name: &'static [u8],
    proxy_type: PduCategory,
    single_out: &'static [u8],
    multiple_out: Option<&'static [u8]>,
) -> snmp_dispatch::ProxyRow {
    snmp_dispatch::ProxyRow {
        name: Bytes::from_static(name),
        proxy_type,
        context_engine_id: Bytes::from_static(REMOTE_ENGINE),
        context_name: Bytes::new(),
        target_params_in: Bytes::from_static(b"Pin"),
        single_target_out: Bytes::from_static(single_out),
        multiple_target_out: multiple_out.map(tag),
        storage: StorageType::NonVolatile,
        status: RowStatus::Active,
    }
}

fn forwarder(store: Arc<TargetStore>, transport: Arc<MockTransport>) -> ProxyForwarder {
    let ctx = DispatchContext::builder(store, transport, Arc::new(AllowAll))
        .engine_id(LOCAL_ENGINE)
        .build();
    ProxyForwarder::new(ctx, REMOTE_ENGINE, PduCategory::All)
}

fn get_request() -> ProxyRequest {
    ProxyRequest {
        pdu: Pdu::request(
            PduType::GetRequest,
            42,
            vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
        ),
        context_engine_id: Bytes::from_static(REMOTE_ENGINE),
        context_name: Bytes::new(),
        security_model: SecurityModel::Usm,
        security_name: Bytes::from_static(b"relayUser"),
        security_level: SecurityLevel::AuthPriv,
        source: None,
    }
}

/// A matching read request is relayed and the downstream answer comes back
/// with the upstream request ID restored.
#[tokio::test]
async fn read_relay_restores_upstream_request_id() {
    common::init_tracing();
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_target_params(v2c_params(b"Pout", b"public")).unwrap();
    store.add_target_addr(addr_row(b"D1", "192.0.2.50:161", b"", b"Pout")).unwrap();
    store.add_proxy(proxy_row(b"X1", PduCategory::Read, b"D1", None)).unwrap();

    let transport = Arc::new(MockTransport::new());
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let handled = fwd.process_request(get_request(), &mut responder).await.unwrap();

    assert!(handled);
    let sends = transport.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].addr.to_string(), "192.0.2.50:161");
    assert_ne!(
        sends[0].pdu.request_id, 42,
        "the downstream leg must carry a fresh request ID"
    );
    assert_eq!(responder.0.len(), 1);
    assert_eq!(responder.0[0].request_id, 42);
    assert_eq!(responder.0[0].pdu_type, PduType::Response);
}

/// Requests for another context engine are not this forwarder's business.
#[tokio::test]
async fn foreign_context_engine_is_declined() {
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_proxy(proxy_row(b"X1", PduCategory::Read, b"D1", None)).unwrap();

    let transport = Arc::new(MockTransport::new());
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let mut req = get_request();
    req.context_engine_id = Bytes::from_static(b"\x80somewhere-else");
    let handled = fwd.process_request(req, &mut responder).await.unwrap();

    assert!(!handled);
    assert!(transport.sends().is_empty());
    assert!(responder.0.is_empty());
}

/// Response PDUs have no forwardable category.
#[tokio::test]
async fn response_pdus_are_not_forwarded() {
    let fwd = forwarder(store(), Arc::new(MockTransport::new()));
    let mut responder = CollectResponder::default();

    let mut req = get_request();
    req.pdu = Pdu::response(7, Vec::new());
    assert!(!fwd.process_request(req, &mut responder).await.unwrap());
}

/// A security name the inbound params row does not list cannot use the
/// proxy.
#[tokio::test]
async fn mismatched_security_name_is_declined() {
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_target_params(v2c_params(b"Pout", b"public")).unwrap();
    store.add_target_addr(addr_row(b"D1", "192.0.2.50:161", b"", b"Pout")).unwrap();
    store.add_proxy(proxy_row(b"X1", PduCategory::Read, b"D1", None)).unwrap();

    let transport = Arc::new(MockTransport::new());
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let mut req = get_request();
    req.security_name = Bytes::from_static(b"intruder");
    let handled = fwd.process_request(req, &mut responder).await.unwrap();

    assert!(!handled, "a non-matching principal must not reach any target");
    assert!(transport.sends().is_empty());
}

/// An inactive outbound target makes the row unusable; with no other match
/// the request is declined.
#[tokio::test]
async fn inactive_single_target_out_declines_the_request() {
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_target_params(v2c_params(b"Pout", b"public")).unwrap();
    let mut down = addr_row(b"D1", "192.0.2.50:161", b"", b"Pout");
    down.status = RowStatus::NotInService;
    store.add_target_addr(down).unwrap();
    store.add_proxy(proxy_row(b"X1", PduCategory::Read, b"D1", None)).unwrap();

    let transport = Arc::new(MockTransport::new());
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let handled = fwd.process_request(get_request(), &mut responder).await.unwrap();

    assert!(!handled);
    assert!(transport.sends().is_empty());
}

/// A downstream error response is still a response; it travels upstream
/// unchanged apart from the request ID.
#[tokio::test]
async fn downstream_error_response_travels_upstream() {
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_target_params(v2c_params(b"Pout", b"public")).unwrap();
    store.add_target_addr(addr_row(b"D1", "192.0.2.50:161", b"", b"Pout")).unwrap();
    store.add_proxy(proxy_row(b"X1", PduCategory::Write, b"D1", None)).unwrap();

    let transport = Arc::new(MockTransport::new());
    transport.script(
        "192.0.2.50:161".parse().unwrap(),
        Behavior::ErrorStatus(ErrorStatus::NoSuchName),
    );
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let mut req = get_request();
    req.pdu = Pdu::request(
        PduType::SetRequest,
        42,
        vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::Integer(1))],
    );
    let handled = fwd.process_request(req, &mut responder).await.unwrap();

    assert!(handled);
    assert_eq!(responder.0.len(), 1);
    assert_eq!(responder.0[0].error_status, ErrorStatus::NoSuchName);
    assert_eq!(responder.0[0].request_id, 42);
}

/// A silent downstream target is a terminal failure for a single-target
/// relay: no upstream response, and the caller is told to answer with a
/// protocol error.
#[tokio::test(start_paused = true)]
async fn silent_downstream_is_a_terminal_single_target_failure() {
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_target_params(v2c_params(b"Pout", b"public")).unwrap();
    store.add_target_addr(addr_row(b"D1", "192.0.2.50:161", b"", b"Pout")).unwrap();
    store.add_proxy(proxy_row(b"X1", PduCategory::Read, b"D1", None)).unwrap();

    let transport = Arc::new(MockTransport::new());
    transport.script("192.0.2.50:161".parse().unwrap(), Behavior::Silent);
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let handled = fwd.process_request(get_request(), &mut responder).await.unwrap();

    assert!(!handled, "a dead downstream target cannot satisfy the relay");
    assert!(responder.0.is_empty());
    // 1s timeout, 1 retry: two attempts before giving up.
    assert_eq!(transport.sends().len(), 2);
}

/// Notify relay resolves the tagged target list and attempts every member.
#[tokio::test]
async fn multiple_target_relay_fans_out_to_all_members() {
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_target_params(v2c_params(b"Pout", b"public")).unwrap();
    store.add_target_addr(addr_row(b"M1", "192.0.2.60:162", b"relay", b"Pout")).unwrap();
    store.add_target_addr(addr_row(b"M2", "192.0.2.61:162", b"relay", b"Pout")).unwrap();
    store.add_target_addr(addr_row(b"M3", "192.0.2.62:162", b"other", b"Pout")).unwrap();
    store
        .add_proxy(proxy_row(b"X1", PduCategory::Notify, b"", Some(b"relay")))
        .unwrap();

    let transport = Arc::new(MockTransport::new());
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let mut req = get_request();
    req.pdu = Pdu::notification(
        PduType::TrapV2,
        Vec::new(),
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3),
        oid!(1, 3),
        1234,
    );
    let handled = fwd.process_request(req, &mut responder).await.unwrap();

    assert!(handled);
    let mut addrs: Vec<_> = transport.sends().iter().map(|s| s.addr.to_string()).collect();
    addrs.sort();
    assert_eq!(addrs, ["192.0.2.60:162", "192.0.2.61:162"]);
    assert!(responder.0.is_empty(), "traps are unacknowledged");
}

/// A member failing must not stop the fan-out; every member gets its
/// attempt and the request counts as handled.
#[tokio::test]
async fn failing_member_does_not_stop_the_fan_out() {
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_target_params(v2c_params(b"Pout", b"public")).unwrap();
    store.add_target_addr(addr_row(b"M1", "192.0.2.60:162", b"relay", b"Pout")).unwrap();
    store.add_target_addr(addr_row(b"M2", "192.0.2.61:162", b"relay", b"Pout")).unwrap();
    store
        .add_proxy(proxy_row(b"X1", PduCategory::Notify, b"", Some(b"relay")))
        .unwrap();

    let transport = Arc::new(MockTransport::new());
    transport.script("192.0.2.60:162".parse().unwrap(), Behavior::Fail);
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let mut req = get_request();
    req.pdu = Pdu::notification(
        PduType::TrapV2,
        Vec::new(),
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3),
        oid!(1, 3),
        1234,
    );
    let handled = fwd.process_request(req, &mut responder).await.unwrap();

    assert!(handled, "one dead member must not sink the whole relay");
    let mut addrs: Vec<_> = transport.sends().iter().map(|s| s.addr.to_string()).collect();
    addrs.sort();
    assert_eq!(addrs, ["192.0.2.60:162", "192.0.2.61:162"]);
}

/// Inform relay awaits the downstream acknowledgment per member and
/// discards it; answering the originator stays the caller's job.
#[tokio::test]
async fn inform_relay_awaits_member_acks() {
    let store = store();
    store
        .add_target_params(usm_params(b"Pin", b"relayUser", SecurityLevel::AuthNoPriv))
        .unwrap();
    store.add_target_params(v2c_params(b"Pout", b"public")).unwrap();
    store.add_target_addr(addr_row(b"M1", "192.0.2.60:162", b"relay", b"Pout")).unwrap();
    store
        .add_proxy(proxy_row(b"X1", PduCategory::Inform, b"", Some(b"relay")))
        .unwrap();

    let transport = Arc::new(MockTransport::new());
    let fwd = forwarder(store, Arc::clone(&transport));
    let mut responder = CollectResponder::default();

    let mut req = get_request();
    req.pdu = Pdu::notification(
        PduType::InformRequest,
        Vec::new(),
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3),
        oid!(1, 3),
        1234,
    );
    req.pdu.request_id = 99;
    let handled = fwd.process_request(req, &mut responder).await.unwrap();

    assert!(handled);
    assert!(responder.0.is_empty(), "member acks must not travel upstream");
    let sends = transport.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].pdu.pdu_type, PduType::InformRequest);
    assert_ne!(sends[0].pdu.request_id, 99, "the downstream leg gets its own ID");
}
