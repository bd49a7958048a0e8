//! Target resolution and dispatch engine for SNMP agents.
//!
//! This crate implements the management-target machinery of RFC 3413 and
//! RFC 2573: the configuration tables that describe where notifications go
//! and how proxied requests are relayed, the resolution step that turns a
//! table row into a per-send security context, and the two engines that
//! consume them.
//!
//! - [`NotificationDispatcher`] fans a trap or inform out to every target
//!   whose tag list intersects the notify table, applying per-target
//!   notification filtering and view-based access control on the way.
//! - [`ProxyForwarder`] relays PDUs addressed to a remote context engine,
//!   to a single downstream target (read/write) or a tagged target list
//!   (notify/inform).
//!
//! Wire encoding, transport bindings, and message-level security live
//! behind the [`DispatchTransport`] seam; this crate decides *where* and
//! *with which parameters* to send, never *how*.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use snmp_dispatch::{
//!     AllowAll, DispatchContext, NotificationDispatcher, NullTransport, TagValue, TargetStore,
//!     oid,
//! };
//!
//! # async fn demo() -> snmp_dispatch::Result<()> {
//! let store = Arc::new(TargetStore::new());
//! let ctx = DispatchContext::builder(store, Arc::new(NullTransport), Arc::new(AllowAll))
//!     .engine_id(&b"\x80\x00\x13\x70\x05local"[..])
//!     .build();
//!
//! let dispatcher = NotificationDispatcher::new(ctx);
//! let tag = TagValue::new(bytes::Bytes::from_static(b"ops")).unwrap();
//! dispatcher.add_v2c_trap_destination(
//!     "192.0.2.10:162".parse().unwrap(),
//!     &b"nms1"[..],
//!     tag,
//!     &b"public"[..],
//! )?;
//!
//! let report = dispatcher
//!     .notify(oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3), Vec::new())
//!     .await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod config;
pub mod context;
mod error;
pub mod log;
pub mod notify;
mod oid;
pub mod outcome;
mod pdu;
pub mod proxy;
pub mod resolve;
mod security;
pub mod transport;
mod value;
mod varbind;

pub use access::{AccessControl, AllowAll, NotifyVacm};
pub use config::{
    CommunityRow, FilterAction, FilterSubtree, NotifyFilterTable, NotifyKind, NotifyRow, ProxyRow, RowStatus,
    StorageType, TagList, TagValue, TargetAddrRow, TargetParamsRow, TargetStore, TransportDomain,
    TrapDestination, TrapSecurity,
};
pub use context::{AgentUptime, DispatchContext, EngineIdentity, FixedEngine};
pub use error::{ConfigErrorKind, Error, ErrorStatus, OidErrorKind, Result};
pub use log::{LogRecord, MemoryLog, NoopLog, NotificationLog};
pub use notify::NotificationDispatcher;
pub use oid::{Oid, MAX_OID_LEN};
pub use outcome::{DispatchReport, SkipReason, TargetOutcome, TargetResult};
pub use pdu::{NotifyHeader, Pdu, PduCategory, PduType};
pub use proxy::{ProxyForwarder, ProxyKey, ProxyRequest, Responder};
pub use resolve::{resolve_send_target, ResolvedTarget};
pub use security::{Community, SecurityContext, SecurityLevel, SecurityModel, Version};
pub use transport::{BoxFuture, DispatchTransport, NullTransport};
pub use value::Value;
pub use varbind::VarBind;
