//! Target resolution.
//!
//! Turns a target-address row into everything a send needs: the transport
//! address, timing, and a fully populated per-send [`SecurityContext`].
//! Resolution works on snapshot rows, so a management write racing the
//! resolution affects the next dispatch, not this one.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::config::{TargetAddrRow, TargetStore, TransportDomain};
use crate::error::{ConfigErrorKind, Error, Result};
use crate::security::{Community, SecurityContext};

/// A target ready to send to.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Target-address row name, kept for outcome reporting.
    pub name: Bytes,
    pub domain: TransportDomain,
    pub addr: SocketAddr,
    pub timeout: Duration,
    pub retries: u32,
    /// Name of the params row the security context was built from.
    pub params_name: Bytes,
    pub security: SecurityContext,
}

/// Resolve a target-address row against the params and community tables.
///
/// Fails with [`Error::RowInactive`] when the address or params row is not
/// active, and [`ConfigErrorKind::UnresolvedParams`] when the params row
/// named by the address row does not exist.
///
/// For community-based targets the community is looked up by the params
/// row's security name. When no mapping exists the security name itself is
/// used as the community, which is how bootstrap-configured v1/v2c
/// destinations behave.
pub fn resolve_send_target(
    store: &TargetStore,
    addr_row: &TargetAddrRow,
    engine_id: &Bytes,
    context_engine_id: &Bytes,
    context_name: &Bytes,
) -> Result<ResolvedTarget> {
    if !addr_row.status.is_active() {
        return Err(Error::RowInactive {
            name: String::from_utf8_lossy(&addr_row.name).into_owned(),
        });
    }

    let params = store.params_by_name(&addr_row.params).ok_or_else(|| {
        Error::config(ConfigErrorKind::UnresolvedParams)
    })?;
    if !params.status.is_active() {
        return Err(Error::RowInactive {
            name: String::from_utf8_lossy(&params.name).into_owned(),
        });
    }

    let community = if params.mp_model.is_community_based() {
        let bytes = store
            .community_for(&params.security_name, engine_id, context_name)
            .unwrap_or_else(|| {
                tracing::warn!(
                    target_name = %String::from_utf8_lossy(&addr_row.name),
                    "no community mapping for security name, using the name itself"
                );
                params.security_name.clone()
            });
        Some(Community::new(bytes))
    } else {
        None
    };

    Ok(ResolvedTarget {
        name: addr_row.name.clone(),
        domain: addr_row.domain,
        addr: addr_row.addr,
        timeout: addr_row.timeout,
        retries: addr_row.retries,
        params_name: params.name.clone(),
        security: SecurityContext {
            version: params.mp_model,
            security_model: params.security_model,
            security_name: params.security_name.clone(),
            security_level: params.security_level,
            context_engine_id: context_engine_id.clone(),
            context_name: context_name.clone(),
            community,
        },
    })
}
