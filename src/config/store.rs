//! The configuration table store.
//!
//! [`TargetStore`] owns the target-address, target-params, notify,
//! community, proxy, and notify-filter tables. Management operations mutate
//! the tables concurrently with dispatch, so every dispatch read goes
//! through a `*_snapshot` method: an atomically captured, independently
//! iterable copy. No lock is ever held across a network send.
//!
//! Lock order, for methods touching several tables: params, notify, addrs,
//! communities, proxies, filters.

use std::net::SocketAddr;
use std::sync::RwLock;
use std::time::Duration;

use bytes::Bytes;

use crate::config::arena::{Arena, RowHandle};
use crate::config::filter::{FilterSubtree, NotifyFilterTable};
use crate::config::rows::{
    CommunityRow, NotifyKind, NotifyRow, ProxyRow, RowStatus, TagValue, TargetAddrRow,
    TargetParamsRow, TransportDomain,
};
use crate::error::{ConfigErrorKind, Error, Result};
use crate::oid::Oid;
use crate::security::{SecurityLevel, SecurityModel, Version};

/// Default inform acknowledgment timeout (RFC 3413: 1500 hundredths of a second).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Default inform retry count (RFC 3413).
pub const DEFAULT_RETRIES: u32 = 3;

/// Security flavor for a trap destination added through the bootstrap API.
#[derive(Debug, Clone)]
pub enum TrapSecurity {
    /// SNMPv1 community-based.
    V1 { community: Bytes },
    /// SNMPv2c community-based.
    V2c { community: Bytes },
    /// SNMPv3 USM.
    V3 {
        security_name: Bytes,
        security_level: SecurityLevel,
    },
}

/// A trap destination to install atomically.
///
/// Expands to one row in each of the params, notify, and target-address
/// tables (plus a community mapping for v1/v2c), created as a unit.
#[derive(Debug, Clone)]
pub struct TrapDestination {
    /// Row name used across the three tables.
    pub name: Bytes,
    /// Destination transport address.
    pub addr: SocketAddr,
    /// Tag linking the target to the notify entry.
    pub tag: TagValue,
    /// Notification kind for the notify entry.
    pub kind: NotifyKind,
    /// Security parameters.
    pub security: TrapSecurity,
    /// Inform acknowledgment timeout.
    pub timeout: Duration,
    /// Inform retry count.
    pub retries: u32,
}

/// Configuration tables read by the dispatcher and proxy forwarder.
pub struct TargetStore {
    params: RwLock<Arena<TargetParamsRow>>,
    notify: RwLock<Arena<NotifyRow>>,
    addrs: RwLock<Arena<TargetAddrRow>>,
    communities: RwLock<Arena<CommunityRow>>,
    proxies: RwLock<Arena<ProxyRow>>,
    filters: RwLock<NotifyFilterTable>,
}

impl Default for TargetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            params: RwLock::new(Arena::new()),
            notify: RwLock::new(Arena::new()),
            addrs: RwLock::new(Arena::new()),
            communities: RwLock::new(Arena::new()),
            proxies: RwLock::new(Arena::new()),
            filters: RwLock::new(NotifyFilterTable::new()),
        }
    }

    // ------------------------------------------------------------------
    // Row CRUD
    // ------------------------------------------------------------------

    /// Add a target-address row. The name must be unique.
    pub fn add_target_addr(&self, row: TargetAddrRow) -> Result<RowHandle> {
        let mut addrs = self.addrs.write().expect("addr table lock");
        if addrs.find(|r| r.name == row.name).is_some() {
            return Err(Error::config(ConfigErrorKind::DuplicateName {
                table: "snmpTargetAddrTable",
            }));
        }
        Ok(addrs.insert(row))
    }

    /// Add a target-params row. The name must be unique.
    pub fn add_target_params(&self, row: TargetParamsRow) -> Result<RowHandle> {
        let mut params = self.params.write().expect("params table lock");
        if params.find(|r| r.name == row.name).is_some() {
            return Err(Error::config(ConfigErrorKind::DuplicateName {
                table: "snmpTargetParamsTable",
            }));
        }
        Ok(params.insert(row))
    }

    /// Add a notify row. The name must be unique.
    pub fn add_notify(&self, row: NotifyRow) -> Result<RowHandle> {
        let mut notify = self.notify.write().expect("notify table lock");
        if notify.find(|r| r.name == row.name).is_some() {
            return Err(Error::config(ConfigErrorKind::DuplicateName {
                table: "snmpNotifyTable",
            }));
        }
        Ok(notify.insert(row))
    }

    /// Add a community row. The index must be unique.
    pub fn add_community(&self, row: CommunityRow) -> Result<RowHandle> {
        let mut communities = self.communities.write().expect("community table lock");
        if communities.find(|r| r.index == row.index).is_some() {
            return Err(Error::config(ConfigErrorKind::DuplicateName {
                table: "snmpCommunityTable",
            }));
        }
        Ok(communities.insert(row))
    }

    /// Add a proxy row. The name must be unique.
    pub fn add_proxy(&self, row: ProxyRow) -> Result<RowHandle> {
        let mut proxies = self.proxies.write().expect("proxy table lock");
        if proxies.find(|r| r.name == row.name).is_some() {
            return Err(Error::config(ConfigErrorKind::DuplicateName {
                table: "snmpProxyTable",
            }));
        }
        Ok(proxies.insert(row))
    }

    /// Remove a target-address row by name.
    pub fn remove_target_addr(&self, name: &[u8]) -> Result<()> {
        let mut addrs = self.addrs.write().expect("addr table lock");
        let handle = addrs
            .find(|r| r.name == name)
            .map(|(h, _)| h)
            .ok_or_else(|| {
                Error::config(ConfigErrorKind::UnknownName {
                    table: "snmpTargetAddrTable",
                })
            })?;
        addrs.remove(handle);
        Ok(())
    }

    /// Remove a target-params row by name.
    pub fn remove_target_params(&self, name: &[u8]) -> Result<()> {
        let mut params = self.params.write().expect("params table lock");
        let handle = params
            .find(|r| r.name == name)
            .map(|(h, _)| h)
            .ok_or_else(|| {
                Error::config(ConfigErrorKind::UnknownName {
                    table: "snmpTargetParamsTable",
                })
            })?;
        params.remove(handle);
        Ok(())
    }

    /// Set the row status of a target-params row.
    pub fn set_params_status(&self, name: &[u8], status: RowStatus) -> Result<()> {
        let mut params = self.params.write().expect("params table lock");
        let handle = params
            .find(|r| r.name == name)
            .map(|(h, _)| h)
            .ok_or_else(|| {
                Error::config(ConfigErrorKind::UnknownName {
                    table: "snmpTargetParamsTable",
                })
            })?;
        if let Some(row) = params.get_mut(handle) {
            row.status = status;
        }
        Ok(())
    }

    /// Set the row status of a target-address row.
    pub fn set_addr_status(&self, name: &[u8], status: RowStatus) -> Result<()> {
        let mut addrs = self.addrs.write().expect("addr table lock");
        let handle = addrs
            .find(|r| r.name == name)
            .map(|(h, _)| h)
            .ok_or_else(|| {
                Error::config(ConfigErrorKind::UnknownName {
                    table: "snmpTargetAddrTable",
                })
            })?;
        if let Some(row) = addrs.get_mut(handle) {
            row.status = status;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Snapshots & lookups (dispatch path)
    // ------------------------------------------------------------------

    /// Consistent copy of the target-address table.
    pub fn target_addr_snapshot(&self) -> Vec<(RowHandle, TargetAddrRow)> {
        self.addrs.read().expect("addr table lock").snapshot()
    }

    /// Consistent copy of the notify table.
    pub fn notify_snapshot(&self) -> Vec<(RowHandle, NotifyRow)> {
        self.notify.read().expect("notify table lock").snapshot()
    }

    /// Consistent copy of the proxy table.
    pub fn proxy_snapshot(&self) -> Vec<(RowHandle, ProxyRow)> {
        self.proxies.read().expect("proxy table lock").snapshot()
    }

    /// Look up a target-params row by name (cloned).
    pub fn params_by_name(&self, name: &[u8]) -> Option<TargetParamsRow> {
        self.params
            .read()
            .expect("params table lock")
            .find(|r| r.name == name)
            .map(|(_, row)| row.clone())
    }

    /// Look up a target-address row by name (cloned).
    pub fn addr_by_name(&self, name: &[u8]) -> Option<TargetAddrRow> {
        self.addrs
            .read()
            .expect("addr table lock")
            .find(|r| r.name == name)
            .map(|(_, row)| row.clone())
    }

    /// Active target-address rows whose tag list contains `tag`.
    ///
    /// This is how a target *list* (snmpProxyMultipleTargetOut) resolves to
    /// its member targets.
    pub fn targets_with_tag(&self, tag: &TagValue) -> Vec<TargetAddrRow> {
        self.addrs
            .read()
            .expect("addr table lock")
            .iter()
            .filter(|(_, r)| r.status.is_active() && r.tag_list.contains(tag))
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Reverse-map a security name to the community to embed in an outgoing
    /// v1/v2c message.
    ///
    /// A mapping applies if its row is active, its security name matches,
    /// its context engine ID is empty (local) or equals `engine_id`, and its
    /// context name equals `context_name`.
    pub fn community_for(
        &self,
        security_name: &[u8],
        engine_id: &[u8],
        context_name: &[u8],
    ) -> Option<Bytes> {
        self.communities
            .read()
            .expect("community table lock")
            .iter()
            .find(|(_, r)| {
                r.status.is_active()
                    && r.security_name == security_name
                    && (r.context_engine_id.is_empty() || r.context_engine_id == engine_id)
                    && r.context_name == context_name
            })
            .map(|(_, r)| r.community.clone())
    }

    /// Forward-map a community string to its security name.
    pub fn security_name_for(&self, community: &[u8]) -> Option<Bytes> {
        self.communities
            .read()
            .expect("community table lock")
            .iter()
            .find(|(_, r)| r.status.is_active() && r.community == community)
            .map(|(_, r)| r.security_name.clone())
    }

    // ------------------------------------------------------------------
    // Notification filters
    // ------------------------------------------------------------------

    /// Append a filter rule to the profile of a target-params name.
    pub fn add_filter_rule(&self, params_name: impl Into<Bytes>, rule: FilterSubtree) {
        self.filters
            .write()
            .expect("filter table lock")
            .add_rule(params_name, rule);
    }

    /// Remove the filter profile of a target-params name.
    pub fn remove_filter_profile(&self, params_name: &[u8]) -> bool {
        self.filters
            .write()
            .expect("filter table lock")
            .remove_profile(params_name)
    }

    /// Evaluate the filter profile of `params_name` against a trap OID.
    pub fn passes_filter(&self, params_name: &[u8], trap_oid: &Oid) -> bool {
        self.filters
            .read()
            .expect("filter table lock")
            .passes(params_name, trap_oid)
    }

    // ------------------------------------------------------------------
    // Bootstrap mutators
    // ------------------------------------------------------------------

    /// Install a trap destination as a unit.
    ///
    /// Populates the params, notify, and target-address tables (and, for
    /// v1/v2c, the community table) atomically: if any row is rejected,
    /// rows created earlier in the same call are rolled back.
    pub fn add_trap_destination(&self, dest: TrapDestination) -> Result<()> {
        let (mp_model, security_model, security_name, security_level, community) =
            match &dest.security {
                TrapSecurity::V1 { community } => (
                    Version::V1,
                    SecurityModel::V1,
                    community.clone(),
                    SecurityLevel::NoAuthNoPriv,
                    Some(community.clone()),
                ),
                TrapSecurity::V2c { community } => (
                    Version::V2c,
                    SecurityModel::V2c,
                    community.clone(),
                    SecurityLevel::NoAuthNoPriv,
                    Some(community.clone()),
                ),
                TrapSecurity::V3 {
                    security_name,
                    security_level,
                } => (
                    Version::V3,
                    SecurityModel::Usm,
                    security_name.clone(),
                    *security_level,
                    None,
                ),
            };

        let params_handle = self.add_target_params(TargetParamsRow {
            name: dest.name.clone(),
            mp_model,
            security_model,
            security_name: security_name.clone(),
            security_level,
            status: RowStatus::Active,
        })?;

        let result = self.add_trap_destination_rest(&dest, security_name, community);
        if result.is_err() {
            // Roll back the params row so no partial destination remains.
            self.params
                .write()
                .expect("params table lock")
                .remove(params_handle);
        }
        result
    }

    fn add_trap_destination_rest(
        &self,
        dest: &TrapDestination,
        security_name: Bytes,
        community: Option<Bytes>,
    ) -> Result<()> {
        let notify_handle = self.add_notify(NotifyRow {
            name: dest.name.clone(),
            tag: dest.tag.clone(),
            kind: dest.kind,
        })?;

        let addr_result = self.add_target_addr(TargetAddrRow {
            name: dest.name.clone(),
            domain: TransportDomain::Udp,
            addr: dest.addr,
            timeout: dest.timeout,
            retries: dest.retries,
            tag_list: crate::config::rows::TagList::from_tags([dest.tag.clone()]),
            params: dest.name.clone(),
            status: RowStatus::Active,
        });

        if let Err(e) = addr_result {
            self.notify
                .write()
                .expect("notify table lock")
                .remove(notify_handle);
            return Err(e);
        }

        if let Some(community) = community {
            // Best-effort: a community mapping may already exist for this
            // security name; a duplicate index is not a partial-creation
            // failure of the destination itself.
            let _ = self.add_community(CommunityRow {
                index: dest.name.clone(),
                community,
                security_name,
                context_engine_id: Bytes::new(),
                context_name: Bytes::new(),
                transport_tag: None,
                status: RowStatus::Active,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rows::TagList;

    fn tag(s: &'static [u8]) -> TagValue {
        TagValue::new(Bytes::from_static(s)).unwrap()
    }

    fn addr_row(name: &'static [u8], tags: &'static [u8]) -> TargetAddrRow {
        TargetAddrRow {
            name: Bytes::from_static(name),
            domain: TransportDomain::Udp,
            addr: "192.0.2.1:162".parse().unwrap(),
            timeout: Duration::from_secs(5),
            retries: 1,
            tag_list: TagList::parse(tags),
            params: Bytes::from_static(b"P1"),
            status: RowStatus::Active,
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let store = TargetStore::new();
        store.add_target_addr(addr_row(b"T1", b"ops")).unwrap();
        let err = store.add_target_addr(addr_row(b"T1", b"ops")).unwrap_err();
        assert!(matches!(
            err,
            Error::Config {
                kind: ConfigErrorKind::DuplicateName { .. }
            }
        ));
    }

    #[test]
    fn test_snapshot_detached_from_live_table() {
        let store = TargetStore::new();
        store.add_target_addr(addr_row(b"T1", b"ops")).unwrap();
        let snap = store.target_addr_snapshot();
        store.remove_target_addr(b"T1").unwrap();
        assert_eq!(snap.len(), 1);
        assert!(store.target_addr_snapshot().is_empty());
    }

    #[test]
    fn test_targets_with_tag_skips_inactive() {
        let store = TargetStore::new();
        store.add_target_addr(addr_row(b"T1", b"ops backup")).unwrap();
        let mut inactive = addr_row(b"T2", b"ops");
        inactive.status = RowStatus::NotInService;
        store.add_target_addr(inactive).unwrap();

        let members = store.targets_with_tag(&tag(b"ops"));
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, Bytes::from_static(b"T1"));
    }

    #[test]
    fn test_community_reverse_lookup() {
        let store = TargetStore::new();
        store
            .add_community(CommunityRow {
                index: Bytes::from_static(b"c1"),
                community: Bytes::from_static(b"public"),
                security_name: Bytes::from_static(b"ops"),
                context_engine_id: Bytes::new(),
                context_name: Bytes::new(),
                transport_tag: None,
                status: RowStatus::Active,
            })
            .unwrap();

        assert_eq!(
            store.community_for(b"ops", b"\x80engine", b""),
            Some(Bytes::from_static(b"public"))
        );
        assert_eq!(store.community_for(b"ops", b"\x80engine", b"other-ctx"), None);
        assert_eq!(store.community_for(b"nobody", b"\x80engine", b""), None);
        assert_eq!(
            store.security_name_for(b"public"),
            Some(Bytes::from_static(b"ops"))
        );
    }

    #[test]
    fn test_add_trap_destination_populates_three_tables() {
        let store = TargetStore::new();
        store
            .add_trap_destination(TrapDestination {
                name: Bytes::from_static(b"nms1"),
                addr: "192.0.2.10:162".parse().unwrap(),
                tag: tag(b"ops"),
                kind: NotifyKind::Trap,
                security: TrapSecurity::V2c {
                    community: Bytes::from_static(b"public"),
                },
                timeout: Duration::from_secs(5),
                retries: 1,
            })
            .unwrap();

        assert!(store.params_by_name(b"nms1").is_some());
        assert!(store.addr_by_name(b"nms1").is_some());
        assert_eq!(store.notify_snapshot().len(), 1);
        assert_eq!(
            store.community_for(b"public", b"", b""),
            Some(Bytes::from_static(b"public"))
        );
    }

    #[test]
    fn test_add_trap_destination_rolls_back_on_conflict() {
        let store = TargetStore::new();
        // Pre-existing address row with the same name forces the last
        // insert to fail; the earlier params/notify rows must be undone.
        store.add_target_addr(addr_row(b"nms1", b"ops")).unwrap();

        let err = store.add_trap_destination(TrapDestination {
            name: Bytes::from_static(b"nms1"),
            addr: "192.0.2.10:162".parse().unwrap(),
            tag: tag(b"ops"),
            kind: NotifyKind::Trap,
            security: TrapSecurity::V2c {
                community: Bytes::from_static(b"public"),
            },
            timeout: Duration::from_secs(5),
            retries: 1,
        });
        assert!(err.is_err());
        assert!(store.params_by_name(b"nms1").is_none());
        assert!(store.notify_snapshot().is_empty());
    }
}
