//! Typed rows for the target, notify, community, and proxy tables.
//!
//! The MIB presents these as loosely-typed table columns; here every
//! enumeration is parsed and validated when the row is written, so dispatch
//! never re-parses strings on the hot path.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::pdu::PduCategory;
use crate::security::{SecurityLevel, SecurityModel, Version};

/// RowStatus (RFC 2579). Only `Active` rows participate in dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowStatus {
    /// Row is available for use.
    #[default]
    Active,
    /// Row exists but is administratively disabled.
    NotInService,
    /// Row is incomplete (missing required columns).
    NotReady,
}

impl RowStatus {
    /// True if the row may be used by dispatch.
    pub fn is_active(&self) -> bool {
        matches!(self, RowStatus::Active)
    }
}

/// StorageType (RFC 2579).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageType {
    Other,
    Volatile,
    #[default]
    NonVolatile,
    Permanent,
    ReadOnly,
}

/// Notification kind selected by a notify-table row (RFC 3413).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyKind {
    /// Unacknowledged notification.
    Trap,
    /// Acknowledged notification with retry/timeout.
    Inform,
}

impl std::fmt::Display for NotifyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyKind::Trap => write!(f, "trap"),
            NotifyKind::Inform => write!(f, "inform"),
        }
    }
}

/// A single SNMP tag value (RFC 3413): no embedded delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagValue(Bytes);

impl TagValue {
    /// Create a tag value, rejecting delimiter characters.
    pub fn new(tag: impl Into<Bytes>) -> Option<Self> {
        let tag = tag.into();
        if tag.is_empty() || tag.iter().any(|b| Self::is_delimiter(*b)) {
            return None;
        }
        Some(Self(tag))
    }

    fn is_delimiter(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\r' | b'\n')
    }

    /// The tag bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// An SNMP tag list: a set of tags, written in the MIB as a
/// delimiter-separated string, parsed once at row-write time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagList(Vec<TagValue>);

impl TagList {
    /// Parse a delimiter-separated tag list string.
    ///
    /// Empty segments are skipped, matching how agents treat repeated
    /// separators in snmpTargetAddrTagList.
    pub fn parse(raw: &[u8]) -> Self {
        let tags = raw
            .split(|b| TagValue::is_delimiter(*b))
            .filter(|seg| !seg.is_empty())
            .filter_map(|seg| TagValue::new(Bytes::copy_from_slice(seg)))
            .collect();
        Self(tags)
    }

    /// Build from already-validated tags.
    pub fn from_tags(tags: impl IntoIterator<Item = TagValue>) -> Self {
        Self(tags.into_iter().collect())
    }

    /// True if the list contains `tag`.
    pub fn contains(&self, tag: &TagValue) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// The tags in the list.
    pub fn tags(&self) -> &[TagValue] {
        &self.0
    }

    /// True if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Transport domain of a target address (RFC 3417).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum TransportDomain {
    /// snmpUDPDomain.
    #[default]
    Udp,
    /// transportDomainTcpIpv4 / v6.
    Tcp,
}

/// Row of the target-address table (snmpTargetAddrTable, RFC 3413).
#[derive(Debug, Clone)]
pub struct TargetAddrRow {
    /// Unique row name.
    pub name: Bytes,
    /// Transport domain.
    pub domain: TransportDomain,
    /// Decoded transport address.
    pub addr: SocketAddr,
    /// Acknowledgment timeout for inform-style sends.
    pub timeout: Duration,
    /// Retry count for inform-style sends.
    pub retries: u32,
    /// Tags selecting this target for notifications and target lists.
    pub tag_list: TagList,
    /// Name of the target-params row to use.
    pub params: Bytes,
    /// Row status.
    pub status: RowStatus,
}

/// Row of the target-params table (snmpTargetParamsTable, RFC 3413).
#[derive(Debug, Clone)]
pub struct TargetParamsRow {
    /// Unique row name.
    pub name: Bytes,
    /// Message-processing model.
    pub mp_model: Version,
    /// Security model.
    pub security_model: SecurityModel,
    /// Security name.
    pub security_name: Bytes,
    /// Security level.
    pub security_level: SecurityLevel,
    /// Row status.
    pub status: RowStatus,
}

/// Row of the notify table (snmpNotifyTable, RFC 3413).
#[derive(Debug, Clone)]
pub struct NotifyRow {
    /// Unique row name.
    pub name: Bytes,
    /// Tag matched against target tag lists.
    pub tag: TagValue,
    /// Whether matching targets receive traps or informs.
    pub kind: NotifyKind,
}

/// Row of the community table (SNMP-COMMUNITY-MIB, RFC 3584).
///
/// Maps bidirectionally between a community string and the security name
/// used internally for access control.
#[derive(Debug, Clone)]
pub struct CommunityRow {
    /// Unique row index.
    pub index: Bytes,
    /// The community string.
    pub community: Bytes,
    /// Security name the community maps to.
    pub security_name: Bytes,
    /// Context engine ID the mapping applies to (empty = local engine).
    pub context_engine_id: Bytes,
    /// Context name the mapping applies to.
    pub context_name: Bytes,
    /// Transport tag restricting which targets may use this mapping
    /// (empty = no restriction).
    pub transport_tag: Option<TagValue>,
    /// Row status.
    pub status: RowStatus,
}

/// Row of the proxy table (snmpProxyTable, RFC 2573).
#[derive(Debug, Clone)]
pub struct ProxyRow {
    /// Unique row name.
    pub name: Bytes,
    /// Which PDU categories this row translates.
    pub proxy_type: PduCategory,
    /// Context engine ID the inbound request must carry.
    pub context_engine_id: Bytes,
    /// Context name the inbound request must carry.
    pub context_name: Bytes,
    /// Name of the target-params row the inbound security context must match.
    pub target_params_in: Bytes,
    /// Target-address row name for single-target (read/write) relay.
    pub single_target_out: Bytes,
    /// Tag naming the target list for multi-target (notify/inform) relay.
    pub multiple_target_out: Option<TagValue>,
    /// Storage type.
    pub storage: StorageType,
    /// Row status.
    pub status: RowStatus,
}
