//! Security models, levels, and the per-send security context.
//!
//! A [`SecurityContext`] is built fresh for every dispatch attempt and owned
//! exclusively by that attempt. It is dropped (community credentials zeroed)
//! at the end of the send call it was built for. Stale contexts must never
//! survive a table reconfiguration, so nothing in this crate caches one.

use bytes::Bytes;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// SNMP message-processing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Version {
    /// SNMPv1 (RFC 1157)
    V1,
    /// SNMPv2c (RFC 1901)
    #[default]
    V2c,
    /// SNMPv3 (RFC 3411-3418)
    V3,
}

impl Version {
    /// The snmpTargetParamsMPModel table value.
    pub const fn as_i32(self) -> i32 {
        match self {
            Version::V1 => 0,
            Version::V2c => 1,
            Version::V3 => 3,
        }
    }

    /// Create from an snmpTargetParamsMPModel table value.
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Version::V1),
            1 => Some(Version::V2c),
            3 => Some(Version::V3),
            _ => None,
        }
    }

    /// True for the community-based models (v1/v2c).
    pub const fn is_community_based(self) -> bool {
        matches!(self, Version::V1 | Version::V2c)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "SNMPv1"),
            Version::V2c => write!(f, "SNMPv2c"),
            Version::V3 => write!(f, "SNMPv3"),
        }
    }
}

/// Security model identifiers (RFC 3411).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityModel {
    /// Wildcard for access-control matching (matches any model).
    Any = 0,
    /// SNMPv1 community.
    V1 = 1,
    /// SNMPv2c community.
    V2c = 2,
    /// SNMPv3 User-based Security Model.
    Usm = 3,
}

/// Security level (RFC 3411). Ordered so that `AuthPriv` is the strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SecurityLevel {
    /// No authentication, no privacy.
    #[default]
    NoAuthNoPriv = 1,
    /// Authentication without privacy.
    AuthNoPriv = 2,
    /// Authentication and privacy.
    AuthPriv = 3,
}

impl SecurityLevel {
    /// Create from the snmpTargetParamsSecurityLevel value.
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(SecurityLevel::NoAuthNoPriv),
            2 => Some(SecurityLevel::AuthNoPriv),
            3 => Some(SecurityLevel::AuthPriv),
            _ => None,
        }
    }
}

/// A community string resolved for an outgoing v1/v2c message.
///
/// Wrapped so the secret is zeroed when the owning [`SecurityContext`]
/// is dropped at the end of the send call.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Community(Vec<u8>);

impl Community {
    /// Wrap a community string.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The community bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Community {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the secret itself.
        write!(f, "Community(<{} bytes>)", self.0.len())
    }
}

/// Security context for one outgoing message.
///
/// Built per dispatch attempt by the resolve module and consumed by the
/// transport send it was built for. The
/// community, when present, is zeroed on drop.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    /// Message-processing model for the outgoing message.
    pub version: Version,
    /// Security model.
    pub security_model: SecurityModel,
    /// Security name (USM user name, or the community-mapped name).
    pub security_name: Bytes,
    /// Security level.
    pub security_level: SecurityLevel,
    /// Context engine ID (v3; the local engine ID for notifications).
    pub context_engine_id: Bytes,
    /// Context name.
    pub context_name: Bytes,
    /// Resolved community (v1/v2c only).
    pub community: Option<Community>,
}

impl SecurityContext {
    /// The identity to place in the outgoing message header: the community
    /// for v1/v2c targets, the security name otherwise.
    pub fn wire_identity(&self) -> &[u8] {
        match &self.community {
            Some(c) if self.version.is_community_based() => c.as_bytes(),
            _ => &self.security_name,
        }
    }
}
